//! Flow layout for [`ReflowMode::Flow`](crate::ReflowMode::Flow) documents.
//!
//! The element tree is mirrored into a taffy tree on demand. Boxes are kept
//! relative to the parent's border box, the same way taffy reports them.

use std::collections::HashMap;
use taffy::prelude::*;

use rune_layout::Rect as BoxRect;

use crate::document::{ElementId, MemoryDocument, parse_px};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub(crate) struct FlowLayout {
    boxes: HashMap<ElementId, BoxRect>,
}

impl FlowLayout {
    pub(crate) fn compute(doc: &MemoryDocument) -> Result<Self> {
        let mut tree: TaffyTree<()> = TaffyTree::new();
        let mut nodes = Vec::new();
        let root = build(doc, &mut tree, doc.body(), &mut nodes)?;

        let (width, height) = doc.viewport();
        tree.compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(width as f32),
                height: AvailableSpace::Definite(height as f32),
            },
        )?;

        let mut boxes = HashMap::with_capacity(nodes.len());
        for (element, node) in nodes {
            let layout = tree.layout(node)?;
            boxes.insert(
                element,
                BoxRect::new(
                    layout.location.x as f64,
                    layout.location.y as f64,
                    layout.size.width as f64,
                    layout.size.height as f64,
                ),
            );
        }
        Ok(Self { boxes })
    }

    pub(crate) fn get(&self, element: ElementId) -> Option<BoxRect> {
        self.boxes.get(&element).copied()
    }
}

fn build(
    doc: &MemoryDocument,
    tree: &mut TaffyTree<()>,
    element: ElementId,
    nodes: &mut Vec<(ElementId, NodeId)>,
) -> Result<NodeId> {
    let children = doc.element_children(element);
    let mut child_nodes = Vec::with_capacity(children.len());
    for child in &children {
        child_nodes.push(build(doc, tree, *child, nodes)?);
    }

    let style = style_for(doc, element, children.is_empty());
    let node = if child_nodes.is_empty() {
        tree.new_leaf(style)?
    } else {
        tree.new_with_children(style, &child_nodes)?
    };
    nodes.push((element, node));
    Ok(node)
}

fn px(doc: &MemoryDocument, element: ElementId, property: &str) -> Option<f32> {
    doc.resolved_style(element, property)
        .as_deref()
        .and_then(parse_px)
        .map(|v| v as f32)
}

fn style_for(doc: &MemoryDocument, element: ElementId, is_leaf: bool) -> Style {
    let display = match doc.resolved_style(element, "display").as_deref() {
        Some("none") => Display::None,
        Some("flex") | Some("inline-flex") => Display::Flex,
        Some("grid") => Display::Grid,
        _ => Display::Block,
    };
    let position = match doc.resolved_style(element, "position").as_deref() {
        Some("absolute") | Some("fixed") => Position::Absolute,
        _ => Position::Relative,
    };
    let inset = |property: &str| match px(doc, element, property) {
        Some(v) if position == Position::Absolute => LengthPercentageAuto::Length(v),
        _ => LengthPercentageAuto::Auto,
    };

    // Leaves have no content to size them, so their frame stands in for it.
    let frame = doc.frame(element);
    let dimension = |property: &str, frame_value: f64| match px(doc, element, property) {
        Some(v) => Dimension::Length(v),
        None if is_leaf && frame_value > 0.0 => Dimension::Length(frame_value as f32),
        None => Dimension::Auto,
    };

    let (border_left, border_top) = doc.border_widths(element);
    let border_right = px(doc, element, "border-right-width").unwrap_or(border_left as f32);
    let border_bottom = px(doc, element, "border-bottom-width").unwrap_or(border_top as f32);
    let padding = px(doc, element, "padding").unwrap_or(0.0);
    let gap = px(doc, element, "gap").unwrap_or(0.0);

    Style {
        display,
        position,
        flex_direction: match doc.resolved_style(element, "flex-direction").as_deref() {
            Some("column") => FlexDirection::Column,
            _ => FlexDirection::Row,
        },
        inset: taffy::Rect {
            left: inset("left"),
            top: inset("top"),
            right: LengthPercentageAuto::Auto,
            bottom: LengthPercentageAuto::Auto,
        },
        size: Size {
            width: dimension("width", frame.width),
            height: dimension("height", frame.height),
        },
        margin: taffy::Rect {
            left: LengthPercentageAuto::Length(px(doc, element, "margin-left").unwrap_or(0.0)),
            top: LengthPercentageAuto::Length(px(doc, element, "margin-top").unwrap_or(0.0)),
            right: LengthPercentageAuto::Length(0.0),
            bottom: LengthPercentageAuto::Length(0.0),
        },
        padding: taffy::Rect {
            left: LengthPercentage::Length(padding),
            right: LengthPercentage::Length(padding),
            top: LengthPercentage::Length(padding),
            bottom: LengthPercentage::Length(padding),
        },
        border: taffy::Rect {
            left: LengthPercentage::Length(border_left as f32),
            right: LengthPercentage::Length(border_right),
            top: LengthPercentage::Length(border_top as f32),
            bottom: LengthPercentage::Length(border_bottom),
        },
        gap: Size {
            width: LengthPercentage::Length(gap),
            height: LengthPercentage::Length(gap),
        },
        ..Style::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ReflowMode;

    fn row(doc: &mut MemoryDocument, count: usize) -> (ElementId, Vec<ElementId>) {
        let container = doc.create_element("div");
        doc.append_child(doc.body(), container).unwrap();
        doc.set_style(container, "display", "flex");
        doc.set_style(container, "gap", "10px");
        let items = (0..count)
            .map(|_| {
                let item = doc.create_element("div");
                doc.set_frame(item, BoxRect::new(0.0, 0.0, 50.0, 20.0));
                doc.append_child(container, item).unwrap();
                item
            })
            .collect();
        (container, items)
    }

    #[test]
    fn test_flex_row_positions() {
        let mut doc = MemoryDocument::new(ReflowMode::Flow);
        let (_, items) = row(&mut doc, 3);
        let layout = FlowLayout::compute(&doc).unwrap();

        assert_eq!(layout.get(items[0]).unwrap().left, 0.0);
        assert_eq!(layout.get(items[1]).unwrap().left, 60.0);
        assert_eq!(layout.get(items[2]).unwrap().left, 120.0);
        assert_eq!(layout.get(items[2]).unwrap().width, 50.0);
    }

    #[test]
    fn test_hidden_items_compact_siblings() {
        let mut doc = MemoryDocument::new(ReflowMode::Flow);
        let (_, items) = row(&mut doc, 3);
        doc.set_style(items[1], "display", "none");
        let layout = FlowLayout::compute(&doc).unwrap();

        assert_eq!(layout.get(items[2]).unwrap().left, 60.0);
    }
}
