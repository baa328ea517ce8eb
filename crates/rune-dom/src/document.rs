//! Element tree storage, editing and style resolution.

use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::warn;

use rune_layout::{Rect, ScrollOffset};

use crate::error::{DomError, Result};
use crate::flow::FlowLayout;

/// Default viewport size.
pub const DEFAULT_VIEWPORT: (f64, f64) = (1280.0, 800.0);

/// Tags laid out inline by default.
const INLINE_TAGS: [&str; 9] = ["span", "a", "em", "strong", "b", "i", "label", "code", "svg"];

/// Handle to a node of a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where element boxes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ReflowMode {
    /// Boxes are the frames set with [`MemoryDocument::set_frame`]. Hiding an
    /// element leaves its siblings where they are.
    #[default]
    Fixed,
    /// Boxes are computed by flex/block layout from the styles, so hiding an
    /// element compacts its siblings.
    Flow,
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    /// Stylesheet declarations, below inline style in the cascade.
    style: BTreeMap<String, String>,
    inline: BTreeMap<String, String>,
    /// Box relative to the parent's padding box, used in fixed mode.
    frame: Rect,
}

#[derive(Debug, Clone)]
enum Content {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct DocNode {
    content: Content,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// An in-memory element tree with enough style and geometry behavior to host
/// layout transitions headlessly.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<DocNode>,
    body: ElementId,
    mode: ReflowMode,
    viewport: (f64, f64),
    pub(crate) scroll: ScrollOffset,
    flow: RefCell<Option<FlowLayout>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new(ReflowMode::default())
    }
}

impl MemoryDocument {
    pub fn new(mode: ReflowMode) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            body: ElementId(0),
            mode,
            viewport: DEFAULT_VIEWPORT,
            scroll: ScrollOffset::default(),
            flow: RefCell::new(None),
        };
        doc.body = doc.create_element("body");
        let (width, height) = doc.viewport;
        doc.set_frame(doc.body, Rect::new(0.0, 0.0, width, height));
        doc
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self.set_frame(self.body, Rect::new(0.0, 0.0, width, height));
        self
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    pub fn mode(&self) -> ReflowMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ReflowMode) {
        self.mode = mode;
        self.invalidate();
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    pub(crate) fn invalidate(&self) {
        self.flow.borrow_mut().take();
    }

    fn push(&mut self, content: Content) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(DocNode {
            content,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.push(Content::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..ElementData::default()
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> ElementId {
        self.push(Content::Text(text.to_string()))
    }

    fn data(&self, id: ElementId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.content {
            Content::Element(data) => Some(data),
            Content::Text(_) => None,
        }
    }

    fn data_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.content {
            Content::Element(data) => Some(data),
            Content::Text(_) => None,
        }
    }

    pub fn is_element(&self, id: ElementId) -> bool {
        self.data(id).is_some()
    }

    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.data(id).map(|data| data.tag.as_str())
    }

    pub fn text(&self, id: ElementId) -> Option<&str> {
        match &self.nodes.get(id.0)?.content {
            Content::Text(text) => Some(text),
            Content::Element(_) => None,
        }
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(id.0)?.parent
    }

    /// Child nodes, text included, in document order.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.nodes
            .get(id.0)
            .map_or(&[], |node| node.children.as_slice())
    }

    /// Element children in document order.
    pub fn element_children(&self, id: ElementId) -> Vec<ElementId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Inclusive ancestor test.
    pub fn is_inclusive_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Whether `id` is attached under the body.
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.is_inclusive_ancestor(self.body, id)
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference`, or last when `reference` is `None`.
    /// A child that already has a parent is moved.
    pub fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        reference: Option<ElementId>,
    ) -> Result<()> {
        if !self.is_element(parent) {
            return Err(DomError::NotAnElement(parent));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) || reference == child {
                return Err(DomError::NotAChild(reference));
            }
        }
        self.remove_child(child);
        let children = &mut self.nodes[parent.0].children;
        let position = reference
            .and_then(|reference| children.iter().position(|c| *c == reference))
            .unwrap_or(children.len());
        children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        self.invalidate();
        Ok(())
    }

    /// Detach `child` from its parent. Detached nodes keep their subtree and
    /// can be inserted again.
    pub fn remove_child(&mut self, child: ElementId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != child);
        self.nodes[child.0].parent = None;
        self.invalidate();
    }

    /// Copy a node, attributes and styles included. The copy is detached.
    pub fn clone_node(&mut self, id: ElementId, deep: bool) -> ElementId {
        let content = self.nodes[id.0].content.clone();
        let copy = self.push(content);
        if deep {
            for child in self.children(id).to_vec() {
                let child_copy = self.clone_node(child, true);
                self.nodes[child_copy.0].parent = Some(copy);
                self.nodes[copy.0].children.push(child_copy);
            }
        }
        copy
    }

    pub fn set_frame(&mut self, id: ElementId, frame: Rect) {
        if let Some(data) = self.data_mut(id) {
            data.frame = frame;
        }
        self.invalidate();
    }

    pub fn frame(&self, id: ElementId) -> Rect {
        self.data(id).map(|data| data.frame).unwrap_or_default()
    }

    /// Set a stylesheet declaration.
    pub fn set_style(&mut self, id: ElementId, property: &str, value: &str) {
        if let Some(data) = self.data_mut(id) {
            data.style.insert(property.to_string(), value.to_string());
        }
        self.invalidate();
    }

    pub fn remove_style(&mut self, id: ElementId, property: &str) {
        if let Some(data) = self.data_mut(id) {
            data.style.remove(property);
        }
        self.invalidate();
    }

    pub fn inline_value(&self, id: ElementId, property: &str) -> Option<&str> {
        self.data(id)?.inline.get(property).map(String::as_str)
    }

    /// Inline declarations of `id`, sorted by property.
    pub fn inline_styles(&self, id: ElementId) -> Vec<(String, String)> {
        self.data(id)
            .map(|data| {
                data.inline
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn set_inline_value(&mut self, id: ElementId, property: &str, value: &str) {
        if let Some(data) = self.data_mut(id) {
            data.inline.insert(property.to_string(), value.to_string());
        }
        self.invalidate();
    }

    pub(crate) fn remove_inline_value(&mut self, id: ElementId, property: &str) {
        if let Some(data) = self.data_mut(id) {
            data.inline.remove(property);
        }
        self.invalidate();
    }

    pub fn attribute_value(&self, id: ElementId, name: &str) -> Option<&str> {
        self.data(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute_value(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(data) = self.data_mut(id) {
            data.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute_value(&mut self, id: ElementId, name: &str) {
        if let Some(data) = self.data_mut(id) {
            data.attributes.remove(name);
        }
    }

    pub fn has_class_name(&self, id: ElementId, class: &str) -> bool {
        self.data(id)
            .is_some_and(|data| data.classes.iter().any(|c| c == class))
    }

    pub fn add_class_name(&mut self, id: ElementId, class: &str) {
        if let Some(data) = self.data_mut(id) {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class_name(&mut self, id: ElementId, class: &str) {
        if let Some(data) = self.data_mut(id) {
            data.classes.retain(|c| c != class);
        }
    }

    /// Elements under the body (inclusive) in document order.
    pub fn elements(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_elements(self.body, true, &mut out);
        out
    }

    /// Elements under `root` in document order.
    pub fn descendants(&self, root: ElementId, include_root: bool) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_elements(root, include_root, &mut out);
        out
    }

    fn collect_elements(&self, root: ElementId, include_root: bool, out: &mut Vec<ElementId>) {
        if !self.is_element(root) {
            return;
        }
        if include_root {
            out.push(root);
        }
        for child in self.children(root) {
            self.collect_elements(*child, true, out);
        }
    }

    /// Cascaded value: inline, then stylesheet, then inherited visibility,
    /// then the initial value.
    pub fn resolved_style(&self, id: ElementId, property: &str) -> Option<String> {
        let data = self.data(id)?;
        if let Some(value) = data.inline.get(property).or_else(|| data.style.get(property)) {
            return Some(value.clone());
        }
        if property == "visibility" {
            if let Some(parent) = self.parent(id) {
                return self.resolved_style(parent, property);
            }
        }
        initial_value(&data.tag, property).map(str::to_string)
    }

    fn length(&self, id: ElementId, property: &str) -> Option<f64> {
        self.resolved_style(id, property)
            .as_deref()
            .and_then(parse_px)
    }

    /// Left and top border widths.
    pub fn border_widths(&self, id: ElementId) -> (f64, f64) {
        let fallback = self.length(id, "border-width").unwrap_or(0.0);
        (
            self.length(id, "border-left-width").unwrap_or(fallback),
            self.length(id, "border-top-width").unwrap_or(fallback),
        )
    }

    /// Whether `id` is connected and neither it nor an ancestor has
    /// `display: none`.
    pub fn is_rendered(&self, id: ElementId) -> bool {
        if !self.is_connected(id) {
            return false;
        }
        let mut current = Some(id);
        while let Some(node) = current {
            if self.resolved_style(node, "display").as_deref() == Some("none") {
                return false;
            }
            current = self.parent(node);
        }
        true
    }

    /// Border box in document coordinates, ignoring scroll.
    pub fn layout_box(&self, id: ElementId) -> Rect {
        if id == self.body {
            let (width, height) = self.viewport;
            return Rect::new(0.0, 0.0, width, height);
        }
        let Some(parent) = self.parent(id) else {
            return Rect::default();
        };
        let parent_box = self.layout_box(parent);
        let (border_left, border_top) = self.border_widths(parent);
        let origin = (parent_box.left + border_left, parent_box.top + border_top);

        let mut rect = match self.mode {
            ReflowMode::Fixed => self.fixed_box(id, origin),
            ReflowMode::Flow => match self.flow_box(id) {
                Some(local) => Rect::new(
                    parent_box.left + local.left,
                    parent_box.top + local.top,
                    local.width,
                    local.height,
                ),
                None => self.fixed_box(id, origin),
            },
        };

        let (tx, ty) = self
            .resolved_style(id, "translate")
            .as_deref()
            .map(parse_translate)
            .unwrap_or((0.0, 0.0));
        rect.left += tx;
        rect.top += ty;
        rect
    }

    fn fixed_box(&self, id: ElementId, origin: (f64, f64)) -> Rect {
        let frame = self.frame(id);
        let mut rect = Rect::new(
            origin.0 + frame.left,
            origin.1 + frame.top,
            frame.width,
            frame.height,
        );
        let position = self.resolved_style(id, "position").unwrap_or_default();
        if position == "absolute" || position == "fixed" {
            let base = if position == "fixed" {
                (self.scroll.x, self.scroll.y)
            } else {
                origin
            };
            rect.left = base.0
                + self.length(id, "left").unwrap_or(frame.left)
                + self.length(id, "margin-left").unwrap_or(0.0);
            rect.top = base.1
                + self.length(id, "top").unwrap_or(frame.top)
                + self.length(id, "margin-top").unwrap_or(0.0);
        }
        if let Some(width) = self.length(id, "width") {
            rect.width = width;
        }
        if let Some(height) = self.length(id, "height") {
            rect.height = height;
        }
        rect
    }

    /// Box relative to the parent's border box from flow layout.
    fn flow_box(&self, id: ElementId) -> Option<Rect> {
        if self.flow.borrow().is_none() {
            match FlowLayout::compute(self) {
                Ok(layout) => *self.flow.borrow_mut() = Some(layout),
                Err(err) => {
                    warn!(error = %err, "flow layout failed, falling back to frames");
                    return None;
                }
            }
        }
        self.flow.borrow().as_ref()?.get(id)
    }
}

/// Initial value of a property, `None` for properties the document does not
/// know about.
fn initial_value(tag: &str, property: &str) -> Option<&'static str> {
    Some(match property {
        "display" if INLINE_TAGS.contains(&tag) => "inline",
        "display" => "block",
        "visibility" => "visible",
        "position" => "static",
        "opacity" => "1",
        "transform" | "translate" => "none",
        "border-radius" | "border-width" | "margin-left" | "margin-top" => "0px",
        "left" | "top" | "width" | "height" | "min-width" | "min-height" => "auto",
        "max-width" | "max-height" => "none",
        _ => return None,
    })
}

/// Parse `12px` or `12` into a number.
pub(crate) fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    value
        .strip_suffix("px")
        .unwrap_or(value)
        .trim()
        .parse::<f64>()
        .ok()
}

/// Parse a `translate` value (`"10px 20px"`, `"10px"`, `"none"`).
pub(crate) fn parse_translate(value: &str) -> (f64, f64) {
    let mut parts = value.split_whitespace().map(parse_px);
    let x = parts.next().flatten().unwrap_or(0.0);
    let y = parts.next().flatten().unwrap_or(0.0);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut doc = MemoryDocument::default();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let body = doc.body();
        doc.append_child(body, a).unwrap();
        doc.insert_before(body, b, Some(a)).unwrap();
        assert_eq!(doc.element_children(body), vec![b, a]);

        doc.remove_child(b);
        assert_eq!(doc.element_children(body), vec![a]);
        assert!(!doc.is_connected(b));
    }

    #[test]
    fn test_insert_errors() {
        let mut doc = MemoryDocument::default();
        let a = doc.create_element("div");
        let text = doc.create_text("hello");
        let body = doc.body();
        doc.append_child(body, a).unwrap();

        assert!(matches!(doc.append_child(text, a), Err(DomError::NotAnElement(_))));
        assert!(matches!(doc.append_child(a, body), Err(DomError::Cycle { .. })));
        let stray = doc.create_element("div");
        assert!(matches!(
            doc.insert_before(body, stray, Some(stray)),
            Err(DomError::NotAChild(_))
        ));
    }

    #[test]
    fn test_cascade_and_inherited_visibility() {
        let mut doc = MemoryDocument::default();
        let parent = doc.create_element("div");
        let child = doc.create_element("span");
        doc.append_child(doc.body(), parent).unwrap();
        doc.append_child(parent, child).unwrap();
        doc.set_style(parent, "visibility", "hidden");

        assert_eq!(doc.resolved_style(child, "visibility").as_deref(), Some("hidden"));
        assert_eq!(doc.resolved_style(child, "display").as_deref(), Some("inline"));
        doc.set_inline_value(child, "display", "block");
        assert_eq!(doc.resolved_style(child, "display").as_deref(), Some("block"));
        assert_eq!(doc.resolved_style(child, "unknown-thing"), None);
    }

    #[test]
    fn test_fixed_boxes_include_parent_border_and_translate() {
        let mut doc = MemoryDocument::new(ReflowMode::Fixed);
        let card = doc.create_element("div");
        let label = doc.create_element("div");
        doc.append_child(doc.body(), card).unwrap();
        doc.append_child(card, label).unwrap();
        doc.set_frame(card, Rect::new(10.0, 20.0, 200.0, 100.0));
        doc.set_frame(label, Rect::new(5.0, 5.0, 50.0, 10.0));
        doc.set_style(card, "border-width", "2px");

        assert_eq!(doc.layout_box(label), Rect::new(17.0, 27.0, 50.0, 10.0));

        doc.set_inline_value(label, "translate", "3px 4px");
        assert_eq!(doc.layout_box(label), Rect::new(20.0, 31.0, 50.0, 10.0));
    }

    #[test]
    fn test_absolute_override_pins_to_parent_origin() {
        let mut doc = MemoryDocument::new(ReflowMode::Fixed);
        let card = doc.create_element("div");
        doc.append_child(doc.body(), card).unwrap();
        doc.set_frame(card, Rect::new(40.0, 40.0, 100.0, 100.0));
        doc.set_inline_value(card, "position", "absolute");
        doc.set_inline_value(card, "left", "0px");
        doc.set_inline_value(card, "top", "0px");
        doc.set_inline_value(card, "translate", "40px 40px");
        doc.set_inline_value(card, "width", "80px");

        assert_eq!(doc.layout_box(card), Rect::new(40.0, 40.0, 80.0, 100.0));
    }

    #[test]
    fn test_rendered_and_clone() {
        let mut doc = MemoryDocument::default();
        let parent = doc.create_element("div");
        let child = doc.create_element("div");
        doc.append_child(doc.body(), parent).unwrap();
        doc.append_child(parent, child).unwrap();
        doc.set_attribute_value(child, "data-layout-id", "node-3");
        assert!(doc.is_rendered(child));

        doc.set_style(parent, "display", "none");
        assert!(!doc.is_rendered(child));

        let copy = doc.clone_node(parent, true);
        assert!(!doc.is_connected(copy));
        let copied_child = doc.element_children(copy)[0];
        assert_eq!(doc.attribute_value(copied_child, "data-layout-id"), Some("node-3"));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_px("12px"), Some(12.0));
        assert_eq!(parse_px(" 3.5 "), Some(3.5));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_translate("10px -4px"), (10.0, -4.0));
        assert_eq!(parse_translate("none"), (0.0, 0.0));
    }
}
