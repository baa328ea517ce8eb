#![allow(dead_code)]

use rune_autolayout::dom::{ElementId, MemoryDocument, ReflowMode};
use rune_autolayout::layout::Rect;

pub const ITEM_WIDTH: f64 = 50.0;
pub const ITEM_HEIGHT: f64 = 20.0;
pub const GAP: f64 = 10.0;

/// A root container holding `count` items in a row, `GAP` apart.
///
/// In fixed mode the items get explicit frames. In flow mode the root is a
/// flex row and the frames only size the items.
pub fn row(mode: ReflowMode, count: usize) -> (MemoryDocument, ElementId, Vec<ElementId>) {
    let mut doc = MemoryDocument::new(mode);
    let root = doc.create_element("div");
    doc.add_class_name(root, "root");
    doc.append_child(doc.body(), root).unwrap();
    doc.set_frame(root, Rect::new(0.0, 0.0, 400.0, 100.0));
    if mode == ReflowMode::Flow {
        doc.set_style(root, "display", "flex");
        doc.set_style(root, "gap", &format!("{GAP}px"));
        doc.set_style(root, "height", "100px");
    }

    let items = (0..count)
        .map(|i| {
            let item = doc.create_element("div");
            doc.add_class_name(item, "item");
            doc.set_frame(item, item_frame(i));
            doc.append_child(root, item).unwrap();
            item
        })
        .collect();
    (doc, root, items)
}

/// Frame of the item at `position` in a fixed-mode row.
pub fn item_frame(position: usize) -> Rect {
    Rect::new(
        position as f64 * (ITEM_WIDTH + GAP),
        0.0,
        ITEM_WIDTH,
        ITEM_HEIGHT,
    )
}
