//! `LayoutHost` for the in-memory document.

use tracing::warn;

use rune_layout::{LayoutHost, Rect, ScrollOffset, SiblingDirection};

use crate::document::{ElementId, MemoryDocument};
use crate::selector::SelectorList;

impl LayoutHost for MemoryDocument {
    type Element = ElementId;

    fn is_layout_element(&self, element: ElementId) -> bool {
        if !self.is_element(element) {
            return false;
        }
        // Nothing inside an <svg> is laid out as a box.
        let mut ancestor = self.parent(element);
        while let Some(current) = ancestor {
            if self.tag(current) == Some("svg") {
                return false;
            }
            ancestor = self.parent(current);
        }
        true
    }

    fn parent_element(&self, element: ElementId) -> Option<ElementId> {
        self.parent(element)
    }

    fn child_elements(&self, element: ElementId) -> Vec<ElementId> {
        self.element_children(element)
    }

    fn contains(&self, ancestor: ElementId, element: ElementId) -> bool {
        self.is_inclusive_ancestor(ancestor, element)
    }

    fn has_text_sibling(&self, element: ElementId, direction: SiblingDirection) -> bool {
        let Some(parent) = self.parent(element) else {
            return false;
        };
        let siblings = self.children(parent);
        let Some(position) = siblings.iter().position(|s| *s == element) else {
            return false;
        };
        let run: Vec<ElementId> = match direction {
            SiblingDirection::Previous => siblings[..position].iter().rev().copied().collect(),
            SiblingDirection::Next => siblings[position + 1..].to_vec(),
        };
        for sibling in run {
            match self.text(sibling) {
                Some(text) if text.trim().is_empty() => continue,
                Some(_) => return true,
                None => return false,
            }
        }
        false
    }

    fn computed_style(&self, element: ElementId, property: &str) -> Option<String> {
        self.resolved_style(element, property)
    }

    fn inline_style(&self, element: ElementId, property: &str) -> Option<String> {
        self.inline_value(element, property).map(str::to_string)
    }

    fn set_inline_style(&mut self, element: ElementId, property: &str, value: &str) {
        self.set_inline_value(element, property, value);
    }

    fn remove_inline_style(&mut self, element: ElementId, property: &str) {
        self.remove_inline_value(element, property);
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        if !self.is_rendered(element) {
            return Rect::default();
        }
        let mut rect = self.layout_box(element);
        rect.left -= self.scroll.x;
        rect.top -= self.scroll.y;
        rect
    }

    fn border_insets(&self, element: ElementId) -> (f64, f64) {
        self.border_widths(element)
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.attribute_value(element, name).map(str::to_string)
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        self.set_attribute_value(element, name, value);
    }

    fn remove_attribute(&mut self, element: ElementId, name: &str) {
        self.remove_attribute_value(element, name);
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        self.add_class_name(element, class);
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        self.remove_class_name(element, class);
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.has_class_name(element, class)
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    fn scroll_to(&mut self, offset: ScrollOffset) {
        self.scroll = offset;
    }

    fn query_selector_all(&self, scope: Option<ElementId>, selector: &str) -> Vec<ElementId> {
        let selector = match SelectorList::parse(selector) {
            Ok(selector) => selector,
            Err(err) => {
                warn!(error = %err, "ignoring selector");
                return Vec::new();
            }
        };
        let candidates = match scope {
            Some(scope) => self.descendants(scope, false),
            None => self.elements(),
        };
        candidates
            .into_iter()
            .filter(|element| selector.matches(self, *element))
            .collect()
    }
}
