//! The live element tree the engine measures and mutates.
//!
//! `LayoutHost` is the only way the engine touches elements. A host owns the
//! real tree (a browser DOM binding, a retained-mode UI tree, or the in-memory
//! document in `rune-dom`) and hands out cheap copyable element handles.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Marker class set on the root while a transition is running.
pub const ANIMATED_CLASS: &str = "is-animated";

/// Handle to a live element. Implemented for any small copyable key.
pub trait ElementRef: Copy + Eq + Hash + Debug + 'static {}

impl<T: Copy + Eq + Hash + Debug + 'static> ElementRef for T {}

/// Absolute border box of an element, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Scroll position of the document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// Which sibling run to inspect when testing for surrounding text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingDirection {
    Previous,
    Next,
}

/// Live element tree, style and geometry primitives.
pub trait LayoutHost {
    type Element: ElementRef;

    /// Whether `element` takes part in box layout. Text nodes and vector
    /// graphics internals return `false` and are never tracked.
    fn is_layout_element(&self, element: Self::Element) -> bool;

    fn parent_element(&self, element: Self::Element) -> Option<Self::Element>;

    /// Element children in document order.
    fn child_elements(&self, element: Self::Element) -> Vec<Self::Element>;

    /// Inclusive descendant test: `ancestor == element` counts.
    fn contains(&self, ancestor: Self::Element, element: Self::Element) -> bool;

    /// Whether a non-whitespace text node is the first non-blank sibling in
    /// `direction`.
    fn has_text_sibling(&self, element: Self::Element, direction: SiblingDirection) -> bool;

    /// Resolved computed value of a style property, `None` if unknown.
    fn computed_style(&self, element: Self::Element, property: &str) -> Option<String>;

    fn inline_style(&self, element: Self::Element, property: &str) -> Option<String>;

    fn set_inline_style(&mut self, element: Self::Element, property: &str, value: &str);

    fn remove_inline_style(&mut self, element: Self::Element, property: &str);

    /// Absolute border box, transforms included.
    fn bounding_rect(&self, element: Self::Element) -> Rect;

    /// Left and top border widths (`clientLeft`/`clientTop`).
    fn border_insets(&self, element: Self::Element) -> (f64, f64);

    fn attribute(&self, element: Self::Element, name: &str) -> Option<String>;

    fn set_attribute(&mut self, element: Self::Element, name: &str, value: &str);

    fn remove_attribute(&mut self, element: Self::Element, name: &str);

    fn add_class(&mut self, element: Self::Element, class: &str);

    fn remove_class(&mut self, element: Self::Element, class: &str);

    fn has_class(&self, element: Self::Element, class: &str) -> bool;

    fn scroll_offset(&self) -> ScrollOffset;

    fn scroll_to(&mut self, offset: ScrollOffset);

    /// Elements matching `selector`, in document order. `scope` limits the
    /// search to descendants of an element; `None` searches the document.
    fn query_selector_all(&self, scope: Option<Self::Element>, selector: &str)
    -> Vec<Self::Element>;
}

/// Child selection for a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Targets<E> {
    /// Every element under the root.
    All,
    /// A selector resolved against the whole document.
    Selector(String),
    Element(E),
    Elements(Vec<E>),
    List(Vec<Targets<E>>),
}

impl<E> Default for Targets<E> {
    fn default() -> Self {
        Self::All
    }
}

impl<E> From<&str> for Targets<E> {
    fn from(selector: &str) -> Self {
        if selector.trim() == "*" {
            Self::All
        } else {
            Self::Selector(selector.to_string())
        }
    }
}

impl<E> From<String> for Targets<E> {
    fn from(selector: String) -> Self {
        Self::from(selector.as_str())
    }
}

/// Resolve `targets` to a concrete element list, duplicates removed and
/// first-encountered order kept.
pub fn resolve_targets<H: LayoutHost>(
    host: &H,
    root: H::Element,
    targets: &Targets<H::Element>,
) -> Vec<H::Element> {
    let mut resolved = Vec::new();
    let mut seen = std::collections::HashSet::new();
    collect_targets(host, root, targets, &mut resolved, &mut seen);
    resolved
}

fn collect_targets<H: LayoutHost>(
    host: &H,
    root: H::Element,
    targets: &Targets<H::Element>,
    out: &mut Vec<H::Element>,
    seen: &mut std::collections::HashSet<H::Element>,
) {
    let mut push = |element: H::Element| {
        if seen.insert(element) {
            out.push(element);
        }
    };
    match targets {
        Targets::All => host
            .query_selector_all(Some(root), "*")
            .into_iter()
            .for_each(&mut push),
        Targets::Selector(selector) => host
            .query_selector_all(None, selector)
            .into_iter()
            .for_each(&mut push),
        Targets::Element(element) => push(*element),
        Targets::Elements(elements) => elements.iter().copied().for_each(&mut push),
        Targets::List(list) => {
            for nested in list {
                collect_targets(host, root, nested, out, seen);
            }
        }
    }
}
