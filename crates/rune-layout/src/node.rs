//! Per-element records.
//!
//! A [`Node`] lives in a snapshot's arena and is linked to its parent, children
//! and siblings by [`NodeIndex`]. The part of a node that the reconciler reads
//! and rewrites (geometry, tracked values, visibility) is split out as
//! [`NodeState`] so a diff can hold owned copies of both end points.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::LayoutId;
use crate::value::StyleValue;

/// Index into a snapshot's node arena.
pub type NodeIndex = usize;

/// Geometry property names stored as fields rather than in `values`.
pub const GEOMETRY_PROPERTIES: [&str; 8] = [
    "x",
    "y",
    "width",
    "height",
    "left",
    "top",
    "border-left",
    "border-top",
];

/// Recorded geometry and tracked style values of one element.
///
/// `x`/`y` are local to the parent node (or to the root when the parent is not
/// tracked). `left`/`top` are the absolute border box origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProperties {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
    pub border_left: f64,
    pub border_top: f64,
    pub transform: String,
    pub values: BTreeMap<String, StyleValue>,
}

impl Default for NodeProperties {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            left: 0.0,
            top: 0.0,
            border_left: 0.0,
            border_top: 0.0,
            transform: "none".to_string(),
            values: BTreeMap::new(),
        }
    }
}

impl NodeProperties {
    /// Properties with every tracked name initialised to `0`.
    pub fn with_tracked<'a>(tracked: impl IntoIterator<Item = &'a str>) -> Self {
        let mut properties = Self::default();
        for name in tracked {
            properties
                .values
                .insert(name.to_string(), StyleValue::Number(0.0));
        }
        properties
    }

    fn geometry_mut(&mut self, name: &str) -> Option<&mut f64> {
        Some(match name {
            "x" => &mut self.x,
            "y" => &mut self.y,
            "width" => &mut self.width,
            "height" => &mut self.height,
            "left" => &mut self.left,
            "top" => &mut self.top,
            "border-left" => &mut self.border_left,
            "border-top" => &mut self.border_top,
            _ => return None,
        })
    }

    fn geometry(&self, name: &str) -> Option<f64> {
        Some(match name {
            "x" => self.x,
            "y" => self.y,
            "width" => self.width,
            "height" => self.height,
            "left" => self.left,
            "top" => self.top,
            "border-left" => self.border_left,
            "border-top" => self.border_top,
            _ => return None,
        })
    }

    /// Read a property by name. Geometry names map onto the fields.
    pub fn get(&self, name: &str) -> Option<StyleValue> {
        if let Some(value) = self.geometry(name) {
            return Some(StyleValue::Number(value));
        }
        if name == "transform" {
            return Some(StyleValue::Text(self.transform.clone()));
        }
        self.values.get(name).cloned()
    }

    /// Write a property by name. Non-numeric values written to a geometry
    /// field are ignored.
    pub fn set(&mut self, name: &str, value: StyleValue) {
        if let Some(field) = self.geometry_mut(name) {
            if let Some(number) = value.as_f64() {
                *field = number;
            }
            return;
        }
        if name == "transform" {
            self.transform = value.to_string();
            return;
        }
        self.values.insert(name.to_string(), value);
    }

    /// Whether any geometry field or tracked value differs, ignoring the
    /// transform.
    pub fn differs_from(&self, other: &NodeProperties) -> bool {
        GEOMETRY_PROPERTIES
            .iter()
            .any(|name| self.geometry(name) != other.geometry(name))
            || self.values != other.values
    }

    pub fn has_transform(&self) -> bool {
        self.transform != "none"
    }
}

/// Visibility and layout facts read from the computed style during a walk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasuredState {
    pub display: String,
    pub visibility: String,
    pub position: String,
    pub has_display_none: bool,
    pub has_visibility_hidden: bool,
    pub is_visible: bool,
    /// Hidden itself or inside a hidden ancestor.
    pub is_removed: bool,
    pub is_inside_root: bool,
}

/// The diffable part of a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeState {
    pub properties: NodeProperties,
    pub is_target: bool,
    pub has_transform: bool,
    pub inline_transform: Option<String>,
    pub measured: MeasuredState,
    pub has_display_none: bool,
    pub has_visibility_hidden: bool,
    pub is_inlined: bool,
}

/// One tracked element in one snapshot.
#[derive(Debug, Clone)]
pub struct Node<E> {
    pub id: LayoutId,
    pub element: E,
    /// Element geometry is read from. Differs from `element` when a hidden
    /// node borrows measurements from a visible twin.
    pub measure: E,
    pub state: NodeState,
    pub index: usize,
    pub total: usize,
    pub has_visibility_swap: bool,

    pub(crate) inline_styles: Vec<(String, Option<String>)>,
    /// Original inline `transition` of `element` while muted for measurement.
    pub(crate) inline_transition: Option<String>,
    pub(crate) measured_inline_transform: Option<String>,
    pub(crate) measured_inline_transition: Option<String>,

    pub(crate) parent: Option<NodeIndex>,
    pub(crate) head: Option<NodeIndex>,
    pub(crate) tail: Option<NodeIndex>,
    pub(crate) prev: Option<NodeIndex>,
    pub(crate) next: Option<NodeIndex>,
}

impl<E: Copy> Node<E> {
    pub fn new(
        id: LayoutId,
        element: E,
        parent: Option<NodeIndex>,
        properties: NodeProperties,
    ) -> Self {
        Self {
            id,
            element,
            measure: element,
            state: NodeState {
                properties,
                ..NodeState::default()
            },
            index: 0,
            total: 1,
            has_visibility_swap: false,
            inline_styles: Vec::new(),
            inline_transition: None,
            measured_inline_transform: None,
            measured_inline_transition: None,
            parent,
            head: None,
            tail: None,
            prev: None,
            next: None,
        }
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeIndex> {
        self.head
    }

    pub fn last_child(&self) -> Option<NodeIndex> {
        self.tail
    }

    pub fn previous_sibling(&self) -> Option<NodeIndex> {
        self.prev
    }

    pub fn next_sibling(&self) -> Option<NodeIndex> {
        self.next
    }

    pub fn properties(&self) -> &NodeProperties {
        &self.state.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set_route_geometry_to_fields() {
        let mut props = NodeProperties::with_tracked(["opacity"]);
        props.set("width", StyleValue::parse("120"));
        props.set("opacity", StyleValue::Number(0.5));
        props.set("transform", StyleValue::from("rotate(45deg)"));

        assert_eq!(props.width, 120.0);
        assert_eq!(props.get("width"), Some(StyleValue::Number(120.0)));
        assert_eq!(props.get("opacity"), Some(StyleValue::Number(0.5)));
        assert!(props.has_transform());
        assert_eq!(props.get("missing"), None);
    }

    #[test]
    fn test_differs_ignores_transform() {
        let a = NodeProperties::with_tracked(["opacity"]);
        let mut b = a.clone();
        b.transform = "scale(2)".into();
        assert!(!a.differs_from(&b));

        b.y = 4.0;
        assert!(a.differs_from(&b));
    }

    #[test]
    fn test_tracked_values_start_at_zero() {
        let props = NodeProperties::with_tracked(["opacity", "border-radius"]);
        assert_eq!(props.values.len(), 2);
        assert_eq!(props.get("border-radius"), Some(StyleValue::Number(0.0)));
    }
}
