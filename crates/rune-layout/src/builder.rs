//! Tree builder: walks the live element tree into a snapshot.
//!
//! The walk is an explicit stack of `(element, parent node)` pairs. Children
//! are pushed in reverse document order so they pop in document order.
//!
//! An element's persistent id lives in its `data-layout-id` attribute. When
//! the id already belongs to a node bound to a *different* element (content
//! was cloned or replaced), [`rebind_decision`] settles which element the
//! node follows.

use std::collections::HashSet;
use tracing::trace;

use crate::host::{ElementRef, LayoutHost, SiblingDirection, Targets};
use crate::ids::{IdRegistry, LAYOUT_ID_ATTRIBUTE, LayoutId};
use crate::node::{MeasuredState, Node, NodeIndex, NodeProperties};
use crate::snapshot::Snapshot;
use crate::styles::{TransitionMuteStore, mute_element_transition};
use crate::value::StyleValue;

/// Everything a walk needs besides the snapshot being filled.
pub struct RecordContext<'a, H: LayoutHost> {
    pub host: &'a mut H,
    pub root: H::Element,
    pub children: &'a Targets<H::Element>,
    pub tracked: &'a [String],
    pub mute_store: &'a mut TransitionMuteStore<H::Element>,
    pub registry: &'a IdRegistry,
}

/// The two elements competing for one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityConflict {
    /// The element the node is currently bound to lies inside the root.
    pub old_inside_root: bool,
    /// The element just encountered lies inside the root.
    pub new_inside_root: bool,
    /// The node was visible when last measured.
    pub was_visible: bool,
    /// The element just encountered is visible.
    pub is_visible: bool,
}

/// Outcome of an identity conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebind {
    /// Bind the node to the new element and measure it normally.
    Rebind,
    /// Keep the node bound to its element but measure through the new one.
    BorrowMeasurement,
    /// Leave the node alone and keep walking the new element's children.
    KeepWalking,
}

pub fn rebind_decision(conflict: IdentityConflict) -> Rebind {
    let IdentityConflict {
        old_inside_root,
        new_inside_root,
        was_visible,
        is_visible,
    } = conflict;
    if !old_inside_root && (new_inside_root || (!was_visible && is_visible)) {
        Rebind::Rebind
    } else if old_inside_root && !was_visible && is_visible {
        Rebind::BorrowMeasurement
    } else {
        Rebind::KeepWalking
    }
}

/// Computed style used for elements under a hidden ancestor. Nothing is
/// queried for them.
fn hidden_style(property: &str) -> Option<&'static str> {
    match property {
        "display" => Some("none"),
        "visibility" => Some("hidden"),
        "opacity" => Some("0"),
        "transform" => Some("none"),
        "position" => Some("static"),
        _ => None,
    }
}

fn probe<H: LayoutHost>(
    host: &H,
    element: H::Element,
    skip: bool,
    property: &str,
) -> Option<String> {
    if skip {
        hidden_style(property).map(str::to_string)
    } else {
        host.computed_style(element, property)
    }
}

impl<E: ElementRef> Snapshot<E> {
    /// Walk `element` and its descendants, attaching the first node under
    /// `parent`. Returns the node of `element` itself.
    pub(crate) fn register_element<H: LayoutHost<Element = E>>(
        &mut self,
        ctx: &mut RecordContext<'_, H>,
        element: E,
        parent: Option<NodeIndex>,
    ) -> Option<NodeIndex> {
        if !ctx.host.is_layout_element(element) {
            return None;
        }
        ctx.mute_store.mute(&mut *ctx.host, element);

        let root = ctx.root;
        let mut stack = vec![(element, parent)];
        let mut first = None;

        while let Some((current, parent)) = stack.pop() {
            if !ctx.host.is_layout_element(current) {
                continue;
            }
            let skip = parent.is_some_and(|p| self.nodes[p].state.measured.is_removed);
            let display = probe(&*ctx.host, current, skip, "display").unwrap_or_default();
            let visibility = probe(&*ctx.host, current, skip, "visibility").unwrap_or_default();
            let has_display_none = skip || display == "none";
            let has_visibility_hidden = skip || visibility == "hidden";
            let is_visible = !has_display_none && !has_visibility_hidden;
            let is_inside_root = ctx.host.contains(root, current);

            let existing = ctx
                .host
                .attribute(current, LAYOUT_ID_ATTRIBUTE)
                .and_then(|id| self.lookup.get(id.as_str()).copied());

            let index = match existing {
                Some(index) if self.nodes[index].element != current => {
                    let conflict = IdentityConflict {
                        old_inside_root: ctx.host.contains(root, self.nodes[index].element),
                        new_inside_root: is_inside_root,
                        was_visible: self.nodes[index].state.measured.is_visible,
                        is_visible,
                    };
                    let decision = rebind_decision(conflict);
                    trace!(id = %self.nodes[index].id, ?current, ?decision, "layout id conflict");
                    match decision {
                        Rebind::Rebind => {
                            self.detach(index);
                            self.reset_node(ctx, index, current);
                            index
                        }
                        Rebind::BorrowMeasurement => {
                            self.record_node_state(ctx, index, current, skip);
                            push_children(&*ctx.host, current, Some(index), &mut stack);
                            first.get_or_insert(index);
                            continue;
                        }
                        Rebind::KeepWalking => {
                            push_children(&*ctx.host, current, parent, &mut stack);
                            first.get_or_insert(index);
                            continue;
                        }
                    }
                }
                Some(index) => {
                    self.detach(index);
                    self.reset_node(ctx, index, current);
                    index
                }
                None => {
                    let id = stamp_id(ctx, current);
                    let properties =
                        NodeProperties::with_tracked(ctx.tracked.iter().map(String::as_str));
                    let index = self.nodes.len();
                    self.nodes.push(Node::new(id.clone(), current, None, properties));
                    self.lookup.insert(id, index);
                    index
                }
            };

            {
                let node = &mut self.nodes[index];
                node.state.is_target = false;
                node.state.has_visibility_hidden = has_visibility_hidden;
                node.state.has_display_none = has_display_none;
                node.has_visibility_swap = has_visibility_hidden || has_display_none;
            }
            self.attach(index, parent);
            self.record_node_state(ctx, index, current, skip);
            push_children(&*ctx.host, current, Some(index), &mut stack);
            first.get_or_insert(index);
        }

        first
    }

    /// Reinitialise the node at `index` for `element`, keeping its id.
    fn reset_node<H: LayoutHost<Element = E>>(
        &mut self,
        ctx: &mut RecordContext<'_, H>,
        index: NodeIndex,
        element: E,
    ) {
        let id = self.nodes[index].id.clone();
        ctx.host.set_attribute(element, LAYOUT_ID_ATTRIBUTE, id.as_str());
        let properties = NodeProperties::with_tracked(ctx.tracked.iter().map(String::as_str));
        self.nodes[index] = Node::new(id, element, None, properties);
    }

    /// Attach an out-of-root candidate under its nearest candidate ancestor,
    /// or as an extra root-level node.
    pub(crate) fn ensure_detached_node<H: LayoutHost<Element = E>>(
        &mut self,
        ctx: &mut RecordContext<'_, H>,
        element: E,
        candidates: &HashSet<E>,
    ) -> Option<NodeIndex> {
        if element == ctx.root {
            return None;
        }
        if let Some(index) = ctx
            .host
            .attribute(element, LAYOUT_ID_ATTRIBUTE)
            .and_then(|id| self.lookup.get(id.as_str()).copied())
        {
            if self.nodes[index].element == element {
                return Some(index);
            }
        }

        let mut parent = None;
        let mut ancestor = ctx.host.parent_element(element);
        while let Some(current) = ancestor {
            if current == ctx.root {
                break;
            }
            if candidates.contains(&current) {
                parent = self.ensure_detached_node(ctx, current, candidates);
                break;
            }
            ancestor = ctx.host.parent_element(current);
        }
        self.register_element(ctx, element, parent)
    }

    /// Measure `measure` into the node at `index`.
    fn record_node_state<H: LayoutHost<Element = E>>(
        &mut self,
        ctx: &mut RecordContext<'_, H>,
        index: NodeIndex,
        measure: E,
        skip: bool,
    ) {
        let root = ctx.root;
        let element = self.nodes[index].element;
        let is_root = element == root;
        let parent = self.nodes[index].parent;
        let parent_not_rendered = parent.is_some_and(|p| self.nodes[p].state.measured.is_removed);

        let host = &mut *ctx.host;
        let computed_transform = probe(&*host, measure, skip, "transform");
        let position = probe(&*host, measure, skip, "position").unwrap_or_default();
        let display = probe(&*host, measure, skip, "display").unwrap_or_default();
        let visibility = probe(&*host, measure, skip, "visibility").unwrap_or_default();
        if is_root {
            self.absolute_coords = position == "fixed" || position == "absolute";
        }

        let has_display_none = display == "none";
        let has_visibility_hidden = visibility == "hidden";
        let is_inlined = display.contains("inline")
            && (host.has_text_sibling(element, SiblingDirection::Previous)
                || host.has_text_sibling(element, SiblingDirection::Next));
        let inline_transform = host.inline_style(element, "transform");
        let has_transform = computed_transform.as_deref().is_some_and(|t| t != "none");

        let node = &mut self.nodes[index];
        node.measure = measure;
        node.state.inline_transform = inline_transform;
        node.state.has_transform = has_transform;
        node.measured_inline_transform = None;
        node.state.is_inlined = is_inlined;
        node.state.measured = MeasuredState {
            is_inside_root: host.contains(root, measure),
            has_display_none,
            has_visibility_hidden,
            is_visible: !(has_display_none || has_visibility_hidden),
            is_removed: has_display_none || has_visibility_hidden || parent_not_rendered,
            display,
            visibility,
            position,
        };

        // Transforms would be counted twice in local x/y.
        if has_transform && !skip {
            if !ctx.mute_store.contains(element) {
                node.inline_transition = Some(mute_element_transition(host, element));
            }
            if measure != element {
                if !ctx.mute_store.contains(measure) {
                    node.measured_inline_transition = Some(mute_element_transition(host, measure));
                }
                node.measured_inline_transform = host.inline_style(measure, "transform");
            }
            host.set_inline_style(measure, "transform", "none");
        }

        let (rect, (border_left, border_top)) = if skip {
            (Default::default(), (0.0, 0.0))
        } else {
            (host.bounding_rect(measure), host.border_insets(measure))
        };

        let tracked: Vec<(String, Option<String>)> = ctx
            .tracked
            .iter()
            .map(|name| (name.clone(), probe(&*host, measure, skip, name)))
            .collect();
        let properties = &mut node.state.properties;
        for (name, value) in tracked {
            if let Some(value) = value {
                properties.set(&name, StyleValue::parse(&value));
            }
        }
        properties.transform = computed_transform.unwrap_or_else(|| "none".to_string());
        properties.left = rect.left;
        properties.top = rect.top;
        properties.border_left = border_left;
        properties.border_top = border_top;
        properties.width = rect.width;
        properties.height = rect.height;

        // Local coordinates relative to the parent, or to the root frame when
        // the parent is not tracked.
        let (x, y) = if is_root {
            if self.absolute_coords {
                (rect.left, rect.top)
            } else {
                (0.0, 0.0)
            }
        } else {
            match parent.or(self.root) {
                Some(frame) if frame != index => {
                    let p = &self.nodes[frame].state.properties;
                    (
                        rect.left - p.left - p.border_left,
                        rect.top - p.top - p.border_top,
                    )
                }
                _ => (rect.left, rect.top),
            }
        };
        let properties = &mut self.nodes[index].state.properties;
        properties.x = x;
        properties.y = y;
    }
}

fn push_children<H: LayoutHost>(
    host: &H,
    element: H::Element,
    parent: Option<NodeIndex>,
    stack: &mut Vec<(H::Element, Option<NodeIndex>)>,
) {
    for child in host.child_elements(element).into_iter().rev() {
        stack.push((child, parent));
    }
}

fn stamp_id<H: LayoutHost>(ctx: &mut RecordContext<'_, H>, element: H::Element) -> LayoutId {
    match ctx.host.attribute(element, LAYOUT_ID_ATTRIBUTE) {
        Some(existing) if !existing.is_empty() => LayoutId::new(existing),
        _ => {
            let id = ctx.registry.next_layout_id();
            ctx.host.set_attribute(element, LAYOUT_ID_ATTRIBUTE, id.as_str());
            id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(old_inside: bool, new_inside: bool, was: bool, is: bool) -> IdentityConflict {
        IdentityConflict {
            old_inside_root: old_inside,
            new_inside_root: new_inside,
            was_visible: was,
            is_visible: is,
        }
    }

    #[test]
    fn test_rebind_when_element_moves_into_root() {
        assert_eq!(rebind_decision(conflict(false, true, true, true)), Rebind::Rebind);
        assert_eq!(rebind_decision(conflict(false, true, false, false)), Rebind::Rebind);
    }

    #[test]
    fn test_rebind_when_outside_twin_becomes_visible() {
        assert_eq!(rebind_decision(conflict(false, false, false, true)), Rebind::Rebind);
        assert_eq!(rebind_decision(conflict(false, false, true, true)), Rebind::KeepWalking);
    }

    #[test]
    fn test_borrow_measurement_for_hidden_inside_node() {
        assert_eq!(
            rebind_decision(conflict(true, true, false, true)),
            Rebind::BorrowMeasurement
        );
        assert_eq!(
            rebind_decision(conflict(true, false, false, true)),
            Rebind::BorrowMeasurement
        );
    }

    #[test]
    fn test_keep_walking_otherwise() {
        assert_eq!(rebind_decision(conflict(true, true, true, true)), Rebind::KeepWalking);
        assert_eq!(rebind_decision(conflict(true, true, false, false)), Rebind::KeepWalking);
        assert_eq!(rebind_decision(conflict(false, false, true, false)), Rebind::KeepWalking);
    }

    #[test]
    fn test_hidden_style_defaults() {
        assert_eq!(hidden_style("display"), Some("none"));
        assert_eq!(hidden_style("opacity"), Some("0"));
        assert_eq!(hidden_style("border-radius"), None);
    }
}
