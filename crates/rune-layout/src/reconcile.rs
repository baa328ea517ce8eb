//! Diffing two snapshots.
//!
//! [`Reconciler::reconcile`] walks the new snapshot's main tree in depth-first
//! order and pairs every node with its old-state record by id. It never
//! mutates either snapshot. Everything the orchestrator has to do to the live
//! tree comes back as data in a [`Reconciliation`].

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::host::ElementRef;
use crate::ids::LayoutId;
use crate::node::{Node, NodeIndex, NodeState};
use crate::snapshot::Snapshot;
use crate::value::{StateParams, Timing, ValueContext};

/// Default width/height change, in pixels, below which a node is not
/// considered resized.
pub const DEFAULT_SIZE_TOLERANCE: f64 = 1.0;

/// How a node changed between the two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    VisibilitySwapped,
    Resized,
    Moved,
    Unchanged,
}

/// Per-node facts computed during reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffFlags {
    pub had_old_state: bool,
    pub parent_changed: bool,
    pub element_changed: bool,
    pub top_level_added: bool,
    pub top_level_removed: bool,
    pub newly_removed: bool,
    pub became_visible: bool,
    pub size_changed: bool,
    pub property_changed: bool,
    pub is_animated: bool,
    pub branch_added: bool,
    pub branch_removed: bool,
    pub branch_not_rendered: bool,
}

/// One node's diff. `from` and `to` are the animation end points.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDiff<E> {
    pub id: LayoutId,
    pub element: E,
    pub measure: E,
    /// Index of the node in the new snapshot.
    pub node: NodeIndex,
    pub delay: f32,
    pub duration: f32,
    pub from: NodeState,
    pub to: NodeState,
    pub kind: ChangeKind,
    pub flags: DiffFlags,
    pub has_visibility_swap: bool,
}

/// Element groups handed to the scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct Groups<E> {
    pub targets: Vec<E>,
    pub animated: Vec<E>,
    pub transformed: Vec<E>,
    pub frozen: Vec<E>,
    pub animated_frozen: Vec<E>,
    pub added: Vec<E>,
    pub removed: Vec<E>,
}

impl<E> Default for Groups<E> {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            animated: Vec::new(),
            transformed: Vec::new(),
            frozen: Vec::new(),
            animated_frozen: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// An inline style write. `None` removes the declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleWrite<E> {
    pub element: E,
    pub property: String,
    pub value: Option<String>,
}

impl<E> StyleWrite<E> {
    fn set(element: E, property: &str, value: &str) -> Self {
        Self {
            element,
            property: property.to_string(),
            value: (!value.is_empty()).then(|| value.to_string()),
        }
    }
}

/// Result of diffing two snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation<E> {
    pub entries: Vec<NodeDiff<E>>,
    pub groups: Groups<E>,
    /// Visibility swap writes, in application order.
    pub style_writes: Vec<StyleWrite<E>>,
    /// Elements that became pending removal.
    pub pending_inserts: Vec<E>,
    /// Elements no longer pending removal.
    pub pending_clears: Vec<E>,
    #[serde(skip)]
    by_id: HashMap<LayoutId, usize>,
}

impl<E> Default for Reconciliation<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            groups: Groups::default(),
            style_writes: Vec::new(),
            pending_inserts: Vec::new(),
            pending_clears: Vec::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<E: ElementRef> Reconciliation<E> {
    pub fn entry(&self, id: &LayoutId) -> Option<&NodeDiff<E>> {
        self.by_id.get(id).map(|index| &self.entries[*index])
    }

    pub fn entry_for(&self, element: E) -> Option<&NodeDiff<E>> {
        self.entries.iter().find(|entry| entry.element == element)
    }

    pub fn kind_of(&self, element: E) -> Option<ChangeKind> {
        self.entry_for(element).map(|entry| entry.kind)
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Inputs of a reconciliation besides the two snapshots.
#[derive(Debug, Clone)]
pub struct Reconciler<'a> {
    pub delay: &'a Timing,
    pub duration: &'a Timing,
    pub added: &'a StateParams,
    pub removed: &'a StateParams,
    pub size_tolerance: f64,
}

/// What a child needs to know about its parent's diff.
#[derive(Debug, Clone, Copy)]
struct ParentFacts {
    branch_added: bool,
    branch_removed: bool,
    branch_not_rendered: bool,
    is_target: bool,
    is_animated: bool,
    size_changed: bool,
}

impl ParentFacts {
    fn of<E>(diff: &NodeDiff<E>) -> Self {
        Self {
            branch_added: diff.flags.branch_added,
            branch_removed: diff.flags.branch_removed,
            branch_not_rendered: diff.flags.branch_not_rendered,
            is_target: diff.to.is_target,
            is_animated: diff.flags.is_animated,
            size_changed: diff.flags.size_changed,
        }
    }
}

/// Sum of local offsets from `start` up to the first node whose parent is the
/// snapshot root.
fn ancestor_offset<E: ElementRef>(snapshot: &Snapshot<E>, start: Option<NodeIndex>) -> (f64, f64) {
    let (mut x, mut y) = (0.0, 0.0);
    let mut current = start;
    while let Some(index) = current {
        let node = &snapshot.nodes[index];
        x += node.state.properties.x;
        y += node.state.properties.y;
        if node.parent == snapshot.root {
            break;
        }
        current = node.parent;
    }
    (x, y)
}

fn apply_params(state: &mut NodeState, params: &StateParams, ctx: &ValueContext<'_>) {
    for (name, value) in params.iter() {
        state.properties.set(name, value.resolve(ctx));
    }
}

impl Reconciler<'_> {
    pub fn reconcile<E: ElementRef>(
        &self,
        old: &Snapshot<E>,
        new: &Snapshot<E>,
        pending_removed: &HashSet<E>,
    ) -> Reconciliation<E> {
        let mut result = Reconciliation::default();
        // New-snapshot index to entry index, filled in traversal order so a
        // parent is always resolved before its children.
        let mut entry_of: HashMap<NodeIndex, usize> = HashMap::new();

        for index in new.root_order() {
            let node = &new.nodes[index];
            let parent = node
                .parent
                .and_then(|parent| entry_of.get(&parent))
                .map(|entry| ParentFacts::of(&result.entries[*entry]));
            let diff = self.diff_node(old, new, node, index, parent, pending_removed, &mut result);
            let element = diff.element;
            let groups = &mut result.groups;

            groups.targets.push(element);
            if !diff.to.is_target {
                groups.frozen.push(element);
                let parent_resizing =
                    parent.is_some_and(|p| p.is_target && p.is_animated && p.size_changed);
                let changed = diff.flags.property_changed
                    || diff.flags.top_level_added
                    || diff.flags.top_level_removed
                    || diff.flags.became_visible;
                if (changed || diff.flags.size_changed) && parent_resizing {
                    groups.animated_frozen.push(element);
                }
            }

            entry_of.insert(index, result.entries.len());
            result.by_id.insert(diff.id.clone(), result.entries.len());
            result.entries.push(diff);
        }

        debug!(
            nodes = result.entries.len(),
            animated = result.groups.animated.len(),
            added = result.groups.added.len(),
            removed = result.groups.removed.len(),
            frozen = result.groups.frozen.len(),
            "reconciled layout snapshots"
        );
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn diff_node<E: ElementRef>(
        &self,
        old: &Snapshot<E>,
        new: &Snapshot<E>,
        node: &Node<E>,
        index: NodeIndex,
        parent: Option<ParentFacts>,
        pending_removed: &HashSet<E>,
        result: &mut Reconciliation<E>,
    ) -> NodeDiff<E> {
        let element = node.element;
        let ctx = new.value_context(index);
        let parent_added = parent.is_some_and(|p| p.branch_added);
        let parent_removed = parent.is_some_and(|p| p.branch_removed);
        let parent_not_rendered = parent.is_some_and(|p| p.branch_not_rendered);

        let old_node = old.node_by_id(&node.id);
        let had_old_state = old_node.is_some();

        // A node without usable prior geometry starts from its current state,
        // flagged as if it had been removed all along.
        let mut from = match old_node {
            Some(old_node)
                if !(old_node.state.measured.is_removed && !node.state.measured.is_removed) =>
            {
                old_node.state.clone()
            }
            _ => {
                let mut state = node.state.clone();
                state.measured.is_removed = true;
                state
            }
        };

        let old_parent_id = old_node
            .and_then(|o| o.parent)
            .map(|p| &old.nodes[p].id);
        let new_parent_id = node.parent.map(|p| &new.nodes[p].id);
        let parent_changed = old_parent_id != new_parent_id;
        let element_changed = old_node.is_none_or(|o| o.element != element);
        let was_removed_before = from.measured.is_removed;
        let is_removed_now = node.state.measured.is_removed;

        // Rebase through both ancestor chains so an ancestor's own move does
        // not show up as a jump of this node.
        if let Some(old_node) = old_node {
            if !was_removed_before && !is_removed_now && (parent_changed || element_changed) {
                let (new_x, new_y) = ancestor_offset(new, node.parent);
                let (old_x, old_y) = ancestor_offset(old, old_node.parent);
                from.properties.x += old_x - new_x;
                from.properties.y += old_y - new_y;
            }
        }

        if node.has_visibility_swap {
            if node.state.has_visibility_hidden {
                result.style_writes.push(StyleWrite::set(element, "visibility", "visible"));
                result.style_writes.push(StyleWrite::set(node.measure, "visibility", "hidden"));
            }
            if node.state.has_display_none {
                let display = if !from.measured.display.is_empty() {
                    from.measured.display.as_str()
                } else {
                    node.state.measured.display.as_str()
                };
                result.style_writes.push(StyleWrite::set(element, "display", display));
                // Hidden rather than display none keeps it measurable.
                result.style_writes.push(StyleWrite::set(node.measure, "visibility", "hidden"));
            }
        }

        let was_pending_removal = pending_removed.contains(&element);
        let was_visible_before = from.measured.is_visible;
        let is_visible_now = node.state.measured.is_visible;
        let became_visible = !was_visible_before && is_visible_now && !parent_not_rendered;
        let top_level_added =
            !is_removed_now && (was_removed_before || was_pending_removal) && !parent_added;
        let newly_removed = is_removed_now && !was_removed_before && !parent_removed;
        // A pending removal only counts again while it is still showing.
        let top_level_removed = newly_removed
            || (is_removed_now && was_pending_removal && was_visible_before && !parent_removed);

        let mut to = node.state.clone();
        if to.measured.is_removed && was_visible_before {
            // Keep showing the outgoing element at its old geometry.
            result.style_writes.push(StyleWrite::set(element, "display", &from.measured.display));
            result.style_writes.push(StyleWrite::set(element, "visibility", "visible"));
            to = from.clone();
        }

        if newly_removed {
            result.groups.removed.push(element);
            result.pending_inserts.push(element);
        } else if !is_removed_now && was_pending_removal {
            result.pending_clears.push(element);
        }

        let shows_added = (top_level_added && !parent_not_rendered) || became_visible;
        if shows_added {
            apply_params(&mut from, self.added, &ctx);
            result.groups.added.push(element);
        } else if top_level_removed && !parent_not_rendered {
            apply_params(&mut to, self.removed, &ctx);
        }

        let hidden_state_changed =
            (top_level_added || newly_removed) && was_removed_before != is_removed_now;
        let mut property_changed = false;
        let rendered_in_either = (!to.measured.is_removed && was_visible_before)
            || (to.measured.is_removed && is_visible_now);
        if to.is_target && rendered_in_either {
            let moved = to.properties.differs_from(&from.properties) || hidden_state_changed;
            let transformed = !to.is_inlined
                && (to.properties.has_transform() || from.properties.has_transform());
            let topology_changed = top_level_added || top_level_removed || became_visible;
            // A standing transform alone is not a change.
            let transform_changed = to.properties.transform != from.properties.transform;
            if transformed && (moved || topology_changed || transform_changed) {
                to.has_transform = true;
                property_changed = true;
                result.groups.transformed.push(element);
            }
            if moved {
                property_changed = true;
                result.groups.animated.push(element);
            }
        }

        let node_has_changed =
            property_changed || top_level_added || top_level_removed || became_visible;
        let is_animated =
            to.is_target && node_has_changed && (was_visible_before || is_visible_now);
        let size_changed = (to.properties.width - from.properties.width).abs()
            > self.size_tolerance
            || (to.properties.height - from.properties.height).abs() > self.size_tolerance;

        let flags = DiffFlags {
            had_old_state,
            parent_changed,
            element_changed,
            top_level_added,
            top_level_removed,
            newly_removed,
            became_visible,
            size_changed,
            property_changed,
            is_animated,
            branch_added: parent_added || top_level_added,
            branch_removed: parent_removed || top_level_removed,
            branch_not_rendered: parent_not_rendered || to.measured.is_removed,
        };

        let kind = if shows_added {
            ChangeKind::Added
        } else if top_level_removed {
            ChangeKind::Removed
        } else if was_visible_before != is_visible_now {
            ChangeKind::VisibilitySwapped
        } else if size_changed {
            ChangeKind::Resized
        } else if to.properties.x != from.properties.x || to.properties.y != from.properties.y {
            ChangeKind::Moved
        } else {
            ChangeKind::Unchanged
        };

        NodeDiff {
            id: node.id.clone(),
            element,
            measure: node.measure,
            node: index,
            delay: self.delay.resolve(&ctx),
            duration: self.duration.resolve(&ctx),
            from,
            to,
            kind,
            flags,
            has_visibility_swap: node.has_visibility_swap,
        }
    }
}
