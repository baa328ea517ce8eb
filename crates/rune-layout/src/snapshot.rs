//! A full recording of the tracked tree at one instant.

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::builder::RecordContext;
use crate::host::{ElementRef, LayoutHost, ScrollOffset, resolve_targets};
use crate::ids::{LAYOUT_ID_ATTRIBUTE, LayoutId};
use crate::node::{Node, NodeIndex, NodeProperties};
use crate::styles::restore_node_transform;
use crate::value::{StyleValue, ValueContext};

/// Node arena plus the id lookup for one recording.
#[derive(Debug, Clone)]
pub struct Snapshot<E> {
    pub(crate) nodes: Vec<Node<E>>,
    pub(crate) lookup: HashMap<LayoutId, NodeIndex>,
    pub(crate) root: Option<NodeIndex>,
    pub(crate) root_nodes: Vec<NodeIndex>,
    pub(crate) scroll: ScrollOffset,
    pub(crate) absolute_coords: bool,
}

impl<E> Default for Snapshot<E> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            lookup: HashMap::new(),
            root: None,
            root_nodes: Vec::new(),
            scroll: ScrollOffset::default(),
            absolute_coords: false,
        }
    }
}

impl<E: ElementRef> Snapshot<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.lookup.clear();
        self.root = None;
        self.root_nodes.clear();
    }

    /// Re-walk the live tree, replacing everything recorded before.
    pub fn record<H: LayoutHost<Element = E>>(
        &mut self,
        ctx: &mut RecordContext<'_, H>,
    ) -> &mut Self {
        let root = ctx.root;
        let candidates = resolve_targets(&*ctx.host, root, ctx.children);

        self.clear();

        let Some(root_index) = self.register_element(ctx, root, None) else {
            warn!(?root, "layout root is not a layout element, nothing recorded");
            return self;
        };
        self.nodes[root_index].state.is_target = true;
        self.root = Some(root_index);

        let in_root_ids: HashSet<LayoutId> = self
            .lookup
            .iter()
            .filter(|(_, index)| self.nodes[**index].state.measured.is_inside_root)
            .map(|(id, _)| id.clone())
            .collect();

        // Outside candidates only rejoin through an id tracked inside the root.
        let mut detached_lookup = HashSet::new();
        let mut detached = Vec::new();
        for &element in &candidates {
            if element == root || !ctx.host.is_layout_element(element) {
                continue;
            }
            if !ctx.host.contains(root, element) {
                let tracked = ctx
                    .host
                    .attribute(element, LAYOUT_ID_ATTRIBUTE)
                    .is_some_and(|id| in_root_ids.contains(id.as_str()));
                if !tracked {
                    continue;
                }
            }
            if detached_lookup.insert(element) {
                detached.push(element);
            }
        }
        for &element in &detached {
            self.ensure_detached_node(ctx, element, &detached_lookup);
        }

        for &element in &candidates {
            let Some(mut current) = self.index_of(&*ctx.host, element) else {
                continue;
            };
            loop {
                let node = &mut self.nodes[current];
                if node.state.is_target {
                    break;
                }
                node.state.is_target = true;
                match node.parent {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }

        self.scroll = ctx.host.scroll_offset();

        let total = self.lookup.len();
        for (position, index) in self.node_order().into_iter().enumerate() {
            let node = &mut self.nodes[index];
            restore_node_transform(&mut *ctx.host, node);
            node.index = position;
            node.total = total;
        }

        debug!(
            nodes = total,
            candidates = candidates.len(),
            detached = detached.len(),
            "recorded layout snapshot"
        );
        self
    }

    /// Remove the id attributes this snapshot stamped and forget every node.
    pub fn revert<H: LayoutHost<Element = E>>(&mut self, host: &mut H) -> &mut Self {
        for index in self.node_order() {
            let node = &self.nodes[index];
            host.remove_attribute(node.element, LAYOUT_ID_ATTRIBUTE);
            host.remove_attribute(node.measure, LAYOUT_ID_ATTRIBUTE);
        }
        self.clear();
        self
    }

    fn index_of<H: LayoutHost<Element = E>>(&self, host: &H, element: E) -> Option<NodeIndex> {
        let id = host.attribute(element, LAYOUT_ID_ATTRIBUTE)?;
        self.lookup.get(id.as_str()).copied()
    }

    /// Recorded properties of `element`, with a warning when it is untracked.
    pub fn get<H: LayoutHost<Element = E>>(&self, host: &H, element: E) -> Option<&NodeProperties> {
        match self.index_of(host, element) {
            Some(index) => Some(&self.nodes[index].state.properties),
            None => {
                warn!(?element, "no layout node recorded for element");
                None
            }
        }
    }

    /// One recorded property of `element`.
    pub fn get_value<H: LayoutHost<Element = E>>(
        &self,
        host: &H,
        element: E,
        property: &str,
    ) -> Option<StyleValue> {
        self.get(host, element)?.get(property)
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node<E>> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node<E>> {
        self.nodes.get_mut(index)
    }

    pub fn node_by_id(&self, id: &LayoutId) -> Option<&Node<E>> {
        self.lookup.get(id).map(|index| &self.nodes[*index])
    }

    pub fn index_by_id(&self, id: &LayoutId) -> Option<NodeIndex> {
        self.lookup.get(id).copied()
    }

    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn root_node(&self) -> Option<&Node<E>> {
        self.root.map(|index| &self.nodes[index])
    }

    pub fn root_nodes(&self) -> &[NodeIndex] {
        &self.root_nodes
    }

    pub fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    pub fn absolute_coords(&self) -> bool {
        self.absolute_coords
    }

    /// Number of distinct ids recorded.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Value context of a node, for per-node resolvers.
    pub fn value_context(&self, index: NodeIndex) -> ValueContext<'_> {
        let node = &self.nodes[index];
        ValueContext {
            id: &node.id,
            index: node.index,
            total: node.total,
        }
    }

    /// Depth-first iterator over the subtree starting at `start`.
    pub fn traverse(&self, start: Option<NodeIndex>) -> Traverse<'_, E> {
        Traverse {
            snapshot: self,
            next: start,
        }
    }

    /// Depth-first order over every root-level tree.
    pub fn node_order(&self) -> Vec<NodeIndex> {
        self.root_nodes
            .iter()
            .flat_map(|root| self.traverse(Some(*root)))
            .collect()
    }

    /// Depth-first order over the main tree only.
    pub fn root_order(&self) -> Vec<NodeIndex> {
        self.traverse(self.root).collect()
    }

    pub fn for_each_node(&self, mut f: impl FnMut(&Node<E>, usize)) {
        for (position, index) in self.node_order().into_iter().enumerate() {
            f(&self.nodes[index], position);
        }
    }

    pub fn for_each_root_node(&self, mut f: impl FnMut(&Node<E>, usize)) {
        for (position, index) in self.traverse(self.root).enumerate() {
            f(&self.nodes[index], position);
        }
    }

    /// Append a node to the arena under `parent`, or as a root-level node.
    ///
    /// Used by the tree builder and to assemble snapshots without a live tree.
    pub fn push_node(&mut self, mut node: Node<E>, parent: Option<NodeIndex>) -> NodeIndex {
        let index = self.nodes.len();
        node.parent = None;
        node.head = None;
        node.tail = None;
        node.prev = None;
        node.next = None;
        self.lookup.insert(node.id.clone(), index);
        self.nodes.push(node);
        self.attach(index, parent);
        index
    }

    /// Designate the main tree root.
    pub fn set_root(&mut self, index: NodeIndex) {
        self.root = Some(index);
        if !self.root_nodes.contains(&index) {
            self.root_nodes.push(index);
        }
    }

    pub fn set_scroll(&mut self, scroll: ScrollOffset) {
        self.scroll = scroll;
    }

    /// Link `index` as the last child of `parent` (or as a root-level node).
    pub(crate) fn attach(&mut self, index: NodeIndex, parent: Option<NodeIndex>) {
        self.nodes[index].parent = parent;
        self.nodes[index].prev = None;
        self.nodes[index].next = None;
        match parent {
            Some(parent) => {
                self.root_nodes.retain(|root| *root != index);
                match self.nodes[parent].tail {
                    None => {
                        self.nodes[parent].head = Some(index);
                        self.nodes[parent].tail = Some(index);
                    }
                    Some(tail) => {
                        self.nodes[tail].next = Some(index);
                        self.nodes[index].prev = Some(tail);
                        self.nodes[parent].tail = Some(index);
                    }
                }
            }
            None => {
                if !self.root_nodes.contains(&index) {
                    self.root_nodes.push(index);
                }
            }
        }
    }

    /// Unlink `index` from its parent's child list.
    pub(crate) fn detach(&mut self, index: NodeIndex) {
        let Some(parent) = self.nodes[index].parent else {
            return;
        };
        let (prev, next) = (self.nodes[index].prev, self.nodes[index].next);
        if self.nodes[parent].head == Some(index) {
            self.nodes[parent].head = next;
        }
        if self.nodes[parent].tail == Some(index) {
            self.nodes[parent].tail = prev;
        }
        if let Some(prev) = prev {
            self.nodes[prev].next = next;
        }
        if let Some(next) = next {
            self.nodes[next].prev = prev;
        }
        let node = &mut self.nodes[index];
        node.prev = None;
        node.next = None;
        node.parent = None;
    }
}

/// Depth-first traversal: head, else next, else ascend to the nearest
/// ancestor with a next sibling.
pub struct Traverse<'a, E> {
    snapshot: &'a Snapshot<E>,
    next: Option<NodeIndex>,
}

impl<E> Iterator for Traverse<'_, E> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let current = self.next?;
        let nodes = &self.snapshot.nodes;
        let node = &nodes[current];
        self.next = if node.head.is_some() {
            node.head
        } else if node.next.is_some() {
            node.next
        } else {
            let mut ancestor = node.parent;
            loop {
                match ancestor {
                    Some(index) if nodes[index].next.is_some() => break nodes[index].next,
                    Some(index) => ancestor = nodes[index].parent,
                    None => break None,
                }
            }
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, element: u32) -> Node<u32> {
        Node::new(LayoutId::new(id), element, None, NodeProperties::default())
    }

    fn sample() -> (Snapshot<u32>, [NodeIndex; 5]) {
        let mut snapshot = Snapshot::new();
        let root = snapshot.push_node(node("root", 0), None);
        snapshot.set_root(root);
        let a = snapshot.push_node(node("a", 1), Some(root));
        let a1 = snapshot.push_node(node("a1", 2), Some(a));
        let b = snapshot.push_node(node("b", 3), Some(root));
        let detached = snapshot.push_node(node("d", 4), None);
        (snapshot, [root, a, a1, b, detached])
    }

    #[test]
    fn test_traversal_is_depth_first_in_child_order() {
        let (snapshot, [root, a, a1, b, detached]) = sample();
        assert_eq!(snapshot.root_order(), vec![root, a, a1, b]);
        assert_eq!(snapshot.node_order(), vec![root, a, a1, b, detached]);
        assert_eq!(snapshot.traverse(Some(a)).collect::<Vec<_>>(), vec![a, a1, b]);
    }

    #[test]
    fn test_detach_keeps_links_consistent() {
        let (mut snapshot, [root, a, _, b, _]) = sample();
        snapshot.detach(a);

        let root_node = snapshot.node(root).unwrap();
        assert_eq!(root_node.first_child(), Some(b));
        assert_eq!(root_node.last_child(), Some(b));
        assert_eq!(snapshot.node(b).unwrap().previous_sibling(), None);
        assert_eq!(snapshot.node(a).unwrap().parent(), None);
    }

    #[test]
    fn test_attach_moves_node_out_of_root_level() {
        let (mut snapshot, [root, _, _, b, detached]) = sample();
        snapshot.attach(detached, Some(b));
        assert_eq!(snapshot.root_nodes(), &[root]);
        assert_eq!(snapshot.node(b).unwrap().first_child(), Some(detached));
        assert_eq!(snapshot.node(detached).unwrap().parent(), Some(b));
    }

    #[test]
    fn test_lookup_by_id() {
        let (snapshot, [_, a, ..]) = sample();
        assert_eq!(snapshot.index_by_id(&LayoutId::new("a")), Some(a));
        assert_eq!(snapshot.node_by_id(&LayoutId::new("a")).unwrap().element, 1);
        assert!(snapshot.node_by_id(&LayoutId::new("zzz")).is_none());
        assert_eq!(snapshot.len(), 5);
    }
}
