//! Stable identifiers for tracked elements and transition instances.
//!
//! Every element the tree builder encounters gets a `LayoutId` stamped onto it
//! as the `data-layout-id` attribute. The id survives any number of recordings
//! as long as the element stays in the document, which is what lets two
//! snapshots taken at different times be matched node by node.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Attribute used to persist a `LayoutId` on a live element.
pub const LAYOUT_ID_ATTRIBUTE: &str = "data-layout-id";

/// Stable identifier of a tracked element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutId(String);

impl LayoutId {
    /// Wrap an existing attribute value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for LayoutId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayoutId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LayoutId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Process-wide id counters.
///
/// Node ids and transition instance ids come from here instead of ambient
/// statics so tests can build an isolated registry and reset it.
#[derive(Debug, Default)]
pub struct IdRegistry {
    next_node: AtomicU64,
    next_transition: AtomicU64,
}

static GLOBAL_REGISTRY: IdRegistry = IdRegistry::new();

impl IdRegistry {
    /// Create an empty registry with both counters at zero.
    pub const fn new() -> Self {
        Self {
            next_node: AtomicU64::new(0),
            next_transition: AtomicU64::new(0),
        }
    }

    /// The registry shared by every transition in the process.
    pub fn global() -> &'static IdRegistry {
        &GLOBAL_REGISTRY
    }

    /// Allocate the next `node-<n>` id.
    pub fn next_layout_id(&self) -> LayoutId {
        let n = self.next_node.fetch_add(1, Ordering::Relaxed);
        LayoutId(format!("node-{n}"))
    }

    /// Allocate the next transition instance id.
    pub fn next_transition_id(&self) -> u64 {
        self.next_transition.fetch_add(1, Ordering::Relaxed)
    }

    /// Reset both counters.
    ///
    /// Only safe when no live element still carries an id from this registry,
    /// otherwise freshly allocated ids collide with stamped ones.
    pub fn reset(&self) {
        self.next_node.store(0, Ordering::Relaxed);
        self.next_transition.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_ids_are_sequential() {
        let registry = IdRegistry::new();
        assert_eq!(registry.next_layout_id().as_str(), "node-0");
        assert_eq!(registry.next_layout_id().as_str(), "node-1");
        assert_eq!(registry.next_transition_id(), 0);
    }

    #[test]
    fn test_reset_restarts_counters() {
        let registry = IdRegistry::new();
        registry.next_layout_id();
        registry.next_transition_id();
        registry.reset();
        assert_eq!(registry.next_layout_id().as_str(), "node-0");
        assert_eq!(registry.next_transition_id(), 0);
    }

    #[test]
    fn test_layout_id_serializes_as_plain_string() {
        let id = LayoutId::new("node-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"node-7\"");
    }
}
