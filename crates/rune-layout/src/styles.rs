//! Inline style bookkeeping around measurement and animation.
//!
//! Measuring an element mid-transition would read an interpolated value, so
//! every element's CSS `transition` is muted before it is probed and restored
//! once the engine is done with it. The other helpers save and restore the
//! inline declarations that the transition overrides.

use std::collections::HashMap;

use crate::host::{ElementRef, LayoutHost};
use crate::node::Node;

/// Mute `element`'s inline transition, returning the original value
/// (empty when none was set).
pub fn mute_element_transition<H: LayoutHost>(host: &mut H, element: H::Element) -> String {
    let original = host.inline_style(element, "transition").unwrap_or_default();
    host.set_inline_style(element, "transition", "none");
    original
}

/// Put back a value returned by [`mute_element_transition`].
pub fn restore_element_transition<H: LayoutHost>(
    host: &mut H,
    element: H::Element,
    original: &str,
) {
    if original.is_empty() {
        host.remove_inline_style(element, "transition");
    } else {
        host.set_inline_style(element, "transition", original);
    }
}

/// Original transitions of every element muted by one transition.
///
/// Muting is idempotent: an element already in the store keeps its first
/// recorded original.
#[derive(Debug)]
pub struct TransitionMuteStore<E> {
    originals: HashMap<E, String>,
}

impl<E: ElementRef> Default for TransitionMuteStore<E> {
    fn default() -> Self {
        Self {
            originals: HashMap::new(),
        }
    }
}

impl<E: ElementRef> TransitionMuteStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, element: E) -> bool {
        self.originals.contains_key(&element)
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    pub fn mute<H: LayoutHost<Element = E>>(&mut self, host: &mut H, element: E) {
        if !self.originals.contains_key(&element) {
            let original = mute_element_transition(host, element);
            self.originals.insert(element, original);
        }
    }

    /// Mute both the element and the measurement element of `node`.
    pub fn mute_node<H: LayoutHost<Element = E>>(&mut self, host: &mut H, node: &Node<E>) {
        self.mute(host, node.element);
        self.mute(host, node.measure);
    }

    /// Restore and forget every entry.
    pub fn restore_all<H: LayoutHost<Element = E>>(&mut self, host: &mut H) {
        for (element, original) in self.originals.drain() {
            restore_element_transition(host, element, &original);
        }
    }
}

/// Save the current inline value of each recorded property on `node`.
pub fn record_inline_styles<H: LayoutHost>(
    host: &H,
    node: &mut Node<H::Element>,
    recorded_properties: &[String],
) {
    node.inline_styles = recorded_properties
        .iter()
        .map(|property| (property.clone(), host.inline_style(node.element, property)))
        .collect();
}

/// Write back the values saved by [`record_inline_styles`].
pub fn restore_inline_styles<H: LayoutHost>(host: &mut H, node: &Node<H::Element>) {
    for (property, value) in &node.inline_styles {
        match value.as_deref() {
            Some(value) if !value.is_empty() => {
                host.set_inline_style(node.element, property, value)
            }
            _ => host.remove_inline_style(node.element, property),
        }
    }
}

/// Undo the transform zeroing and transition muting done while measuring
/// `node`.
pub fn restore_node_transform<H: LayoutHost>(host: &mut H, node: &mut Node<H::Element>) {
    let element = node.element;
    let has_transform = node.state.has_transform;

    match node.state.inline_transform.as_deref() {
        Some(value) if has_transform && !value.is_empty() && value != "none" => {
            host.set_inline_style(element, "transform", value);
        }
        _ => host.remove_inline_style(element, "transform"),
    }

    let measure = node.measure;
    if has_transform && measure != element {
        match node.measured_inline_transform.take() {
            Some(value) if !value.is_empty() => host.set_inline_style(measure, "transform", &value),
            _ => host.remove_inline_style(measure, "transform"),
        }
    }
    node.measured_inline_transform = None;

    if let Some(original) = node.inline_transition.take() {
        restore_element_transition(host, element, &original);
    }
    if measure != element {
        if let Some(original) = node.measured_inline_transition.take() {
            restore_element_transition(host, measure, &original);
        }
    }
}
