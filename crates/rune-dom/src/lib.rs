//! Headless element tree for driving layout transitions without a browser.
//!
//! [`MemoryDocument`] keeps elements, classes, attributes and a small style
//! cascade, and implements [`rune_layout::LayoutHost`]. Geometry comes either
//! from explicit frames or from taffy flow layout, see [`ReflowMode`].

pub mod document;
pub mod error;
mod flow;
mod host;
pub mod selector;

pub use document::{DEFAULT_VIEWPORT, ElementId, MemoryDocument, ReflowMode};
pub use error::{DomError, Result};
pub use selector::SelectorList;
