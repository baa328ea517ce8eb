//! rune-autolayout: automatic layout transitions.
//!
//! Re-exports the engine ([`layout`]), the headless element tree ([`dom`]) and
//! configuration loading ([`config`]).

pub use rune_config as config;
pub use rune_dom as dom;
pub use rune_layout as layout;

pub use rune_config::{LayoutConfig, RuneConfig};
pub use rune_dom::{ElementId, MemoryDocument, ReflowMode};
pub use rune_layout::{
    AnimationParams, ChangeKind, FinishReason, LayoutHost, PlanRecorder, Reconciliation,
    Transition, TransitionConfig,
};
