//! rune-layout: automatic layout transitions.
//!
//! Record a subtree, mutate it, then animate every element from where it was
//! to where layout put it:
//! - snapshot: tree walk with stable ids, geometry and visibility per node
//! - reconcile: pure diff of two snapshots into per-node changes and groups
//! - transition: the record/animate/revert orchestration on top of a
//!   [`LayoutHost`] and an external [`Scheduler`]

pub mod builder;
pub mod easing;
pub mod error;
pub mod frame;
pub mod host;
pub mod ids;
pub mod node;
pub mod plan;
pub mod reconcile;
pub mod scheduler;
pub mod snapshot;
pub mod styles;
pub mod transition;
pub mod value;

pub use easing::{EaseDirection, Easing, StepPosition};
pub use error::{LayoutError, Result};
pub use frame::{FrameQueue, FrameTask};
pub use host::{
    ANIMATED_CLASS, ElementRef, LayoutHost, Rect, ScrollOffset, SiblingDirection, Targets,
    resolve_targets,
};
pub use ids::{IdRegistry, LAYOUT_ID_ATTRIBUTE, LayoutId};
pub use node::{MeasuredState, Node, NodeIndex, NodeProperties, NodeState};
pub use plan::{Plan, PlanRecorder, PlayState, TimelinePlan};
pub use reconcile::{
    ChangeKind, DEFAULT_SIZE_TOLERANCE, DiffFlags, Groups, NodeDiff, Reconciler, Reconciliation,
    StyleWrite,
};
pub use scheduler::{
    NativeAnimation, NativeAnimator, NativeTarget, NodeTiming, ScheduledAction, Scheduler,
    Segment, Timeline, TimelineDefaults, Track,
};
pub use snapshot::Snapshot;
pub use transition::{
    AnimationParams, DEFAULT_PROPERTIES, FinishReason, Transition, TransitionConfig,
};
pub use value::{ParamValue, StateParams, StyleValue, Timing, ValueContext};
