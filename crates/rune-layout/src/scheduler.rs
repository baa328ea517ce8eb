//! Collaborator traits for the tween scheduler and the native animation
//! primitive, plus the data they are fed.
//!
//! The engine never advances time. It describes per-element property tracks
//! and timed style writes, and the embedder's scheduler plays them. When a
//! timeline finishes or is paused the embedder reports back through
//! `Transition::finish`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::easing::Easing;
use crate::host::LayoutHost;
use crate::ids::LayoutId;
use crate::value::StyleValue;

/// One interpolation leg of a track. `ease: None` uses the timeline default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: StyleValue,
    pub to: StyleValue,
    pub ease: Option<Easing>,
}

/// A property animated through one or more consecutive segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub property: String,
    pub segments: Vec<Segment>,
}

impl Track {
    /// Single segment from `from` to `to` with the default ease.
    pub fn tween(property: impl Into<String>, from: StyleValue, to: StyleValue) -> Self {
        Self {
            property: property.into(),
            segments: vec![Segment { from, to, ease: None }],
        }
    }

    pub fn from_value(&self) -> Option<&StyleValue> {
        self.segments.first().map(|segment| &segment.from)
    }

    pub fn to_value(&self) -> Option<&StyleValue> {
        self.segments.last().map(|segment| &segment.to)
    }
}

/// Delay and duration of one node, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeTiming {
    pub delay: f32,
    pub duration: f32,
}

/// Default timing resolvers of a timeline, keyed by stable id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineDefaults {
    pub ease: Easing,
    pub timings: BTreeMap<LayoutId, NodeTiming>,
}

impl TimelineDefaults {
    pub fn timing(&self, id: &LayoutId) -> Option<NodeTiming> {
        self.timings.get(id).copied()
    }
}

/// A style change the scheduler performs at an offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScheduledAction<E> {
    ApplyStyles {
        element: E,
        styles: Vec<(String, String)>,
    },
}

impl<E: Copy> ScheduledAction<E> {
    /// Perform the action on `host`.
    pub fn apply<H: LayoutHost<Element = E>>(&self, host: &mut H) {
        match self {
            Self::ApplyStyles { element, styles } => {
                for (property, value) in styles {
                    host.set_inline_style(*element, property, value);
                }
            }
        }
    }
}

/// Handle to a running native transform animation.
pub trait NativeAnimation {
    fn id(&self) -> u64;
    /// Stop and drop the animation's effect.
    fn cancel(&mut self);
    /// Jump to the end state.
    fn complete(&mut self);
}

/// Handle to a scheduled timeline.
pub trait Timeline<E> {
    fn id(&self) -> u64;
    /// Tween `tracks` on `element` starting at `offset` ms.
    fn add(&mut self, element: E, id: &LayoutId, tracks: Vec<Track>, offset: f32);
    /// Run `action` at `offset` ms.
    fn call(&mut self, offset: f32, action: ScheduledAction<E>);
    /// Keep `animation` in lockstep with this timeline from `offset` ms.
    fn sync(&mut self, animation: &dyn NativeAnimation, offset: f32);
    /// Render the initial frame.
    fn init(&mut self);
    /// Stop without completing. The embedder reports the pause.
    fn cancel(&mut self);
    /// Seek to the end. The embedder reports the completion.
    fn complete(&mut self);
}

/// Creates timelines.
pub trait Scheduler<E> {
    fn create_timeline(&mut self, defaults: TimelineDefaults) -> Box<dyn Timeline<E>>;
}

/// An element handed to the native animator with its tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeTarget<E> {
    pub element: E,
    pub id: LayoutId,
    pub tracks: Vec<Track>,
}

/// Starts native animations. Animations start paused and are driven by the
/// timeline they are synced to.
pub trait NativeAnimator<E> {
    fn animate(
        &mut self,
        targets: Vec<NativeTarget<E>>,
        defaults: &TimelineDefaults,
    ) -> Box<dyn NativeAnimation>;
}
