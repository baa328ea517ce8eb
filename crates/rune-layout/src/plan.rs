//! Headless scheduler that records what a transition asked for.
//!
//! `PlanRecorder` implements both [`Scheduler`] and [`NativeAnimator`] by
//! appending to a shared [`Plan`]. It is useful for inspecting a transition
//! without a renderer, for replaying it elsewhere, and in tests.

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

use crate::host::LayoutHost;
use crate::ids::LayoutId;
use crate::scheduler::{
    NativeAnimation, NativeAnimator, NativeTarget, ScheduledAction, Scheduler, Timeline,
    TimelineDefaults, Track,
};

/// Lifecycle of a recorded timeline or native animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    Created,
    Initialized,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct TweenEntry<E> {
    pub element: E,
    pub id: LayoutId,
    pub tracks: Vec<Track>,
    pub offset: f32,
}

impl<E> TweenEntry<E> {
    pub fn track(&self, property: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.property == property)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallEntry<E> {
    pub offset: f32,
    pub action: ScheduledAction<E>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelinePlan<E> {
    pub id: u64,
    pub defaults: TimelineDefaults,
    pub tweens: Vec<TweenEntry<E>>,
    pub calls: Vec<CallEntry<E>>,
    /// Native animations synced to this timeline, with their offsets.
    pub synced: Vec<(u64, f32)>,
    pub state: PlayState,
}

impl<E: Copy + PartialEq> TimelinePlan<E> {
    pub fn tweens_for(&self, element: E) -> impl Iterator<Item = &TweenEntry<E>> {
        self.tweens.iter().filter(move |entry| entry.element == element)
    }

    pub fn animated_elements(&self) -> Vec<E> {
        let mut elements: Vec<E> = Vec::new();
        for entry in &self.tweens {
            if !elements.contains(&entry.element) {
                elements.push(entry.element);
            }
        }
        elements
    }

    /// Run every scheduled call in offset order.
    pub fn apply_calls<H: LayoutHost<Element = E>>(&self, host: &mut H) {
        let mut calls: Vec<&CallEntry<E>> = self.calls.iter().collect();
        calls.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        for call in calls {
            call.action.apply(host);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NativePlan<E> {
    pub id: u64,
    pub targets: Vec<NativeTarget<E>>,
    pub defaults: TimelineDefaults,
    pub state: PlayState,
}

/// Everything recorded so far.
#[derive(Debug, Clone, Serialize)]
pub struct Plan<E> {
    pub timelines: Vec<TimelinePlan<E>>,
    pub native: Vec<NativePlan<E>>,
    #[serde(skip)]
    next_id: u64,
}

impl<E> Default for Plan<E> {
    fn default() -> Self {
        Self {
            timelines: Vec::new(),
            native: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> Plan<E> {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn last_timeline(&self) -> Option<&TimelinePlan<E>> {
        self.timelines.last()
    }

    pub fn last_native(&self) -> Option<&NativePlan<E>> {
        self.native.last()
    }
}

/// Records timelines and native animations into a shared [`Plan`].
#[derive(Debug)]
pub struct PlanRecorder<E> {
    plan: Rc<RefCell<Plan<E>>>,
}

impl<E> Default for PlanRecorder<E> {
    fn default() -> Self {
        Self {
            plan: Rc::new(RefCell::new(Plan::default())),
        }
    }
}

impl<E: Clone> PlanRecorder<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the plan recorded so far.
    pub fn plan(&self) -> Plan<E> {
        self.plan.borrow().clone()
    }

    pub fn last_timeline(&self) -> Option<TimelinePlan<E>> {
        self.plan.borrow().timelines.last().cloned()
    }

    pub fn last_native(&self) -> Option<NativePlan<E>> {
        self.plan.borrow().native.last().cloned()
    }

    /// Forget everything recorded so far. Handles still held by a transition
    /// stay valid and no longer record anything.
    pub fn clear(&self) {
        let mut plan = self.plan.borrow_mut();
        plan.timelines.clear();
        plan.native.clear();
    }
}

struct RecordedTimeline<E> {
    plan: Rc<RefCell<Plan<E>>>,
    id: u64,
}

impl<E> RecordedTimeline<E> {
    fn with(&self, f: impl FnOnce(&mut TimelinePlan<E>)) {
        let mut plan = self.plan.borrow_mut();
        if let Some(timeline) = plan.timelines.iter_mut().find(|t| t.id == self.id) {
            f(timeline);
        }
    }
}

impl<E> Timeline<E> for RecordedTimeline<E> {
    fn id(&self) -> u64 {
        self.id
    }

    fn add(&mut self, element: E, id: &LayoutId, tracks: Vec<Track>, offset: f32) {
        let entry = TweenEntry {
            element,
            id: id.clone(),
            tracks,
            offset,
        };
        self.with(|timeline| timeline.tweens.push(entry));
    }

    fn call(&mut self, offset: f32, action: ScheduledAction<E>) {
        self.with(|timeline| timeline.calls.push(CallEntry { offset, action }));
    }

    fn sync(&mut self, animation: &dyn NativeAnimation, offset: f32) {
        let native = animation.id();
        self.with(|timeline| timeline.synced.push((native, offset)));
    }

    fn init(&mut self) {
        self.with(|timeline| timeline.state = PlayState::Initialized);
    }

    fn cancel(&mut self) {
        self.with(|timeline| timeline.state = PlayState::Cancelled);
    }

    fn complete(&mut self) {
        self.with(|timeline| timeline.state = PlayState::Completed);
    }
}

struct RecordedNative<E> {
    plan: Rc<RefCell<Plan<E>>>,
    id: u64,
}

impl<E> RecordedNative<E> {
    fn set_state(&self, state: PlayState) {
        let mut plan = self.plan.borrow_mut();
        if let Some(native) = plan.native.iter_mut().find(|n| n.id == self.id) {
            native.state = state;
        }
    }
}

impl<E> NativeAnimation for RecordedNative<E> {
    fn id(&self) -> u64 {
        self.id
    }

    fn cancel(&mut self) {
        self.set_state(PlayState::Cancelled);
    }

    fn complete(&mut self) {
        self.set_state(PlayState::Completed);
    }
}

impl<E: 'static> Scheduler<E> for PlanRecorder<E> {
    fn create_timeline(&mut self, defaults: TimelineDefaults) -> Box<dyn Timeline<E>> {
        let mut plan = self.plan.borrow_mut();
        let id = plan.allocate_id();
        plan.timelines.push(TimelinePlan {
            id,
            defaults,
            tweens: Vec::new(),
            calls: Vec::new(),
            synced: Vec::new(),
            state: PlayState::Created,
        });
        Box::new(RecordedTimeline {
            plan: Rc::clone(&self.plan),
            id,
        })
    }
}

impl<E: 'static> NativeAnimator<E> for PlanRecorder<E> {
    fn animate(
        &mut self,
        targets: Vec<NativeTarget<E>>,
        defaults: &TimelineDefaults,
    ) -> Box<dyn NativeAnimation> {
        let mut plan = self.plan.borrow_mut();
        let id = plan.allocate_id();
        plan.native.push(NativePlan {
            id,
            targets,
            defaults: defaults.clone(),
            state: PlayState::Created,
        });
        Box::new(RecordedNative {
            plan: Rc::clone(&self.plan),
            id,
        })
    }
}
