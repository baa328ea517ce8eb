//! Automatic layout transitions.
//!
//! A [`Transition`] records the tracked tree, lets the caller mutate it, then
//! records it again and animates every element from the old geometry to the
//! new one:
//!
//! ```text
//! record() ──► caller mutates the tree ──► animate()
//!                                             │
//!         Scheduler / NativeAnimator ◄────────┤ tracks, calls, sync
//!                                             │
//!         finish(Completed | Paused) ◄── embedder reports the timeline end
//! ```
//!
//! While a transition runs every target is pinned with inline overrides
//! (absolute position, explicit size, cleared min/max constraints) so that
//! interpolating width, height and translate looks like real layout. The
//! overrides are removed again when the embedder reports completion.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::builder::RecordContext;
use crate::easing::Easing;
use crate::error::Result;
use crate::frame::{FrameQueue, FrameTask};
use crate::host::{ANIMATED_CLASS, ElementRef, LayoutHost, Targets};
use crate::ids::IdRegistry;
use crate::reconcile::{DEFAULT_SIZE_TOLERANCE, NodeDiff, Reconciler, Reconciliation};
use crate::scheduler::{
    NativeAnimation, NativeAnimator, NativeTarget, NodeTiming, ScheduledAction, Scheduler, Segment,
    Timeline, TimelineDefaults, Track,
};
use crate::snapshot::Snapshot;
use crate::styles::{TransitionMuteStore, record_inline_styles, restore_inline_styles};
use crate::value::{StateParams, StyleValue, Timing, px, translate};

/// Properties tracked by every transition.
pub const DEFAULT_PROPERTIES: [&str; 2] = ["opacity", "border-radius"];

/// Inline properties a transition overrides on its targets. Saved after the
/// new state is recorded and written back on completion.
pub const OVERRIDDEN_PROPERTIES: [&str; 14] = [
    "display",
    "visibility",
    "translate",
    "position",
    "left",
    "top",
    "margin-left",
    "margin-top",
    "width",
    "height",
    "max-width",
    "max-height",
    "min-width",
    "min-height",
];

/// Power of the two halves of a frozen crossfade.
const CROSSFADE_POWER: f32 = 1.75;

/// Called once per `animate()`, when the timeline completes or is paused.
pub type CompleteCallback<E> = Rc<dyn Fn(&Transition<E>)>;

/// Options fixed for the lifetime of a transition.
#[derive(Clone)]
pub struct TransitionConfig<E> {
    /// Which elements under the root are animated.
    pub children: Targets<E>,
    pub delay: Timing,
    pub duration: Timing,
    pub ease: Easing,
    /// Start state of added nodes.
    pub added: StateParams,
    /// End state of removed nodes.
    pub removed: StateParams,
    /// Midpoint state of non-target nodes inside a resizing target.
    pub frozen: StateParams,
    /// Extra style properties to track, on top of [`DEFAULT_PROPERTIES`].
    pub properties: Vec<String>,
    pub size_tolerance: f64,
    pub on_complete: Option<CompleteCallback<E>>,
}

impl<E> Default for TransitionConfig<E> {
    fn default() -> Self {
        Self {
            children: Targets::All,
            delay: Timing::Fixed(0.0),
            duration: Timing::Fixed(500.0),
            ease: Easing::default(),
            added: StateParams::transparent(),
            removed: StateParams::transparent(),
            frozen: StateParams::transparent(),
            properties: Vec::new(),
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
            on_complete: None,
        }
    }
}

impl<E> fmt::Debug for TransitionConfig<E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionConfig")
            .field("children", &self.children)
            .field("delay", &self.delay)
            .field("duration", &self.duration)
            .field("ease", &self.ease)
            .field("added", &self.added)
            .field("removed", &self.removed)
            .field("frozen", &self.frozen)
            .field("properties", &self.properties)
            .field("size_tolerance", &self.size_tolerance)
            .finish_non_exhaustive()
    }
}

impl<E> TransitionConfig<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine options from the `[layout]` table of `rune.toml`.
    pub fn from_config(config: &rune_config::LayoutConfig) -> Result<Self> {
        let ease = config.ease.parse::<Easing>()?;
        let params = |map: &std::collections::BTreeMap<String, rune_config::StateValue>| {
            if map.is_empty() {
                StateParams::transparent()
            } else {
                StateParams::from(map.clone())
            }
        };
        Ok(Self {
            children: config
                .children
                .as_deref()
                .map(Targets::from)
                .unwrap_or_default(),
            delay: Timing::Fixed(config.delay_ms),
            duration: Timing::Fixed(config.duration_ms),
            ease,
            added: params(&config.added),
            removed: params(&config.removed),
            frozen: params(&config.frozen),
            properties: config.properties.clone(),
            size_tolerance: config.size_tolerance,
            on_complete: None,
        })
    }

    pub fn with_children(mut self, children: impl Into<Targets<E>>) -> Self {
        self.children = children.into();
        self
    }

    pub fn with_delay(mut self, delay: impl Into<Timing>) -> Self {
        self.delay = delay.into();
        self
    }

    pub fn with_duration(mut self, duration: impl Into<Timing>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_ease(mut self, ease: Easing) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_added(mut self, added: StateParams) -> Self {
        self.added = added;
        self
    }

    pub fn with_removed(mut self, removed: StateParams) -> Self {
        self.removed = removed;
        self
    }

    pub fn with_frozen(mut self, frozen: StateParams) -> Self {
        self.frozen = frozen;
        self
    }

    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_size_tolerance(mut self, tolerance: f64) -> Self {
        self.size_tolerance = tolerance;
        self
    }

    pub fn on_complete(mut self, callback: impl Fn(&Transition<E>) + 'static) -> Self {
        self.on_complete = Some(Rc::new(callback));
        self
    }

    /// Every tracked property: the defaults, each state param name and the
    /// configured extras, without duplicates.
    pub fn tracked_properties(&self) -> Vec<String> {
        let mut tracked: Vec<String> = DEFAULT_PROPERTIES.iter().map(|p| p.to_string()).collect();
        let names = self
            .frozen
            .names()
            .chain(self.added.names())
            .chain(self.removed.names())
            .chain(self.properties.iter().map(String::as_str));
        for name in names {
            if !tracked.iter().any(|p| p == name) {
                tracked.push(name.to_string());
            }
        }
        tracked
    }

    /// Inline properties saved before animating and restored after.
    pub fn recorded_properties(&self) -> Vec<String> {
        let mut recorded: Vec<String> =
            OVERRIDDEN_PROPERTIES.iter().map(|p| p.to_string()).collect();
        for name in self.tracked_properties() {
            if !recorded.contains(&name) {
                recorded.push(name);
            }
        }
        recorded
    }
}

/// Per-call overrides for [`Transition::animate`].
pub struct AnimationParams<E> {
    pub delay: Option<Timing>,
    pub duration: Option<Timing>,
    pub ease: Option<Easing>,
    /// Merged over the configured params, entries here win.
    pub added: Option<StateParams>,
    pub removed: Option<StateParams>,
    pub frozen: Option<StateParams>,
    pub on_complete: Option<CompleteCallback<E>>,
}

impl<E> Default for AnimationParams<E> {
    fn default() -> Self {
        Self {
            delay: None,
            duration: None,
            ease: None,
            added: None,
            removed: None,
            frozen: None,
            on_complete: None,
        }
    }
}

impl<E> AnimationParams<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(mut self, delay: impl Into<Timing>) -> Self {
        self.delay = Some(delay.into());
        self
    }

    pub fn duration(mut self, duration: impl Into<Timing>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn ease(mut self, ease: Easing) -> Self {
        self.ease = Some(ease);
        self
    }

    pub fn added(mut self, added: StateParams) -> Self {
        self.added = Some(added);
        self
    }

    pub fn removed(mut self, removed: StateParams) -> Self {
        self.removed = Some(removed);
        self
    }

    pub fn frozen(mut self, frozen: StateParams) -> Self {
        self.frozen = Some(frozen);
        self
    }

    pub fn on_complete(mut self, callback: impl Fn(&Transition<E>) + 'static) -> Self {
        self.on_complete = Some(Rc::new(callback));
        self
    }
}

/// How a running timeline ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Completed,
    Paused,
}

/// State of the `animate()` call whose timeline is still running.
struct Active<E> {
    on_complete: Option<CompleteCallback<E>>,
    /// Transformed elements with the transform they end on.
    transformed: Vec<(E, String)>,
}

#[derive(Clone, Copy)]
enum Slot {
    Old,
    New,
}

/// Records a subtree, diffs it after a mutation and animates the difference.
pub struct Transition<E> {
    id: u64,
    root: Option<E>,
    config: TransitionConfig<E>,
    tracked: Vec<String>,
    recorded: Vec<String>,
    old: Snapshot<E>,
    new: Snapshot<E>,
    pending_removed: HashSet<E>,
    mute_store: TransitionMuteStore<E>,
    timeline: Option<Box<dyn Timeline<E>>>,
    native: Option<Box<dyn NativeAnimation>>,
    frames: FrameQueue,
    active: Option<Active<E>>,
    reconciliation: Option<Reconciliation<E>>,
    registry: &'static IdRegistry,
}

impl<E: ElementRef> fmt::Debug for Transition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("old", &self.old.len())
            .field("new", &self.new.len())
            .field("animating", &self.active.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: ElementRef> Transition<E> {
    /// Create a transition on `root` and record its current layout.
    pub fn new<H>(host: &mut H, root: E, config: TransitionConfig<E>) -> Self
    where
        H: LayoutHost<Element = E>,
    {
        Self::with_registry(host, Some(root), config, IdRegistry::global())
    }

    /// Create a transition on the first element matching `selector`.
    ///
    /// A selector that matches nothing yields an inert transition whose
    /// `animate()` returns `None`.
    pub fn from_selector<H>(host: &mut H, selector: &str, config: TransitionConfig<E>) -> Self
    where
        H: LayoutHost<Element = E>,
    {
        let root = host.query_selector_all(None, selector).first().copied();
        if root.is_none() {
            warn!(selector, "layout root not found");
        }
        Self::with_registry(host, root, config, IdRegistry::global())
    }

    /// Like [`Transition::new`] with ids drawn from `registry`.
    pub fn with_registry<H>(
        host: &mut H,
        root: Option<E>,
        config: TransitionConfig<E>,
        registry: &'static IdRegistry,
    ) -> Self
    where
        H: LayoutHost<Element = E>,
    {
        let tracked = config.tracked_properties();
        let recorded = config.recorded_properties();
        let mut transition = Self {
            id: registry.next_transition_id(),
            root,
            config,
            tracked,
            recorded,
            old: Snapshot::new(),
            new: Snapshot::new(),
            pending_removed: HashSet::new(),
            mute_store: TransitionMuteStore::new(),
            timeline: None,
            native: None,
            frames: FrameQueue::new(),
            active: None,
            reconciliation: None,
            registry,
        };
        // Stamps the ids; the transitions muted while measuring come back
        // right away.
        transition.record_snapshot(host, Slot::Old);
        transition.mute_store.restore_all(host);
        transition
    }

    fn record_snapshot<H>(&mut self, host: &mut H, slot: Slot)
    where
        H: LayoutHost<Element = E>,
    {
        let Some(root) = self.root else {
            return;
        };
        let snapshot = match slot {
            Slot::Old => &mut self.old,
            Slot::New => &mut self.new,
        };
        let mut ctx = RecordContext {
            host,
            root,
            children: &self.config.children,
            tracked: &self.tracked,
            mute_store: &mut self.mute_store,
            registry: self.registry,
        };
        snapshot.record(&mut ctx);
    }

    /// Capture the layout before a mutation.
    ///
    /// Handles still running from the previous `animate()` are cancelled
    /// before measuring. The layout is then measured as it stands, so the
    /// next transition starts where the interrupted one stopped. The pause
    /// path of the cancelled timeline runs after measuring and inline
    /// overrides of the previous transition are put back.
    pub fn record<H>(&mut self, host: &mut H) -> &mut Self
    where
        H: LayoutHost<Element = E>,
    {
        if let Some(mut native) = self.native.take() {
            native.cancel();
        }
        let paused = match self.timeline.take() {
            Some(mut timeline) => {
                timeline.cancel();
                true
            }
            None => false,
        };
        self.record_snapshot(host, Slot::Old);
        if paused {
            self.finish(host, FinishReason::Paused);
        }
        for index in self.new.root_order() {
            if let Some(node) = self.new.node(index) {
                restore_inline_styles(host, node);
            }
        }
        self
    }

    /// Record the new layout, diff it against the old one and hand the
    /// animation to `backend`.
    ///
    /// Returns `None` when there is no root to animate.
    pub fn animate<H, B>(
        &mut self,
        host: &mut H,
        backend: &mut B,
        params: AnimationParams<E>,
    ) -> Option<&Reconciliation<E>>
    where
        H: LayoutHost<Element = E>,
        B: Scheduler<E> + NativeAnimator<E>,
    {
        let Some(root) = self.root else {
            warn!(transition = self.id, "no layout root, nothing to animate");
            return None;
        };

        let delay = params.delay.unwrap_or_else(|| self.config.delay.clone());
        let duration = params.duration.unwrap_or_else(|| self.config.duration.clone());
        let ease = params.ease.unwrap_or_else(|| self.config.ease.clone());
        let merge = |call: Option<StateParams>, defaults: &StateParams| match call {
            Some(call) => call.merged_over(defaults),
            None => defaults.clone(),
        };
        let added = merge(params.added, &self.config.added);
        let removed = merge(params.removed, &self.config.removed);
        let frozen = merge(params.frozen, &self.config.frozen);
        let on_complete = params.on_complete.or_else(|| self.config.on_complete.clone());

        for index in self.old.root_order() {
            if let Some(node) = self.old.node(index) {
                self.mute_store.mute_node(host, node);
            }
        }
        self.record_snapshot(host, Slot::New);
        if self.new.root().is_none() {
            warn!(transition = self.id, ?root, "layout root is not a layout element");
            return None;
        }
        for index in self.new.root_order() {
            if let Some(node) = self.new.node_mut(index) {
                record_inline_styles(&*host, node, &self.recorded);
            }
        }

        let reconciliation = Reconciler {
            delay: &delay,
            duration: &duration,
            added: &added,
            removed: &removed,
            size_tolerance: self.config.size_tolerance,
        }
        .reconcile(&self.old, &self.new, &self.pending_removed);

        for write in &reconciliation.style_writes {
            match &write.value {
                Some(value) => host.set_inline_style(write.element, &write.property, value),
                None => host.remove_inline_style(write.element, &write.property),
            }
        }
        self.pending_removed.extend(reconciliation.pending_inserts.iter().copied());
        for element in &reconciliation.pending_clears {
            self.pending_removed.remove(element);
        }

        let defaults = TimelineDefaults {
            ease,
            timings: reconciliation
                .entries
                .iter()
                .map(|entry| {
                    let timing = NodeTiming {
                        delay: entry.delay,
                        duration: entry.duration,
                    };
                    (entry.id.clone(), timing)
                })
                .collect(),
        };
        let mut timeline = backend.create_timeline(defaults.clone());
        let groups = &reconciliation.groups;

        if !groups.targets.is_empty() {
            host.add_class(root, ANIMATED_CLASS);
            let absolute = self.new.absolute_coords();
            for entry in &reconciliation.entries {
                self.mute_store.mute(host, entry.element);
                self.mute_store.mute(host, entry.measure);
                if entry.to.is_inlined {
                    continue;
                }
                let root_is_static = self
                    .new
                    .node(entry.node)
                    .is_some_and(|node| node.state.measured.position == "static");
                pin_target(host, entry, root, absolute, root_is_static);
            }

            let old_scroll = self.old.scroll();
            if old_scroll != host.scroll_offset() {
                self.frames.push(FrameTask::RestoreScroll(old_scroll));
            }

            let animated: HashSet<E> = groups.animated.iter().copied().collect();
            for entry in reconciliation.entries.iter().filter(|e| animated.contains(&e.element)) {
                let tracks = animated_tracks(entry, &self.tracked);
                if !tracks.is_empty() {
                    timeline.add(entry.element, &entry.id, tracks, 0.0);
                }
            }
        }

        if !groups.frozen.is_empty() {
            let frozen_set: HashSet<E> = groups.frozen.iter().copied().collect();
            let frozen_entries = reconciliation
                .entries
                .iter()
                .filter(|e| frozen_set.contains(&e.element));
            for entry in frozen_entries.clone() {
                for (property, value) in frozen_styles(entry, true, &self.tracked) {
                    host.set_inline_style(entry.element, &property, &value);
                }
            }
            for entry in frozen_entries {
                let action = ScheduledAction::ApplyStyles {
                    element: entry.element,
                    styles: frozen_styles(entry, false, &self.tracked),
                };
                timeline.call(entry.delay + entry.duration / 2.0, action);
            }

            let crossfading: HashSet<E> = groups.animated_frozen.iter().copied().collect();
            let crossfade_entries = reconciliation
                .entries
                .iter()
                .filter(|e| crossfading.contains(&e.element));
            for entry in crossfade_entries {
                let ctx = self.new.value_context(entry.node);
                let tracks: Vec<Track> = frozen
                    .iter()
                    .filter_map(|(property, param)| {
                        let pivot = param.resolve(&ctx);
                        let from = entry.from.properties.get(property)?;
                        let to = entry.to.properties.get(property)?;
                        Some(crossfade_track(property, from, pivot, to))
                    })
                    .collect();
                if !tracks.is_empty() {
                    timeline.add(entry.element, &entry.id, tracks, 0.0);
                }
            }
        }

        let mut transformed = Vec::new();
        let mut native_targets = Vec::new();
        for &element in &groups.transformed {
            let Some(entry) = reconciliation.entry_for(element) else {
                continue;
            };
            let (from, to) = (&entry.from.properties, &entry.to.properties);
            let old_translate = translate(from.x, from.y);
            host.set_inline_style(element, "translate", &old_translate);
            host.set_inline_style(element, "transform", &from.transform);
            native_targets.push(NativeTarget {
                element,
                id: entry.id.clone(),
                tracks: vec![
                    Track::tween(
                        "translate",
                        StyleValue::Text(old_translate),
                        StyleValue::Text(translate(to.x, to.y)),
                    ),
                    Track::tween(
                        "transform",
                        StyleValue::Text(from.transform.clone()),
                        StyleValue::Text(to.transform.clone()),
                    ),
                ],
            });
            transformed.push((element, to.transform.clone()));
        }
        if !native_targets.is_empty() {
            let native = backend.animate(native_targets, &defaults);
            timeline.sync(native.as_ref(), 0.0);
            self.native = Some(native);
        }

        timeline.init();

        debug!(
            transition = self.id,
            timeline = timeline.id(),
            targets = groups.targets.len(),
            animated = groups.animated.len(),
            transformed = transformed.len(),
            frozen = groups.frozen.len(),
            "layout transition started"
        );

        self.timeline = Some(timeline);
        self.active = Some(Active {
            on_complete,
            transformed,
        });
        self.reconciliation = Some(reconciliation);
        self.reconciliation.as_ref()
    }

    /// Report that the timeline of the last `animate()` completed or was
    /// paused. Only the first report per `animate()` has an effect.
    pub fn finish<H>(&mut self, host: &mut H, reason: FinishReason)
    where
        H: LayoutHost<Element = E>,
    {
        let Some(active) = self.active.take() else {
            return;
        };
        if let Some(mut native) = self.native.take() {
            native.cancel();
        }

        if let Some(reconciliation) = &self.reconciliation {
            for entry in &reconciliation.entries {
                restore_visual_state(host, entry, &mut self.pending_removed);
                if reason == FinishReason::Completed {
                    if let Some(node) = self.new.node(entry.node) {
                        restore_inline_styles(host, node);
                    }
                }
            }
        }

        if reason == FinishReason::Completed {
            for (element, transform) in &active.transformed {
                host.set_inline_style(*element, "transform", transform);
            }
            self.timeline = None;
        }
        if let Some(root) = self.root {
            host.remove_class(root, ANIMATED_CLASS);
        }

        debug!(transition = self.id, ?reason, "layout transition finished");

        if let Some(callback) = active.on_complete {
            callback(self);
        }
        if reason == FinishReason::Completed {
            self.frames.push(FrameTask::RestoreTransitions {
                unless_animated: true,
            });
        }
    }

    /// `record()`, run `mutate`, then `animate()`.
    pub fn update<H, B, F>(
        &mut self,
        host: &mut H,
        backend: &mut B,
        mutate: F,
        params: AnimationParams<E>,
    ) -> Option<&Reconciliation<E>>
    where
        H: LayoutHost<Element = E>,
        B: Scheduler<E> + NativeAnimator<E>,
        F: FnOnce(&mut H),
    {
        self.record(host);
        mutate(host);
        self.animate(host, backend, params)
    }

    /// Force-complete anything in flight and forget every recording.
    ///
    /// Muted CSS transitions come back on the next frame.
    pub fn revert<H>(&mut self, host: &mut H) -> &mut Self
    where
        H: LayoutHost<Element = E>,
    {
        if let Some(mut timeline) = self.timeline.take() {
            timeline.complete();
            self.finish(host, FinishReason::Completed);
        }
        if let Some(mut native) = self.native.take() {
            native.complete();
        }
        if let Some(root) = self.root {
            host.remove_class(root, ANIMATED_CLASS);
        }
        self.active = None;
        self.reconciliation = None;
        self.old.revert(host);
        self.new.revert(host);
        self.frames.push(FrameTask::RestoreTransitions {
            unless_animated: false,
        });
        self
    }

    /// Run the tasks deferred to this frame.
    pub fn on_frame<H>(&mut self, host: &mut H)
    where
        H: LayoutHost<Element = E>,
    {
        for task in self.frames.take() {
            match task {
                FrameTask::RestoreScroll(offset) => host.scroll_to(offset),
                FrameTask::RestoreTransitions { unless_animated } => {
                    let animating =
                        self.root.is_some_and(|root| host.has_class(root, ANIMATED_CLASS));
                    if unless_animated && animating {
                        continue;
                    }
                    self.mute_store.restore_all(host);
                }
            }
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn root(&self) -> Option<E> {
        self.root
    }

    pub fn config(&self) -> &TransitionConfig<E> {
        &self.config
    }

    pub fn tracked_properties(&self) -> &[String] {
        &self.tracked
    }

    pub fn recorded_properties(&self) -> &[String] {
        &self.recorded
    }

    pub fn old_state(&self) -> &Snapshot<E> {
        &self.old
    }

    pub fn new_state(&self) -> &Snapshot<E> {
        &self.new
    }

    /// Diff of the last `animate()`.
    pub fn reconciliation(&self) -> Option<&Reconciliation<E>> {
        self.reconciliation.as_ref()
    }

    pub fn added(&self) -> &[E] {
        self.reconciliation
            .as_ref()
            .map_or(&[], |r| r.groups.added.as_slice())
    }

    pub fn removed(&self) -> &[E] {
        self.reconciliation
            .as_ref()
            .map_or(&[], |r| r.groups.removed.as_slice())
    }

    pub fn frozen(&self) -> &[E] {
        self.reconciliation
            .as_ref()
            .map_or(&[], |r| r.groups.frozen.as_slice())
    }

    /// Whether `element` was removed by a transition and not added back yet.
    pub fn is_pending_removal(&self, element: E) -> bool {
        self.pending_removed.contains(&element)
    }

    /// Whether the last `animate()` has not finished yet.
    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Number of elements whose CSS transition is currently muted.
    pub fn muted_transitions(&self) -> usize {
        self.mute_store.len()
    }

    pub fn pending_frame_tasks(&self) -> usize {
        self.frames.len()
    }
}

/// Pin a target at its old geometry so width, height and translate can be
/// interpolated independently of the surrounding layout.
fn pin_target<H: LayoutHost>(
    host: &mut H,
    entry: &NodeDiff<H::Element>,
    root: H::Element,
    absolute: bool,
    root_is_static: bool,
) {
    let element = entry.element;
    let from = &entry.from.properties;
    host.set_inline_style(element, "display", "block");
    if element != root || absolute {
        host.set_inline_style(element, "position", if absolute { "fixed" } else { "absolute" });
        host.set_inline_style(element, "left", "0px");
        host.set_inline_style(element, "top", "0px");
        host.set_inline_style(element, "margin-left", "0px");
        host.set_inline_style(element, "margin-top", "0px");
        host.set_inline_style(element, "translate", &translate(from.x, from.y));
    }
    if element == root && root_is_static {
        host.set_inline_style(element, "position", "relative");
        host.set_inline_style(element, "left", "0px");
        host.set_inline_style(element, "top", "0px");
    }
    host.set_inline_style(element, "width", &px(from.width));
    host.set_inline_style(element, "height", &px(from.height));
    unclamp(host, element);
}

fn unclamp<H: LayoutHost>(host: &mut H, element: H::Element) {
    host.set_inline_style(element, "min-width", "auto");
    host.set_inline_style(element, "min-height", "auto");
    host.set_inline_style(element, "max-width", "none");
    host.set_inline_style(element, "max-height", "none");
}

fn animated_tracks<E>(entry: &NodeDiff<E>, tracked: &[String]) -> Vec<Track> {
    let (from, to) = (&entry.from.properties, &entry.to.properties);
    let mut tracks = Vec::new();
    if !entry.to.is_inlined {
        if from.width != to.width {
            tracks.push(Track::tween("width", from.width.into(), to.width.into()));
        }
        if from.height != to.height {
            tracks.push(Track::tween("height", from.height.into(), to.height.into()));
        }
        // Translate of transformed nodes runs on the native animation.
        if !entry.to.has_transform {
            tracks.push(Track::tween(
                "translate",
                StyleValue::Text(translate(from.x, from.y)),
                StyleValue::Text(translate(to.x, to.y)),
            ));
        }
    }
    for property in tracked.iter().filter(|p| p.as_str() != "transform") {
        if let (Some(old), Some(new)) = (from.get(property), to.get(property)) {
            if old != new {
                tracks.push(Track::tween(property.clone(), old, new));
            }
        }
    }
    tracks
}

/// Inline styles pinning a frozen node to its old (`old == true`) or new
/// geometry and tracked values.
fn frozen_styles<E>(entry: &NodeDiff<E>, old: bool, tracked: &[String]) -> Vec<(String, String)> {
    let (state, inlined) = if old {
        (&entry.from, entry.from.is_inlined)
    } else {
        (&entry.to, entry.to.is_inlined)
    };
    let properties = &state.properties;
    let mut styles = Vec::new();
    if !inlined {
        styles.push(("width".to_string(), px(properties.width)));
        styles.push(("height".to_string(), px(properties.height)));
        for (property, value) in [
            ("min-width", "auto"),
            ("min-height", "auto"),
            ("max-width", "none"),
            ("max-height", "none"),
        ] {
            styles.push((property.to_string(), value.to_string()));
        }
        styles.push(("translate".to_string(), translate(properties.x, properties.y)));
    }
    for property in tracked.iter().filter(|p| p.as_str() != "transform") {
        if let Some(value) = properties.get(property) {
            styles.push((property.clone(), value.to_string()));
        }
    }
    styles
}

/// Two-segment track through `pivot`: eased in towards it, eased out of it.
fn crossfade_track(property: &str, from: StyleValue, pivot: StyleValue, to: StyleValue) -> Track {
    Track {
        property: property.to_string(),
        segments: vec![
            Segment {
                from,
                to: pivot.clone(),
                ease: Some(Easing::ease_in(CROSSFADE_POWER)),
            },
            Segment {
                from: pivot,
                to,
                ease: Some(Easing::ease_out(CROSSFADE_POWER)),
            },
        ],
    }
}

/// Drop the visibility overrides of a node once its transition is over.
fn restore_visual_state<H: LayoutHost>(
    host: &mut H,
    entry: &NodeDiff<H::Element>,
    pending_removed: &mut HashSet<H::Element>,
) {
    let is_removed = entry.to.measured.is_removed;
    if is_removed || entry.has_visibility_swap {
        host.remove_inline_style(entry.element, "display");
        host.remove_inline_style(entry.element, "visibility");
        if entry.has_visibility_swap {
            host.remove_inline_style(entry.measure, "display");
            host.remove_inline_style(entry.measure, "visibility");
        }
    }
    if is_removed {
        pending_removed.remove(&entry.element);
    }
}
