mod common;

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result};
use rune_autolayout::dom::{MemoryDocument, ReflowMode};
use rune_autolayout::layout::{
    ANIMATED_CLASS, AnimationParams, FinishReason, LAYOUT_ID_ATTRIBUTE, LayoutHost, PlanRecorder,
    PlayState, Rect, ScheduledAction, StyleValue, Transition, TransitionConfig,
};

use common::{item_frame, row};

fn counter() -> (Rc<Cell<usize>>, impl Fn(&Transition<rune_autolayout::ElementId>) + 'static) {
    let calls = Rc::new(Cell::new(0));
    let handle = Rc::clone(&calls);
    (calls, move |_: &Transition<_>| handle.set(handle.get() + 1))
}

#[test]
fn animate_pins_targets_and_completion_restores_them() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let item = items[0];
    let (calls, on_complete) = counter();
    let mut backend = PlanRecorder::new();
    let config = TransitionConfig::default().on_complete(on_complete);
    let mut transition = Transition::new(&mut doc, root, config);

    transition.record(&mut doc);
    doc.set_frame(item, Rect::new(100.0, 0.0, 50.0, 20.0));
    transition
        .animate(&mut doc, &mut backend, AnimationParams::default())
        .context("root should be recorded")?;

    assert!(transition.is_animating());
    assert!(doc.has_class(root, ANIMATED_CLASS));
    assert_eq!(doc.inline_style(item, "position").as_deref(), Some("absolute"));
    assert_eq!(doc.inline_style(item, "translate").as_deref(), Some("0px 0px"));
    assert_eq!(doc.inline_style(item, "width").as_deref(), Some("50px"));
    assert_eq!(doc.inline_style(item, "max-width").as_deref(), Some("none"));
    // Pinned at the old position until the scheduler moves it.
    assert_eq!(doc.bounding_rect(item).left, 0.0);

    let timeline = backend.last_timeline().context("timeline")?;
    assert_eq!(timeline.state, PlayState::Initialized);
    assert_eq!(timeline.animated_elements(), vec![item]);
    let tween = timeline.tweens_for(item).next().context("item tween")?;
    let track = tween.track("translate").context("translate track")?;
    assert_eq!(track.from_value(), Some(&StyleValue::from("0px 0px")));
    assert_eq!(track.to_value(), Some(&StyleValue::from("100px 0px")));
    assert!(tween.track("width").is_none());

    transition.finish(&mut doc, FinishReason::Completed);

    assert_eq!(calls.get(), 1);
    assert!(!transition.is_animating());
    assert!(!doc.has_class(root, ANIMATED_CLASS));
    assert_eq!(doc.inline_style(item, "position"), None);
    assert_eq!(doc.inline_style(item, "translate"), None);
    assert_eq!(doc.bounding_rect(item).left, 100.0);

    // Transitions stay muted until the next frame.
    assert!(transition.muted_transitions() > 0);
    assert_eq!(doc.inline_style(item, "transition").as_deref(), Some("none"));
    transition.on_frame(&mut doc);
    assert_eq!(transition.muted_transitions(), 0);
    assert_eq!(doc.inline_style(item, "transition"), None);

    // Only the first report counts.
    transition.finish(&mut doc, FinishReason::Completed);
    assert_eq!(calls.get(), 1);
    Ok(())
}

#[test]
fn muted_transition_keeps_its_original_value() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 1);
    doc.set_inline_style(items[0], "transition", "opacity 1s");
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());
    assert_eq!(doc.inline_style(items[0], "transition").as_deref(), Some("opacity 1s"));

    transition.update(
        &mut doc,
        &mut backend,
        |doc: &mut MemoryDocument| doc.set_frame(items[0], item_frame(3)),
        AnimationParams::default(),
    );
    assert_eq!(doc.inline_style(items[0], "transition").as_deref(), Some("none"));

    transition.finish(&mut doc, FinishReason::Completed);
    transition.on_frame(&mut doc);
    assert_eq!(doc.inline_style(items[0], "transition").as_deref(), Some("opacity 1s"));
    Ok(())
}

#[test]
fn recording_mid_animation_pauses_the_previous_one() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let item = items[1];
    let (calls, on_complete) = counter();
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());

    transition.update(
        &mut doc,
        &mut backend,
        |doc: &mut MemoryDocument| doc.set_frame(item, item_frame(3)),
        AnimationParams::default().on_complete(on_complete),
    );
    assert!(transition.is_animating());

    transition.record(&mut doc);

    assert_eq!(calls.get(), 1);
    assert!(!transition.is_animating());
    assert!(!doc.has_class(root, ANIMATED_CLASS));
    assert_eq!(doc.inline_style(item, "position"), None);
    let plan = backend.plan();
    assert_eq!(plan.timelines[0].state, PlayState::Cancelled);
    Ok(())
}

#[test]
fn frozen_children_snap_at_the_midpoint_and_crossfade() -> Result<()> {
    let mut doc = MemoryDocument::new(ReflowMode::Fixed);
    let root = doc.create_element("div");
    let card = doc.create_element("div");
    let label = doc.create_element("span");
    doc.add_class_name(card, "card");
    doc.append_child(doc.body(), root)?;
    doc.append_child(root, card)?;
    doc.append_child(card, label)?;
    doc.set_frame(root, Rect::new(0.0, 0.0, 400.0, 400.0));
    doc.set_frame(card, Rect::new(0.0, 0.0, 100.0, 100.0));
    doc.set_frame(label, Rect::new(10.0, 10.0, 50.0, 10.0));

    let mut backend = PlanRecorder::new();
    let config = TransitionConfig::default()
        .with_children(".card")
        .with_duration(400.0_f32)
        .with_delay(100.0_f32);
    let mut transition = Transition::new(&mut doc, root, config);

    let result = transition
        .update(
            &mut doc,
            &mut backend,
            |doc: &mut MemoryDocument| {
                doc.set_frame(card, Rect::new(0.0, 0.0, 200.0, 100.0));
                doc.set_frame(label, Rect::new(10.0, 10.0, 120.0, 10.0));
            },
            AnimationParams::default(),
        )
        .context("root should be recorded")?;
    assert_eq!(result.groups.frozen, vec![label]);
    assert_eq!(result.groups.animated_frozen, vec![label]);
    assert_eq!(transition.frozen(), &[label]);

    // The label shows its old geometry until the midpoint call.
    assert_eq!(doc.inline_style(label, "width").as_deref(), Some("50px"));

    let timeline = backend.last_timeline().context("timeline")?;
    let call = timeline.calls.first().context("midpoint call")?;
    assert_eq!(call.offset, 300.0);
    let ScheduledAction::ApplyStyles { element, styles } = &call.action;
    assert_eq!(*element, label);
    assert!(styles.contains(&("width".to_string(), "120px".to_string())));

    let tween = timeline.tweens_for(label).next().context("crossfade tween")?;
    let opacity = tween.track("opacity").context("opacity track")?;
    assert_eq!(opacity.segments.len(), 2);
    assert_eq!(opacity.segments[0].to, StyleValue::Number(0.0));
    assert_eq!(opacity.to_value(), Some(&StyleValue::Number(1.0)));

    timeline.apply_calls(&mut doc);
    assert_eq!(doc.inline_style(label, "width").as_deref(), Some("120px"));
    Ok(())
}

#[test]
fn transformed_elements_run_on_the_native_animation() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let item = items[0];
    doc.set_style(item, "transform", "rotate(10deg)");
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());

    let result = transition
        .update(
            &mut doc,
            &mut backend,
            |doc: &mut MemoryDocument| doc.set_frame(item, item_frame(4)),
            AnimationParams::default(),
        )
        .context("root should be recorded")?;
    assert_eq!(result.groups.transformed, vec![item]);

    let native = backend.last_native().context("native animation")?;
    assert_eq!(native.targets.len(), 1);
    assert_eq!(native.targets[0].element, item);
    let timeline = backend.last_timeline().context("timeline")?;
    assert_eq!(timeline.synced, vec![(native.id, 0.0)]);
    // Translate runs on the native animation, not on the timeline.
    assert!(timeline.tweens_for(item).all(|tween| tween.track("translate").is_none()));

    transition.finish(&mut doc, FinishReason::Completed);
    assert_eq!(doc.inline_style(item, "transform").as_deref(), Some("rotate(10deg)"));
    let native = backend.last_native().context("native animation")?;
    assert_eq!(native.state, PlayState::Cancelled);
    Ok(())
}

#[test]
fn revert_completes_and_forgets_everything() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let (calls, on_complete) = counter();
    let mut backend = PlanRecorder::new();
    let config = TransitionConfig::default().on_complete(on_complete);
    let mut transition = Transition::new(&mut doc, root, config);
    assert!(doc.attribute(items[0], LAYOUT_ID_ATTRIBUTE).is_some());

    transition.update(
        &mut doc,
        &mut backend,
        |doc: &mut MemoryDocument| doc.set_frame(items[0], item_frame(2)),
        AnimationParams::default(),
    );
    transition.revert(&mut doc);

    assert_eq!(calls.get(), 1);
    assert_eq!(backend.plan().timelines[0].state, PlayState::Completed);
    assert!(transition.old_state().is_empty());
    assert!(transition.new_state().is_empty());
    assert!(transition.reconciliation().is_none());
    assert_eq!(doc.attribute(items[0], LAYOUT_ID_ATTRIBUTE), None);
    assert_eq!(doc.inline_style(items[0], "position"), None);

    transition.on_frame(&mut doc);
    assert_eq!(transition.muted_transitions(), 0);
    assert_eq!(transition.pending_frame_tasks(), 0);
    Ok(())
}

#[test]
fn missing_root_gives_an_inert_transition() {
    let (mut doc, _, _) = row(ReflowMode::Fixed, 1);
    let mut backend = PlanRecorder::new();
    let mut transition: Transition<rune_autolayout::ElementId> =
        Transition::from_selector(&mut doc, "#nowhere", TransitionConfig::default());

    assert!(transition.root().is_none());
    assert!(
        transition
            .animate(&mut doc, &mut backend, AnimationParams::default())
            .is_none()
    );
    assert!(backend.plan().timelines.is_empty());

    let found = Transition::from_selector(&mut doc, ".root", TransitionConfig::default());
    assert!(found.root().is_some());
    assert_eq!(found.old_state().len(), 2);
}

#[test]
fn scroll_position_is_restored_on_the_next_frame() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());
    let start = doc.scroll_offset();

    transition.update(
        &mut doc,
        &mut backend,
        |doc: &mut MemoryDocument| {
            doc.set_frame(items[1], item_frame(3));
            doc.scroll_to(rune_autolayout::layout::ScrollOffset { x: 0.0, y: 80.0 });
        },
        AnimationParams::default(),
    );
    assert_eq!(transition.pending_frame_tasks(), 1);

    transition.on_frame(&mut doc);
    assert_eq!(doc.scroll_offset(), start);
    Ok(())
}

#[test]
fn clearing_the_recorder_mid_animation_is_harmless() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());

    transition.update(
        &mut doc,
        &mut backend,
        |doc: &mut MemoryDocument| doc.set_frame(items[0], item_frame(3)),
        AnimationParams::default(),
    );
    assert!(transition.is_animating());
    backend.clear();

    transition.record(&mut doc);
    assert!(!transition.is_animating());
    assert!(backend.plan().timelines.is_empty());
    assert_eq!(doc.inline_style(items[0], "position"), None);

    transition.revert(&mut doc);
    assert!(backend.plan().native.is_empty());
    Ok(())
}

#[test]
fn recording_mid_animation_measures_the_current_frame() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let item = items[1];
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());

    transition.update(
        &mut doc,
        &mut backend,
        |doc: &mut MemoryDocument| doc.set_frame(item, item_frame(3)),
        AnimationParams::default(),
    );
    // Values a running tween would have written halfway through.
    doc.set_inline_style(item, "translate", "25px 0px");
    doc.set_inline_style(item, "width", "60px");
    let current = doc.layout_box(item);
    let origin = doc.layout_box(root);

    transition.record(&mut doc);

    let recorded = transition
        .old_state()
        .get(&doc, item)
        .context("item recorded")?;
    assert_eq!(recorded.x, current.left - origin.left);
    assert_eq!(recorded.width, 60.0);
    assert_eq!(backend.plan().timelines[0].state, PlayState::Cancelled);
    assert!(!transition.is_animating());
    assert_eq!(doc.inline_style(item, "position"), None);
    Ok(())
}
