mod common;

use std::collections::HashSet;

use anyhow::{Context, Result};
use rune_autolayout::dom::{MemoryDocument, ReflowMode};
use rune_autolayout::layout::{
    AnimationParams, ChangeKind, LayoutHost, PlanRecorder, Rect, Reconciler, StateParams, Timing,
    Transition, TransitionConfig,
};

use common::row;

#[test]
fn recording_twice_without_mutation_finds_no_changes() -> Result<()> {
    let (mut doc, root, _) = row(ReflowMode::Flow, 4);
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());

    let result = transition
        .update(&mut doc, &mut backend, |_: &mut MemoryDocument| {}, AnimationParams::default())
        .context("root should be recorded")?;

    assert_eq!(result.entries.len(), 5);
    assert_eq!(result.count(ChangeKind::Unchanged), 5);
    assert!(result.groups.animated.is_empty());
    assert!(result.groups.added.is_empty());
    assert!(result.groups.removed.is_empty());
    Ok(())
}

#[test]
fn standing_transforms_are_not_changes() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Flow, 3);
    doc.set_style(items[1], "transform", "rotate(10deg)");
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());

    let result = transition
        .update(&mut doc, &mut backend, |_: &mut MemoryDocument| {}, AnimationParams::default())
        .context("root should be recorded")?;

    assert_eq!(result.count(ChangeKind::Unchanged), 4);
    assert!(result.groups.transformed.is_empty());
    assert!(result.entries.iter().all(|e| !e.flags.property_changed));
    assert!(result.entries.iter().all(|e| !e.flags.is_animated));
    assert!(backend.last_native().is_none());
    Ok(())
}

#[test]
fn snapshot_diffed_against_itself_is_unchanged() {
    let (mut doc, root, _) = row(ReflowMode::Fixed, 3);
    let transition = Transition::new(&mut doc, root, TransitionConfig::default());
    let snapshot = transition.old_state();

    let reconciler = Reconciler {
        delay: &Timing::Fixed(0.0),
        duration: &Timing::Fixed(500.0),
        added: &StateParams::transparent(),
        removed: &StateParams::transparent(),
        size_tolerance: 1.0,
    };
    let result = reconciler.reconcile(snapshot, snapshot, &HashSet::new());

    assert_eq!(result.entries.len(), snapshot.len());
    assert!(result.entries.iter().all(|e| e.kind == ChangeKind::Unchanged));
    assert!(result.entries.iter().all(|e| !e.flags.is_animated));
}

#[test]
fn local_offsets_add_up_to_absolute_positions() -> Result<()> {
    let mut doc = MemoryDocument::new(ReflowMode::Fixed);
    let root = doc.create_element("div");
    let card = doc.create_element("div");
    let label = doc.create_element("div");
    doc.append_child(doc.body(), root)?;
    doc.append_child(root, card)?;
    doc.append_child(card, label)?;
    doc.set_frame(root, Rect::new(20.0, 30.0, 300.0, 300.0));
    doc.set_frame(card, Rect::new(10.0, 10.0, 200.0, 200.0));
    doc.set_frame(label, Rect::new(5.0, 5.0, 50.0, 10.0));
    doc.set_style(card, "border-width", "2px");

    let transition = Transition::new(&mut doc, root, TransitionConfig::default());
    let snapshot = transition.old_state();

    for index in snapshot.node_order() {
        let node = snapshot.node(index).context("node")?;
        let Some(parent) = node.parent().and_then(|p| snapshot.node(p)) else {
            continue;
        };
        let (props, parent_props) = (node.properties(), parent.properties());
        assert_eq!(props.x, props.left - parent_props.left - parent_props.border_left);
        assert_eq!(props.y, props.top - parent_props.top - parent_props.border_top);
    }

    let root_props = snapshot.get(&doc, root).context("root")?.clone();
    let card_props = snapshot.get(&doc, card).context("card")?.clone();
    let label_props = snapshot.get(&doc, label).context("label")?.clone();
    assert_eq!(root_props.x, 0.0);
    assert_eq!(card_props.border_left, 2.0);

    let summed = label_props.x
        + card_props.border_left
        + card_props.x
        + root_props.border_left
        + root_props.left;
    assert!((summed - label_props.left).abs() < 1e-9);
    assert_eq!(label_props.left, 37.0);
    Ok(())
}

#[test]
fn no_node_is_both_added_and_removed() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Flow, 4);
    doc.set_inline_style(items[3], "display", "none");
    let extra = doc.create_element("div");
    doc.set_frame(extra, Rect::new(0.0, 0.0, 30.0, 20.0));
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());

    let hide = items[0];
    let reveal = items[3];
    let result = transition
        .update(
            &mut doc,
            &mut backend,
            |doc: &mut MemoryDocument| {
                doc.set_inline_style(hide, "display", "none");
                doc.remove_inline_style(reveal, "display");
                doc.append_child(root, extra).unwrap();
            },
            AnimationParams::default(),
        )
        .context("root should be recorded")?;

    assert_eq!(result.kind_of(hide), Some(ChangeKind::Removed));
    assert_eq!(result.kind_of(reveal), Some(ChangeKind::Added));
    assert_eq!(result.kind_of(extra), Some(ChangeKind::Added));
    for entry in &result.entries {
        assert!(
            !(entry.flags.top_level_added && entry.flags.top_level_removed),
            "{:?} flagged both added and removed",
            entry.element
        );
    }
    Ok(())
}

#[test]
fn size_changes_within_tolerance_are_not_resizes() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let item = items[0];
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());

    let result = transition
        .update(
            &mut doc,
            &mut backend,
            |doc: &mut MemoryDocument| doc.set_frame(item, Rect::new(0.0, 0.0, 51.0, 20.0)),
            AnimationParams::default(),
        )
        .context("root should be recorded")?;
    let entry = result.entry_for(item).context("item entry")?;
    assert!(!entry.flags.size_changed);
    assert_ne!(entry.kind, ChangeKind::Resized);

    let result = transition
        .update(
            &mut doc,
            &mut backend,
            |doc: &mut MemoryDocument| doc.set_frame(item, Rect::new(0.0, 0.0, 52.5, 20.0)),
            AnimationParams::default(),
        )
        .context("root should be recorded")?;
    let entry = result.entry_for(item).context("item entry")?;
    assert!(entry.flags.size_changed);
    assert_eq!(entry.kind, ChangeKind::Resized);
    Ok(())
}
