mod common;

use std::fs;

use anyhow::{Context, Result};
use rune_autolayout::dom::{MemoryDocument, ReflowMode};
use rune_autolayout::layout::{
    AnimationParams, Easing, PlanRecorder, StyleValue, Timing, Transition, TransitionConfig,
};
use rune_autolayout::{LayoutHost, RuneConfig};

use common::{item_frame, row};

const RUNE_TOML: &str = r#"
[layout]
children = ".item"
duration_ms = 300
delay_ms = 20
ease = "out(2)"
properties = ["color"]
size_tolerance = 2.0

[layout.added]
opacity = 0
scale = "0.5"
"#;

#[test]
fn rune_toml_drives_transition_defaults() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rune.toml");
    fs::write(&path, RUNE_TOML)?;

    let config = RuneConfig::load_from_file(&path)?;
    let transition_config = TransitionConfig::from_config(&config.layout)?;
    assert_eq!(transition_config.ease, Easing::ease_out(2.0));
    assert!(matches!(transition_config.duration, Timing::Fixed(ms) if ms == 300.0));
    assert_eq!(transition_config.size_tolerance, 2.0);
    assert!(
        transition_config
            .tracked_properties()
            .contains(&"scale".to_string())
    );

    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let extra = doc.create_element("div");
    doc.add_class_name(extra, "item");
    doc.set_frame(extra, item_frame(2));
    doc.set_style(extra, "scale", "1");
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, transition_config);

    let result = transition
        .update(
            &mut doc,
            &mut backend,
            |doc: &mut MemoryDocument| doc.append_child(root, extra).unwrap(),
            AnimationParams::default(),
        )
        .context("root should be recorded")?;
    let entry = result.entry_for(extra).context("extra entry")?;
    assert_eq!(entry.from.properties.get("scale"), Some(StyleValue::Number(0.5)));
    assert_eq!(entry.from.properties.get("opacity"), Some(StyleValue::Number(0.0)));
    assert_eq!(entry.duration, 300.0);
    assert_eq!(entry.delay, 20.0);

    let timeline = backend.last_timeline().context("timeline")?;
    assert_eq!(timeline.defaults.ease, Easing::ease_out(2.0));
    let timing = timeline.defaults.timing(&entry.id).context("timing")?;
    assert_eq!(timing.duration, 300.0);
    assert!(doc.attribute(items[0], "data-layout-id").is_some());
    Ok(())
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RuneConfig::load_from_file(dir.path().join("missing.toml")).unwrap_err();
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn per_call_params_override_the_config() -> Result<()> {
    let (mut doc, root, items) = row(ReflowMode::Fixed, 2);
    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, root, TransitionConfig::default());

    let result = transition
        .update(
            &mut doc,
            &mut backend,
            |doc: &mut MemoryDocument| doc.set_frame(items[1], item_frame(3)),
            AnimationParams::default()
                .duration(Timing::stagger(100.0, 50.0))
                .ease(Easing::Linear),
        )
        .context("root should be recorded")?;

    let durations: Vec<f32> = result.entries.iter().map(|entry| entry.duration).collect();
    assert_eq!(durations, vec![100.0, 150.0, 200.0]);

    let timeline = backend.last_timeline().context("timeline")?;
    assert_eq!(timeline.defaults.ease, Easing::Linear);
    let json = serde_json::to_value(&timeline)?;
    assert_eq!(json["state"], "initialized");
    Ok(())
}
