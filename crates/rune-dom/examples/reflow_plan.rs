//! Record a flex row, hide one item and print the animation plan as JSON.
//!
//! Run with: cargo run -p rune-dom --example reflow_plan

use rune_dom::{MemoryDocument, ReflowMode};
use rune_layout::{
    AnimationParams, FinishReason, LayoutHost, PlanRecorder, Rect, Transition, TransitionConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = MemoryDocument::new(ReflowMode::Flow);
    let row = doc.create_element("div");
    doc.append_child(doc.body(), row)?;
    doc.set_style(row, "display", "flex");
    doc.set_style(row, "gap", "8px");

    let mut items = Vec::new();
    for _ in 0..4 {
        let item = doc.create_element("div");
        doc.set_frame(item, Rect::new(0.0, 0.0, 64.0, 32.0));
        doc.append_child(row, item)?;
        items.push(item);
    }

    let mut backend = PlanRecorder::new();
    let mut transition = Transition::new(&mut doc, row, TransitionConfig::default());
    let hidden = items[1];
    if let Some(result) = transition.update(
        &mut doc,
        &mut backend,
        |doc: &mut MemoryDocument| doc.set_inline_style(hidden, "display", "none"),
        AnimationParams::default(),
    ) {
        for entry in &result.entries {
            println!("{:>8} {:?}", entry.id.as_str(), entry.kind);
        }
    }

    println!("{}", serde_json::to_string_pretty(&backend.plan())?);

    transition.finish(&mut doc, FinishReason::Completed);
    transition.on_frame(&mut doc);
    Ok(())
}
