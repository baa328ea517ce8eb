/// Example program to print the loaded layout configuration
///
/// Run with: cargo run -p rune-config --example print_config

fn main() {
    // Load configuration from rune.toml
    let config = rune_config::RuneConfig::load();
    let layout = &config.layout;

    println!("=== Rune Layout Configuration ===\n");

    println!("Timing:");
    println!("  Duration: {} ms", layout.duration_ms);
    println!("  Delay: {} ms", layout.delay_ms);
    println!("  Ease: {}", layout.ease);
    println!();

    println!("Selection:");
    println!("  Children: {:?}", layout.children);
    println!("  Extra Properties: {:?}", layout.properties);
    println!("  Size Tolerance: {} px", layout.size_tolerance);
    println!();

    println!("States:");
    println!("  Added: {:?}", layout.added);
    println!("  Removed: {:?}", layout.removed);
    println!("  Frozen: {:?}", layout.frozen);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
