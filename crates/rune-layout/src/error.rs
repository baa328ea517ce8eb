//! Error types for the layout engine.
//!
//! Measurement and tracking problems never surface here: they are logged and
//! degrade to "no animation for this element". Only configuration input can
//! fail.

use thiserror::Error;

/// Result type for layout configuration.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors raised while building transition options.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// An easing string did not match any accepted form.
    #[error("invalid easing: {0}")]
    InvalidEasing(String),

    /// Loading `rune.toml` failed.
    #[error("configuration error: {0}")]
    Config(#[from] rune_config::ConfigError),
}
