//! Rune layout configuration
//!
//! Loads layout transition defaults from `rune.toml`, with environment
//! variable overrides for quick experiments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading `rune.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuneConfig {
    /// Layout transition settings
    pub layout: LayoutConfig,
}

/// A style value in a state table, e.g. `opacity = 0` or `scale = "0.5"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Number(f64),
    Text(String),
}

/// Layout transition defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Selector for the animated children (default: every element under the root)
    pub children: Option<String>,
    /// Duration of each node's animation in milliseconds
    pub duration_ms: f32,
    /// Delay before each node's animation in milliseconds
    pub delay_ms: f32,
    /// Easing name, e.g. "inOut(3.5)", "out(2)", "linear"
    pub ease: String,
    /// Extra style properties to track besides opacity and border-radius
    pub properties: Vec<String>,
    /// Start state of added elements (empty: `opacity = 0`)
    pub added: BTreeMap<String, StateValue>,
    /// End state of removed elements (empty: `opacity = 0`)
    pub removed: BTreeMap<String, StateValue>,
    /// Midpoint state of frozen children (empty: `opacity = 0`)
    pub frozen: BTreeMap<String, StateValue>,
    /// Width/height change in pixels below which a node is not resized
    pub size_tolerance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            children: None,
            duration_ms: 500.0,
            delay_ms: 0.0,
            ease: "inOut(3.5)".to_string(),
            properties: Vec::new(),
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
            frozen: BTreeMap::new(),
            size_tolerance: 1.0,
        }
    }
}

impl RuneConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from the default location (rune.toml in the current directory)
    /// or return default configuration if file doesn't exist
    pub fn load_or_default() -> Self {
        Self::load_from_file("rune.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Unparseable numbers are ignored.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("RUNE_LAYOUT_DURATION") {
            if let Ok(ms) = val.parse::<f32>() {
                self.layout.duration_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("RUNE_LAYOUT_DELAY") {
            if let Ok(ms) = val.parse::<f32>() {
                self.layout.delay_ms = ms;
            }
        }
        if let Ok(ease) = std::env::var("RUNE_LAYOUT_EASE") {
            self.layout.ease = ease;
        }
        if let Ok(children) = std::env::var("RUNE_LAYOUT_CHILDREN") {
            self.layout.children = Some(children);
        }
        if let Ok(val) = std::env::var("RUNE_LAYOUT_SIZE_TOLERANCE") {
            if let Ok(tolerance) = val.parse::<f64>() {
                self.layout.size_tolerance = tolerance;
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from rune.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
