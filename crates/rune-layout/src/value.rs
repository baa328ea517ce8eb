//! Style values, per-node value resolvers and timing parameters.
//!
//! Computed styles arrive from the host as strings. Anything that parses as a
//! bare number is kept as `StyleValue::Number` so `"1"` and `1.0` compare equal;
//! everything else (`"8px"`, `"none"`, `"matrix(...)"`) stays textual.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::ids::LayoutId;

/// A recorded or target style value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),
}

impl StyleValue {
    /// Parse a computed style string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => {
                let numeric = text.trim().trim_end_matches("px");
                numeric.parse::<f64>().ok()
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<rune_config::StateValue> for StyleValue {
    fn from(value: rune_config::StateValue) -> Self {
        match value {
            rune_config::StateValue::Number(n) => Self::Number(n),
            rune_config::StateValue::Text(t) => Self::parse(&t),
        }
    }
}

/// Context handed to per-node resolvers: the node's stable id and its position
/// in the depth-first order of the snapshot it was recorded in.
#[derive(Debug, Clone, Copy)]
pub struct ValueContext<'a> {
    pub id: &'a LayoutId,
    pub index: usize,
    pub total: usize,
}

pub type ValueFn = Arc<dyn Fn(&ValueContext<'_>) -> StyleValue + Send + Sync>;
pub type TimingFn = Arc<dyn Fn(&ValueContext<'_>) -> f32 + Send + Sync>;

/// A state parameter: either a constant or resolved per node.
#[derive(Clone)]
pub enum ParamValue {
    Fixed(StyleValue),
    PerNode(ValueFn),
}

impl ParamValue {
    pub fn per_node<F>(f: F) -> Self
    where
        F: Fn(&ValueContext<'_>) -> StyleValue + Send + Sync + 'static,
    {
        Self::PerNode(Arc::new(f))
    }

    pub fn resolve(&self, ctx: &ValueContext<'_>) -> StyleValue {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::PerNode(f) => f(ctx),
        }
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::PerNode(_) => f.write_str("PerNode(..)"),
        }
    }
}

impl From<StyleValue> for ParamValue {
    fn from(value: StyleValue) -> Self {
        Self::Fixed(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Fixed(StyleValue::Number(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Fixed(StyleValue::from(value))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Fixed(StyleValue::Text(value))
    }
}

/// Property overrides applied to a node's start or end state
/// (the `added`, `removed` and `frozen` parameters).
#[derive(Debug, Clone, Default)]
pub struct StateParams {
    values: BTreeMap<String, ParamValue>,
}

impl StateParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `{opacity: 0}` default used for added, removed and frozen nodes.
    pub fn transparent() -> Self {
        Self::new().with("opacity", 0.0_f64)
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(property.into(), value.into());
        self
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(property.into(), value.into());
    }

    pub fn get(&self, property: &str) -> Option<&ParamValue> {
        self.values.get(property)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge `self` over `defaults`; entries in `self` win.
    pub fn merged_over(&self, defaults: &StateParams) -> StateParams {
        let mut values = defaults.values.clone();
        for (name, value) in &self.values {
            values.insert(name.clone(), value.clone());
        }
        StateParams { values }
    }
}

impl From<BTreeMap<String, rune_config::StateValue>> for StateParams {
    fn from(map: BTreeMap<String, rune_config::StateValue>) -> Self {
        let values = map
            .into_iter()
            .map(|(k, v)| (k, ParamValue::Fixed(v.into())))
            .collect();
        Self { values }
    }
}

/// Delay or duration in milliseconds, constant or per node.
#[derive(Clone)]
pub enum Timing {
    Fixed(f32),
    PerNode(TimingFn),
}

impl Timing {
    pub fn per_node<F>(f: F) -> Self
    where
        F: Fn(&ValueContext<'_>) -> f32 + Send + Sync + 'static,
    {
        Self::PerNode(Arc::new(f))
    }

    /// Stagger by index: `base + index * step`.
    pub fn stagger(base: f32, step: f32) -> Self {
        Self::per_node(move |ctx| base + ctx.index as f32 * step)
    }

    pub fn resolve(&self, ctx: &ValueContext<'_>) -> f32 {
        match self {
            Self::Fixed(ms) => *ms,
            Self::PerNode(f) => f(ctx),
        }
    }
}

impl fmt::Debug for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(ms) => f.debug_tuple("Fixed").field(ms).finish(),
            Self::PerNode(_) => f.write_str("PerNode(..)"),
        }
    }
}

impl From<f32> for Timing {
    fn from(ms: f32) -> Self {
        Self::Fixed(ms)
    }
}

/// Format a pixel length for an inline style.
pub(crate) fn px(value: f64) -> String {
    format!("{value}px")
}

/// Format a `translate` inline value.
pub(crate) fn translate(x: f64, y: f64) -> String {
    format!("{x}px {y}px")
}
