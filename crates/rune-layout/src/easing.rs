//! Easing descriptors.
//!
//! The layout engine never evaluates a curve. It only forwards an easing
//! descriptor to the scheduler, so this module is limited to naming, parsing
//! and printing the accepted forms:
//!
//! - `linear`
//! - `in`, `out`, `inOut`, `outIn` with an optional power, e.g. `inOut(3.5)`
//! - `cubicBezier(x1, y1, x2, y2)`
//! - `steps(n)` and `steps(n, start)`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LayoutError;

/// Power used when `in`/`out`/`inOut`/`outIn` is given without parentheses.
pub const DEFAULT_POWER: f32 = 1.675;

/// Which end(s) of the curve the acceleration applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EaseDirection {
    In,
    Out,
    InOut,
    OutIn,
}

impl EaseDirection {
    fn prefix(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "inOut",
            Self::OutIn => "outIn",
        }
    }

    /// Split a direction prefix off `name`, longest match first.
    fn split(name: &str) -> Option<(Self, &str)> {
        for direction in [Self::InOut, Self::OutIn, Self::In, Self::Out] {
            if let Some(rest) = name.strip_prefix(direction.prefix()) {
                return Some((direction, rest));
            }
        }
        None
    }
}

/// Step jump position for `steps(n, position)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    Start,
    #[default]
    End,
}

/// An easing descriptor handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    Linear,
    Power {
        direction: EaseDirection,
        power: f32,
    },
    CubicBezier {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Steps {
        count: u32,
        position: StepPosition,
    },
}

impl Default for Easing {
    /// `inOut(3.5)`, the default for layout transitions.
    fn default() -> Self {
        Self::Power {
            direction: EaseDirection::InOut,
            power: 3.5,
        }
    }
}

impl Easing {
    pub fn ease_in(power: f32) -> Self {
        Self::Power {
            direction: EaseDirection::In,
            power,
        }
    }

    pub fn ease_out(power: f32) -> Self {
        Self::Power {
            direction: EaseDirection::Out,
            power,
        }
    }

    pub fn in_out(power: f32) -> Self {
        Self::Power {
            direction: EaseDirection::InOut,
            power,
        }
    }
}

/// Split `name(args)` into `name` and the comma separated argument list.
fn split_call(input: &str) -> Option<(&str, Vec<&str>)> {
    let open = input.find('(')?;
    let inner = input[open + 1..].strip_suffix(')')?;
    let args = inner
        .split(',')
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .collect();
    Some((input[..open].trim(), args))
}

fn parse_f32(raw: &str, input: &str) -> Result<f32, LayoutError> {
    raw.parse::<f32>()
        .map_err(|_| LayoutError::InvalidEasing(input.to_string()))
}

impl FromStr for Easing {
    type Err = LayoutError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let invalid = || LayoutError::InvalidEasing(input.to_string());

        if trimmed == "linear" {
            return Ok(Self::Linear);
        }

        if let Some((name, args)) = split_call(trimmed) {
            return match name {
                "linear" if args.is_empty() => Ok(Self::Linear),
                "cubicBezier" => {
                    let [x1, y1, x2, y2] = args.as_slice() else {
                        return Err(invalid());
                    };
                    let (x1, x2) = (parse_f32(x1, input)?, parse_f32(x2, input)?);
                    if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
                        return Err(invalid());
                    }
                    Ok(Self::CubicBezier {
                        x1,
                        y1: parse_f32(y1, input)?,
                        x2,
                        y2: parse_f32(y2, input)?,
                    })
                }
                "steps" => {
                    let count = args
                        .first()
                        .and_then(|raw| raw.parse::<u32>().ok())
                        .filter(|count| *count >= 1)
                        .ok_or_else(invalid)?;
                    let position = match args.get(1).copied() {
                        None | Some("end") => StepPosition::End,
                        Some("start") => StepPosition::Start,
                        Some(_) => return Err(invalid()),
                    };
                    Ok(Self::Steps { count, position })
                }
                _ => {
                    let (direction, rest) = EaseDirection::split(name).ok_or_else(invalid)?;
                    if !rest.is_empty() {
                        return Err(invalid());
                    }
                    let power = match args.as_slice() {
                        [] => DEFAULT_POWER,
                        [raw] => parse_f32(raw, input)?,
                        _ => return Err(invalid()),
                    };
                    Ok(Self::Power { direction, power })
                }
            };
        }

        match EaseDirection::split(trimmed) {
            Some((direction, "")) => Ok(Self::Power {
                direction,
                power: DEFAULT_POWER,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Power { direction, power } => write!(f, "{}({power})", direction.prefix()),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubicBezier({x1}, {y1}, {x2}, {y2})")
            }
            Self::Steps { count, position } => match position {
                StepPosition::End => write!(f, "steps({count})"),
                StepPosition::Start => write!(f, "steps({count}, start)"),
            },
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.to_string()
    }
}
