use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Placeholder for values the ephemeris could not provide.
pub const UNAVAILABLE: &str = "N/A";

/// How an exact zero from the ephemeris is rendered.
///
/// Responses have historically treated zero as "no value"; `Numeric` renders
/// it as a number like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroValuePolicy {
    #[default]
    Unavailable,
    Numeric,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid zero value policy: {0:?}. Expected \"unavailable\" or \"numeric\"")]
pub struct ParsePolicyError(String);

impl FromStr for ZeroValuePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unavailable" => Ok(ZeroValuePolicy::Unavailable),
            "numeric" => Ok(ZeroValuePolicy::Numeric),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

impl fmt::Display for ZeroValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroValuePolicy::Unavailable => f.write_str("unavailable"),
            ZeroValuePolicy::Numeric => f.write_str("numeric"),
        }
    }
}

/// Six fractional digits, or [`UNAVAILABLE`].
pub fn format_value(value: f64, policy: ZeroValuePolicy) -> String {
    if !value.is_finite() {
        return UNAVAILABLE.to_string();
    }
    if value == 0.0 && policy == ZeroValuePolicy::Unavailable {
        return UNAVAILABLE.to_string();
    }
    format!("{value:.6}")
}
