pub mod backup;
pub mod exercise;
pub mod folder;
pub mod routine;
pub mod settings;
pub mod workout;

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A record failed a save-time rule (empty name, no exercises, bad target).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ValidationError {}

pub fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Anything unparsable, negative or non-finite becomes 0.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Non-negative value truncated to a whole count, saturating at `u32::MAX`.
pub fn whole_count(value: f64) -> u32 {
    let value = non_negative(value).trunc();
    if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value as u32
    }
}

fn number_in(raw: &Value) -> f64 {
    match raw {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Stored weights read leniently: older files hold `null` for a blank field.
pub fn lenient_weight<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(non_negative(number_in(&raw)))
}

/// Stored counts read leniently: fractional reps are truncated, `null` is 0.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(whole_count(number_in(&raw)))
}
