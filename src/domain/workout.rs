use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::routine::ExerciseSpec;
use super::{lenient_count, lenient_weight, non_negative, whole_count};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Easy,
    Hard,
    Failure,
}

impl Effort {
    pub fn as_str(self) -> &'static str {
        match self {
            Effort::Easy => "easy",
            Effort::Hard => "hard",
            Effort::Failure => "failure",
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effort {
    type Err = ParseEffortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" | "e" => Ok(Effort::Easy),
            "hard" | "h" => Ok(Effort::Hard),
            "failure" | "fail" | "f" => Ok(Effort::Failure),
            _ => Err(ParseEffortError {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEffortError {
    value: String,
}

impl fmt::Display for ParseEffortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown effort '{}', expected one of easy, hard, failure or none",
            self.value
        )
    }
}

impl Error for ParseEffortError {}

/// Copy of an [`ExerciseSpec`] frozen into a workout record. Kept as its own
/// type so later routine edits never leak into history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSnapshot {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "equipamiento")]
    pub equipment: String,
    #[serde(alias = "series_objetivo", deserialize_with = "lenient_count")]
    pub target_sets: u32,
    #[serde(alias = "repeticiones_objetivo", deserialize_with = "lenient_count")]
    pub target_reps: u32,
    #[serde(default, alias = "peso_objetivo", deserialize_with = "lenient_weight")]
    pub target_weight: f64,
    #[serde(default, alias = "observaciones")]
    pub notes: String,
}

impl From<&ExerciseSpec> for ExerciseSnapshot {
    fn from(spec: &ExerciseSpec) -> Self {
        Self {
            name: spec.name.clone(),
            equipment: spec.equipment.clone(),
            target_sets: spec.target_sets,
            target_reps: spec.target_reps,
            target_weight: spec.target_weight,
            notes: spec.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    #[serde(deserialize_with = "lenient_weight")]
    pub weight: f64,
    #[serde(deserialize_with = "lenient_count")]
    pub reps: u32,
    #[serde(default)]
    pub effort: Option<Effort>,
}

impl SetEntry {
    pub fn is_rated(&self) -> bool {
        self.effort.is_some()
    }

    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }

    pub fn apply(&mut self, update: SetUpdate) {
        match update {
            SetUpdate::Weight(weight) => self.weight = weight,
            SetUpdate::Reps(reps) => self.reps = reps,
            SetUpdate::Effort(effort) => self.effort = effort,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutExercise {
    #[serde(flatten)]
    pub exercise: ExerciseSnapshot,
    pub sets: Vec<SetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub routine_id: String,
    pub routine_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub exercises: Vec<WorkoutExercise>,
}

/// A single-field change to one logged set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetUpdate {
    Weight(f64),
    Reps(u32),
    Effort(Option<Effort>),
}

impl SetUpdate {
    /// Lenient weight input: anything unparsable, negative or non-finite
    /// becomes 0.
    pub fn weight_from_input(raw: &str) -> Self {
        SetUpdate::Weight(non_negative(parse_or_zero(raw)))
    }

    /// Lenient reps input, truncated to a whole number.
    pub fn reps_from_input(raw: &str) -> Self {
        SetUpdate::Reps(whole_count(parse_or_zero(raw)))
    }

    /// `none` or an empty string clears the rating.
    pub fn effort_from_input(raw: &str) -> Result<Self, ParseEffortError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(SetUpdate::Effort(None));
        }
        Ok(SetUpdate::Effort(Some(Effort::from_str(trimmed)?)))
    }
}

fn parse_or_zero(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}
