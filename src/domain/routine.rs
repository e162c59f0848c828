use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{lenient_count, lenient_weight, non_empty, ValidationError};

/// One planned exercise inside a routine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSpec {
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

impl ExerciseSpec {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if non_empty(&self.name).is_none() {
            return Err(ValidationError::new("exercise name cannot be empty"));
        }
        if self.target_sets == 0 {
            return Err(ValidationError::new(format!(
                "exercise '{}' needs at least one target set",
                self.name.trim()
            )));
        }
        if self.target_reps == 0 {
            return Err(ValidationError::new(format!(
                "exercise '{}' needs at least one target rep",
                self.name.trim()
            )));
        }
        if !self.target_weight.is_finite() || self.target_weight < 0.0 {
            return Err(ValidationError::new(format!(
                "exercise '{}' target weight must be zero or more",
                self.name.trim()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    pub exercises: Vec<ExerciseSpec>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The user-editable part of a routine, used for create, update and
/// single-routine import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoutineDraft {
    pub name: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ExerciseSpec>,
}

impl RoutineDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if non_empty(&self.name).is_none() {
            return Err(ValidationError::new("routine name cannot be empty"));
        }
        if self.exercises.is_empty() {
            return Err(ValidationError::new("routine needs at least one exercise"));
        }
        for exercise in &self.exercises {
            exercise.validate()?;
        }
        Ok(())
    }

    pub fn into_routine(self, id: String, created_at: OffsetDateTime) -> Routine {
        Routine {
            id,
            name: self.name.trim().to_string(),
            folder_id: self.folder_id,
            exercises: self.exercises,
            created_at,
        }
    }
}

impl From<&Routine> for RoutineDraft {
    fn from(routine: &Routine) -> Self {
        Self {
            name: routine.name.clone(),
            folder_id: routine.folder_id.clone(),
            exercises: routine.exercises.clone(),
        }
    }
}
