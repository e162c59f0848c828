use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use serde::Deserialize;

use crate::domain::exercise::ExerciseEntry;
use crate::domain::{non_empty, ValidationError};

const LIBRARY_TOML: &str = include_str!("library.toml");

pub const CUSTOM_DESCRIPTION: &str = "Custom exercise";

#[derive(Debug, Clone, Deserialize)]
struct RawLibraryFile {
    #[serde(default)]
    equipment: Vec<String>,
    #[serde(default)]
    groups: Vec<RawMuscleGroup>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawMuscleGroup {
    muscle: String,
    #[serde(default)]
    exercises: Vec<RawExercise>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawExercise {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone)]
pub struct ExerciseLibrary {
    muscles: Vec<String>,
    builtin: Vec<ExerciseEntry>,
    equipment: Vec<String>,
}

#[derive(Debug)]
pub enum LibraryError {
    Toml(toml::de::Error),
    InvalidDefinition(String),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Toml(err) => write!(f, "invalid exercise library TOML: {}", err),
            LibraryError::InvalidDefinition(message) => {
                write!(f, "invalid exercise library: {}", message)
            }
        }
    }
}

impl Error for LibraryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LibraryError::Toml(err) => Some(err),
            LibraryError::InvalidDefinition(_) => None,
        }
    }
}

impl From<toml::de::Error> for LibraryError {
    fn from(value: toml::de::Error) -> Self {
        LibraryError::Toml(value)
    }
}

impl ExerciseLibrary {
    pub fn load() -> Result<Self, LibraryError> {
        Self::from_toml(LIBRARY_TOML)
    }

    pub(crate) fn from_toml(raw: &str) -> Result<Self, LibraryError> {
        let file: RawLibraryFile = toml::from_str(raw)?;
        if file.groups.is_empty() {
            return Err(LibraryError::InvalidDefinition(
                "at least one muscle group must be defined".to_string(),
            ));
        }

        let mut muscles = Vec::with_capacity(file.groups.len());
        let mut builtin = Vec::new();
        let mut seen = HashSet::new();
        for group in file.groups {
            let Some(muscle) = non_empty(&group.muscle).map(str::to_string) else {
                return Err(LibraryError::InvalidDefinition(
                    "muscle group name cannot be empty".to_string(),
                ));
            };
            for exercise in group.exercises {
                let key = (muscle.to_ascii_lowercase(), exercise.name.to_ascii_lowercase());
                if !seen.insert(key) {
                    return Err(LibraryError::InvalidDefinition(format!(
                        "duplicate exercise '{}' in group '{}'",
                        exercise.name, muscle
                    )));
                }
                builtin.push(ExerciseEntry {
                    name: exercise.name,
                    primary_muscle: muscle.clone(),
                    description: exercise.description,
                    custom: false,
                });
            }
            muscles.push(muscle);
        }

        Ok(Self {
            muscles,
            builtin,
            equipment: file.equipment,
        })
    }

    pub fn muscles(&self) -> &[String] {
        &self.muscles
    }

    pub fn equipment(&self) -> &[String] {
        &self.equipment
    }

    /// Built-in catalog followed by the user's custom exercises.
    pub fn all(&self, custom: &[ExerciseEntry]) -> Vec<ExerciseEntry> {
        self.builtin.iter().chain(custom).cloned().collect()
    }

    pub fn by_muscle(&self, custom: &[ExerciseEntry], muscle: &str) -> Vec<ExerciseEntry> {
        let wanted = muscle.trim();
        self.all(custom)
            .into_iter()
            .filter(|entry| entry.primary_muscle.eq_ignore_ascii_case(wanted))
            .collect()
    }
}

pub fn custom_exercise(
    name: &str,
    muscle: &str,
    description: Option<&str>,
) -> Result<ExerciseEntry, ValidationError> {
    let name =
        non_empty(name).ok_or_else(|| ValidationError::new("exercise name cannot be empty"))?;
    let muscle =
        non_empty(muscle).ok_or_else(|| ValidationError::new("primary muscle cannot be empty"))?;
    Ok(ExerciseEntry {
        name: name.to_string(),
        primary_muscle: muscle.to_string(),
        description: description
            .and_then(non_empty)
            .unwrap_or(CUSTOM_DESCRIPTION)
            .to_string(),
        custom: true,
    })
}
