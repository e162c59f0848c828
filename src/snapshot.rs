//! Export documents and the import format detection.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::domain::exercise::ExerciseEntry;
use crate::domain::folder::Folder;
use crate::domain::routine::{Routine, RoutineDraft};
use crate::domain::settings::{Settings, SettingsPatch};
use crate::domain::workout::Workout;
use crate::store::StoreData;

pub const SNAPSHOT_VERSION: &str = "3.0";
pub const SUPPORTED_MAJOR_VERSION: u32 = 3;
pub const SINGLE_ROUTINE_TYPE: &str = "single_routine";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSnapshot {
    pub routines: Vec<Routine>,
    pub workouts: Vec<Workout>,
    pub folders: Vec<Folder>,
    pub custom_exercises: Vec<ExerciseEntry>,
    pub settings: Settings,
    #[serde(with = "time::serde::rfc3339")]
    pub export_date: OffsetDateTime,
    pub version: String,
}

impl FullSnapshot {
    pub fn capture(data: &StoreData, export_date: OffsetDateTime) -> Self {
        Self {
            routines: data.routines.clone(),
            workouts: data.workouts.clone(),
            folders: data.folders.clone(),
            custom_exercises: data.custom_exercises.clone(),
            settings: data.settings.clone(),
            export_date,
            version: SNAPSHOT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineSnapshot {
    pub routine: Routine,
    #[serde(with = "time::serde::rfc3339")]
    pub export_date: OffsetDateTime,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl RoutineSnapshot {
    pub fn capture(routine: &Routine, export_date: OffsetDateTime) -> Self {
        Self {
            routine: routine.clone(),
            export_date,
            version: SNAPSHOT_VERSION.to_string(),
            kind: SINGLE_ROUTINE_TYPE.to_string(),
        }
    }
}

/// A full-store document as accepted on import. Only `routines` and
/// `workouts` are required; other collections default to empty and settings
/// are merged over the current ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingFullSnapshot {
    pub routines: Vec<Routine>,
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub folders: Option<Vec<Folder>>,
    #[serde(default)]
    pub custom_exercises: Option<Vec<ExerciseEntry>>,
    #[serde(default)]
    pub settings: Option<SettingsPatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportDocument {
    SingleRoutine(RoutineDraft),
    Full(Box<IncomingFullSnapshot>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedFormat {
    reason: String,
}

impl UnrecognizedFormat {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for UnrecognizedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized import format: {}", self.reason)
    }
}

impl Error for UnrecognizedFormat {}

pub fn parse_json(raw: &str) -> Result<Value, UnrecognizedFormat> {
    serde_json::from_str(raw)
        .map_err(|err| UnrecognizedFormat::new(format!("not valid JSON ({})", err)))
}

pub fn parse_str(raw: &str) -> Result<ImportDocument, UnrecognizedFormat> {
    parse_document(&parse_json(raw)?)
}

pub fn parse_document(value: &Value) -> Result<ImportDocument, UnrecognizedFormat> {
    let Some(object) = value.as_object() else {
        return Err(UnrecognizedFormat::new("expected a JSON object"));
    };
    check_version(object.get("version"))?;

    let is_single_routine = object.get("type").and_then(Value::as_str) == Some(SINGLE_ROUTINE_TYPE);
    if let Some(routine) = object.get("routine").filter(|_| is_single_routine) {
        if !routine.is_null() {
            let draft = RoutineDraft::deserialize(routine).map_err(|err| {
                UnrecognizedFormat::new(format!("routine could not be read ({})", err))
            })?;
            return Ok(ImportDocument::SingleRoutine(draft));
        }
    }

    let has_collection = |key: &str| object.get(key).is_some_and(|value| !value.is_null());
    if has_collection("routines") && has_collection("workouts") {
        let snapshot = IncomingFullSnapshot::deserialize(value).map_err(|err| {
            UnrecognizedFormat::new(format!("backup could not be read ({})", err))
        })?;
        return Ok(ImportDocument::Full(Box::new(snapshot)));
    }

    Err(UnrecognizedFormat::new(
        "expected a single routine export or a full backup with routines and workouts",
    ))
}

fn check_version(version: Option<&Value>) -> Result<(), UnrecognizedFormat> {
    let Some(raw) = version.and_then(Value::as_str) else {
        return Ok(());
    };
    let major = raw
        .trim()
        .split('.')
        .next()
        .and_then(|major| major.parse::<u32>().ok());
    match major {
        Some(major) if major > SUPPORTED_MAJOR_VERSION => Err(UnrecognizedFormat::new(format!(
            "version {} is newer than this tool understands",
            raw
        ))),
        _ => Ok(()),
    }
}
