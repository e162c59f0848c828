use std::error::Error;
use std::fmt;
use std::path::Path;

use rusqlite::Connection;
use serde::de::DeserializeOwned;

use crate::clock::now_utc_rfc3339;
use crate::db;
use crate::domain::backup::BackupMetadata;
use crate::domain::exercise::ExerciseEntry;
use crate::domain::folder::Folder;
use crate::domain::routine::Routine;
use crate::domain::settings::Settings;
use crate::domain::workout::Workout;

/// Everything the tracker persists, loaded once and kept in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreData {
    pub routines: Vec<Routine>,
    pub workouts: Vec<Workout>,
    pub folders: Vec<Folder>,
    pub custom_exercises: Vec<ExerciseEntry>,
    pub settings: Settings,
    pub backup: BackupMetadata,
    pub active_workout: Option<Workout>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    Routines,
    Workouts,
    Folders,
    CustomExercises,
    Settings,
    BackupData,
    ActiveWorkout,
}

impl DocumentKey {
    pub const ALL: [DocumentKey; 7] = [
        DocumentKey::Routines,
        DocumentKey::Workouts,
        DocumentKey::Folders,
        DocumentKey::CustomExercises,
        DocumentKey::Settings,
        DocumentKey::BackupData,
        DocumentKey::ActiveWorkout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKey::Routines => "routines",
            DocumentKey::Workouts => "workouts",
            DocumentKey::Folders => "folders",
            DocumentKey::CustomExercises => "customExercises",
            DocumentKey::Settings => "settings",
            DocumentKey::BackupData => "backupData",
            DocumentKey::ActiveWorkout => "activeWorkout",
        }
    }

    fn encode(self, data: &StoreData) -> serde_json::Result<String> {
        match self {
            DocumentKey::Routines => serde_json::to_string(&data.routines),
            DocumentKey::Workouts => serde_json::to_string(&data.workouts),
            DocumentKey::Folders => serde_json::to_string(&data.folders),
            DocumentKey::CustomExercises => serde_json::to_string(&data.custom_exercises),
            DocumentKey::Settings => serde_json::to_string(&data.settings),
            DocumentKey::BackupData => serde_json::to_string(&data.backup),
            DocumentKey::ActiveWorkout => serde_json::to_string(&data.active_workout),
        }
    }
}

pub struct Store {
    conn: Connection,
    data: StoreData,
    save_attempts: u32,
}

impl Store {
    pub fn open(path: &str, save_attempts: u32) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = db::open_connection(path)?;
        let data = load(&conn)?;
        Ok(Self {
            conn,
            data,
            save_attempts: save_attempts.max(1),
        })
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// Applies `change` to a copy of the data, writes the touched documents in
    /// one transaction, and only then swaps the copy in. Any error leaves the
    /// in-memory data exactly as it was.
    pub fn mutate<T, E, F>(&mut self, keys: &[DocumentKey], change: F) -> Result<T, E>
    where
        F: FnOnce(&mut StoreData) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut staged = self.data.clone();
        let value = change(&mut staged)?;
        let bodies = encode_documents(&staged, keys)?;
        self.persist(&bodies)?;
        self.data = staged;
        Ok(value)
    }

    /// Rewrites every document from memory.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let bodies = encode_documents(&self.data, &DocumentKey::ALL)?;
        self.persist(&bodies)
    }

    fn persist(&mut self, bodies: &[(DocumentKey, String)]) -> Result<(), StoreError> {
        let mut attempt = 1;
        loop {
            match write_documents(&mut self.conn, bodies) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.save_attempts => {
                    log::warn!(
                        "saving {} document(s) failed on attempt {}/{}: {}",
                        bodies.len(),
                        attempt,
                        self.save_attempts,
                        err
                    );
                    attempt += 1;
                }
                Err(err) => {
                    log::error!(
                        "giving up saving after {} attempt(s): {}",
                        self.save_attempts,
                        err
                    );
                    return Err(StoreError::Db(err));
                }
            }
        }
    }
}

fn encode_documents(
    data: &StoreData,
    keys: &[DocumentKey],
) -> Result<Vec<(DocumentKey, String)>, StoreError> {
    let mut bodies = Vec::with_capacity(keys.len());
    for key in keys {
        if bodies.iter().any(|(seen, _)| seen == key) {
            continue;
        }
        bodies.push((*key, key.encode(data)?));
    }
    Ok(bodies)
}

fn write_documents(
    conn: &mut Connection,
    bodies: &[(DocumentKey, String)],
) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    let updated_at = now_utc_rfc3339();
    for (key, body) in bodies {
        db::put_document(&tx, key.as_str(), body, &updated_at)?;
    }
    tx.commit()
}

fn load(conn: &Connection) -> Result<StoreData, StoreError> {
    Ok(StoreData {
        routines: load_document(conn, DocumentKey::Routines)?,
        workouts: load_document(conn, DocumentKey::Workouts)?,
        folders: load_document(conn, DocumentKey::Folders)?,
        custom_exercises: load_document(conn, DocumentKey::CustomExercises)?,
        settings: load_document(conn, DocumentKey::Settings)?,
        backup: load_document(conn, DocumentKey::BackupData)?,
        active_workout: load_document(conn, DocumentKey::ActiveWorkout)?,
    })
}

fn load_document<T>(conn: &Connection, key: DocumentKey) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    let Some(body) = db::get_document(conn, key.as_str())? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(err) => {
            log::warn!(
                "document '{}' could not be read ({}); starting from defaults",
                key.as_str(),
                err
            );
            Ok(T::default())
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
            StoreError::Db(err) => write!(f, "database error: {}", err),
            StoreError::Json(err) => write!(f, "document encoding error: {}", err),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Db(err) => Some(err),
            StoreError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Db(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Json(value)
    }
}
