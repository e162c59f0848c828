use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::backup_store::{BackupStore, SqliteBackupStore};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigError};
use crate::domain::exercise::ExerciseEntry;
use crate::domain::folder::Folder;
use crate::domain::routine::{Routine, RoutineDraft};
use crate::domain::settings::{ParseThemeError, Settings, SettingsPatch};
use crate::domain::workout::ParseEffortError;
use crate::domain::{non_empty, ValidationError};
use crate::folders::{self, FolderError, TreeRow};
use crate::ids::{generate_id, FOLDER_PREFIX, ROUTINE_PREFIX};
use crate::library::{self, ExerciseLibrary, LibraryError};
use crate::sample;
use crate::snapshot::UnrecognizedFormat;
use crate::store::{DocumentKey, Store, StoreData, StoreError};
use crate::workouts::SetLookupError;

mod backups;
mod sessions;

pub use backups::{ImportOutcome, ImportPreview};

pub const DATA_DIR_NAME: &str = ".gymlog";

/// Where the primary store, the backup store and the optional config file
/// live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub db_path: String,
    pub backup_db_path: String,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn under(data_dir: &Path) -> Self {
        let root = data_dir.join(DATA_DIR_NAME);
        Self {
            db_path: root.join("state.sqlite").to_string_lossy().into_owned(),
            backup_db_path: root.join("backups.sqlite").to_string_lossy().into_owned(),
            config_path: root.join("config.toml"),
        }
    }
}

pub struct App {
    store: Store,
    backups: Box<dyn BackupStore>,
    clock: Box<dyn Clock>,
    config: Config,
    library: ExerciseLibrary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineFilter<'a> {
    All,
    /// Routines without a folder, including those whose folder is gone.
    Root,
    Folder(&'a str),
}

impl App {
    pub fn open(paths: &AppPaths) -> Result<Self, AppError> {
        Self::open_with_clock(paths, Box::new(SystemClock))
    }

    pub fn open_with_clock(paths: &AppPaths, clock: Box<dyn Clock>) -> Result<Self, AppError> {
        let config = Config::load(&paths.config_path)?;
        let store = Store::open(&paths.db_path, config.store.save_attempts)?;
        let backups = SqliteBackupStore::open(&paths.backup_db_path)?;
        Self::from_parts(store, Box::new(backups), clock, config)
    }

    pub fn from_parts(
        store: Store,
        backups: Box<dyn BackupStore>,
        clock: Box<dyn Clock>,
        config: Config,
    ) -> Result<Self, AppError> {
        let library = ExerciseLibrary::load()?;
        Ok(Self {
            store,
            backups,
            clock,
            config,
            library,
        })
    }

    pub fn data(&self) -> &StoreData {
        self.store.data()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current time at millisecond precision, matching stored timestamps.
    pub fn now(&self) -> OffsetDateTime {
        let now = self.clock.now();
        now.replace_millisecond(now.millisecond()).unwrap_or(now)
    }

    pub fn create_folder(
        &mut self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Folder, AppError> {
        let name = non_empty(name)
            .ok_or_else(|| ValidationError::new("folder name cannot be empty"))?
            .to_string();
        let now = self.now();
        self.store.mutate(&[DocumentKey::Folders], |data| {
            if let Some(parent) = parent_id {
                if folders::find(&data.folders, parent).is_none() {
                    return Err(AppError::not_found("folder", parent));
                }
            }
            let id = generate_id(FOLDER_PREFIX, |candidate| {
                folders::find(&data.folders, candidate).is_some()
            });
            let folder = Folder {
                id,
                name,
                parent_id: parent_id.map(str::to_string),
                created_at: now,
            };
            data.folders.push(folder.clone());
            Ok(folder)
        })
    }

    pub fn rename_folder(&mut self, id: &str, name: &str) -> Result<Folder, AppError> {
        let name = non_empty(name)
            .ok_or_else(|| ValidationError::new("folder name cannot be empty"))?
            .to_string();
        self.store.mutate(&[DocumentKey::Folders], |data| {
            let folder = data
                .folders
                .iter_mut()
                .find(|folder| folder.id == id)
                .ok_or_else(|| AppError::not_found("folder", id))?;
            folder.name = name;
            Ok(folder.clone())
        })
    }

    pub fn move_folder(
        &mut self,
        id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<Folder, AppError> {
        self.store.mutate(&[DocumentKey::Folders], |data| {
            folders::move_folder(&mut data.folders, id, new_parent_id)?;
            folders::find(&data.folders, id)
                .cloned()
                .ok_or_else(|| AppError::not_found("folder", id))
        })
    }

    /// Child folders move up to the removed folder's parent; routines keep
    /// their (now dangling) folder id and show up at the root.
    pub fn delete_folder(&mut self, id: &str) -> Result<Folder, AppError> {
        let removed = self.store.mutate(&[DocumentKey::Folders], |data| {
            Ok::<_, AppError>(folders::remove_folder(&mut data.folders, id)?)
        })?;
        log::info!("deleted folder '{}' ({})", removed.name, removed.id);
        Ok(removed)
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        folders::find(&self.data().folders, id)
    }

    pub fn list_children(&self, parent_id: Option<&str>) -> Vec<&Folder> {
        folders::list_children(&self.data().folders, parent_id)
    }

    pub fn folder_path(&self, id: &str) -> Result<Vec<&Folder>, AppError> {
        if self.folder(id).is_none() {
            return Err(AppError::not_found("folder", id));
        }
        Ok(folders::path_to(&self.data().folders, id))
    }

    pub fn folder_tree(&self) -> Vec<TreeRow<'_>> {
        folders::flatten_tree(&self.data().folders)
    }

    /// Lenient read: a routine whose folder was deleted has no folder.
    pub fn routine_folder(&self, routine: &Routine) -> Option<&Folder> {
        folders::resolve(&self.data().folders, routine.folder_id.as_deref())
    }

    pub fn create_routine(&mut self, draft: RoutineDraft) -> Result<Routine, AppError> {
        draft.validate()?;
        let now = self.now();
        let routine = self.store.mutate(&[DocumentKey::Routines], |data| {
            ensure_folder_exists(data, draft.folder_id.as_deref())?;
            let id = generate_id(ROUTINE_PREFIX, |candidate| {
                data.routines.iter().any(|routine| routine.id == candidate)
            });
            let routine = draft.into_routine(id, now);
            data.routines.push(routine.clone());
            Ok::<_, AppError>(routine)
        })?;
        log::info!("created routine '{}' ({})", routine.name, routine.id);
        Ok(routine)
    }

    /// Replaces name, folder and exercises; id and creation time stay.
    pub fn update_routine(&mut self, id: &str, draft: RoutineDraft) -> Result<Routine, AppError> {
        draft.validate()?;
        self.store.mutate(&[DocumentKey::Routines], |data| {
            ensure_folder_exists(data, draft.folder_id.as_deref())?;
            let routine = data
                .routines
                .iter_mut()
                .find(|routine| routine.id == id)
                .ok_or_else(|| AppError::not_found("routine", id))?;
            let updated = draft.into_routine(routine.id.clone(), routine.created_at);
            *routine = updated.clone();
            Ok(updated)
        })
    }

    /// Past workouts keep their own copy of the routine and are untouched.
    pub fn delete_routine(&mut self, id: &str) -> Result<Routine, AppError> {
        self.store.mutate(&[DocumentKey::Routines], |data| {
            let index = data
                .routines
                .iter()
                .position(|routine| routine.id == id)
                .ok_or_else(|| AppError::not_found("routine", id))?;
            Ok(data.routines.remove(index))
        })
    }

    pub fn move_routine_to_folder(
        &mut self,
        id: &str,
        folder_id: Option<&str>,
    ) -> Result<Routine, AppError> {
        self.store.mutate(&[DocumentKey::Routines], |data| {
            ensure_folder_exists(data, folder_id)?;
            let routine = data
                .routines
                .iter_mut()
                .find(|routine| routine.id == id)
                .ok_or_else(|| AppError::not_found("routine", id))?;
            routine.folder_id = folder_id.map(str::to_string);
            Ok(routine.clone())
        })
    }

    pub fn routine(&self, id: &str) -> Option<&Routine> {
        self.data().routines.iter().find(|routine| routine.id == id)
    }

    pub fn list_routines(&self, filter: RoutineFilter<'_>) -> Vec<&Routine> {
        self.data()
            .routines
            .iter()
            .filter(|routine| match filter {
                RoutineFilter::All => true,
                RoutineFilter::Root => self.routine_folder(routine).is_none(),
                RoutineFilter::Folder(id) => routine.folder_id.as_deref() == Some(id),
            })
            .collect()
    }

    /// Exact id first, then a unique case-insensitive name.
    pub fn find_routine(&self, reference: &str) -> Result<&Routine, AppError> {
        let routines = &self.data().routines;
        let wanted = reference.trim();
        find_by_reference(
            "routine",
            reference,
            routines.iter().find(|routine| routine.id == wanted),
            routines
                .iter()
                .filter(|routine| routine.name.eq_ignore_ascii_case(wanted)),
        )
    }

    pub fn find_folder(&self, reference: &str) -> Result<&Folder, AppError> {
        let known = &self.data().folders;
        let wanted = reference.trim();
        find_by_reference(
            "folder",
            reference,
            folders::find(known, wanted),
            known
                .iter()
                .filter(|folder| folder.name.eq_ignore_ascii_case(wanted)),
        )
    }

    pub fn settings(&self) -> &Settings {
        &self.data().settings
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Settings, AppError> {
        if !patch.has_changes() {
            return Err(ValidationError::new("no settings to change").into());
        }
        self.store.mutate(&[DocumentKey::Settings], |data| {
            data.settings.merge(patch);
            Ok::<_, AppError>(data.settings.clone())
        })
    }

    pub fn library(&self) -> &ExerciseLibrary {
        &self.library
    }

    pub fn exercises(&self, muscle: Option<&str>) -> Vec<ExerciseEntry> {
        let custom = &self.data().custom_exercises;
        match muscle {
            Some(muscle) => self.library.by_muscle(custom, muscle),
            None => self.library.all(custom),
        }
    }

    pub fn add_custom_exercise(
        &mut self,
        name: &str,
        muscle: &str,
        description: Option<&str>,
    ) -> Result<ExerciseEntry, AppError> {
        let entry = library::custom_exercise(name, muscle, description)?;
        self.store.mutate(&[DocumentKey::CustomExercises], |data| {
            data.custom_exercises.push(entry.clone());
            Ok::<_, AppError>(entry)
        })
    }

    /// Seeds starter data into an empty store. Returns false when routines
    /// already exist.
    pub fn seed_sample(&mut self) -> Result<bool, AppError> {
        let now = self.now();
        self.store.mutate(&DocumentKey::ALL, |data| {
            Ok::<_, AppError>(sample::seed(data, now))
        })
    }

    /// Rewrites every document from memory (the periodic save).
    pub fn flush(&mut self) -> Result<(), AppError> {
        self.store.flush()?;
        Ok(())
    }
}

fn ensure_folder_exists(data: &StoreData, folder_id: Option<&str>) -> Result<(), AppError> {
    match folder_id {
        Some(id) if folders::find(&data.folders, id).is_none() => {
            Err(AppError::not_found("folder", id))
        }
        _ => Ok(()),
    }
}

fn find_by_reference<'a, T: 'a>(
    kind: &'static str,
    reference: &str,
    by_id: Option<&'a T>,
    by_name: impl Iterator<Item = &'a T>,
) -> Result<&'a T, AppError> {
    if let Some(found) = by_id {
        return Ok(found);
    }
    let matches = by_name.take(2).collect::<Vec<_>>();
    match matches.as_slice() {
        [only] => Ok(*only),
        [] => Err(AppError::not_found(kind, reference)),
        _ => {
            let message = format!(
                "more than one {} is named '{}'; use its id instead",
                kind,
                reference.trim()
            );
            Err(ValidationError::new(message).into())
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    NotFound { kind: &'static str, id: String },
    Cycle { folder: String, target: String },
    UnrecognizedFormat(UnrecognizedFormat),
    Persistence(StoreError),
    Config(ConfigError),
    Library(LibraryError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(err) => write!(f, "{}", err),
            AppError::NotFound { kind, id } => write!(f, "{} '{}' not found", kind, id),
            AppError::Cycle { folder, target } => write!(
                f,
                "cannot move folder '{}' into '{}': that is the folder or one of its subfolders",
                folder, target
            ),
            AppError::UnrecognizedFormat(err) => write!(f, "{}", err),
            AppError::Persistence(err) => write!(f, "could not save data: {}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Library(err) => write!(f, "{}", err),
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Validation(err) => Some(err),
            AppError::NotFound { .. } => None,
            AppError::Cycle { .. } => None,
            AppError::UnrecognizedFormat(err) => Some(err),
            AppError::Persistence(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Library(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Json(err) => Some(err),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        AppError::Validation(value)
    }
}

impl From<FolderError> for AppError {
    fn from(value: FolderError) -> Self {
        match value {
            FolderError::NotFound(id) => AppError::NotFound { kind: "folder", id },
            FolderError::Cycle { folder, target } => AppError::Cycle { folder, target },
        }
    }
}

impl From<SetLookupError> for AppError {
    fn from(value: SetLookupError) -> Self {
        match value {
            SetLookupError::Exercise { index, .. } => {
                AppError::not_found("exercise", format!("#{}", index + 1))
            }
            SetLookupError::Set {
                exercise_index,
                index,
                ..
            } => AppError::not_found(
                "set",
                format!("#{} of exercise #{}", index + 1, exercise_index + 1),
            ),
        }
    }
}

impl From<ParseEffortError> for AppError {
    fn from(value: ParseEffortError) -> Self {
        AppError::Validation(ValidationError::new(value.to_string()))
    }
}

impl From<ParseThemeError> for AppError {
    fn from(value: ParseThemeError) -> Self {
        AppError::Validation(ValidationError::new(value.to_string()))
    }
}

impl From<UnrecognizedFormat> for AppError {
    fn from(value: UnrecognizedFormat) -> Self {
        AppError::UnrecognizedFormat(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Persistence(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<LibraryError> for AppError {
    fn from(value: LibraryError) -> Self {
        AppError::Library(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Json(value)
    }
}

#[cfg(test)]
mod tests;
#[cfg(test)]
mod tests_backup;
