use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use super::{App, AppError};
use crate::backup::{
    self, auto_backup_due, prune_auto_versions, record_version, unique_storage_key, BackupPolicy,
    BackupStatus,
};
use crate::backup_store::StoredBackup;
use crate::domain::backup::{BackupKind, BackupVersion};
use crate::domain::routine::Routine;
use crate::domain::ValidationError;
use crate::folders;
use crate::ids::{generate_id, ROUTINE_PREFIX};
use crate::scheduler::{Job, Scheduler};
use crate::snapshot::{self, FullSnapshot, ImportDocument, IncomingFullSnapshot, RoutineSnapshot};
use crate::store::DocumentKey;

/// What a full-store import is about to replace, shown before confirming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportPreview {
    pub routines: usize,
    pub workouts: usize,
    pub folders: usize,
    pub custom_exercises: usize,
    /// The in-progress session is dropped since it may reference routines
    /// the import removes.
    pub discards_active_workout: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    RoutineImported(Routine),
    Replaced(ImportPreview),
    Cancelled,
}

impl App {
    pub fn backup_policy(&self) -> BackupPolicy {
        self.config.backup_policy()
    }

    /// Takes an automatic snapshot when none exists yet or the last one is
    /// older than the configured interval. `None` means not due.
    pub fn run_automatic_backup_if_due(&mut self) -> Result<Option<BackupVersion>, AppError> {
        let policy = self.backup_policy();
        if !auto_backup_due(&self.data().backup, &policy, self.now()) {
            log::debug!("automatic backup not due yet");
            return Ok(None);
        }
        self.create_backup(BackupKind::Auto).map(Some)
    }

    pub fn run_manual_backup(&mut self) -> Result<BackupVersion, AppError> {
        self.create_backup(BackupKind::Manual)
    }

    fn create_backup(&mut self, kind: BackupKind) -> Result<BackupVersion, AppError> {
        let now = self.now();
        let payload = serde_json::to_string(&FullSnapshot::capture(self.data(), now))?;
        let stored_keys = self.backups.keys()?.into_iter().collect::<HashSet<_>>();
        let key = unique_storage_key(kind, now, |candidate| {
            stored_keys.contains(candidate) || self.data().backup.find(candidate).is_some()
        });
        self.backups.save(&StoredBackup {
            key: key.clone(),
            kind,
            created_at: Some(now),
            payload,
        })?;

        let max_auto = self.backup_policy().max_auto_versions;
        let recorded = self.store.mutate(&[DocumentKey::BackupData], |data| {
            record_version(&mut data.backup, kind, now, key.clone());
            let pruned = match kind {
                BackupKind::Auto => prune_auto_versions(&mut data.backup, max_auto),
                BackupKind::Manual => Vec::new(),
            };
            Ok::<_, AppError>(pruned)
        });
        let pruned = match recorded {
            Ok(pruned) => pruned,
            Err(err) => {
                if let Err(cleanup) = self.backups.remove(&key) {
                    log::warn!("could not remove unrecorded backup {}: {}", key, cleanup);
                }
                return Err(err);
            }
        };

        for version in &pruned {
            if let Err(err) = self.backups.remove(&version.storage_key) {
                log::warn!(
                    "pruned backup {} could not be deleted: {}",
                    version.storage_key,
                    err
                );
            }
        }
        log::info!(
            "{} backup stored as {} ({} pruned)",
            kind.as_str(),
            key,
            pruned.len()
        );
        Ok(BackupVersion {
            kind,
            timestamp: now,
            storage_key: key,
        })
    }

    pub fn is_reminder_due(&self) -> bool {
        backup::reminder_due(
            &self.data().backup,
            self.settings(),
            &self.backup_policy(),
            self.now(),
        )
    }

    pub fn backup_status(&self) -> BackupStatus {
        backup::status(
            &self.data().backup,
            self.settings(),
            &self.backup_policy(),
            self.now(),
        )
    }

    pub fn list_backups(&self) -> &[BackupVersion] {
        &self.data().backup.backup_versions
    }

    pub fn export_snapshot(&self) -> FullSnapshot {
        FullSnapshot::capture(self.data(), self.now())
    }

    pub fn export_routine(&self, id: &str) -> Result<RoutineSnapshot, AppError> {
        let routine = self
            .routine(id)
            .ok_or_else(|| AppError::not_found("routine", id))?;
        Ok(RoutineSnapshot::capture(routine, self.now()))
    }

    pub fn import_str<F>(&mut self, raw: &str, confirm: F) -> Result<ImportOutcome, AppError>
    where
        F: FnOnce(&ImportPreview) -> bool,
    {
        let document = snapshot::parse_json(raw)?;
        self.import_snapshot(&document, confirm)
    }

    /// A single-routine document is appended under a fresh id. A full-store
    /// document replaces routines, workouts, folders and custom exercises
    /// and merges settings, but only once `confirm` agrees. Anything else is
    /// rejected and nothing changes.
    pub fn import_snapshot<F>(
        &mut self,
        document: &Value,
        confirm: F,
    ) -> Result<ImportOutcome, AppError>
    where
        F: FnOnce(&ImportPreview) -> bool,
    {
        let document = snapshot::parse_document(document)?;
        self.apply_import(document, confirm)
    }

    pub fn restore_backup<F>(
        &mut self,
        storage_key: &str,
        confirm: F,
    ) -> Result<ImportOutcome, AppError>
    where
        F: FnOnce(&ImportPreview) -> bool,
    {
        let stored = self
            .backups
            .load(storage_key)?
            .ok_or_else(|| AppError::not_found("backup", storage_key))?;
        match snapshot::parse_str(&stored.payload)? {
            ImportDocument::Full(snapshot) => self.replace_all(*snapshot, confirm),
            ImportDocument::SingleRoutine(_) => {
                let message = format!(
                    "backup '{}' holds a single routine, not a full snapshot",
                    storage_key
                );
                Err(ValidationError::new(message).into())
            }
        }
    }

    fn apply_import<F>(
        &mut self,
        document: ImportDocument,
        confirm: F,
    ) -> Result<ImportOutcome, AppError>
    where
        F: FnOnce(&ImportPreview) -> bool,
    {
        match document {
            ImportDocument::SingleRoutine(mut draft) => {
                draft.validate()?;
                let created_at = self.now();
                let routine = self.store.mutate(&[DocumentKey::Routines], |data| {
                    if folders::resolve(&data.folders, draft.folder_id.as_deref()).is_none() {
                        draft.folder_id = None;
                    }
                    let id = generate_id(ROUTINE_PREFIX, |candidate| {
                        data.routines.iter().any(|routine| routine.id == candidate)
                    });
                    let routine = draft.into_routine(id, created_at);
                    data.routines.push(routine.clone());
                    Ok::<_, AppError>(routine)
                })?;
                log::info!("imported routine '{}' as {}", routine.name, routine.id);
                Ok(ImportOutcome::RoutineImported(routine))
            }
            ImportDocument::Full(snapshot) => self.replace_all(*snapshot, confirm),
        }
    }

    fn replace_all<F>(
        &mut self,
        snapshot: IncomingFullSnapshot,
        confirm: F,
    ) -> Result<ImportOutcome, AppError>
    where
        F: FnOnce(&ImportPreview) -> bool,
    {
        let preview = ImportPreview {
            routines: snapshot.routines.len(),
            workouts: snapshot.workouts.len(),
            folders: snapshot.folders.as_ref().map_or(0, Vec::len),
            custom_exercises: snapshot.custom_exercises.as_ref().map_or(0, Vec::len),
            discards_active_workout: self.active_workout().is_some(),
        };
        if !confirm(&preview) {
            log::info!("full import cancelled");
            return Ok(ImportOutcome::Cancelled);
        }

        self.store.mutate(
            &[
                DocumentKey::Routines,
                DocumentKey::Workouts,
                DocumentKey::Folders,
                DocumentKey::CustomExercises,
                DocumentKey::Settings,
                DocumentKey::ActiveWorkout,
            ],
            |data| {
                data.active_workout = None;
                data.routines = snapshot.routines;
                data.workouts = snapshot.workouts;
                data.folders = snapshot.folders.unwrap_or_default();
                data.custom_exercises = snapshot.custom_exercises.unwrap_or_default();
                if let Some(patch) = &snapshot.settings {
                    data.settings.merge(patch);
                }
                Ok::<_, AppError>(())
            },
        )?;
        if preview.discards_active_workout {
            log::warn!("active workout discarded by full import");
        }
        log::info!(
            "replaced store with {} routines and {} workouts",
            preview.routines,
            preview.workouts
        );
        Ok(ImportOutcome::Replaced(preview))
    }

    /// A scheduler armed from the current settings.
    pub fn scheduler(&self) -> Scheduler {
        let mut scheduler = Scheduler::new(&self.config.scheduler);
        scheduler.configure(self.settings().auto_backup_enabled, self.now());
        scheduler
    }

    pub fn run_job(&mut self, job: Job) -> Result<Option<BackupVersion>, AppError> {
        match job {
            Job::AutoSave => {
                self.flush()?;
                Ok(None)
            }
            Job::BackupCheck => self.run_automatic_backup_if_due(),
        }
    }
}
