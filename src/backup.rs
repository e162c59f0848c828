//! Backup scheduling rules, version bookkeeping and pruning. Pure functions
//! over [`BackupMetadata`]; the app wires them to the stores.

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::clock::{format_rfc3339, whole_days_between};
use crate::domain::backup::{BackupKind, BackupMetadata, BackupVersion};
use crate::domain::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPolicy {
    pub auto_interval: Duration,
    pub max_auto_versions: usize,
    pub reminder_after: Duration,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            auto_interval: Duration::hours(24),
            max_auto_versions: 7,
            reminder_after: Duration::days(7),
        }
    }
}

pub fn auto_backup_due(
    metadata: &BackupMetadata,
    policy: &BackupPolicy,
    now: OffsetDateTime,
) -> bool {
    match metadata.last_auto_backup {
        None => true,
        Some(last) => now - last >= policy.auto_interval,
    }
}

pub fn reminder_due(
    metadata: &BackupMetadata,
    settings: &Settings,
    policy: &BackupPolicy,
    now: OffsetDateTime,
) -> bool {
    if !settings.backup_reminders_enabled {
        return false;
    }
    match metadata.last_manual_backup {
        None => true,
        Some(last) => now - last >= policy.reminder_after,
    }
}

pub fn storage_key(kind: BackupKind, at: OffsetDateTime) -> String {
    format!("{}_backup_{}", kind.as_str(), format_rfc3339(at))
}

/// Like [`storage_key`], but appends `-2`, `-3`, ... while `taken` reports a
/// collision (two backups inside the same second).
pub fn unique_storage_key<F>(kind: BackupKind, at: OffsetDateTime, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = storage_key(kind, at);
    if !taken(&base) {
        return base;
    }
    let mut suffix = 2u32;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Appends a version entry and moves the matching "last backup" marker.
pub fn record_version(
    metadata: &mut BackupMetadata,
    kind: BackupKind,
    at: OffsetDateTime,
    storage_key: String,
) {
    metadata.backup_versions.push(BackupVersion {
        kind,
        timestamp: at,
        storage_key,
    });
    match kind {
        BackupKind::Auto => metadata.last_auto_backup = Some(at),
        BackupKind::Manual => metadata.last_manual_backup = Some(at),
    }
}

/// Drops the oldest automatic entries beyond `max_auto`. Manual entries and
/// the relative order of survivors are untouched. Returns the dropped entries.
pub fn prune_auto_versions(metadata: &mut BackupMetadata, max_auto: usize) -> Vec<BackupVersion> {
    let auto_count = metadata.count(BackupKind::Auto);
    let mut excess = auto_count.saturating_sub(max_auto);
    if excess == 0 {
        return Vec::new();
    }

    let mut dropped = Vec::with_capacity(excess);
    let mut kept = Vec::with_capacity(metadata.backup_versions.len() - excess);
    for version in metadata.backup_versions.drain(..) {
        if excess > 0 && version.kind == BackupKind::Auto {
            excess -= 1;
            dropped.push(version);
        } else {
            kept.push(version);
        }
    }
    metadata.backup_versions = kept;
    dropped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupIndicator {
    Ok,
    Pending,
    Missing,
}

impl BackupIndicator {
    pub fn label(self) -> &'static str {
        match self {
            BackupIndicator::Ok => "Backup OK",
            BackupIndicator::Pending => "Backup pending",
            BackupIndicator::Missing => "No backup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupStatus {
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_manual_backup: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_auto_backup: Option<OffsetDateTime>,
    pub days_since_manual: Option<i64>,
    pub manual_versions: usize,
    pub auto_versions: usize,
    pub indicator: BackupIndicator,
    pub reminder_due: bool,
}

pub fn status(
    metadata: &BackupMetadata,
    settings: &Settings,
    policy: &BackupPolicy,
    now: OffsetDateTime,
) -> BackupStatus {
    let days_since_manual = metadata
        .last_manual_backup
        .map(|last| whole_days_between(last, now));
    let indicator = match days_since_manual {
        None => BackupIndicator::Missing,
        Some(days) if days > policy.reminder_after.whole_days() => BackupIndicator::Pending,
        Some(_) => BackupIndicator::Ok,
    };
    BackupStatus {
        last_manual_backup: metadata.last_manual_backup,
        last_auto_backup: metadata.last_auto_backup,
        days_since_manual,
        manual_versions: metadata.count(BackupKind::Manual),
        auto_versions: metadata.count(BackupKind::Auto),
        indicator,
        reminder_due: reminder_due(metadata, settings, policy, now),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use time::Duration;

    use super::{
        auto_backup_due, prune_auto_versions, record_version, reminder_due, status, storage_key,
        unique_storage_key, BackupIndicator, BackupPolicy,
    };
    use crate::domain::backup::{BackupKind, BackupMetadata};
    use crate::domain::settings::Settings;

    #[test]
    fn auto_backup_is_due_when_never_run_or_a_day_has_passed() {
        let policy = BackupPolicy::default();
        let now = datetime!(2026-03-10 12:00 UTC);
        let mut metadata = BackupMetadata::default();
        assert!(auto_backup_due(&metadata, &policy, now));

        metadata.last_auto_backup = Some(now - Duration::hours(23));
        assert!(!auto_backup_due(&metadata, &policy, now));

        metadata.last_auto_backup = Some(now - Duration::hours(24));
        assert!(auto_backup_due(&metadata, &policy, now));
    }

    #[test]
    fn reminder_respects_setting_and_week_threshold() {
        let policy = BackupPolicy::default();
        let now = datetime!(2026-03-10 12:00 UTC);
        let mut settings = Settings::default();
        let mut metadata = BackupMetadata::default();
        assert!(reminder_due(&metadata, &settings, &policy, now));

        metadata.last_manual_backup = Some(now - Duration::days(6));
        assert!(!reminder_due(&metadata, &settings, &policy, now));

        metadata.last_manual_backup = Some(now - Duration::days(7));
        assert!(reminder_due(&metadata, &settings, &policy, now));

        settings.backup_reminders_enabled = false;
        assert!(!reminder_due(&metadata, &settings, &policy, now));
    }

    #[test]
    fn storage_keys_embed_kind_and_timestamp_and_avoid_collisions() {
        let at = datetime!(2026-03-10 12:00 UTC);
        assert_eq!(
            storage_key(BackupKind::Manual, at),
            "manual_backup_2026-03-10T12:00:00Z"
        );
        let taken = [
            "auto_backup_2026-03-10T12:00:00Z",
            "auto_backup_2026-03-10T12:00:00Z-2",
        ];
        let key = unique_storage_key(BackupKind::Auto, at, |candidate| taken.contains(&candidate));
        assert_eq!(key, "auto_backup_2026-03-10T12:00:00Z-3");
    }

    #[test]
    fn pruning_keeps_every_manual_and_newest_autos() {
        let start = datetime!(2026-03-01 00:00 UTC);
        let mut metadata = BackupMetadata::default();
        for day in 0..12i64 {
            let at = start + Duration::days(day);
            let kind = if day % 4 == 0 {
                BackupKind::Manual
            } else {
                BackupKind::Auto
            };
            record_version(&mut metadata, kind, at, storage_key(kind, at));
            prune_auto_versions(&mut metadata, 7);
            assert!(metadata.count(BackupKind::Auto) <= 7);
        }

        assert_eq!(metadata.count(BackupKind::Manual), 3);
        assert_eq!(metadata.count(BackupKind::Auto), 7);
        let oldest_auto = metadata
            .backup_versions
            .iter()
            .find(|version| version.kind == BackupKind::Auto)
            .expect("autos should remain");
        assert_eq!(oldest_auto.timestamp, start + Duration::days(3));
        assert_eq!(metadata.last_manual_backup, Some(start + Duration::days(8)));
        assert_eq!(metadata.last_auto_backup, Some(start + Duration::days(11)));
    }

    #[test]
    fn pruning_returns_dropped_entries_oldest_first() {
        let start = datetime!(2026-03-01 00:00 UTC);
        let mut metadata = BackupMetadata::default();
        for hour in 0..3i64 {
            let at = start + Duration::hours(hour);
            let key = storage_key(BackupKind::Auto, at);
            record_version(&mut metadata, BackupKind::Auto, at, key);
        }
        let dropped = prune_auto_versions(&mut metadata, 1);
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped[0].timestamp, start);
        assert_eq!(metadata.backup_versions.len(), 1);
        assert!(prune_auto_versions(&mut metadata, 1).is_empty());
    }

    #[test]
    fn status_reports_indicator_tiers() {
        let policy = BackupPolicy::default();
        let settings = Settings::default();
        let now = datetime!(2026-03-10 12:00 UTC);
        let mut metadata = BackupMetadata::default();
        assert_eq!(
            status(&metadata, &settings, &policy, now).indicator,
            BackupIndicator::Missing
        );

        metadata.last_manual_backup = Some(now - Duration::days(7));
        let report = status(&metadata, &settings, &policy, now);
        assert_eq!(report.indicator, BackupIndicator::Ok);
        assert_eq!(report.days_since_manual, Some(7));
        assert!(report.reminder_due);

        metadata.last_manual_backup = Some(now - Duration::days(8));
        assert_eq!(
            status(&metadata, &settings, &policy, now).indicator,
            BackupIndicator::Pending
        );
    }
}
