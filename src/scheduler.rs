//! Timer bookkeeping for the two background jobs. The scheduler only decides
//! what is due; `watch` runs the jobs and sleeps between ticks.

use time::{Duration, OffsetDateTime};

use crate::config::SchedulerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    AutoSave,
    BackupCheck,
}

impl Job {
    pub fn as_str(self) -> &'static str {
        match self {
            Job::AutoSave => "autosave",
            Job::BackupCheck => "backup_check",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    autosave_every: Duration,
    backup_check_every: Duration,
    next_autosave: Option<OffsetDateTime>,
    next_backup_check: Option<OffsetDateTime>,
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            autosave_every: seconds(config.autosave_seconds),
            backup_check_every: seconds(config.backup_check_seconds),
            next_autosave: None,
            next_backup_check: None,
        }
    }

    /// Arms both timers when auto-backup is enabled, disarms them otherwise.
    /// The backup check fires on the first tick after arming.
    pub fn configure(&mut self, auto_backup_enabled: bool, now: OffsetDateTime) {
        if !auto_backup_enabled {
            self.next_autosave = None;
            self.next_backup_check = None;
            return;
        }
        if self.next_autosave.is_none() {
            self.next_autosave = Some(now + self.autosave_every);
        }
        if self.next_backup_check.is_none() {
            self.next_backup_check = Some(now);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.next_autosave.is_some() || self.next_backup_check.is_some()
    }

    /// Jobs due at `now`, each rescheduled one period after `now`. A job
    /// that missed several periods fires once.
    pub fn due(&mut self, now: OffsetDateTime) -> Vec<Job> {
        let mut jobs = Vec::new();
        if fire(&mut self.next_backup_check, self.backup_check_every, now) {
            jobs.push(Job::BackupCheck);
        }
        if fire(&mut self.next_autosave, self.autosave_every, now) {
            jobs.push(Job::AutoSave);
        }
        if !jobs.is_empty() {
            let names = jobs.iter().map(|job| job.as_str()).collect::<Vec<_>>();
            log::debug!("scheduler tick at {}: {}", now, names.join(", "));
        }
        jobs
    }

    pub fn next_wake(&self) -> Option<OffsetDateTime> {
        match (self.next_autosave, self.next_backup_check) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

fn seconds(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}

fn fire(next: &mut Option<OffsetDateTime>, every: Duration, now: OffsetDateTime) -> bool {
    match *next {
        Some(at) if at <= now => {
            *next = Some(now + every);
            true
        }
        _ => false,
    }
}
