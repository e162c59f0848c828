//! Tunable policy: backup cadence, retention, scheduler periods and write
//! retries. Built-in defaults ship inside the binary; a `config.toml` in the
//! data directory may override any subset of keys.

use std::error::Error;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use time::Duration;

use crate::backup::BackupPolicy;

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backup: BackupConfig,
    pub scheduler: SchedulerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupConfig {
    pub auto_interval_hours: u32,
    pub max_auto_versions: u32,
    pub reminder_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub autosave_seconds: u64,
    pub backup_check_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub save_attempts: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigFile {
    #[serde(default)]
    backup: RawBackup,
    #[serde(default)]
    scheduler: RawScheduler,
    #[serde(default)]
    store: RawStore,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBackup {
    auto_interval_hours: Option<u32>,
    max_auto_versions: Option<u32>,
    reminder_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScheduler {
    autosave_seconds: Option<u64>,
    backup_check_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStore {
    save_attempts: Option<u32>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "could not read config: {}", err),
            ConfigError::Toml(err) => write!(f, "invalid config TOML: {}", err),
            ConfigError::Invalid(message) => write!(f, "invalid config: {}", message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Toml(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}

impl Config {
    pub fn defaults() -> Result<Self, ConfigError> {
        let raw: RawConfigFile = toml::from_str(DEFAULTS_TOML)?;
        let config = Self {
            backup: BackupConfig {
                auto_interval_hours: required(
                    raw.backup.auto_interval_hours,
                    "backup.auto_interval_hours",
                )?,
                max_auto_versions: required(
                    raw.backup.max_auto_versions,
                    "backup.max_auto_versions",
                )?,
                reminder_days: required(raw.backup.reminder_days, "backup.reminder_days")?,
            },
            scheduler: SchedulerConfig {
                autosave_seconds: required(
                    raw.scheduler.autosave_seconds,
                    "scheduler.autosave_seconds",
                )?,
                backup_check_seconds: required(
                    raw.scheduler.backup_check_seconds,
                    "scheduler.backup_check_seconds",
                )?,
            },
            store: StoreConfig {
                save_attempts: required(raw.store.save_attempts, "store.save_attempts")?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `path` when it exists.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::defaults()?;
        if !path.exists() {
            return Ok(config);
        }
        let contents = std::fs::read_to_string(path)?;
        config.apply_toml(&contents)?;
        log::debug!("loaded config overrides from {}", path.display());
        Ok(config)
    }

    pub(crate) fn apply_toml(&mut self, raw: &str) -> Result<(), ConfigError> {
        let file: RawConfigFile = toml::from_str(raw)?;
        let backup = &mut self.backup;
        overlay(
            &mut backup.auto_interval_hours,
            file.backup.auto_interval_hours,
        );
        overlay(&mut backup.max_auto_versions, file.backup.max_auto_versions);
        overlay(&mut backup.reminder_days, file.backup.reminder_days);
        let scheduler = &mut self.scheduler;
        overlay(
            &mut scheduler.autosave_seconds,
            file.scheduler.autosave_seconds,
        );
        overlay(
            &mut scheduler.backup_check_seconds,
            file.scheduler.backup_check_seconds,
        );
        overlay(&mut self.store.save_attempts, file.store.save_attempts);
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let Self {
            backup,
            scheduler,
            store,
        } = self;
        let checks: [(&str, u64); 6] = [
            (
                "backup.auto_interval_hours",
                backup.auto_interval_hours.into(),
            ),
            ("backup.max_auto_versions", backup.max_auto_versions.into()),
            ("backup.reminder_days", backup.reminder_days.into()),
            ("scheduler.autosave_seconds", scheduler.autosave_seconds),
            (
                "scheduler.backup_check_seconds",
                scheduler.backup_check_seconds,
            ),
            ("store.save_attempts", store.save_attempts.into()),
        ];
        for (key, value) in checks {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be at least 1", key)));
            }
        }
        Ok(())
    }

    pub fn backup_policy(&self) -> BackupPolicy {
        BackupPolicy {
            auto_interval: Duration::hours(i64::from(self.backup.auto_interval_hours)),
            max_auto_versions: self.backup.max_auto_versions as usize,
            reminder_after: Duration::days(i64::from(self.backup.reminder_days)),
        }
    }
}

fn required<T>(value: Option<T>, key: &str) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::Invalid(format!("built-in defaults are missing {}", key)))
}

fn overlay<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
