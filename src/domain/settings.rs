use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REST_TIMER_SECONDS: u32 = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(ParseThemeError {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseThemeError {
    value: String,
}

impl fmt::Display for ParseThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown theme '{}', expected light or dark", self.value)
    }
}

impl Error for ParseThemeError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_rest_timer", alias = "restTimer")]
    pub rest_timer_seconds: u32,
    #[serde(default = "enabled", alias = "autoBackup")]
    pub auto_backup_enabled: bool,
    #[serde(default = "enabled", alias = "backupReminders")]
    pub backup_reminders_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            rest_timer_seconds: DEFAULT_REST_TIMER_SECONDS,
            auto_backup_enabled: true,
            backup_reminders_enabled: true,
        }
    }
}

fn default_rest_timer() -> u32 {
    DEFAULT_REST_TIMER_SECONDS
}

fn enabled() -> bool {
    true
}

/// Partial settings: fields left as `None` keep their current value. Used by
/// `settings set` and when merging the settings of an imported backup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default, alias = "restTimer")]
    pub rest_timer_seconds: Option<u32>,
    #[serde(default, alias = "autoBackup")]
    pub auto_backup_enabled: Option<bool>,
    #[serde(default, alias = "backupReminders")]
    pub backup_reminders_enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn has_changes(&self) -> bool {
        self.theme.is_some()
            || self.rest_timer_seconds.is_some()
            || self.auto_backup_enabled.is_some()
            || self.backup_reminders_enabled.is_some()
    }
}

impl Settings {
    pub fn merge(&mut self, patch: &SettingsPatch) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(seconds) = patch.rest_timer_seconds {
            self.rest_timer_seconds = seconds;
        }
        if let Some(enabled) = patch.auto_backup_enabled {
            self.auto_backup_enabled = enabled;
        }
        if let Some(enabled) = patch.backup_reminders_enabled {
            self.backup_reminders_enabled = enabled;
        }
    }
}
