//! Application settings for pocket-ledger
//!
//! Settings are process-level knobs (which storage backend to open, alert
//! thresholds, notification timing). Per-user preferences live in the store
//! itself, see [`crate::models::UserConfig`].

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::LedgerError;

/// Which storage backend the key-value store opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Single JSON file under the data directory
    #[default]
    File,
    /// Process-local map, lost on exit
    Memory,
}

/// Settings for pocket-ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub backend: BackendKind,

    /// Percentage used by the "near limit" budget query
    #[serde(default = "default_near_limit_percent")]
    pub near_limit_percent: f64,

    /// Hour of day (0-23) for the recurring daily summary
    #[serde(default = "default_daily_summary_hour")]
    pub daily_summary_hour: u32,

    /// Gap between consecutive notifications of one alert batch
    #[serde(default = "default_alert_spacing_ms")]
    pub alert_spacing_ms: u64,

    /// User whose `user_config_<id>` entry is consulted
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_near_limit_percent() -> f64 {
    80.0
}

fn default_daily_summary_hour() -> u32 {
    20
}

fn default_alert_spacing_ms() -> u64 {
    1000
}

fn default_user_id() -> String {
    "local".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backend: BackendKind::default(),
            near_limit_percent: default_near_limit_percent(),
            daily_summary_hour: default_daily_summary_hour(),
            alert_spacing_ms: default_alert_spacing_ms(),
            user_id: default_user_id(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                LedgerError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            LedgerError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Reject values the scheduler and aggregator cannot work with
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.daily_summary_hour > 23 {
            return Err(LedgerError::Config(format!(
                "daily_summary_hour must be 0-23, got {}",
                self.daily_summary_hour
            )));
        }
        if !(0.0..=100.0).contains(&self.near_limit_percent) {
            return Err(LedgerError::Config(format!(
                "near_limit_percent must be 0-100, got {}",
                self.near_limit_percent
            )));
        }
        Ok(())
    }
}
