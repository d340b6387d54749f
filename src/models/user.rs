//! Per-user preferences stored under `user_config_<userId>`

use serde::{Deserialize, Serialize};

/// Key prefix for per-user configuration entries
pub const USER_CONFIG_PREFIX: &str = "user_config_";

/// Reserved singleton keys owned by the (external) account layer
pub const USERS_KEY: &str = "users";
pub const CURRENT_USER_KEY: &str = "current_user_id";
pub const SESSION_ACTIVE_KEY: &str = "session_active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

/// Which notification families the user wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default = "enabled")]
    pub budgets: bool,
    #[serde(default = "enabled")]
    pub reminders: bool,
    #[serde(default)]
    pub daily_summary: bool,
}

fn enabled() -> bool {
    true
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            budgets: true,
            reminders: true,
            daily_summary: false,
        }
    }
}

/// Preferences for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// strftime-style date format
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub notifications: NotificationPreferences,
    #[serde(default)]
    pub theme: Theme,
}

fn default_currency() -> String {
    "MXN".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_language() -> String {
    "es".to_string()
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            currency_symbol: default_currency_symbol(),
            language: default_language(),
            date_format: default_date_format(),
            notifications: NotificationPreferences::default(),
            theme: Theme::default(),
        }
    }
}

impl UserConfig {
    pub fn key_for(user_id: &str) -> String {
        format!("{}{}", USER_CONFIG_PREFIX, user_id)
    }
}
