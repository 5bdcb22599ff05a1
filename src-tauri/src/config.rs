use log::LevelFilter;

use crate::{DEV_MODE_ENV, LOG_LEVEL_ENV};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppConfig {
    /// Skips the update flow and opens the main window directly.
    pub(crate) dev_mode: bool,
    pub(crate) log_level: LevelFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            log_level: LevelFilter::Info,
        }
    }
}

impl AppConfig {
    /// Loads `.env` from the working directory (if any) and reads the
    /// process environment.
    pub(crate) fn from_env() -> Self {
        if let Err(error) = dotenvy::dotenv() {
            if !error.not_found() {
                eprintln!("[kick-app] failed to load .env: {error}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let dev_mode = lookup(DEV_MODE_ENV)
            .map(|value| value.trim() == "on")
            .unwrap_or(defaults.dev_mode);
        let log_level = lookup(LOG_LEVEL_ENV)
            .and_then(|value| value.trim().parse::<LevelFilter>().ok())
            .unwrap_or(defaults.log_level);

        Self {
            dev_mode,
            log_level,
        }
    }
}
