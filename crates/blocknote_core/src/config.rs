//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Provide defaults for logging, note store location and autosave delay.
//! - Apply `BLOCKNOTE_*` environment overrides.
//!
//! # Invariants
//! - Blank override values are ignored.
//! - Invalid override values are rejected, never silently replaced.

use crate::logging::default_log_level;
use crate::service::autosave::DEFAULT_AUTOSAVE_DELAY;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_LOG_LEVEL: &str = "BLOCKNOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BLOCKNOTE_LOG_DIR";
pub const ENV_DB_PATH: &str = "BLOCKNOTE_DB_PATH";
pub const ENV_AUTOSAVE_DELAY_MS: &str = "BLOCKNOTE_AUTOSAVE_DELAY_MS";

const DEFAULT_DB_FILE_NAME: &str = "blocknote.sqlite3";

/// Configuration error for override values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: `{value}`"),
        }
    }
}

impl Error for ConfigError {}

/// Effective core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub log_level: String,
    /// Logging stays disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub db_path: PathBuf,
    pub autosave_delay: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = read(ENV_AUTOSAVE_DELAY_MS) {
            let millis = raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_AUTOSAVE_DELAY_MS,
                value: raw.clone(),
            })?;
            config.autosave_delay = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_AUTOSAVE_DELAY_MS, ENV_DB_PATH, ENV_LOG_DIR};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_apply_and_blank_values_are_ignored() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, " /data/notes.sqlite3 "),
            (ENV_LOG_DIR, "   "),
            (ENV_AUTOSAVE_DELAY_MS, "250"),
        ]))
        .expect("overrides should parse");

        assert_eq!(config.db_path, PathBuf::from("/data/notes.sqlite3"));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.autosave_delay, Duration::from_millis(250));
    }

    #[test]
    fn invalid_delay_is_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_AUTOSAVE_DELAY_MS, "soon")]))
            .expect_err("non-numeric delay must fail");
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_AUTOSAVE_DELAY_MS,
                value: "soon".to_string(),
            }
        );
    }

    #[test]
    fn defaults_without_overrides() {
        let config = CoreConfig::from_lookup(|_| None).expect("defaults should load");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.autosave_delay, Duration::from_millis(1000));
    }
}
