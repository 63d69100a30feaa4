//! Environment-driven runtime configuration.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - An unsupported log level is an error, not a silent default.

use crate::logging::default_log_level;
use log::Level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "SHOROSHIM_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "SHOROSHIM_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "SHOROSHIM_LOG_DIR";

const DEFAULT_DB_FILE: &str = "shoroshim.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Not one of trace, debug, info, warn (or warning), error.
    InvalidLogLevel { value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel { value } => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// Logging stays off when unset.
    pub log_dir: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_VAR) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_VAR) {
            config.set_log_level(&level)?;
        }
        config.log_dir = read(LOG_DIR_VAR);
        Ok(config)
    }

    /// Overrides the log level, validating it like the environment value.
    pub fn set_log_level(&mut self, level: &str) -> Result<(), ConfigError> {
        self.log_level = parse_log_level(level)?;
        Ok(())
    }
}

/// Canonical lowercase name for a log level, case-insensitive.
pub fn parse_log_level(raw: &str) -> Result<&'static str, ConfigError> {
    let trimmed = raw.trim();
    let name = if trimmed.eq_ignore_ascii_case("warning") {
        "warn"
    } else {
        trimmed
    };
    let level = name
        .parse::<Level>()
        .map_err(|_| ConfigError::InvalidLogLevel {
            value: trimmed.to_string(),
        })?;
    Ok(match level {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    })
}

pub fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE)
}

#[cfg(test)]
mod tests {
    use super::{
        default_db_path, parse_log_level, ConfigError, CoreConfig, DB_PATH_VAR, LOG_DIR_VAR,
        LOG_LEVEL_VAR,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn unset_and_blank_values_fall_back_to_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[(DB_PATH_VAR, "  "), (LOG_DIR_VAR, "")]))
            .expect("defaults");
        assert_eq!(config.db_path, default_db_path());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[
            (DB_PATH_VAR, "/data/family.sqlite3"),
            (LOG_LEVEL_VAR, "WARN"),
            (LOG_DIR_VAR, "/var/log/shoroshim"),
        ]))
        .expect("explicit config");
        assert_eq!(config.db_path, PathBuf::from("/data/family.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/shoroshim"));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[(LOG_LEVEL_VAR, "loud")]))
            .expect_err("invalid level");
        assert!(matches!(err, ConfigError::InvalidLogLevel { value } if value == "loud"));
    }

    #[test]
    fn log_level_accepts_aliases_and_case() {
        assert_eq!(parse_log_level(" WARNING ").expect("alias"), "warn");
        assert_eq!(parse_log_level("Trace").expect("mixed case"), "trace");
        assert!(parse_log_level("off").is_err());
        assert!(parse_log_level("").is_err());
    }
}
