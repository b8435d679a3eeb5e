//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono_tz::Tz;
use std::net::SocketAddr;
use study_planner_core::time::DEFAULT_TIMEZONE;
use study_planner_core::RegenerationPolicy;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Without a database URL the server keeps everything in memory.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub timezone: Tz,
    pub regeneration: RegenerationPolicy,
    pub cors_origin: String,
    pub repair_on_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            timezone: DEFAULT_TIMEZONE,
            regeneration: RegenerationPolicy::default(),
            cors_origin: "http://localhost:3000".to_string(),
            repair_on_startup: true,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so parsing can be tested
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Load Server and Database Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Planner Settings ---
        let timezone = match lookup("PLANNER_TIMEZONE") {
            Some(raw) => raw.parse::<Tz>().map_err(|_| {
                ConfigError::InvalidValue(
                    "PLANNER_TIMEZONE".to_string(),
                    format!("'{}' is not an IANA timezone", raw),
                )
            })?,
            None => defaults.timezone,
        };

        let regeneration = match lookup("SCHEDULE_REGENERATION") {
            Some(raw) => raw.parse::<RegenerationPolicy>().map_err(|e| {
                ConfigError::InvalidValue("SCHEDULE_REGENERATION".to_string(), e)
            })?,
            None => defaults.regeneration,
        };

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        let repair_on_startup = match lookup("REPAIR_ON_STARTUP") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "REPAIR_ON_STARTUP".to_string(),
                    format!("'{}' is not a boolean", raw),
                )
            })?,
            None => defaults.repair_on_startup,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            timezone,
            regeneration,
            cors_origin,
            repair_on_startup,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.timezone, chrono_tz::Asia::Muscat);
        assert_eq!(config.regeneration, RegenerationPolicy::Replace);
        assert!(config.repair_on_startup);
    }

    #[test]
    fn values_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/planner"),
            ("RUST_LOG", "debug"),
            ("PLANNER_TIMEZONE", "Europe/Berlin"),
            ("SCHEDULE_REGENERATION", "append"),
            ("REPAIR_ON_STARTUP", "off"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/planner"));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.regeneration, RegenerationPolicy::Append);
        assert!(!config.repair_on_startup);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("PLANNER_TIMEZONE", "Mars/Olympus")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "PLANNER_TIMEZONE"));

        let err = Config::from_lookup(lookup(&[("SCHEDULE_REGENERATION", "merge")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "SCHEDULE_REGENERATION"));
    }
}
