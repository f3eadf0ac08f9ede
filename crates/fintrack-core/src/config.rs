//! Application configuration
//!
//! Resolved in layers: built-in defaults, then the TOML file (explicit path or
//! `<config_dir>/fintrack/config.toml`), then `FINTRACK_*` environment overrides.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//! allowed_origins = ["http://localhost:5173"]
//!
//! [auth]
//! access_ttl_minutes = 60
//! refresh_ttl_days = 7
//!
//! [scheduler]
//! reminder_interval_minutes = 60
//! reminder_lookahead_days = 3
//! snapshot_interval_hours = 24
//!
//! [insights]
//! max_insights = 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const JWT_SECRET_ENV: &str = "FINTRACK_JWT_SECRET";
pub const ALLOWED_ORIGINS_ENV: &str = "FINTRACK_ALLOWED_ORIGINS";
pub const REMINDER_INTERVAL_ENV: &str = "FINTRACK_REMINDER_INTERVAL_MINUTES";
pub const SNAPSHOT_INTERVAL_ENV: &str = "FINTRACK_SNAPSHOT_INTERVAL_HOURS";

/// Upper bounds enforced by [`AppConfig::validate`]
pub const MAX_ACCESS_TTL_MINUTES: i64 = 24 * 60;
pub const MAX_REFRESH_TTL_DAYS: i64 = 365;
pub const MAX_REMINDER_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
pub const MAX_REMINDER_LOOKAHEAD_DAYS: i64 = 365;
pub const MAX_SNAPSHOT_INTERVAL_HOURS: u64 = 31 * 24;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub auth: AuthSection,
    pub scheduler: SchedulerSection,
    pub insights: InsightsSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Empty means localhost-only defaults are applied by the server
    pub allowed_origins: Vec<String>,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            allowed_origins: Vec::new(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub jwt_secret: Option<String>,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_ttl_minutes: 60,
            refresh_ttl_days: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// 0 disables the reminder job
    pub reminder_interval_minutes: u64,
    pub reminder_lookahead_days: i64,
    /// 0 disables the budget snapshot job
    pub snapshot_interval_hours: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            reminder_interval_minutes: 60,
            reminder_lookahead_days: 3,
            snapshot_interval_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsightsSection {
    pub max_insights: usize,
}

impl Default for InsightsSection {
    fn default() -> Self {
        Self { max_insights: 4 }
    }
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fintrack").join("config.toml"))
}

impl AppConfig {
    /// Load configuration from an explicit path, or the default location if present
    ///
    /// An explicit path that does not exist is an error; a missing default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    Error::Config(format!("Failed to read config {}: {}", p.display(), e))
                })?;
                Self::parse(&content)?
            }
            None => match default_config_path() {
                Some(p) if p.exists() => Self::parse(&fs::read_to_string(&p)?)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside the supported ranges
    pub fn validate(&self) -> Result<()> {
        let auth = &self.auth;
        check_range("auth.access_ttl_minutes", auth.access_ttl_minutes, 1, MAX_ACCESS_TTL_MINUTES)?;
        check_range("auth.refresh_ttl_days", auth.refresh_ttl_days, 1, MAX_REFRESH_TTL_DAYS)?;

        let scheduler = &self.scheduler;
        check_range(
            "scheduler.reminder_interval_minutes",
            scheduler.reminder_interval_minutes,
            0,
            MAX_REMINDER_INTERVAL_MINUTES,
        )?;
        check_range(
            "scheduler.reminder_lookahead_days",
            scheduler.reminder_lookahead_days,
            0,
            MAX_REMINDER_LOOKAHEAD_DAYS,
        )?;
        check_range(
            "scheduler.snapshot_interval_hours",
            scheduler.snapshot_interval_hours,
            0,
            MAX_SNAPSHOT_INTERVAL_HOURS,
        )?;
        Ok(())
    }

    /// Parse config from TOML content (no environment overrides)
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
    }

    /// Apply `FINTRACK_*` environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var(JWT_SECRET_ENV) {
            if !secret.is_empty() {
                self.auth.jwt_secret = Some(secret);
            }
        }

        if let Ok(origins) = std::env::var(ALLOWED_ORIGINS_ENV) {
            self.server.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(minutes) = env_u64(REMINDER_INTERVAL_ENV) {
            self.scheduler.reminder_interval_minutes = minutes;
        }

        if let Some(hours) = env_u64(SNAPSHOT_INTERVAL_ENV) {
            self.scheduler.snapshot_interval_hours = hours;
        }
    }
}

fn check_range<T>(field: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(Error::Config(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        )));
    }
    Ok(())
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.access_ttl_minutes, 60);
        assert_eq!(config.auth.refresh_ttl_days, 7);
        assert_eq!(config.scheduler.reminder_lookahead_days, 3);
        assert_eq!(config.insights.max_insights, 4);
    }

    #[test]
    fn test_parse_partial() {
        let config = AppConfig::parse(
            r#"
            [server]
            port = 8080

            [insights]
            max_insights = 6
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.insights.max_insights, 6);
        assert_eq!(config.scheduler.snapshot_interval_hours, 24);
    }

    #[test]
    fn test_parse_invalid() {
        let err = AppConfig::parse("[server]\nport = \"abc\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler]\nreminder_lookahead_days = 5\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scheduler.reminder_lookahead_days, 5);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for content in [
            "[scheduler]\nreminder_lookahead_days = 9223372036854775807\n",
            "[scheduler]\nreminder_lookahead_days = -1\n",
            "[scheduler]\nreminder_interval_minutes = 9223372036854775807\n",
            "[scheduler]\nsnapshot_interval_hours = 100000\n",
            "[auth]\naccess_ttl_minutes = 9223372036854775807\n",
            "[auth]\nrefresh_ttl_days = 0\n",
        ] {
            let config = AppConfig::parse(content).unwrap();
            let err = config.validate().unwrap_err();
            assert!(matches!(err, Error::Config(_)), "accepted: {}", content);
        }
    }

    #[test]
    fn test_load_rejects_out_of_range_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[auth]\nrefresh_ttl_days = 100000\n").unwrap();

        assert!(matches!(AppConfig::load(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/fintrack.toml")));
        assert!(result.is_err());
    }
}
