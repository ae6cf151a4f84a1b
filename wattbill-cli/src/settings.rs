//! Settings persistence.
//!
//! A JSON file under the user config directory holds the portal account,
//! the reporting zone, and the billing date of the last emitted report.
//! The password itself is never stored; the file names the environment
//! variable that carries it.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Default environment variable holding the portal password.
const DEFAULT_PASSWORD_ENV: &str = "WATTBILL_PORTAL_PASSWORD";

/// Default reporting time zone (the utility's service territory).
const DEFAULT_TIME_ZONE: &str = "America/New_York";

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file could not be read or written.
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid JSON.
    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured zone is not a known IANA zone name.
    #[error("unknown time zone: {0}")]
    UnknownZone(String),

    /// The configured password environment variable is unset.
    #[error("portal password environment variable {0} is not set")]
    MissingPassword(String),
}

/// Persisted reporter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Portal account username (email address).
    pub username: String,

    /// Name of the environment variable carrying the portal password.
    #[serde(default = "default_password_env")]
    pub password_env: String,

    /// IANA zone name billing intervals are reported in.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Billing date of the most recently emitted report.
    #[serde(default)]
    pub most_recent_report_date: Option<NaiveDate>,
}

fn default_password_env() -> String {
    DEFAULT_PASSWORD_ENV.to_string()
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: String::new(),
            password_env: default_password_env(),
            time_zone: default_time_zone(),
            most_recent_report_date: None,
        }
    }
}

impl Settings {
    /// Returns the default settings file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wattbill")
            .join("settings.json")
    }

    /// Loads settings from a specific path, falling back to defaults when
    /// the file does not exist yet.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Io`] or [`SettingsError::Parse`].
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Saves settings to a specific path, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Io`] or [`SettingsError::Parse`].
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// Resolves the configured zone name.
    ///
    /// # Errors
    ///
    /// [`SettingsError::UnknownZone`].
    pub fn zone(&self) -> Result<Tz, SettingsError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| SettingsError::UnknownZone(self.time_zone.clone()))
    }

    /// Reads the portal password from the configured environment variable.
    ///
    /// # Errors
    ///
    /// [`SettingsError::MissingPassword`].
    pub fn password(&self) -> Result<String, SettingsError> {
        std::env::var(&self.password_env)
            .map_err(|_| SettingsError::MissingPassword(self.password_env.clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            username: "oruUser".to_string(),
            most_recent_report_date: NaiveDate::from_ymd_opt(2017, 8, 16),
            ..Settings::default()
        };

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();

        assert_eq!(loaded.username, "oruUser");
        assert_eq!(
            loaded.most_recent_report_date,
            NaiveDate::from_ymd_opt(2017, 8, 16)
        );
        assert_eq!(loaded.time_zone, "America/New_York");
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.username.is_empty());
        assert!(loaded.most_recent_report_date.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"username": "oruUser"}"#).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.username, "oruUser");
        assert_eq!(loaded.password_env, "WATTBILL_PORTAL_PASSWORD");
        assert_eq!(loaded.time_zone, "America/New_York");
    }

    #[test]
    fn test_zone_resolution() {
        let settings = Settings::default();
        assert_eq!(settings.zone().unwrap(), chrono_tz::America::New_York);

        let bad = Settings {
            time_zone: "Mars/Olympus_Mons".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            bad.zone().unwrap_err(),
            SettingsError::UnknownZone(_)
        ));
    }
}
