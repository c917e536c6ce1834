//! Clinic settings for the Clinica scheduling service.
//!
//! Settings are loaded once at startup from a TOML file (path from the CLI,
//! the `CLINICA_CONFIG` environment variable, or `clinica.toml`) and shared
//! immutably; there is no live reconfiguration. Recognized keys mirror the
//! clinic's operational knobs: clinic name, business hours, slot
//! granularity, the buffer between appointments, and the cancellation
//! notice policy.

use serde::{Deserialize, Serialize};
use std::path::Path;
use time::Time;
use time::macros::format_description;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "clinica.toml";

/// Environment variable that points at the configuration file.
pub const CONFIG_PATH_ENV: &str = "CLINICA_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClinicSettings {
    #[serde(default)]
    pub clinic: ClinicInfo,
    #[serde(default)]
    pub business_hours: BusinessHours,
    #[serde(default)]
    pub scheduling: SchedulingSettings,
    #[serde(default)]
    pub cancellation_policy: CancellationPolicy,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Logging settings applied after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicInfo {
    #[serde(default = "default_clinic_name")]
    pub name: String,
}

impl Default for ClinicInfo {
    fn default() -> Self {
        Self {
            name: default_clinic_name(),
        }
    }
}

fn default_clinic_name() -> String {
    "Clinica".to_string()
}

/// Daily opening window, as `HH:MM` wall-clock strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHours {
    #[serde(default = "default_hours_start")]
    pub start: String,
    #[serde(default = "default_hours_end")]
    pub end: String,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: default_hours_start(),
            end: default_hours_end(),
        }
    }
}

fn default_hours_start() -> String {
    "08:00".to_string()
}

fn default_hours_end() -> String {
    "18:00".to_string()
}

impl BusinessHours {
    /// Parses the window into `time::Time` bounds.
    pub fn resolve(&self) -> Result<(Time, Time)> {
        let format = format_description!("[hour]:[minute]");
        let start = Time::parse(&self.start, &format).map_err(|e| {
            ConfigError::parse(format!("business_hours.start '{}': {e}", self.start))
        })?;
        let end = Time::parse(&self.end, &format).map_err(|e| {
            ConfigError::parse(format!("business_hours.end '{}': {e}", self.end))
        })?;
        Ok((start, end))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingSettings {
    /// Step between candidate slot starts, in minutes.
    #[serde(default = "default_slot_granularity")]
    pub slot_granularity_minutes: u32,
    /// Idle minutes kept free around each booked appointment.
    #[serde(default)]
    pub appointment_buffer_minutes: u32,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: default_slot_granularity(),
            appointment_buffer_minutes: 0,
        }
    }
}

fn default_slot_granularity() -> u32 {
    15
}

/// How late cancellations are treated by the lifecycle manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CancellationEnforcement {
    /// Late cancellations are rejected.
    #[default]
    Block,
    /// Late cancellations go through, with a warning logged.
    Advise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationPolicy {
    /// Required notice before the scheduled start, in hours.
    #[serde(default = "default_notice_hours")]
    pub notice_hours: u32,
    #[serde(default)]
    pub enforcement: CancellationEnforcement,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            notice_hours: default_notice_hours(),
            enforcement: CancellationEnforcement::Block,
        }
    }
}

fn default_notice_hours() -> u32 {
    24
}

impl ClinicSettings {
    pub fn validate(&self) -> Result<()> {
        if self.clinic.name.trim().is_empty() {
            return Err(ConfigError::validation("clinic.name must not be empty"));
        }
        let (start, end) = self.business_hours.resolve()?;
        if end <= start {
            return Err(ConfigError::validation(format!(
                "business hours end '{}' must be after start '{}'",
                self.business_hours.end, self.business_hours.start
            )));
        }
        if self.scheduling.slot_granularity_minutes == 0 {
            return Err(ConfigError::validation(
                "scheduling.slot_granularity_minutes must be > 0",
            ));
        }
        if self.scheduling.slot_granularity_minutes > 24 * 60 {
            return Err(ConfigError::validation(
                "scheduling.slot_granularity_minutes must fit within a day",
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::validation("server.port must be > 0"));
        }
        Ok(())
    }

    /// Parses settings from TOML text and validates them.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: ClinicSettings =
            toml::from_str(text).map_err(|e| ConfigError::parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a file, falling back to defaults when the
    /// default config file is absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(p) => (p.into(), true),
                Err(_) => (DEFAULT_CONFIG_FILE.into(), false),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("configuration file not found: {}", path.display()),
                )));
            }
            tracing::info!("no configuration file found, using defaults");
            let defaults = Self::default();
            defaults.validate()?;
            return Ok(defaults);
        }

        let text = std::fs::read_to_string(&path)?;
        let settings = Self::from_toml(&text)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = ClinicSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.clinic.name, "Clinica");
        assert_eq!(settings.scheduling.slot_granularity_minutes, 15);
        assert_eq!(settings.cancellation_policy.notice_hours, 24);
        assert_eq!(
            settings.cancellation_policy.enforcement,
            CancellationEnforcement::Block
        );
    }

    #[test]
    fn test_business_hours_resolve() {
        let hours = BusinessHours::default();
        let (start, end) = hours.resolve().unwrap();
        assert_eq!(start, Time::from_hms(8, 0, 0).unwrap());
        assert_eq!(end, Time::from_hms(18, 0, 0).unwrap());
    }

    #[test]
    fn test_from_toml_overrides() {
        let settings = ClinicSettings::from_toml(
            r#"
            [clinic]
            name = "Elm Street Clinic"

            [business_hours]
            start = "09:00"
            end = "17:00"

            [scheduling]
            slot_granularity_minutes = 10
            appointment_buffer_minutes = 5

            [cancellation_policy]
            notice_hours = 48
            enforcement = "advise"
            "#,
        )
        .unwrap();

        assert_eq!(settings.clinic.name, "Elm Street Clinic");
        assert_eq!(settings.scheduling.appointment_buffer_minutes, 5);
        assert_eq!(settings.cancellation_policy.notice_hours, 48);
        assert_eq!(
            settings.cancellation_policy.enforcement,
            CancellationEnforcement::Advise
        );
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings = ClinicSettings::from_toml(
            r#"
            [clinic]
            name = "Elm Street Clinic"
            "#,
        )
        .unwrap();
        assert_eq!(settings.business_hours.start, "08:00");
        assert_eq!(settings.scheduling.slot_granularity_minutes, 15);
    }

    #[test]
    fn test_inverted_hours_rejected() {
        let err = ClinicSettings::from_toml(
            r#"
            [business_hours]
            start = "18:00"
            end = "08:00"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_unparseable_hours_rejected() {
        let err = ClinicSettings::from_toml(
            r#"
            [business_hours]
            start = "late morning"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_granularity_rejected() {
        let err = ClinicSettings::from_toml(
            r#"
            [scheduling]
            slot_granularity_minutes = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_zero_port_rejected() {
        let err = ClinicSettings::from_toml(
            r#"
            [server]
            port = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[clinic]\nname = \"File Clinic\"").unwrap();

        let settings = ClinicSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.clinic.name, "File Clinic");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let err =
            ClinicSettings::load(Some(Path::new("/nonexistent/clinica.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
