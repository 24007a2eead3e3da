//! Configuration management for urc-controller
//!
//! Configuration is stored in TOML format at the platform config dir
//! (`~/.config/urc/controller.toml` on Unix, `%APPDATA%\urc\controller.toml`
//! on Windows). Command-line arguments take precedence over file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use urc_proto::Role;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Controller configuration
///
/// # Example TOML
///
/// ```toml
/// [device]
/// address = "192.168.4.1"
/// role = "LAYMAN"  # "LAYMAN" | "MEDICAL"
///
/// [timeouts]
/// probe_seconds = 10
/// capture_seconds = 90
///
/// [output]
/// format = "table"  # "table" | "json" | "quiet"
/// verbose = false
/// colors = true
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Device configuration
    #[serde(default)]
    pub device: DeviceConfig,

    /// Timeout configuration
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Address of the analyzer device. The factory hotspot hands out
    /// 192.168.4.1, so that is the out-of-the-box default.
    #[serde(default = "default_address")]
    pub address: String,

    /// Requesting role: "LAYMAN" or "MEDICAL"
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_address() -> String {
    "192.168.4.1".to_string()
}

fn default_role() -> String {
    "LAYMAN".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            role: default_role(),
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Seconds to wait for the capability answer
    #[serde(default = "default_probe_seconds")]
    pub probe_seconds: u64,

    /// Seconds to wait for an analysis result
    #[serde(default = "default_capture_seconds")]
    pub capture_seconds: u64,
}

fn default_probe_seconds() -> u64 {
    10
}

fn default_capture_seconds() -> u64 {
    90
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            probe_seconds: default_probe_seconds(),
            capture_seconds: default_capture_seconds(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "table", "json", "quiet"
    #[serde(default = "default_format")]
    pub format: String,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable colors
    #[serde(default = "default_colors")]
    pub colors: bool,
}

fn default_format() -> String {
    "table".to_string()
}

fn default_colors() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            verbose: false,
            colors: default_colors(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (empty = stderr only)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    /// Get default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "uristrip", "urc")
            .map(|dirs| dirs.config_dir().join("controller.toml"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create default configuration file if it doesn't exist
    pub fn create_default_if_missing() -> Result<bool, ConfigError> {
        if let Some(path) = Self::default_path() {
            if !path.exists() {
                let config = Self::default();
                config.save(&path)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.address.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "device address must not be empty".to_string(),
            ));
        }

        if self.device.role.parse::<Role>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Invalid role '{}'. Valid values: [\"LAYMAN\", \"MEDICAL\"]",
                self.device.role
            )));
        }

        let valid_formats = ["table", "json", "quiet"];
        if !valid_formats.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid output format '{}'. Valid values: {:?}",
                self.output.format, valid_formats
            )));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        if self.timeouts.probe_seconds == 0 || self.timeouts.capture_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Role parsed from the validated config value.
    pub fn role(&self) -> Role {
        self.device.role.parse().unwrap_or(Role::Layman)
    }

    /// Probe timeout as a duration.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.probe_seconds)
    }

    /// Capture timeout as a duration.
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.capture_seconds)
    }

    /// Generate a sample configuration file content
    pub fn sample_toml() -> &'static str {
        r#"# URC Controller Configuration

[device]
# Address of the analyzer device (factory hotspot default)
address = "192.168.4.1"
# Requesting role: "LAYMAN" or "MEDICAL"
role = "LAYMAN"

[timeouts]
# Seconds to wait for the capability answer
probe_seconds = 10
# Seconds to wait for an analysis result
capture_seconds = 90

[output]
# Output format: "table", "json", "quiet"
format = "table"
# Enable verbose output
verbose = false
# Enable colored output
colors = true

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
# Log file path (empty = stderr only)
# file = ""
"#
    }
}

/// CLI configuration overrides
///
/// This struct captures CLI flags that can override config file values.
/// Command-line arguments take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Output format override
    pub output_format: Option<String>,
    /// Verbose flag override
    pub verbose: Option<bool>,
    /// Debug flag override
    pub debug: Option<bool>,
    /// Device address override
    pub device_address: Option<String>,
    /// Role override
    pub role: Option<String>,
}

impl Config {
    /// Apply CLI overrides to configuration
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref format) = overrides.output_format {
            self.output.format = format.clone();
        }
        if let Some(verbose) = overrides.verbose {
            self.output.verbose = verbose;
        }
        if let Some(debug) = overrides.debug {
            if debug {
                self.logging.level = "debug".to_string();
            }
        }
        if let Some(ref address) = overrides.device_address {
            self.device.address = address.clone();
        }
        if let Some(ref role) = overrides.role {
            self.device.role = role.clone();
        }
        self
    }
}
