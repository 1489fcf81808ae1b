//! Configuration types for uitest.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Defaults for `wait_until`
    pub wait: WaitSettings,
    /// Key-press settings
    pub press: PressSettings,
    /// Image loading settings
    pub images: ImageSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        secs("wait.timeout_secs", self.wait.timeout_secs)?;
        secs("wait.interval_secs", self.wait.interval_secs)?;
        secs("wait.stable_secs", self.wait.stable_secs)?;
        secs("press.interpress_delay_secs", self.press.interpress_delay_secs)?;
        secs("press.max_hold_secs", self.press.max_hold_secs)?;

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::Config(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }

        Ok(())
    }
}

/// Convert a seconds setting, rejecting values a `Duration` can't hold.
fn secs(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        Error::Config(format!(
            "{name} must be a finite number >= 0, got {value}"
        ))
    })
}

/// Defaults for stability polling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaitSettings {
    /// Total time budget in seconds
    pub timeout_secs: f64,
    /// Minimum spacing between probe invocations in seconds
    pub interval_secs: f64,
    /// Required stability in seconds (0 = don't require stability)
    pub stable_secs: f64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10.0,
            interval_secs: 0.0,
            stable_secs: 0.0,
        }
    }
}

impl WaitSettings {
    /// Timeout as a Duration.
    pub fn timeout(&self) -> Result<Duration> {
        secs("wait.timeout_secs", self.timeout_secs)
    }

    /// Interval as a Duration.
    pub fn interval(&self) -> Result<Duration> {
        secs("wait.interval_secs", self.interval_secs)
    }

    /// Stability window, `None` when disabled.
    pub fn stable(&self) -> Result<Option<Duration>> {
        let stable = secs("wait.stable_secs", self.stable_secs)?;
        Ok((!stable.is_zero()).then_some(stable))
    }
}

/// Key-press settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PressSettings {
    /// Minimum time between consecutive key-presses in seconds
    pub interpress_delay_secs: f64,
    /// Longest allowed key hold in seconds
    pub max_hold_secs: f64,
}

impl Default for PressSettings {
    fn default() -> Self {
        Self {
            interpress_delay_secs: 0.3,
            max_hold_secs: 60.0,
        }
    }
}

impl PressSettings {
    /// Default gap between key-presses as a Duration.
    pub fn interpress_delay(&self) -> Result<Duration> {
        secs("press.interpress_delay_secs", self.interpress_delay_secs)
    }

    /// Longest allowed key hold as a Duration.
    pub fn max_hold(&self) -> Result<Duration> {
        secs("press.max_hold_secs", self.max_hold_secs)
    }
}

/// Image loading settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ImageSettings {
    /// Directory that relative image paths are resolved against
    /// (the current directory when unset)
    pub root: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
