//! Configuration management for fx-engine
//!
//! Runtime settings for an engine instance: logging and step timeouts. The
//! module collection itself is code (`FxConfig`), not configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::utils::{EnvError, EnvOverrides};

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "fx_engine=debug"); RUST_LOG takes precedence
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON lines (requires the `json-logging` feature)
    #[serde(default = "default_false")]
    pub json_format: bool,
}

/// Timeouts applied to user code run by the engine
///
/// `None` means no timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Per capability factory and per module hook
    #[serde(default)]
    pub factory_timeout_seconds: Option<u64>,

    /// Per `on_start` / `on_stop` hook
    #[serde(default)]
    pub hook_timeout_seconds: Option<u64>,
}

impl TimeoutConfig {
    pub fn factory_timeout(&self) -> Option<Duration> {
        self.factory_timeout_seconds.map(Duration::from_secs)
    }

    pub fn hook_timeout(&self) -> Option<Duration> {
        self.hook_timeout_seconds.map(Duration::from_secs)
    }
}

fn default_false() -> bool {
    false
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,

    /// Step timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl EngineConfig {
    /// Load configuration from TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override settings from `FX_LOG`, `FX_LOG_JSON`,
    /// `FX_FACTORY_TIMEOUT_SECS` and `FX_HOOK_TIMEOUT_SECS`
    pub fn apply_env_overrides(self) -> Result<Self, EnvError> {
        self.apply_overrides(&EnvOverrides::from_process())
    }

    /// Apply overrides read from `env`; a malformed value is an error
    pub fn apply_overrides<F>(mut self, env: &EnvOverrides<F>) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(filter) = env.log_filter() {
            self.logging.get_or_insert_with(LoggingConfig::default).filter = Some(filter);
        }
        if let Some(json) = env.log_json()? {
            self.logging.get_or_insert_with(LoggingConfig::default).json_format = json;
        }
        if let Some(secs) = env.factory_timeout_seconds()? {
            self.timeouts.factory_timeout_seconds = Some(secs);
        }
        if let Some(secs) = env.hook_timeout_seconds()? {
            self.timeouts.hook_timeout_seconds = Some(secs);
        }
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeouts.factory_timeout_seconds == Some(0) {
            return Err(anyhow::anyhow!(
                "factory_timeout_seconds must be greater than 0 (omit it to disable the timeout)"
            ));
        }
        if self.timeouts.hook_timeout_seconds == Some(0) {
            return Err(anyhow::anyhow!(
                "hook_timeout_seconds must be greater than 0 (omit it to disable the timeout)"
            ));
        }
        Ok(())
    }
}
