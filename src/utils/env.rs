//! `FX_*` environment overrides
//!
//! Reads the variables that can override an [`EngineConfig`]. Values are
//! trimmed and an empty value counts as unset. A value that is set but cannot
//! be parsed is an error, never silently ignored.
//!
//! [`EngineConfig`]: crate::config::EngineConfig

use thiserror::Error;

/// Log filter override
pub const LOG_FILTER_VAR: &str = "FX_LOG";
/// JSON log output override
pub const LOG_JSON_VAR: &str = "FX_LOG_JSON";
/// Per factory / module hook timeout, in seconds
pub const FACTORY_TIMEOUT_VAR: &str = "FX_FACTORY_TIMEOUT_SECS";
/// Per lifecycle hook timeout, in seconds
pub const HOOK_TIMEOUT_VAR: &str = "FX_HOOK_TIMEOUT_SECS";

/// Malformed override value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("{key}={value:?} is not a flag (expected true/false, 1/0, yes/no or on/off)")]
    InvalidFlag { key: &'static str, value: String },

    #[error("{key}={value:?} is not a positive number of seconds")]
    InvalidSeconds { key: &'static str, value: String },
}

fn process_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Typed view over the `FX_*` variables of some environment
pub struct EnvOverrides<F> {
    lookup: F,
}

impl EnvOverrides<fn(&str) -> Option<String>> {
    /// Overrides from the process environment
    pub fn from_process() -> Self {
        Self {
            lookup: process_var,
        }
    }
}

impl<F> EnvOverrides<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Overrides from an arbitrary lookup (tests, embedding hosts)
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    fn value(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn log_filter(&self) -> Option<String> {
        self.value(LOG_FILTER_VAR)
    }

    pub fn log_json(&self) -> Result<Option<bool>, EnvError> {
        self.flag(LOG_JSON_VAR)
    }

    pub fn factory_timeout_seconds(&self) -> Result<Option<u64>, EnvError> {
        self.seconds(FACTORY_TIMEOUT_VAR)
    }

    pub fn hook_timeout_seconds(&self) -> Result<Option<u64>, EnvError> {
        self.seconds(HOOK_TIMEOUT_VAR)
    }

    fn flag(&self, key: &'static str) -> Result<Option<bool>, EnvError> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(EnvError::InvalidFlag { key, value }),
        }
    }

    fn seconds(&self, key: &'static str) -> Result<Option<u64>, EnvError> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Some(secs)),
            _ => Err(EnvError::InvalidSeconds { key, value }),
        }
    }
}
