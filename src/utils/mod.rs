//! Shared helpers: logging setup, environment overrides and step timeouts

pub mod env;
pub mod logging;
pub mod timeout;

pub use env::{EnvError, EnvOverrides};
pub use logging::{init_logging, init_logging_from_config};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use timeout::with_optional_timeout;
