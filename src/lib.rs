//! fx-engine - declarative module dependency injection
//!
//! Applications are assembled from named modules. Each module declares which
//! other modules it depends on and which capabilities it provides; the engine
//! orders modules so every dependency is resolved before its dependents,
//! evaluates (possibly asynchronous) capability factories, runs
//! post-resolution hooks, and exposes the resulting capability map to
//! consumers only once everything is ready.
//!
//! ## Design Principles
//!
//! 1. **Deterministic order**: dependencies first, ties broken by declaration order
//! 2. **Least knowledge**: a factory sees only the modules it declared
//! 3. **Fail early**: missing modules and cycles are rejected before any factory runs
//! 4. **Explicit ownership**: one engine per module collection, no global state
//!
//! ## Example
//!
//! ```no_run
//! use fx_engine::{Engine, FxConfig, LifecycleHooks, ModuleDescriptor};
//!
//! # async fn run() -> Result<(), fx_engine::EngineError> {
//! let config = ModuleDescriptor::builder("config")
//!     .provide("debug", |_| Ok(true))
//!     .build();
//! let logger = ModuleDescriptor::builder("logger")
//!     .depends_on(&config)
//!     .provide("prefix", |deps| {
//!         let debug = *deps.get::<bool>("config", "debug")?;
//!         Ok(if debug { "[debug]" } else { "[app]" }.to_string())
//!     })
//!     .build();
//!
//! let mut engine = Engine::new(
//!     FxConfig::new(vec![logger, config])
//!         .with_hooks(LifecycleHooks::new().on_start(|| Ok(()))),
//! );
//! let handle = engine.handle();
//!
//! engine.start().await?;
//! let prefix = handle.capability::<String>("logger", "prefix")?;
//! assert_eq!(prefix.as_str(), "[debug]");
//! engine.teardown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod module;
pub mod store;
pub mod utils;

pub use config::{EngineConfig, LoggingConfig, TimeoutConfig};
pub use module::{
    Capability, CapabilityMap, Dependencies, Engine, EngineError, EngineSnapshot, EngineState,
    ErrorCategory, FxConfig, FxHandle, HookIntent, LifecycleHooks, LocalView, ModuleDescriptor,
    ResolvedModules, Status,
};
pub use store::{Store, StoreError, StoreRegistry};
