//! Module system traits and interfaces
//!
//! Defines the engine lifecycle state, the error taxonomy, and the async seams
//! through which user code (capability factories, module hooks and lifecycle
//! hooks) plugs into the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::module::capability::{Capability, Dependencies, LocalView};
use crate::module::descriptor::HookIntent;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineState {
    /// Nothing resolved (initial state, and the state after teardown)
    Uninitialized,
    /// Resolution pass in flight
    Resolving,
    /// Every module resolved and start hooks ran
    Ready,
    /// Resolution or a start hook failed; terminal for this engine
    Failed,
    /// Stop hooks are running
    TearingDown,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Resolving => "resolving",
            EngineState::Ready => "ready",
            EngineState::Failed => "failed",
            EngineState::TearingDown => "tearing down",
        };
        f.write_str(name)
    }
}

/// Broad error class, used by presentation layers and tests to tell
/// configuration mistakes from runtime failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The module collection itself is malformed (missing names, cycles, duplicates)
    Configuration,
    /// A module's dependency view is missing a declared entry
    Injection,
    /// A factory, module hook or lifecycle hook failed
    Execution,
    /// Resolved state was accessed outside the ready window
    Usage,
}

/// A single failed hook in a best-effort pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    /// Position of the hook in its declared list
    pub index: usize,
    /// Rendered error chain
    pub message: String,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.index, self.message)
    }
}

fn join_failures(failures: &[HookFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Engine errors
///
/// User errors raised by factories and hooks are captured as rendered messages
/// so the first terminal error can be handed to the caller and kept on the
/// engine at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Duplicate module name: {0}")]
    DuplicateModule(String),

    #[error("Module not found: {dependency} (required by {module})")]
    ModuleNotFound { module: String, dependency: String },

    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("Module \"{module}\" is trying to use dependency \"{dependency}\" which was not injected")]
    DependencyNotInjected { module: String, dependency: String },

    #[error("Factory \"{capability}\" of module \"{module}\" failed: {message}")]
    FactoryFailed {
        module: String,
        capability: String,
        message: String,
    },

    #[error("{intent} hook #{index} of module \"{module}\" failed: {message}")]
    HookFailed {
        module: String,
        intent: HookIntent,
        /// Declaration position among the module's hooks of the same intent
        index: usize,
        message: String,
    },

    #[error("Start hook #{index} failed: {message}")]
    StartHookFailed { index: usize, message: String },

    #[error("{} stop hook(s) failed: {}", .failures.len(), join_failures(.failures))]
    StopHooksFailed { failures: Vec<HookFailure> },

    #[error("Engine start was cancelled before resolution finished")]
    StartCancelled,

    #[error("Timed out after {after:?} waiting for {step}")]
    Timeout { step: String, after: Duration },

    #[error("Engine is not initialized (state: {state})")]
    NotInitialized { state: EngineState },

    #[error("Handle used outside an active engine")]
    OutsideEngine,

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Capability \"{capability}\" is not provided by module \"{module}\"")]
    CapabilityNotFound { module: String, capability: String },

    #[error("Capability \"{capability}\" of module \"{module}\" is a {actual}, not a {expected}")]
    CapabilityTypeMismatch {
        module: String,
        capability: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Cannot {operation} while engine is {state}")]
    InvalidState {
        operation: &'static str,
        state: EngineState,
    },
}

impl EngineError {
    /// Map the error onto its taxonomy class
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::DuplicateModule(_)
            | EngineError::ModuleNotFound { .. }
            | EngineError::CircularDependency { .. } => ErrorCategory::Configuration,
            EngineError::DependencyNotInjected { .. } => ErrorCategory::Injection,
            EngineError::FactoryFailed { .. }
            | EngineError::HookFailed { .. }
            | EngineError::StartHookFailed { .. }
            | EngineError::StopHooksFailed { .. }
            | EngineError::StartCancelled
            | EngineError::Timeout { .. } => ErrorCategory::Execution,
            EngineError::NotInitialized { .. }
            | EngineError::OutsideEngine
            | EngineError::UnknownModule(_)
            | EngineError::CapabilityNotFound { .. }
            | EngineError::CapabilityTypeMismatch { .. }
            | EngineError::InvalidState { .. } => ErrorCategory::Usage,
        }
    }
}

/// Render a user error with its full cause chain
pub(crate) fn render_error(error: &anyhow::Error) -> String {
    format!("{:#}", error)
}

/// Capability factory
///
/// Receives exactly the capabilities of the modules its descriptor declared
/// as dependencies and produces one capability.
#[async_trait]
pub trait Factory: Send + Sync {
    async fn provide(&self, deps: Dependencies) -> anyhow::Result<Capability>;
}

/// Post-resolution module hook (`decorate` or `invoke`)
///
/// Sees the module's dependency view plus its own freshly produced capabilities.
#[async_trait]
pub trait ModuleHook: Send + Sync {
    async fn run(&self, view: LocalView) -> anyhow::Result<()>;
}

/// Zero-argument engine lifecycle hook (`on_start` / `on_stop`)
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}

/// Adapter turning a synchronous closure into a factory or hook
pub struct SyncFn<F>(pub F);

/// Adapter turning a closure that returns a future into a factory or hook
pub struct AsyncFn<F>(pub F);

#[async_trait]
impl<F, T> Factory for SyncFn<F>
where
    F: Fn(Dependencies) -> anyhow::Result<T> + Send + Sync,
    T: Any + Send + Sync,
{
    async fn provide(&self, deps: Dependencies) -> anyhow::Result<Capability> {
        (self.0)(deps).map(Capability::new)
    }
}

#[async_trait]
impl<F, Fut, T> Factory for AsyncFn<F>
where
    F: Fn(Dependencies) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Any + Send + Sync,
{
    async fn provide(&self, deps: Dependencies) -> anyhow::Result<Capability> {
        (self.0)(deps).await.map(Capability::new)
    }
}

#[async_trait]
impl<F> ModuleHook for SyncFn<F>
where
    F: Fn(LocalView) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, view: LocalView) -> anyhow::Result<()> {
        (self.0)(view)
    }
}

#[async_trait]
impl<F, Fut> ModuleHook for AsyncFn<F>
where
    F: Fn(LocalView) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, view: LocalView) -> anyhow::Result<()> {
        (self.0)(view).await
    }
}

#[async_trait]
impl<F> LifecycleHook for SyncFn<F>
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self) -> anyhow::Result<()> {
        (self.0)()
    }
}

#[async_trait]
impl<F, Fut> LifecycleHook for AsyncFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self) -> anyhow::Result<()> {
        (self.0)().await
    }
}
