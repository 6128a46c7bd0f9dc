//! Module system for fx-engine
//!
//! Modules are declared in code as [`ModuleDescriptor`]s: a name, the modules
//! they depend on, named capability factories and post-resolution hooks.
//!
//! ## Architecture
//!
//! - **Registry**: builds the dependency graph and plans a deterministic
//!   initialization order
//! - **Resolver**: evaluates factories in that order, giving each module only
//!   its declared dependencies
//! - **Lifecycle**: engine-wide start and stop hooks
//! - **Engine**: the state machine tying these together
//! - **API**: handles through which consumers read resolved capabilities

pub mod api;
pub mod capability;
pub mod descriptor;
pub mod lifecycle;
pub mod manager;
pub mod registry;
pub mod resolver;
pub mod traits;

pub use api::{FxHandle, Status};
pub use capability::{Capability, CapabilityMap, Dependencies, LocalView};
pub use descriptor::{HookIntent, ModuleDescriptor, ModuleDescriptorBuilder, PostHook};
pub use lifecycle::{LifecycleCoordinator, LifecycleHooks};
pub use manager::{Engine, EngineSnapshot, FxConfig};
pub use registry::{DependencyGraph, GraphManifest, InitializationPlan, ManifestModule, Planner};
pub use resolver::{ResolvedModules, Resolver};
pub use traits::{
    AsyncFn, EngineError, EngineState, ErrorCategory, Factory, HookFailure, LifecycleHook,
    ModuleHook, SyncFn,
};
