//! Engine orchestration
//!
//! `Engine` owns one module collection and drives it through
//! `Uninitialized -> Resolving -> Ready | Failed -> TearingDown -> Uninitialized`.
//! Consumers never touch the engine directly; they go through an
//! [`FxHandle`](crate::module::api::FxHandle), which observes the state
//! published here.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::module::api::FxHandle;
use crate::module::descriptor::ModuleDescriptor;
use crate::module::lifecycle::{LifecycleCoordinator, LifecycleHooks};
use crate::module::registry::{DependencyGraph, Planner};
use crate::module::resolver::{ResolvedModules, Resolver};
use crate::module::traits::{EngineError, EngineState};
use crate::store::StoreRegistry;

/// Module collection plus engine-wide lifecycle hooks
#[derive(Debug, Clone, Default)]
pub struct FxConfig {
    modules: Vec<ModuleDescriptor>,
    hooks: LifecycleHooks,
}

impl FxConfig {
    pub fn new(modules: Vec<ModuleDescriptor>) -> Self {
        Self {
            modules,
            hooks: LifecycleHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Append a module
    pub fn module(mut self, module: ModuleDescriptor) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }
}

/// What consumers can observe about an engine
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub(crate) state: EngineState,
    pub(crate) resolved: Option<Arc<ResolvedModules>>,
    pub(crate) error: Option<EngineError>,
    /// Set once teardown has started; never cleared
    pub(crate) torn_down: bool,
}

impl EngineSnapshot {
    fn initial() -> Self {
        Self {
            state: EngineState::Uninitialized,
            resolved: None,
            error: None,
            torn_down: false,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The terminal error, while the engine is `Failed`
    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready && self.resolved.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

/// State shared between an engine and its handles
///
/// Handles hold this weakly, so dropping the engine invalidates them.
#[derive(Debug)]
pub(crate) struct EngineShared {
    pub(crate) id: Uuid,
    snapshot: watch::Sender<EngineSnapshot>,
    pub(crate) stores: Arc<StoreRegistry>,
}

impl EngineShared {
    fn new(id: Uuid) -> Self {
        let (snapshot, _) = watch::channel(EngineSnapshot::initial());
        Self {
            id,
            snapshot,
            stores: Arc::new(StoreRegistry::new()),
        }
    }

    pub(crate) fn snapshot(&self) -> EngineSnapshot {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn state(&self) -> EngineState {
        self.snapshot.borrow().state
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshot.subscribe()
    }

    fn set_state(&self, state: EngineState) {
        self.snapshot.send_modify(|s| s.state = state);
    }

    fn publish_ready(&self, resolved: Arc<ResolvedModules>) {
        self.snapshot.send_modify(|s| {
            s.state = EngineState::Ready;
            s.resolved = Some(resolved);
            s.error = None;
        });
    }

    fn publish_failed(&self, error: EngineError) {
        self.snapshot.send_modify(|s| {
            s.state = EngineState::Failed;
            s.resolved = None;
            s.error = Some(error);
        });
    }

    fn begin_teardown(&self) {
        self.snapshot.send_modify(|s| {
            s.state = EngineState::TearingDown;
            s.resolved = None;
            s.error = None;
            s.torn_down = true;
        });
    }
}

/// Dependency injection engine for one module collection
#[derive(Debug)]
pub struct Engine {
    config: FxConfig,
    settings: EngineConfig,
    shared: Arc<EngineShared>,
    /// Resolution runs at most once per engine
    resolved_once: bool,
    /// Stop hooks only run if start hooks were reached
    reached_ready: bool,
}

impl Engine {
    /// Create an engine with default settings
    pub fn new(config: FxConfig) -> Self {
        Self::with_config(config, EngineConfig::default())
    }

    /// Create an engine with explicit settings
    pub fn with_config(config: FxConfig, settings: EngineConfig) -> Self {
        Self {
            config,
            settings,
            shared: Arc::new(EngineShared::new(Uuid::new_v4())),
            resolved_once: false,
            reached_ready: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    /// The terminal error, while the engine is `Failed`
    pub fn error(&self) -> Option<EngineError> {
        self.shared.snapshot().error
    }

    pub fn settings(&self) -> &EngineConfig {
        &self.settings
    }

    /// Consumer handle bound to this engine
    pub fn handle(&self) -> FxHandle {
        FxHandle::new(Arc::downgrade(&self.shared))
    }

    /// Plan, resolve and start every module
    ///
    /// On error the engine is left `Failed` with the same error recorded;
    /// call [`Engine::teardown`] to release it.
    ///
    /// Dropping the returned future during resolution also leaves the engine
    /// `Failed`, with [`EngineError::StartCancelled`]. Dropping it while start
    /// hooks run leaves the engine `Ready` with the remaining hooks skipped.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        let span = info_span!("engine", id = %self.shared.id);
        self.start_inner().instrument(span).await
    }

    async fn start_inner(&mut self) -> Result<(), EngineError> {
        let state = self.state();
        if self.resolved_once || state != EngineState::Uninitialized {
            return Err(EngineError::InvalidState {
                operation: "start",
                state,
            });
        }
        self.resolved_once = true;

        info!("Starting engine with {} modules", self.config.modules.len());
        self.shared.set_state(EngineState::Resolving);
        let _cancelled = ResolvingGuard(Arc::clone(&self.shared));

        let plan = match DependencyGraph::build(&self.config.modules)
            .and_then(|graph| Planner::plan(&graph))
        {
            Ok(plan) => plan,
            Err(e) => return Err(self.fail(e)),
        };
        info!("Initialization order: {}", plan.order().join(" -> "));

        let resolved = match Resolver::new(&self.settings.timeouts)
            .resolve(&self.config.modules, &plan)
            .await
        {
            Ok(resolved) => resolved,
            Err(e) => return Err(self.fail(e)),
        };

        self.shared.publish_ready(Arc::new(resolved));
        self.reached_ready = true;
        info!("Engine ready");

        if let Err(e) = LifecycleCoordinator::new(&self.settings.timeouts)
            .run_start(&self.config.hooks)
            .await
        {
            return Err(self.fail(e));
        }
        Ok(())
    }

    fn fail(&self, error: EngineError) -> EngineError {
        error!("Engine failed: {}", error);
        self.shared.publish_failed(error.clone());
        error
    }

    /// Run stop hooks and discard the resolved map
    ///
    /// The engine always ends `Uninitialized`, even when stop hooks fail;
    /// their failures are reported together afterwards.
    pub async fn teardown(&mut self) -> Result<(), EngineError> {
        let span = info_span!("engine", id = %self.shared.id);
        self.teardown_inner().instrument(span).await
    }

    async fn teardown_inner(&mut self) -> Result<(), EngineError> {
        let state = self.state();
        if !matches!(state, EngineState::Ready | EngineState::Failed) {
            return Err(EngineError::InvalidState {
                operation: "tear down",
                state,
            });
        }

        info!("Tearing down engine");
        self.shared.begin_teardown();
        self.shared.stores.clear();

        let failures = if self.reached_ready {
            LifecycleCoordinator::new(&self.settings.timeouts)
                .run_stop(&self.config.hooks)
                .await
        } else {
            Vec::new()
        };

        self.shared.set_state(EngineState::Uninitialized);
        info!("Engine torn down");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EngineError::StopHooksFailed { failures })
        }
    }
}

/// Marks the engine `Failed` if `start` is dropped while still resolving
struct ResolvingGuard(Arc<EngineShared>);

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        if self.0.state() == EngineState::Resolving {
            warn!("Engine {} start cancelled during resolution", self.0.id);
            self.0.publish_failed(EngineError::StartCancelled);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.state() == EngineState::Ready {
            warn!(
                "Engine {} dropped while ready; stop hooks were not run",
                self.shared.id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_module(name: &str, calls: &Arc<AtomicUsize>) -> ModuleDescriptor {
        let calls = Arc::clone(calls);
        ModuleDescriptor::builder(name)
            .provide("calls", move |_| Ok(calls.fetch_add(1, Ordering::SeqCst)))
            .build()
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = Engine::new(FxConfig::new(vec![counting_module("a", &calls)]));
        assert_eq!(engine.state(), EngineState::Uninitialized);

        engine.start().await.unwrap();
        assert_eq!(engine.state(), EngineState::Ready);
        assert!(engine.error().is_none());

        engine.teardown().await.unwrap();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = Engine::new(FxConfig::new(vec![counting_module("a", &calls)]));
        engine.start().await.unwrap();

        let err = engine.start().await.unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidState {
                operation: "start",
                state: EngineState::Ready,
            }
        );

        engine.teardown().await.unwrap();
        assert!(engine.start().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_recorded() {
        let broken = ModuleDescriptor::builder("broken")
            .provide("value", |_| -> anyhow::Result<u8> { Err(anyhow::anyhow!("boom")) })
            .build();
        let mut engine = Engine::new(FxConfig::new(vec![broken]));

        let err = engine.start().await.unwrap_err();
        assert_eq!(engine.state(), EngineState::Failed);
        assert_eq!(engine.error(), Some(err));

        engine.teardown().await.unwrap();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(engine.error().is_none());
    }

    #[tokio::test]
    async fn test_teardown_requires_start() {
        let mut engine = Engine::new(FxConfig::default());
        assert!(matches!(
            engine.teardown().await,
            Err(EngineError::InvalidState { operation: "tear down", .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_start_fails_engine() {
        let stalled = ModuleDescriptor::builder("stalled")
            .provide_async("value", |_| futures::future::pending::<anyhow::Result<u8>>())
            .build();
        let mut engine = Engine::new(FxConfig::new(vec![stalled]));
        let handle = engine.handle();

        let started =
            tokio::time::timeout(std::time::Duration::from_secs(1), engine.start()).await;
        assert!(started.is_err());

        assert_eq!(engine.state(), EngineState::Failed);
        assert_eq!(engine.error(), Some(EngineError::StartCancelled));
        assert_eq!(
            handle.wait_ready().await.unwrap_err(),
            EngineError::StartCancelled
        );

        engine.teardown().await.unwrap();
        assert_eq!(engine.state(), EngineState::Uninitialized);
    }

    #[tokio::test]
    async fn test_stores_cleared_on_teardown() {
        let mut engine = Engine::new(FxConfig::default());
        engine.start().await.unwrap();

        let stores = engine.handle().stores().unwrap();
        stores.create("session", 0u32).unwrap();
        engine.teardown().await.unwrap();
        assert!(stores.is_empty());
    }
}
