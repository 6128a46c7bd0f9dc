//! Engine handle
//!
//! A cheap, cloneable reference to one engine instance. Every accessor
//! checks three things in order: the engine still exists (`OutsideEngine`),
//! it is `Ready` (`NotInitialized`), and the module is known
//! (`UnknownModule`). Nothing is cached on the handle, so it always reflects
//! the current engine state.

use std::any::Any;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use uuid::Uuid;

use crate::module::capability::CapabilityMap;
use crate::module::manager::{EngineShared, EngineSnapshot};
use crate::module::resolver::ResolvedModules;
use crate::module::traits::{EngineError, EngineState};
use crate::store::StoreRegistry;

/// Initialization status as seen by a consumer
#[derive(Debug, Clone)]
pub enum Status {
    /// Not ready yet, or already torn down
    Pending(EngineState),
    Ready(Arc<ResolvedModules>),
    Failed(EngineError),
}

impl Status {
    pub fn is_ready(&self) -> bool {
        matches!(self, Status::Ready(_))
    }
}

/// Handle to an engine's resolved modules
#[derive(Debug, Clone)]
pub struct FxHandle {
    shared: Weak<EngineShared>,
}

impl FxHandle {
    pub(crate) fn new(shared: Weak<EngineShared>) -> Self {
        Self { shared }
    }

    /// A handle that was never attached to an engine
    pub fn detached() -> Self {
        Self {
            shared: Weak::new(),
        }
    }

    fn engine(&self) -> Result<Arc<EngineShared>, EngineError> {
        self.shared.upgrade().ok_or(EngineError::OutsideEngine)
    }

    pub fn is_attached(&self) -> bool {
        self.shared.strong_count() > 0
    }

    pub fn engine_id(&self) -> Result<Uuid, EngineError> {
        Ok(self.engine()?.id)
    }

    pub fn state(&self) -> Result<EngineState, EngineError> {
        Ok(self.engine()?.state())
    }

    /// Full capability map; only available while `Ready`
    pub fn resolved(&self) -> Result<Arc<ResolvedModules>, EngineError> {
        let snapshot = self.engine()?.snapshot();
        match snapshot.resolved {
            Some(resolved) if snapshot.state == EngineState::Ready => Ok(resolved),
            _ => Err(EngineError::NotInitialized {
                state: snapshot.state,
            }),
        }
    }

    /// One module's slice
    pub fn select(&self, module: &str) -> Result<Arc<CapabilityMap>, EngineError> {
        self.resolved()?.module(module).map(Arc::clone)
    }

    /// Typed handle to `module.key`
    pub fn capability<T: Any + Send + Sync>(
        &self,
        module: &str,
        key: &str,
    ) -> Result<Arc<T>, EngineError> {
        self.resolved()?.capability::<T>(module, key)
    }

    /// Current status, for rendering a fallback until the engine is ready
    pub fn status(&self) -> Result<Status, EngineError> {
        let snapshot = self.engine()?.snapshot();
        Ok(Self::status_of(snapshot))
    }

    fn status_of(snapshot: EngineSnapshot) -> Status {
        match (snapshot.state, snapshot.resolved, snapshot.error) {
            (EngineState::Ready, Some(resolved), _) => Status::Ready(resolved),
            (EngineState::Failed, _, Some(error)) => Status::Failed(error),
            (state, _, _) => Status::Pending(state),
        }
    }

    /// Receiver notified on every engine state change
    pub fn subscribe(&self) -> Result<watch::Receiver<EngineSnapshot>, EngineError> {
        Ok(self.engine()?.subscribe())
    }

    /// Wait until the engine is `Ready`
    ///
    /// Returns the engine's error if it fails, `NotInitialized` once it has
    /// been torn down and `OutsideEngine` if it is dropped while waiting.
    pub async fn wait_ready(&self) -> Result<Arc<ResolvedModules>, EngineError> {
        // Don't keep the engine alive while waiting
        let mut rx = self.engine()?.subscribe();
        let snapshot = {
            let current = rx
                .wait_for(|s| {
                    s.torn_down || matches!(s.state, EngineState::Ready | EngineState::Failed)
                })
                .await
                .map_err(|_| EngineError::OutsideEngine)?;
            EngineSnapshot::clone(&current)
        };

        match Self::status_of(snapshot) {
            Status::Ready(resolved) => Ok(resolved),
            Status::Failed(error) => Err(error),
            Status::Pending(state) => Err(EngineError::NotInitialized { state }),
        }
    }

    /// The engine's store registry
    pub fn stores(&self) -> Result<Arc<StoreRegistry>, EngineError> {
        Ok(Arc::clone(&self.engine()?.stores))
    }
}
