//! Lifecycle coordination
//!
//! Engine-wide `on_start` hooks run once every module is resolved, in
//! declaration order. `on_stop` hooks run at teardown in reverse declaration
//! order. Start is fail-fast; stop is best-effort and never short-circuits.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TimeoutConfig;
use crate::module::traits::{
    render_error, AsyncFn, EngineError, HookFailure, LifecycleHook, SyncFn,
};
use crate::utils::with_optional_timeout;

/// Ordered engine lifecycle hooks
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    on_start: Vec<Arc<dyn LifecycleHook>>,
    on_stop: Vec<Arc<dyn LifecycleHook>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start<F>(self, hook: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_start_with(Arc::new(SyncFn(hook)))
    }

    pub fn on_start_async<F, Fut>(self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_start_with(Arc::new(AsyncFn(hook)))
    }

    pub fn on_start_with(mut self, hook: Arc<dyn LifecycleHook>) -> Self {
        self.on_start.push(hook);
        self
    }

    pub fn on_stop<F>(self, hook: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_stop_with(Arc::new(SyncFn(hook)))
    }

    pub fn on_stop_async<F, Fut>(self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_stop_with(Arc::new(AsyncFn(hook)))
    }

    pub fn on_stop_with(mut self, hook: Arc<dyn LifecycleHook>) -> Self {
        self.on_stop.push(hook);
        self
    }

    pub fn start_hooks(&self) -> usize {
        self.on_start.len()
    }

    pub fn stop_hooks(&self) -> usize {
        self.on_stop.len()
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("on_start", &self.on_start.len())
            .field("on_stop", &self.on_stop.len())
            .finish()
    }
}

/// Runs lifecycle hooks with the configured per-hook timeout
#[derive(Debug, Clone, Default)]
pub struct LifecycleCoordinator {
    hook_timeout: Option<Duration>,
}

impl LifecycleCoordinator {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        Self {
            hook_timeout: timeouts.hook_timeout(),
        }
    }

    /// Run start hooks in declaration order, stopping at the first failure
    ///
    /// Hooks that already ran are not reverted.
    pub async fn run_start(&self, hooks: &LifecycleHooks) -> Result<(), EngineError> {
        for (index, hook) in hooks.on_start.iter().enumerate() {
            debug!("Running start hook #{}", index);
            self.run_one(hook.as_ref())
                .await
                .map_err(|message| EngineError::StartHookFailed { index, message })?;
        }
        info!("Ran {} start hooks", hooks.on_start.len());
        Ok(())
    }

    /// Run every stop hook in reverse declaration order
    ///
    /// Failures are logged and collected; the remaining hooks still run.
    /// `index` in each failure is the hook's declaration position.
    pub async fn run_stop(&self, hooks: &LifecycleHooks) -> Vec<HookFailure> {
        let mut failures = Vec::new();
        for (index, hook) in hooks.on_stop.iter().enumerate().rev() {
            debug!("Running stop hook #{}", index);
            if let Err(message) = self.run_one(hook.as_ref()).await {
                warn!("Stop hook #{} failed: {}", index, message);
                failures.push(HookFailure { index, message });
            }
        }
        info!(
            "Ran {} stop hooks ({} failed)",
            hooks.on_stop.len(),
            failures.len()
        );
        failures
    }

    async fn run_one(&self, hook: &dyn LifecycleHook) -> Result<(), String> {
        match with_optional_timeout(hook.run(), self.hook_timeout).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(render_error(&e)),
            Err(after) => Err(format!("timed out after {:?}", after)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type RecordingHook = Box<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> RecordingHook) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_for_hooks = Arc::clone(&log);
        let make = move |name: &'static str| -> RecordingHook {
            let log = Arc::clone(&log_for_hooks);
            Box::new(move || {
                log.lock().unwrap().push(name);
                Ok(())
            })
        };
        (log, make)
    }

    #[tokio::test]
    async fn test_start_in_order_stop_in_reverse() {
        let (log, make) = recorder();
        let hooks = LifecycleHooks::new()
            .on_start(make("f1"))
            .on_start(make("f2"))
            .on_stop(make("g1"))
            .on_stop(make("g2"));

        let coordinator = LifecycleCoordinator::default();
        coordinator.run_start(&hooks).await.unwrap();
        assert!(coordinator.run_stop(&hooks).await.is_empty());

        assert_eq!(*log.lock().unwrap(), vec!["f1", "f2", "g2", "g1"]);
    }

    #[tokio::test]
    async fn test_start_stops_at_first_failure() {
        let (log, make) = recorder();
        let hooks = LifecycleHooks::new()
            .on_start(make("f1"))
            .on_start(|| Err(anyhow::anyhow!("port in use")))
            .on_start(make("f3"));

        let err = LifecycleCoordinator::default()
            .run_start(&hooks)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::StartHookFailed {
                index: 1,
                message: "port in use".to_string(),
            }
        );
        assert_eq!(*log.lock().unwrap(), vec!["f1"]);
    }

    #[tokio::test]
    async fn test_stop_is_best_effort() {
        let (log, make) = recorder();
        let hooks = LifecycleHooks::new()
            .on_stop(make("g1"))
            .on_stop(|| Err(anyhow::anyhow!("flush failed")))
            .on_stop(make("g3"));

        let failures = LifecycleCoordinator::default().run_stop(&hooks).await;
        assert_eq!(
            failures,
            vec![HookFailure {
                index: 1,
                message: "flush failed".to_string(),
            }]
        );
        assert_eq!(*log.lock().unwrap(), vec!["g3", "g1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_stop_hook_times_out() {
        let hooks = LifecycleHooks::new().on_stop_async(|| async {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok::<_, anyhow::Error>(())
        });
        let coordinator = LifecycleCoordinator::new(&TimeoutConfig {
            factory_timeout_seconds: None,
            hook_timeout_seconds: Some(3),
        });

        let failures = coordinator.run_stop(&hooks).await;
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("timed out"));
    }
}
