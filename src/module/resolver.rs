//! Resolution engine
//!
//! Walks the planned order and evaluates every module's capability factories
//! with its dependency view, then runs the module's post-resolution hooks.
//! Everything is awaited in sequence: modules in planned order, factories in
//! declaration order, `decorate` hooks before `invoke` hooks. The first error
//! aborts the whole pass.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TimeoutConfig;
use crate::module::capability::{CapabilityMap, Dependencies, LocalView};
use crate::module::descriptor::{HookIntent, ModuleDescriptor};
use crate::module::registry::planner::InitializationPlan;
use crate::module::traits::{render_error, EngineError};
use crate::utils::with_optional_timeout;

/// Fully resolved capability map, keyed by module name
#[derive(Debug, Clone, Default)]
pub struct ResolvedModules {
    modules: HashMap<String, Arc<CapabilityMap>>,
    /// Resolution order
    order: Vec<String>,
}

impl ResolvedModules {
    pub(crate) fn insert(&mut self, name: String, slice: Arc<CapabilityMap>) {
        self.order.push(name.clone());
        self.modules.insert(name, slice);
    }

    pub fn get(&self, module: &str) -> Option<&Arc<CapabilityMap>> {
        self.modules.get(module)
    }

    /// Slice of one module, `UnknownModule` if it was never resolved
    pub fn module(&self, module: &str) -> Result<&Arc<CapabilityMap>, EngineError> {
        self.get(module)
            .ok_or_else(|| EngineError::UnknownModule(module.to_string()))
    }

    /// Typed shared handle to `module.key`
    pub fn capability<T: std::any::Any + Send + Sync>(
        &self,
        module: &str,
        key: &str,
    ) -> Result<Arc<T>, EngineError> {
        self.module(module)?.get_arc::<T>(key)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Module names in resolution order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Slices in resolution order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<CapabilityMap>)> {
        self.order
            .iter()
            .filter_map(|name| self.modules.get(name).map(|slice| (name.as_str(), slice)))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Resolution engine
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    step_timeout: Option<Duration>,
}

impl Resolver {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        Self {
            step_timeout: timeouts.factory_timeout(),
        }
    }

    /// Resolve every module in planned order
    ///
    /// `descriptors` must contain every module named by the plan.
    pub async fn resolve(
        &self,
        descriptors: &[ModuleDescriptor],
        plan: &InitializationPlan,
    ) -> Result<ResolvedModules, EngineError> {
        let by_name: HashMap<&str, &ModuleDescriptor> =
            descriptors.iter().map(|d| (d.name(), d)).collect();

        let mut resolved = ResolvedModules::default();

        for module_name in plan.iter() {
            let descriptor = by_name
                .get(module_name)
                .copied()
                .ok_or_else(|| EngineError::UnknownModule(module_name.to_string()))?;

            let slice = self.resolve_module(descriptor, &resolved).await?;
            resolved.insert(module_name.to_string(), slice);
        }

        info!("Resolved {} modules", resolved.len());
        Ok(resolved)
    }

    /// Resolve one module against the modules resolved so far
    pub async fn resolve_module(
        &self,
        descriptor: &ModuleDescriptor,
        resolved: &ResolvedModules,
    ) -> Result<Arc<CapabilityMap>, EngineError> {
        let module_name = descriptor.name();
        info!("Initializing module: {}", module_name);

        let deps = Self::dependency_view(descriptor, resolved)?;

        let mut provided = CapabilityMap::new(module_name);
        for (key, factory) in descriptor.provides() {
            debug!("Providing {}.{}", module_name, key);
            let step = factory.provide(deps.clone());
            let capability = with_optional_timeout(step, self.step_timeout)
                .await
                .map_err(|after| EngineError::Timeout {
                    step: format!("factory \"{}\" of module \"{}\"", key, module_name),
                    after,
                })?
                .map_err(|e| EngineError::FactoryFailed {
                    module: module_name.to_string(),
                    capability: key.to_string(),
                    message: render_error(&e),
                })?;
            provided.insert(key, capability);
        }
        let provided = Arc::new(provided);

        let view = LocalView::new(deps, Arc::clone(&provided));
        // Hooks are numbered within their own intent
        let (mut decorates, mut invokes) = (0usize, 0usize);
        for post in descriptor.hooks_in_execution_order() {
            let counter = match post.intent {
                HookIntent::Decorate => &mut decorates,
                HookIntent::Invoke => &mut invokes,
            };
            let index = *counter;
            *counter += 1;

            debug!("Running {} hook #{} of {}", post.intent, index, module_name);
            let step = post.hook.run(view.clone());
            with_optional_timeout(step, self.step_timeout)
                .await
                .map_err(|after| EngineError::Timeout {
                    step: format!(
                        "{} hook #{} of module \"{}\"",
                        post.intent, index, module_name
                    ),
                    after,
                })?
                .map_err(|e| EngineError::HookFailed {
                    module: module_name.to_string(),
                    intent: post.intent,
                    index,
                    message: render_error(&e),
                })?;
        }

        Ok(provided)
    }

    /// Copy exactly the declared dependencies out of the resolved map
    fn dependency_view(
        descriptor: &ModuleDescriptor,
        resolved: &ResolvedModules,
    ) -> Result<Dependencies, EngineError> {
        let mut deps = Dependencies::new(descriptor.name());
        for dep in descriptor.dependencies() {
            let slice = resolved
                .get(dep)
                .ok_or_else(|| EngineError::DependencyNotInjected {
                    module: descriptor.name().to_string(),
                    dependency: dep.clone(),
                })?;
            deps.push(dep.clone(), Arc::clone(slice));
        }
        Ok(deps)
    }
}
