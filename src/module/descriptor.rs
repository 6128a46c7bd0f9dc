//! Module descriptors
//!
//! A descriptor is the static unit of the system: a unique name, the names of
//! the modules it depends on, an ordered set of capability factories and an
//! ordered list of post-resolution hooks. Descriptors are built once and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::module::capability::{Dependencies, LocalView};
use crate::module::traits::{AsyncFn, Factory, ModuleHook, SyncFn};

/// Why a post-resolution hook exists
///
/// Both intents share one execution contract. All `Decorate` hooks of a
/// module run before its `Invoke` hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookIntent {
    /// Side effect that needs the complete local view
    Decorate,
    /// Fire-and-forget bootstrap action
    Invoke,
}

impl fmt::Display for HookIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookIntent::Decorate => f.write_str("decorate"),
            HookIntent::Invoke => f.write_str("invoke"),
        }
    }
}

/// A tagged post-resolution hook
#[derive(Clone)]
pub struct PostHook {
    pub intent: HookIntent,
    pub hook: Arc<dyn ModuleHook>,
}

impl fmt::Debug for PostHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostHook")
            .field("intent", &self.intent)
            .finish_non_exhaustive()
    }
}

/// Static description of one module
#[derive(Clone)]
pub struct ModuleDescriptor {
    name: String,
    dependencies: Vec<String>,
    provides: Vec<(String, Arc<dyn Factory>)>,
    hooks: Vec<PostHook>,
}

impl ModuleDescriptor {
    pub fn builder(name: impl Into<String>) -> ModuleDescriptorBuilder {
        ModuleDescriptorBuilder {
            descriptor: ModuleDescriptor {
                name: name.into(),
                dependencies: Vec::new(),
                provides: Vec::new(),
                hooks: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of direct dependencies, in declaration order
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Capability factories, in declaration order
    pub fn provides(&self) -> impl Iterator<Item = (&str, &Arc<dyn Factory>)> {
        self.provides.iter().map(|(k, f)| (k.as_str(), f))
    }

    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.provides.iter().map(|(k, _)| k.as_str())
    }

    /// All post-resolution hooks in declaration order
    pub fn hooks(&self) -> &[PostHook] {
        &self.hooks
    }

    /// Hooks in execution order: every `Decorate`, then every `Invoke`
    pub fn hooks_in_execution_order(&self) -> impl Iterator<Item = &PostHook> {
        let decorates = self
            .hooks
            .iter()
            .filter(|h| h.intent == HookIntent::Decorate);
        let invokes = self.hooks.iter().filter(|h| h.intent == HookIntent::Invoke);
        decorates.chain(invokes)
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("provides", &self.capability_names().collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for [`ModuleDescriptor`]
pub struct ModuleDescriptorBuilder {
    descriptor: ModuleDescriptor,
}

impl ModuleDescriptorBuilder {
    /// Declare a dependency on another descriptor
    pub fn depends_on(self, module: &ModuleDescriptor) -> Self {
        self.depends_on_name(module.name())
    }

    /// Declare a dependency by module name
    pub fn depends_on_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.descriptor.dependencies.contains(&name) {
            self.descriptor.dependencies.push(name);
        }
        self
    }

    /// Register a synchronous capability factory
    pub fn provide<F, T>(self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Dependencies) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        self.provide_with(key, Arc::new(SyncFn(factory)))
    }

    /// Register a capability factory that returns a pending result
    pub fn provide_async<F, Fut, T>(self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Dependencies) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Any + Send + Sync,
    {
        self.provide_with(key, Arc::new(AsyncFn(factory)))
    }

    /// Register a factory trait object
    pub fn provide_with(mut self, key: impl Into<String>, factory: Arc<dyn Factory>) -> Self {
        let key = key.into();
        match self.descriptor.provides.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => {
                debug!(
                    "Module {} redefines capability {}",
                    self.descriptor.name, key
                );
                slot.1 = factory;
            }
            None => self.descriptor.provides.push((key, factory)),
        }
        self
    }

    pub fn decorate<F>(self, hook: F) -> Self
    where
        F: Fn(LocalView) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hook(HookIntent::Decorate, Arc::new(SyncFn(hook)))
    }

    pub fn decorate_async<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(LocalView) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hook(HookIntent::Decorate, Arc::new(AsyncFn(hook)))
    }

    pub fn invoke<F>(self, hook: F) -> Self
    where
        F: Fn(LocalView) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hook(HookIntent::Invoke, Arc::new(SyncFn(hook)))
    }

    pub fn invoke_async<F, Fut>(self, hook: F) -> Self
    where
        F: Fn(LocalView) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hook(HookIntent::Invoke, Arc::new(AsyncFn(hook)))
    }

    /// Append a hook trait object under the given intent
    pub fn hook(mut self, intent: HookIntent, hook: Arc<dyn ModuleHook>) -> Self {
        self.descriptor.hooks.push(PostHook { intent, hook });
        self
    }

    pub fn build(self) -> ModuleDescriptor {
        self.descriptor
    }
}
