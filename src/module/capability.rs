//! Typed capability containers
//!
//! A module's resolved slice is a `CapabilityMap`: an ordered key -> value
//! container whose values are type-erased but read back through typed
//! accessors. Factories see a `Dependencies` view holding only the slices of
//! the modules they declared; module hooks see a `LocalView`.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::module::traits::EngineError;

/// One produced capability value
#[derive(Clone)]
pub struct Capability {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Capability {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Rust type name of the stored value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("type", &self.type_name)
            .finish()
    }
}

/// Resolved capabilities of a single module, in declaration order
#[derive(Debug, Clone)]
pub struct CapabilityMap {
    module: String,
    entries: Vec<(String, Capability)>,
}

impl CapabilityMap {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            entries: Vec::new(),
        }
    }

    /// Name of the owning module
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Insert a capability, replacing any previous value under the same key
    pub fn insert(&mut self, key: impl Into<String>, capability: Capability) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = capability,
            None => self.entries.push((key, capability)),
        }
    }

    pub fn capability(&self, key: &str) -> Option<&Capability> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, capability)| capability)
    }

    /// Typed borrow of a capability
    pub fn get<T: Any>(&self, key: &str) -> Result<&T, EngineError> {
        let capability = self.require(key)?;
        capability
            .downcast_ref::<T>()
            .ok_or_else(|| self.mismatch::<T>(key, capability))
    }

    /// Typed shared handle to a capability
    pub fn get_arc<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, EngineError> {
        let capability = self.require(key)?;
        capability
            .downcast::<T>()
            .ok_or_else(|| self.mismatch::<T>(key, capability))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.capability(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Capability)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn require(&self, key: &str) -> Result<&Capability, EngineError> {
        self.capability(key)
            .ok_or_else(|| EngineError::CapabilityNotFound {
                module: self.module.clone(),
                capability: key.to_string(),
            })
    }

    fn mismatch<T: Any>(&self, key: &str, capability: &Capability) -> EngineError {
        EngineError::CapabilityTypeMismatch {
            module: self.module.clone(),
            capability: key.to_string(),
            expected: type_name::<T>(),
            actual: capability.type_name(),
        }
    }
}

/// Dependency view handed to a module's factories
///
/// Holds exactly the slices of the modules the owner declared, in
/// declaration order.
#[derive(Debug, Clone)]
pub struct Dependencies {
    owner: String,
    modules: Vec<(String, Arc<CapabilityMap>)>,
}

impl Dependencies {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            modules: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, slice: Arc<CapabilityMap>) {
        self.modules.push((name.into(), slice));
    }

    /// Module these dependencies were assembled for
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Slice of one injected dependency
    pub fn module(&self, name: &str) -> Result<&CapabilityMap, EngineError> {
        self.modules
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slice)| slice.as_ref())
            .ok_or_else(|| EngineError::DependencyNotInjected {
                module: self.owner.clone(),
                dependency: name.to_string(),
            })
    }

    /// Typed borrow of `module.key`
    pub fn get<T: Any>(&self, module: &str, key: &str) -> Result<&T, EngineError> {
        self.module(module)?.get::<T>(key)
    }

    /// Typed shared handle to `module.key`
    pub fn get_arc<T: Any + Send + Sync>(
        &self,
        module: &str,
        key: &str,
    ) -> Result<Arc<T>, EngineError> {
        self.module(module)?.get_arc::<T>(key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Input of `decorate`/`invoke` hooks: dependencies plus own capabilities
#[derive(Debug, Clone)]
pub struct LocalView {
    dependencies: Dependencies,
    provided: Arc<CapabilityMap>,
}

impl LocalView {
    pub fn new(dependencies: Dependencies, provided: Arc<CapabilityMap>) -> Self {
        Self {
            dependencies,
            provided,
        }
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// The module's own capabilities
    pub fn provided(&self) -> &CapabilityMap {
        &self.provided
    }

    pub fn module(&self, name: &str) -> Result<&CapabilityMap, EngineError> {
        self.dependencies.module(name)
    }

    /// Typed borrow of one of the module's own capabilities
    pub fn get<T: Any>(&self, key: &str) -> Result<&T, EngineError> {
        self.provided.get::<T>(key)
    }

    pub fn get_arc<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, EngineError> {
        self.provided.get_arc::<T>(key)
    }
}
