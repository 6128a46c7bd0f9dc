//! Store registry
//!
//! Explicit owner of named stores with create / lookup / duplicate-name
//! semantics. Stores of different value types share one namespace.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

use crate::store::store::Store;

/// Store registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store with name \"{0}\" already exists")]
    AlreadyExists(String),

    #[error("Store with name \"{0}\" does not exist")]
    NotFound(String),

    #[error("Store \"{name}\" does not hold a {expected}")]
    TypeMismatch { name: String, expected: &'static str },
}

/// Registry of named stores
#[derive(Debug, Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store; fails if the name is taken
    pub fn create<T>(&self, name: &str, initial: T) -> Result<Arc<Store<T>>, StoreError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        if stores.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        let store = Arc::new(Store::new(name, initial));
        stores.insert(name.to_string(), Arc::clone(&store) as Arc<dyn Any + Send + Sync>);
        debug!("Created store {}", name);
        Ok(store)
    }

    /// Look up an existing store by name and value type
    pub fn get<T>(&self, name: &str) -> Result<Arc<Store<T>>, StoreError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let entry = stores
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        Arc::clone(entry)
            .downcast::<Store<T>>()
            .map_err(|_| StoreError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Remove a store; returns whether it existed
    pub fn remove(&self, name: &str) -> bool {
        self.stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Store names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.stores.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every store
    pub fn clear(&self) {
        self.stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
