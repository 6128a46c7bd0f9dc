//! Module dependency graph
//!
//! Turns a flat descriptor collection into an adjacency structure keyed by
//! module name.

use std::collections::HashMap;
use tracing::debug;

use crate::module::descriptor::ModuleDescriptor;
use crate::module::traits::EngineError;

/// Adjacency structure over one module collection
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Module names in input order
    modules: Vec<String>,
    /// Module name -> direct dependency names, in declaration order
    dependencies: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph from module descriptors
    pub fn build(descriptors: &[ModuleDescriptor]) -> Result<Self, EngineError> {
        Self::from_edges(
            descriptors
                .iter()
                .map(|d| (d.name().to_string(), d.dependencies().to_vec())),
        )
    }

    /// Build the graph from `(name, dependencies)` pairs
    ///
    /// Two entries sharing a name are rejected.
    pub fn from_edges<I>(edges: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut graph = DependencyGraph::default();

        for (name, deps) in edges {
            if graph.dependencies.contains_key(&name) {
                return Err(EngineError::DuplicateModule(name));
            }
            graph.modules.push(name.clone());
            graph.dependencies.insert(name, deps);
        }

        debug!("Built dependency graph with {} modules", graph.modules.len());
        Ok(graph)
    }

    /// Module names in input order
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.as_str())
    }

    /// Direct dependencies of a module, `None` if the module is unknown
    pub fn dependencies_of(&self, module: &str) -> Option<&[String]> {
        self.dependencies.get(module).map(|deps| deps.as_slice())
    }

    pub fn contains(&self, module: &str) -> bool {
        self.dependencies.contains_key(module)
    }

    /// Full adjacency map
    pub fn adjacency(&self) -> &HashMap<String, Vec<String>> {
        &self.dependencies
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
