//! Module graph manifests
//!
//! A manifest describes the shape of a module collection (names and declared
//! dependencies) without any factories, so graphs can be planned and checked
//! from a file:
//!
//! ```toml
//! [[modules]]
//! name = "config"
//!
//! [[modules]]
//! name = "logger"
//! dependencies = ["config"]
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::module::descriptor::ModuleDescriptor;
use crate::module::registry::graph::DependencyGraph;
use crate::module::registry::planner::{InitializationPlan, Planner};
use crate::module::traits::EngineError;

/// One module entry in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestModule {
    /// Module name (unique identifier)
    pub name: String,
    /// Names of modules this one depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Module graph manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphManifest {
    #[serde(default)]
    pub modules: Vec<ManifestModule>,
}

impl GraphManifest {
    /// Load a manifest, picking the format from the file extension
    /// (`.json` is JSON, anything else is TOML)
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file {}", path.display()))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let manifest: GraphManifest =
            toml::from_str(contents).context("Failed to parse manifest TOML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_json_str(contents: &str) -> anyhow::Result<Self> {
        let manifest: GraphManifest =
            serde_json::from_str(contents).context("Failed to parse manifest JSON")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Describe an existing descriptor collection
    pub fn from_descriptors(descriptors: &[ModuleDescriptor]) -> Self {
        Self {
            modules: descriptors
                .iter()
                .map(|d| ManifestModule {
                    name: d.name().to_string(),
                    dependencies: d.dependencies().to_vec(),
                    description: None,
                })
                .collect(),
        }
    }

    /// Validate required fields
    pub fn validate(&self) -> anyhow::Result<()> {
        for (index, module) in self.modules.iter().enumerate() {
            if module.name.trim().is_empty() {
                anyhow::bail!("Module #{} has an empty name", index);
            }
            if module.dependencies.iter().any(|d| d.trim().is_empty()) {
                anyhow::bail!("Module {} declares an empty dependency name", module.name);
            }
        }
        Ok(())
    }

    pub fn to_graph(&self) -> Result<DependencyGraph, EngineError> {
        DependencyGraph::from_edges(
            self.modules
                .iter()
                .map(|m| (m.name.clone(), m.dependencies.clone())),
        )
    }

    /// Build the graph and plan its initialization order
    pub fn plan(&self) -> Result<InitializationPlan, EngineError> {
        Planner::plan(&self.to_graph()?)
    }
}
