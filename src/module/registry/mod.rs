//! Module registry
//!
//! Handles graph construction, initialization order planning and graph manifests.

pub mod graph;
pub mod manifest;
pub mod planner;

pub use graph::DependencyGraph;
pub use manifest::{GraphManifest, ManifestModule};
pub use planner::{InitializationPlan, Planner};
