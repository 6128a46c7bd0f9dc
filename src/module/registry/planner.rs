//! Initialization order planning
//!
//! Computes a linear order in which every module comes after all of its
//! transitive dependencies. Traversal is depth-first with three-colour
//! marking: roots are taken in input order and dependencies in declaration
//! order, so the result is deterministic and keeps input order wherever the
//! graph leaves it free. Revisiting a module that is still on the active path
//! is a cycle and is reported, never truncated.

use std::collections::HashMap;
use tracing::debug;

use crate::module::registry::graph::DependencyGraph;
use crate::module::traits::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Planned initialization order (dependencies first)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializationPlan {
    order: Vec<String>,
}

impl InitializationPlan {
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|m| m.as_str())
    }

    /// Position of a module in the plan
    pub fn position(&self, module: &str) -> Option<usize> {
        self.order.iter().position(|m| m == module)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_order(self) -> Vec<String> {
        self.order
    }
}

/// Initialization order planner
pub struct Planner;

impl Planner {
    /// Plan the initialization order of every module in the graph
    pub fn plan(graph: &DependencyGraph) -> Result<InitializationPlan, EngineError> {
        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.len());
        let mut order = Vec::with_capacity(graph.len());

        for root in graph.modules() {
            if marks.contains_key(root) {
                continue;
            }

            // (module, index of the next dependency to visit)
            let mut path: Vec<(&str, usize)> = vec![(root, 0)];
            marks.insert(root, Mark::InProgress);

            while let Some(frame) = path.last_mut() {
                let module = frame.0;
                let deps = graph.dependencies_of(module).unwrap_or(&[]);

                let Some(dep) = deps.get(frame.1) else {
                    marks.insert(module, Mark::Done);
                    order.push(module.to_string());
                    path.pop();
                    continue;
                };
                frame.1 += 1;
                let dep = dep.as_str();

                if !graph.contains(dep) {
                    return Err(EngineError::ModuleNotFound {
                        module: module.to_string(),
                        dependency: dep.to_string(),
                    });
                }

                match marks.get(dep) {
                    None => {
                        marks.insert(dep, Mark::InProgress);
                        path.push((dep, 0));
                    }
                    Some(Mark::InProgress) => {
                        let start = path.iter().position(|(m, _)| *m == dep).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|(m, _)| m.to_string()).collect();
                        cycle.push(dep.to_string());
                        return Err(EngineError::CircularDependency { cycle });
                    }
                    Some(Mark::Done) => {}
                }
            }
        }

        debug!("Initialization order: {:?}", order);
        Ok(InitializationPlan { order })
    }
}
