//! Property tests for planner invariants
//!
//! Random graphs are generated over `m0..mN` with edges only pointing to
//! lower indices (so they are acyclic), then shuffled.

use proptest::prelude::*;
use std::collections::HashMap;

use fx_engine::module::registry::{DependencyGraph, Planner};
use fx_engine::EngineError;

fn name(index: usize) -> String {
    format!("m{}", index)
}

/// (declaration order, edges) for an acyclic graph
fn acyclic_graph() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    (1usize..24)
        .prop_flat_map(|size| {
            let deps = (0..size)
                .map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(3)))
                .collect::<Vec<_>>();
            (deps, Just((0..size).collect::<Vec<usize>>()).prop_shuffle())
        })
        .prop_map(|(deps, order)| {
            order
                .into_iter()
                .map(|i| {
                    let mut targets: Vec<String> = deps[i]
                        .iter()
                        .filter(|&&d| d < i)
                        .map(|&d| name(d))
                        .collect();
                    targets.sort();
                    targets.dedup();
                    (name(i), targets)
                })
                .collect()
        })
}

proptest! {
    #[test]
    fn test_dependencies_precede_dependents(edges in acyclic_graph()) {
        // Invariant: every dependency is planned before its dependent
        let graph = DependencyGraph::from_edges(edges.clone()).unwrap();
        let plan = Planner::plan(&graph).unwrap();

        prop_assert_eq!(plan.len(), edges.len());
        for (module, deps) in &edges {
            let at = plan.position(module).unwrap();
            for dep in deps {
                prop_assert!(plan.position(dep).unwrap() < at, "{} planned after {}", dep, module);
            }
        }
    }

    #[test]
    fn test_plan_is_deterministic(edges in acyclic_graph()) {
        // Invariant: same declaration order, same plan
        let first = Planner::plan(&DependencyGraph::from_edges(edges.clone()).unwrap()).unwrap();
        let second = Planner::plan(&DependencyGraph::from_edges(edges).unwrap()).unwrap();
        prop_assert_eq!(first.order(), second.order());
    }

    #[test]
    fn test_back_edge_is_reported_as_cycle(
        edges in acyclic_graph(),
        pick in any::<prop::sample::Index>(),
    ) {
        // Invariant: adding an edge from a dependency back to its dependent
        // always produces a cycle that starts and ends on the same module
        let with_deps: Vec<usize> = edges
            .iter()
            .enumerate()
            .filter(|(_, (_, deps))| !deps.is_empty())
            .map(|(i, _)| i)
            .collect();
        prop_assume!(!with_deps.is_empty());

        let (dependent, deps) = edges[with_deps[pick.index(with_deps.len())]].clone();
        let mut edges: HashMap<String, Vec<String>> = edges.into_iter().collect();
        edges.get_mut(&deps[0]).unwrap().push(dependent);

        let graph = DependencyGraph::from_edges(edges).unwrap();
        match Planner::plan(&graph) {
            Err(EngineError::CircularDependency { cycle }) => {
                prop_assert!(cycle.len() >= 2);
                prop_assert_eq!(cycle.first(), cycle.last());
            }
            other => prop_assert!(false, "expected a cycle, got {:?}", other),
        }
    }
}
