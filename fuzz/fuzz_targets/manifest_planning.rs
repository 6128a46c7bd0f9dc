#![no_main]
use libfuzzer_sys::fuzz_target;
use fx_engine::module::registry::{DependencyGraph, GraphManifest, Planner};
use fx_engine::EngineError;

fuzz_target!(|data: &[u8]| {
    // Arbitrary manifests must either plan or fail with a graph error, never panic
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(manifest) = GraphManifest::from_toml_str(text) {
            check(&manifest);
        }
        if let Ok(manifest) = GraphManifest::from_json_str(text) {
            check(&manifest);
        }
    }

    // Byte-driven graph: module i depends on module data[i] % n
    let n = data.len().min(64);
    if n == 0 {
        return;
    }
    let edges = (0..n).map(|i| {
        let target = data[i] as usize % (n + 1);
        let deps = if target == n {
            Vec::new()
        } else {
            vec![format!("m{}", target)]
        };
        (format!("m{}", i), deps)
    });
    if let Ok(graph) = DependencyGraph::from_edges(edges) {
        match Planner::plan(&graph) {
            Ok(plan) => assert_eq!(plan.len(), n),
            Err(EngineError::CircularDependency { cycle }) => {
                assert_eq!(cycle.first(), cycle.last());
            }
            Err(_) => {}
        }
    }
});

fn check(manifest: &GraphManifest) {
    if let Ok(plan) = manifest.plan() {
        for module in &manifest.modules {
            let at = plan.position(&module.name);
            for dep in &module.dependencies {
                assert!(plan.position(dep) < at);
            }
        }
    }
}
