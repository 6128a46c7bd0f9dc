use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fx_engine::module::registry::{DependencyGraph, Planner};
use fx_engine::{Engine, FxConfig, ModuleDescriptor};

/// Layered graph: every module depends on up to three modules of the previous layer
fn layered_edges(layers: usize, width: usize) -> Vec<(String, Vec<String>)> {
    let mut edges = Vec::with_capacity(layers * width);
    // Declare the last layer first so the planner has to reorder
    for layer in (0..layers).rev() {
        for slot in 0..width {
            let deps = if layer == 0 {
                Vec::new()
            } else {
                (0..3)
                    .map(|k| format!("l{}m{}", layer - 1, (slot + k) % width))
                    .collect()
            };
            edges.push((format!("l{}m{}", layer, slot), deps));
        }
    }
    edges
}

fn benchmark_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    for &(layers, width) in &[(4, 8), (16, 16), (64, 32)] {
        let graph = DependencyGraph::from_edges(layered_edges(layers, width)).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(layers * width),
            &graph,
            |b, graph| b.iter(|| black_box(Planner::plan(black_box(graph)).unwrap())),
        );
    }
    group.finish();
}

fn benchmark_engine_start(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let modules: Vec<ModuleDescriptor> = layered_edges(16, 16)
        .into_iter()
        .map(|(name, deps)| {
            deps.into_iter()
                .fold(ModuleDescriptor::builder(name), |builder, dep| {
                    builder.depends_on_name(dep)
                })
                .provide("value", |deps| Ok(deps.len()))
                .build()
        })
        .collect();

    c.bench_function("engine_start_256_modules", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut engine = Engine::new(FxConfig::new(modules.clone()));
                engine.start().await.unwrap();
                engine.teardown().await.unwrap();
            })
        })
    });
}

criterion_group!(benches, benchmark_plan, benchmark_engine_start);
criterion_main!(benches);
