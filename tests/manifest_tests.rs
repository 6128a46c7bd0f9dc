//! Graph manifest tests

mod common;

use std::io::Write;

use common::config_logger_service;
use fx_engine::module::registry::GraphManifest;
use fx_engine::EngineError;

#[test]
fn test_plan_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
        [[modules]]
        name = "service"
        dependencies = ["logger"]

        [[modules]]
        name = "logger"
        dependencies = ["config"]
        description = "Structured logging"

        [[modules]]
        name = "config"
        "#
    )
    .unwrap();

    let manifest = GraphManifest::from_file(file.path()).unwrap();
    assert_eq!(manifest.modules.len(), 3);
    assert_eq!(
        manifest.plan().unwrap().order(),
        &["config", "logger", "service"]
    );
}

#[test]
fn test_plan_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(
        &path,
        r#"{"modules": [{"name": "b", "dependencies": ["a"]}, {"name": "a"}]}"#,
    )
    .unwrap();

    let manifest = GraphManifest::from_file(&path).unwrap();
    assert_eq!(manifest.plan().unwrap().order(), &["a", "b"]);
}

#[test]
fn test_manifest_reports_graph_errors() {
    let manifest = GraphManifest::from_toml_str(
        r#"
        [[modules]]
        name = "a"
        dependencies = ["b"]

        [[modules]]
        name = "b"
        dependencies = ["a"]
        "#,
    )
    .unwrap();
    assert!(matches!(
        manifest.plan(),
        Err(EngineError::CircularDependency { .. })
    ));

    let manifest = GraphManifest::from_toml_str(
        r#"
        [[modules]]
        name = "a"
        dependencies = ["ghost"]
        "#,
    )
    .unwrap();
    assert_eq!(
        manifest.plan().unwrap_err(),
        EngineError::ModuleNotFound {
            module: "a".to_string(),
            dependency: "ghost".to_string(),
        }
    );
}

#[test]
fn test_missing_file_has_context() {
    let err = GraphManifest::from_file("/nonexistent/graph.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read manifest file"));
}

#[test]
fn test_manifest_from_descriptors_matches_engine_order() {
    let manifest = GraphManifest::from_descriptors(&config_logger_service());
    assert_eq!(
        manifest.plan().unwrap().order(),
        &["config", "logger", "service"]
    );

    let toml = toml::to_string(&manifest).unwrap();
    assert_eq!(GraphManifest::from_toml_str(&toml).unwrap(), manifest);
}
