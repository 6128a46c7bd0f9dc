//! Property tests for initialization planning

#[path = "property/planner_invariants_tests.rs"]
mod planner_invariants_tests;
