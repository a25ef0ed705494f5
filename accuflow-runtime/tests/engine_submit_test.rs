use accuflow_api::engine::EngineKind;
use accuflow_common::config::EngineOptions;
use accuflow_common::error::AccuFlowError;
use accuflow_common::types::{EdgeRecord, VertexRecord};
use accuflow_common::value::Value;
use accuflow_runtime::algorithms::sssp::single_source_shortest_paths;
use accuflow_runtime::engine::{Engine, ExecutionStatus};
use accuflow_runtime::graph::InMemoryGraph;
use std::collections::BTreeMap;

fn chain_graph() -> InMemoryGraph {
    let vertex = |id: &str| VertexRecord::new(id, BTreeMap::new());
    let edge = |from: &str, to: &str, weight: f64| {
        let mut document = BTreeMap::new();
        document.insert("weight".to_string(), Value::Double(weight));
        EdgeRecord::new(from, to, document)
    };
    InMemoryGraph::new(
        vec![vertex("A"), vertex("B"), vertex("C")],
        vec![edge("A", "B", 2.0), edge("B", "C", 3.0)],
    )
}

#[test]
fn test_submit_join_roundtrip() {
    let engine = Engine::new(EngineOptions::default());
    let program = single_source_shortest_paths("result", "A", "weight");

    let handle = engine
        .submit(EngineKind::Air, chain_graph(), &program)
        .unwrap();
    let (graph, stats) = engine.join(handle).unwrap();

    assert_eq!(engine.status(handle).unwrap(), ExecutionStatus::Halted);
    assert_eq!(stats.supersteps, 3);
    assert!(graph.vertex("C").unwrap().document.contains_key("result"));
}

#[test]
fn test_join_twice_is_an_error() {
    let engine = Engine::new(EngineOptions::default());
    let program = single_source_shortest_paths("result", "A", "weight");

    let handle = engine
        .submit(EngineKind::Air, chain_graph(), &program)
        .unwrap();
    engine.join(handle).unwrap();
    let err = engine.join(handle).unwrap_err();
    assert!(matches!(err, AccuFlowError::InvalidArgument(_)));
}

#[test]
fn test_failed_run_surfaces_through_status() {
    let engine = Engine::new(EngineOptions::default());
    let mut program = single_source_shortest_paths("result", "A", "weight");
    program["maxGSS"] = serde_json::Value::from(1u64);

    let handle = engine
        .submit(EngineKind::Air, chain_graph(), &program)
        .unwrap();
    let err = engine.join(handle).unwrap_err();
    assert!(matches!(err, AccuFlowError::DeadlineExceeded { .. }));
    assert!(matches!(
        engine.status(handle).unwrap(),
        ExecutionStatus::Failed { .. }
    ));
}

#[test]
fn test_status_remains_queryable_after_join() {
    let engine = Engine::new(EngineOptions::default());
    let program = single_source_shortest_paths("result", "A", "weight");
    let handle = engine
        .submit(EngineKind::Air, chain_graph(), &program)
        .unwrap();
    engine.join(handle).unwrap();
    assert_eq!(engine.status(handle).unwrap(), ExecutionStatus::Halted);
}
