use accuflow_api::engine::EngineKind;
use accuflow_common::config::EngineOptions;
use accuflow_common::types::{EdgeRecord, VertexRecord};
use accuflow_common::value::Value;
use accuflow_runtime::algorithms::sssp::single_source_shortest_paths;
use accuflow_runtime::engine::run_program;
use accuflow_runtime::graph::InMemoryGraph;
use std::collections::BTreeMap;

fn vertex(id: &str) -> VertexRecord {
    VertexRecord::new(id, BTreeMap::new())
}

fn edge(from: &str, to: &str, weight: f64) -> EdgeRecord {
    let mut document = BTreeMap::new();
    document.insert("weight".to_string(), Value::Double(weight));
    EdgeRecord::new(from, to, document)
}

fn distance_of(graph: &InMemoryGraph, id: &str) -> (Value, Value) {
    let vertex = graph.vertex(id).unwrap();
    let Some(Value::Object(result)) = vertex.document.get("result") else {
        panic!("vertex {id} has no result object");
    };
    let Some(Value::Object(distance)) = result.get("distance") else {
        panic!("vertex {id} result has no distance entry");
    };
    (
        distance.get("value").cloned().unwrap(),
        distance.get("sender").cloned().unwrap(),
    )
}

#[test]
fn test_sssp_three_vertex_chain() {
    let vertices = vec![vertex("A"), vertex("B"), vertex("C")];
    let edges = vec![edge("A", "B", 2.0), edge("B", "C", 3.0)];
    let graph = InMemoryGraph::new(vertices, edges);

    let program = single_source_shortest_paths("result", "A", "weight");
    let (graph, stats) = run_program(
        EngineKind::Air,
        graph,
        &program,
        &EngineOptions::default(),
    )
    .unwrap();

    let (a_dist, a_sender) = distance_of(&graph, "A");
    let (b_dist, b_sender) = distance_of(&graph, "B");
    let (c_dist, c_sender) = distance_of(&graph, "C");

    assert_eq!(a_dist, Value::Double(0.0));
    assert_eq!(b_dist, Value::Double(2.0));
    assert_eq!(c_dist, Value::Double(5.0));

    // Senders record the predecessor on the shortest path; the start vertex
    // set its distance locally and has none.
    assert_eq!(a_sender, Value::Null);
    assert_eq!(b_sender, Value::String("A".to_string()));
    assert_eq!(c_sender, Value::String("B".to_string()));

    // Graph diameter is 2, so the run needs at most 3 update rounds.
    assert_eq!(stats.supersteps, 3);
}

#[test]
fn test_sssp_prefers_cheaper_indirect_path() {
    let vertices = vec![vertex("A"), vertex("B"), vertex("C")];
    let edges = vec![
        edge("A", "B", 10.0),
        edge("B", "C", 20.0),
        edge("A", "C", 100.0),
    ];
    let graph = InMemoryGraph::new(vertices, edges);

    let program = single_source_shortest_paths("result", "A", "weight");
    let (graph, _) = run_program(
        EngineKind::VertexAccumulators,
        graph,
        &program,
        &EngineOptions::default(),
    )
    .unwrap();

    let (c_dist, c_sender) = distance_of(&graph, "C");
    assert_eq!(c_dist, Value::Double(30.0));
    assert_eq!(c_sender, Value::String("B".to_string()));
}

#[test]
fn test_sssp_unreachable_vertex_keeps_sentinel() {
    let vertices = vec![vertex("A"), vertex("B"), vertex("X")];
    let edges = vec![edge("A", "B", 2.0)];
    let graph = InMemoryGraph::new(vertices, edges);

    let program = single_source_shortest_paths("result", "A", "weight");
    let (graph, _) = run_program(
        EngineKind::Air,
        graph,
        &program,
        &EngineOptions::default(),
    )
    .unwrap();

    let (x_dist, _) = distance_of(&graph, "X");
    let sentinel = x_dist.as_f64().unwrap();
    assert!(sentinel > 1e18);
}
