use accuflow_api::engine::EngineKind;
use accuflow_common::config::EngineOptions;
use accuflow_common::error::AccuFlowError;
use accuflow_common::types::{EdgeRecord, VertexRecord};
use accuflow_common::value::Value;
use accuflow_runtime::engine::run_program;
use accuflow_runtime::graph::InMemoryGraph;
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;

fn single_vertex_graph() -> InMemoryGraph {
    InMemoryGraph::new(
        vec![VertexRecord::new("A", BTreeMap::new())],
        Vec::new(),
    )
}

fn run_init(
    accumulators: JsonValue,
    init: JsonValue,
    graph: InMemoryGraph,
    options: &EngineOptions,
) -> Result<InMemoryGraph, AccuFlowError> {
    let program = json!({
        "resultField": "result",
        "maxGSS": 10,
        "accumulatorsDeclaration": accumulators,
        "initProgram": init,
        "updateProgram": false,
    });
    run_program(EngineKind::Air, graph, &program, options).map(|(g, _)| g)
}

fn result_entry(graph: &InMemoryGraph, id: &str, accumulator: &str) -> Value {
    let Some(Value::Object(result)) = graph.vertex(id).unwrap().document.get("result") else {
        panic!("vertex {id} has no result object");
    };
    result.get(accumulator).cloned().unwrap()
}

#[test]
fn test_set_is_visible_to_later_expressions() {
    let graph = run_init(
        json!({
            "x": { "accumulatorType": "store", "valueType": "ints" },
            "y": { "accumulatorType": "store", "valueType": "ints" },
        }),
        json!([
            "seq",
            ["set", "x", 1],
            ["set", "y", ["+", ["accum-ref", "x"], 1]],
            false,
        ]),
        single_vertex_graph(),
        &EngineOptions::default(),
    )
    .unwrap();

    assert_eq!(result_entry(&graph, "A", "x"), Value::Int(1));
    assert_eq!(result_entry(&graph, "A", "y"), Value::Int(2));
}

#[test]
fn test_if_without_matching_clause_is_a_no_op() {
    let graph = run_init(
        json!({ "x": { "accumulatorType": "store", "valueType": "ints" } }),
        json!([
            "if",
            [["eq?", ["this"], "somebody-else"], ["seq", ["set", "x", 1], true]],
        ]),
        single_vertex_graph(),
        &EngineOptions::default(),
    )
    .unwrap();

    // No clause matched: nothing was set and the implicit false vote halted
    // the vertex.
    assert_eq!(result_entry(&graph, "A", "x"), Value::Null);
}

#[test]
fn test_bindings_are_readable() {
    let program = json!({
        "resultField": "result",
        "maxGSS": 10,
        "accumulatorsDeclaration": {
            "x": { "accumulatorType": "store", "valueType": "ints" },
        },
        "bindings": { "offset": 40 },
        "initProgram": ["seq", ["set", "x", ["+", ["bind-ref", "offset"], 2]], false],
        "updateProgram": false,
    });
    let (graph, _) = run_program(
        EngineKind::Air,
        single_vertex_graph(),
        &program,
        &EngineOptions::default(),
    )
    .unwrap();
    assert_eq!(result_entry(&graph, "A", "x"), Value::Int(42));
}

#[test]
fn test_missing_attribute_aborts_with_vertex_context() {
    let vertices = vec![
        VertexRecord::new("A", BTreeMap::new()),
        VertexRecord::new("B", BTreeMap::new()),
    ];
    let edges = vec![EdgeRecord::new("A", "B", BTreeMap::new())];
    let graph = InMemoryGraph::new(vertices, edges);

    let init = json!([
        "seq",
        [
            "for",
            "outbound",
            ["quote", "edge"],
            ["quote", "seq", ["print", ["attrib", "weight", ["var-ref", "edge"]]]],
        ],
        false,
    ]);

    let err = run_init(
        json!({ "x": { "accumulatorType": "store", "valueType": "ints" } }),
        init,
        graph,
        &EngineOptions::default(),
    )
    .unwrap_err();

    match err {
        AccuFlowError::VertexProgram {
            vertex, source, ..
        } => {
            assert_eq!(vertex, "A");
            assert!(matches!(*source, AccuFlowError::MissingAttribute(field) if field == "weight"));
        }
        other => panic!("expected a vertex program failure, got {other}"),
    }
}

#[test]
fn test_missing_attribute_yields_null_when_lenient() {
    let vertices = vec![
        VertexRecord::new("A", BTreeMap::new()),
        VertexRecord::new("B", BTreeMap::new()),
    ];
    let edges = vec![EdgeRecord::new("A", "B", BTreeMap::new())];
    let graph = InMemoryGraph::new(vertices, edges);

    let init = json!([
        "seq",
        [
            "for",
            "outbound",
            ["quote", "edge"],
            ["quote", "seq", ["set", "x", ["attrib", "weight", ["var-ref", "edge"]]]],
        ],
        false,
    ]);

    let lenient = EngineOptions {
        missing_attribute_fatal: false,
        ..EngineOptions::default()
    };
    let graph = run_init(
        json!({ "x": { "accumulatorType": "store", "valueType": "slice" } }),
        init,
        graph,
        &lenient,
    )
    .unwrap();
    assert_eq!(result_entry(&graph, "A", "x"), Value::Null);
}

#[test]
fn test_self_message_merges_at_barrier() {
    let program = json!({
        "resultField": "result",
        "maxGSS": 10,
        "accumulatorsDeclaration": {
            "total": { "accumulatorType": "sum", "valueType": "ints" },
        },
        "initProgram": [
            "seq",
            [
                "for-each",
                ["v", ["quote", 1, 2, 3]],
                ["seq", ["update", "total", ["this"], ["var-ref", "v"]]],
            ],
            false,
        ],
        "updateProgram": ["seq", false],
    });
    let (graph, stats) = run_program(
        EngineKind::Air,
        single_vertex_graph(),
        &program,
        &EngineOptions::default(),
    )
    .unwrap();

    // The three updates were merged at the init barrier and reactivated the
    // vertex for exactly one (empty) update round.
    assert_eq!(result_entry(&graph, "A", "total"), Value::Int(6));
    assert_eq!(stats.supersteps, 1);
}

#[test]
fn test_non_boolean_vote_counts_as_halt() {
    let graph = run_init(
        json!({ "x": { "accumulatorType": "store", "valueType": "ints" } }),
        json!(["seq", ["set", "x", 1], 42]),
        single_vertex_graph(),
        &EngineOptions::default(),
    )
    .unwrap();
    // The mutation happened; the stray 42 vote halted the vertex instead of
    // failing the run.
    assert_eq!(result_entry(&graph, "A", "x"), Value::Int(1));
}

#[test]
fn test_edge_attributes_are_projectable() {
    let mut doc = BTreeMap::new();
    doc.insert("weight".to_string(), Value::Double(7.5));
    let vertices = vec![
        VertexRecord::new("A", BTreeMap::new()),
        VertexRecord::new("B", BTreeMap::new()),
    ];
    let edges = vec![EdgeRecord::new("A", "B", doc)];
    let graph = InMemoryGraph::new(vertices, edges);

    let init = json!([
        "seq",
        [
            "for",
            "outbound",
            ["quote", "edge"],
            [
                "quote",
                "seq",
                ["set", "x", ["attrib", "weight", ["var-ref", "edge"]]],
                ["set", "target", ["attrib", "_to", ["var-ref", "edge"]]],
            ],
        ],
        false,
    ]);
    let graph = run_init(
        json!({
            "x": { "accumulatorType": "store", "valueType": "doubles" },
            "target": { "accumulatorType": "store", "valueType": "strings" },
        }),
        init,
        graph,
        &EngineOptions::default(),
    )
    .unwrap();

    assert_eq!(result_entry(&graph, "A", "x"), Value::Double(7.5));
    assert_eq!(
        result_entry(&graph, "A", "target"),
        Value::String("B".to_string())
    );
}
