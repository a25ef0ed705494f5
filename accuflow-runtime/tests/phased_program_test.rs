use accuflow_api::engine::EngineKind;
use accuflow_common::config::EngineOptions;
use accuflow_common::types::{EdgeRecord, VertexRecord};
use accuflow_common::value::Value;
use accuflow_runtime::algorithms::scc::strongly_connected_components;
use accuflow_runtime::engine::run_program;
use accuflow_runtime::graph::InMemoryGraph;
use serde_json::json;
use std::collections::BTreeMap;

fn vertex(id: &str) -> VertexRecord {
    VertexRecord::new(id, BTreeMap::new())
}

fn edge(from: &str, to: &str) -> EdgeRecord {
    EdgeRecord::new(from, to, BTreeMap::new())
}

fn result_entry(graph: &InMemoryGraph, id: &str, accumulator: &str) -> Value {
    let Some(Value::Object(result)) = graph.vertex(id).unwrap().document.get("result") else {
        panic!("vertex {id} has no result object");
    };
    result.get(accumulator).cloned().unwrap()
}

#[test]
fn test_scc_cycle_with_tail() {
    // A and B form a cycle; C and D hang off it as singleton components.
    let vertices = vec![vertex("A"), vertex("B"), vertex("C"), vertex("D")];
    let edges = vec![
        edge("A", "B"),
        edge("B", "A"),
        edge("B", "C"),
        edge("C", "D"),
    ];
    let graph = InMemoryGraph::new(vertices, edges);

    let program = strongly_connected_components("result");
    let (graph, stats) = run_program(
        EngineKind::VertexAccumulators,
        graph,
        &program,
        &EngineOptions::default(),
    )
    .unwrap();

    // Phases ran strictly in declaration order; none started before the
    // previous one converged.
    let phase_names: Vec<&str> = stats.phases.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(phase_names, ["init", "broadcast", "forward", "backward"]);

    // The forward flood carries the minimum unique id everywhere reachable.
    for id in ["A", "B", "C", "D"] {
        assert_eq!(result_entry(&graph, id, "forwardMin"), Value::Int(0));
    }

    // Only the cycle members see the root's id come back around.
    assert_eq!(result_entry(&graph, "A", "backwardMin"), Value::Int(0));
    assert_eq!(result_entry(&graph, "B", "backwardMin"), Value::Int(0));
    assert_eq!(result_entry(&graph, "C", "backwardMin"), Value::Int(99999));
    assert_eq!(result_entry(&graph, "D", "backwardMin"), Value::Int(99999));

    assert_eq!(result_entry(&graph, "A", "isDisabled"), Value::Bool(true));
    assert_eq!(result_entry(&graph, "B", "isDisabled"), Value::Bool(true));
    assert_eq!(result_entry(&graph, "C", "isDisabled"), Value::Bool(false));
    assert_eq!(result_entry(&graph, "D", "isDisabled"), Value::Bool(false));
}

#[test]
fn test_later_phase_reads_converged_state() {
    // Phase `seed` floods the minimum unique id around a cycle; phase `read`
    // copies whatever it finds into a store accumulator. The copy equals the
    // fully converged minimum on every vertex, so `read` cannot have started
    // early.
    let program = json!({
        "resultField": "result",
        "maxGSS": 100,
        "accumulatorsDeclaration": {
            "m": { "accumulatorType": "min", "valueType": "ints" },
            "copied": { "accumulatorType": "store", "valueType": "ints" },
        },
        "phases": [
            {
                "name": "seed",
                "initProgram": ["seq", ["set", "m", ["vertex-unique-id"]], true],
                "updateProgram": [
                    "seq",
                    [
                        "for",
                        "outbound",
                        ["quote", "edge"],
                        [
                            "quote",
                            "seq",
                            [
                                "update",
                                "m",
                                ["attrib", "_to", ["var-ref", "edge"]],
                                ["accum-ref", "m"],
                            ],
                        ],
                    ],
                    false,
                ],
            },
            {
                "name": "read",
                "initProgram": ["seq", ["set", "copied", ["accum-ref", "m"]], false],
                "updateProgram": false,
            },
        ],
    });

    let vertices = vec![vertex("A"), vertex("B"), vertex("C")];
    let edges = vec![edge("A", "B"), edge("B", "C"), edge("C", "A")];
    let graph = InMemoryGraph::new(vertices, edges);

    let (graph, stats) = run_program(
        EngineKind::Air,
        graph,
        &program,
        &EngineOptions::default(),
    )
    .unwrap();

    let phase_names: Vec<&str> = stats.phases.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(phase_names, ["seed", "read"]);

    for id in ["A", "B", "C"] {
        assert_eq!(result_entry(&graph, id, "copied"), Value::Int(0));
    }
}

#[test]
fn test_disabled_vertex_stops_emitting() {
    // Both vertices start active; B disables itself during init. B still
    // receives A's message and wakes up once, but emits nothing from then
    // on, so A's counter stays untouched.
    let program = json!({
        "resultField": "result",
        "maxGSS": 10,
        "accumulatorsDeclaration": {
            "hits": { "accumulatorType": "sum", "valueType": "ints" },
            "isDisabled": { "accumulatorType": "store", "valueType": "bool" },
        },
        "initProgram": [
            "seq",
            ["set", "isDisabled", ["eq?", ["vertex-unique-id"], 1]],
            true,
        ],
        "updateProgram": [
            "if",
            [["accum-ref", "isDisabled"], false],
            [
                true,
                [
                    "seq",
                    [
                        "for",
                        "outbound",
                        ["quote", "edge"],
                        [
                            "quote",
                            "seq",
                            ["update", "hits", ["attrib", "_to", ["var-ref", "edge"]], 1],
                        ],
                    ],
                    false,
                ],
            ],
        ],
    });

    let vertices = vec![vertex("A"), vertex("B")];
    let edges = vec![edge("A", "B"), edge("B", "A")];
    let graph = InMemoryGraph::new(vertices, edges);

    let (graph, stats) = run_program(
        EngineKind::Air,
        graph,
        &program,
        &EngineOptions::default(),
    )
    .unwrap();

    assert_eq!(result_entry(&graph, "A", "hits"), Value::Int(0));
    assert_eq!(result_entry(&graph, "B", "hits"), Value::Int(1));
    assert_eq!(stats.supersteps, 2);
}

#[test]
fn test_noop_phase_converges_without_update_rounds() {
    let program = json!({
        "resultField": "result",
        "maxGSS": 10,
        "accumulatorsDeclaration": {
            "total": { "accumulatorType": "sum", "valueType": "ints" },
        },
        "phases": [
            {
                "name": "scatter",
                "initProgram": [
                    "seq",
                    [
                        "for-each",
                        ["v", ["quote", 1, 2, 3]],
                        ["seq", ["update", "total", ["this"], ["var-ref", "v"]]],
                    ],
                    true,
                ],
                "updateProgram": false,
            },
        ],
    });

    let graph = InMemoryGraph::new(vec![vertex("A")], Vec::new());
    let (graph, stats) = run_program(
        EngineKind::Air,
        graph,
        &program,
        &EngineOptions::default(),
    )
    .unwrap();

    // Messages emitted in the init round were merged at the barrier even
    // though the no-op update program meant no further round ran.
    assert_eq!(result_entry(&graph, "A", "total"), Value::Int(6));
    assert_eq!(stats.supersteps, 0);
}
