use serde_json::{json, Value as JsonValue};

/// Descriptor for a single-source shortest path search from `start_vertex`
/// over all vertices, reading the cost from `weight_attribute` on each edge
/// and leaving per-vertex results under `result_field` as an object with a
/// `distance` entry. Senders are stored so paths can be walked backwards.
pub fn single_source_shortest_paths(
    result_field: &str,
    start_vertex: &str,
    weight_attribute: &str,
) -> JsonValue {
    json!({
        "resultField": result_field,
        "maxGSS": 10000,
        "accumulatorsDeclaration": {
            "distance": {
                "accumulatorType": "min",
                "valueType": "doubles",
                "storeSender": true,
            },
        },
        "initProgram": [
            "seq",
            [
                "if",
                [
                    ["eq?", ["this"], start_vertex],
                    ["seq", ["set", "distance", 0], true],
                ],
                [true, ["seq", ["set", "distance", 9223372036854776000.0], false]],
            ],
        ],
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
                        "distance",
                        ["attrib", "_to", ["var-ref", "edge"]],
                        [
                            "+",
                            ["accum-ref", "distance"],
                            ["attrib", weight_attribute, ["var-ref", "edge"]],
                        ],
                    ],
                ],
            ],
            false,
        ],
    })
}
