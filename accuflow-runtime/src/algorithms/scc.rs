use serde_json::{json, Value as JsonValue};

/// Phased descriptor locating one strongly connected component: the
/// `broadcast` phase records each vertex's in-neighbors, `forward` floods
/// the minimum unique id along edges, and `backward` walks the recorded
/// in-neighbors from the component root (the vertex whose own id survived
/// the flood). Vertices that finish a component disable themselves through
/// the `isDisabled` store accumulator and stop emitting from the following
/// round.
pub fn strongly_connected_components(result_field: &str) -> JsonValue {
    json!({
        "resultField": result_field,
        "maxGSS": 10000,
        "accumulatorsDeclaration": {
            "forwardMin": { "accumulatorType": "min", "valueType": "ints" },
            "backwardMin": { "accumulatorType": "min", "valueType": "ints" },
            "isDisabled": { "accumulatorType": "store", "valueType": "bool" },
            "activeInbound": { "accumulatorType": "list", "valueType": "strings" },
        },
        "phases": [
            {
                "name": "init",
                "initProgram": ["seq", ["set", "isDisabled", false], false],
                "updateProgram": false,
            },
            {
                "name": "broadcast",
                "initProgram": [
                    "seq",
                    ["set", "activeInbound", ["quote"]],
                    [
                        "for",
                        "outbound",
                        ["quote", "edge"],
                        [
                            "quote",
                            "seq",
                            [
                                "update",
                                "activeInbound",
                                ["attrib", "_to", ["var-ref", "edge"]],
                                ["this"],
                            ],
                        ],
                    ],
                    true,
                ],
                "updateProgram": false,
            },
            {
                "name": "forward",
                "initProgram": [
                    "if",
                    [["accum-ref", "isDisabled"], false],
                    [
                        true,
                        ["seq", ["set", "forwardMin", ["vertex-unique-id"]], true],
                    ],
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
                                    [
                                        "update",
                                        "forwardMin",
                                        ["attrib", "_to", ["var-ref", "edge"]],
                                        ["accum-ref", "forwardMin"],
                                    ],
                                ],
                            ],
                            false,
                        ],
                    ],
                ],
            },
            {
                "name": "backward",
                "initProgram": [
                    "if",
                    [["accum-ref", "isDisabled"], false],
                    [
                        ["eq?", ["vertex-unique-id"], ["accum-ref", "forwardMin"]],
                        [
                            "seq",
                            ["set", "backwardMin", ["accum-ref", "forwardMin"]],
                            true,
                        ],
                    ],
                    [
                        true,
                        ["seq", ["set", "backwardMin", 99999], false],
                    ],
                ],
                "updateProgram": [
                    "if",
                    [["accum-ref", "isDisabled"], false],
                    [
                        ["eq?", ["accum-ref", "backwardMin"], ["accum-ref", "forwardMin"]],
                        [
                            "seq",
                            ["set", "isDisabled", true],
                            [
                                "for-each",
                                ["vertex", ["accum-ref", "activeInbound"]],
                                [
                                    "seq",
                                    [
                                        "update",
                                        "backwardMin",
                                        ["var-ref", "vertex"],
                                        ["accum-ref", "backwardMin"],
                                    ],
                                ],
                            ],
                            false,
                        ],
                    ],
                    [true, false],
                ],
            },
        ],
    })
}
