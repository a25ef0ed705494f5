use accuflow_common::error::AccuFlowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The descriptor dialects the engine accepts. Both currently resolve to the
/// same validation and interpretation profile; the closed enumeration exists
/// so submission rejects anything else up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Air,
    VertexAccumulators,
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Air => "air",
            EngineKind::VertexAccumulators => "vertexaccumulators",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EngineKind {
    type Err = AccuFlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "air" => Ok(EngineKind::Air),
            "vertexaccumulators" => Ok(EngineKind::VertexAccumulators),
            other => Err(AccuFlowError::InvalidArgument(format!(
                "unknown engine kind: {other}"
            ))),
        }
    }
}
