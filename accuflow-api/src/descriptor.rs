use accuflow_common::error::{AccuFlowError, AccuFlowResult};
use accuflow_common::value::ValueType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Merge strategy of a declared accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccumulatorKind {
    Min,
    Max,
    Sum,
    And,
    Or,
    Store,
    List,
}

impl AccumulatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            AccumulatorKind::Min => "min",
            AccumulatorKind::Max => "max",
            AccumulatorKind::Sum => "sum",
            AccumulatorKind::And => "and",
            AccumulatorKind::Or => "or",
            AccumulatorKind::Store => "store",
            AccumulatorKind::List => "list",
        }
    }
}

impl fmt::Display for AccumulatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulatorDeclaration {
    pub accumulator_type: AccumulatorKind,
    pub value_type: ValueType,
    #[serde(default)]
    pub store_sender: bool,
}

/// One stage of a phased program. A program given as literal `false` is a
/// no-op: it runs nothing, emits nothing and votes halt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDescriptor {
    pub name: String,
    pub init_program: JsonValue,
    pub update_program: JsonValue,
}

/// Wire shape of a submitted program, camelCase JSON. Programs themselves
/// stay as raw JSON S-expressions here; the runtime compiles them into a
/// typed AST at submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDescriptor {
    pub result_field: String,
    #[serde(rename = "maxGSS")]
    pub max_gss: u64,
    pub accumulators_declaration: IndexMap<String, AccumulatorDeclaration>,
    #[serde(default)]
    pub bindings: BTreeMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_program: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_program: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<PhaseDescriptor>>,
}

impl ProgramDescriptor {
    pub fn from_json(v: &JsonValue) -> AccuFlowResult<Self> {
        let descriptor: ProgramDescriptor = serde_json::from_value(v.clone())
            .map_err(|e| AccuFlowError::MalformedDescriptor(e.to_string()))?;
        descriptor.validate_shape()?;
        Ok(descriptor)
    }

    fn validate_shape(&self) -> AccuFlowResult<()> {
        if self.max_gss == 0 {
            return Err(AccuFlowError::MalformedDescriptor(
                "maxGSS must be a positive integer".to_string(),
            ));
        }
        let has_pair = self.init_program.is_some() || self.update_program.is_some();
        match &self.phases {
            Some(phases) => {
                if has_pair {
                    return Err(AccuFlowError::MalformedDescriptor(
                        "descriptor carries both phases and an initProgram/updateProgram pair"
                            .to_string(),
                    ));
                }
                if phases.is_empty() {
                    return Err(AccuFlowError::MalformedDescriptor(
                        "phases must not be empty".to_string(),
                    ));
                }
            }
            None => {
                if self.init_program.is_none() || self.update_program.is_none() {
                    return Err(AccuFlowError::MalformedDescriptor(
                        "descriptor needs either phases or both initProgram and updateProgram"
                            .to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Normalized phase list; a bare init/update pair becomes a single phase
    /// named `default`.
    pub fn phase_list(&self) -> Vec<PhaseDescriptor> {
        match &self.phases {
            Some(phases) => phases.clone(),
            None => vec![PhaseDescriptor {
                name: "default".to_string(),
                init_program: self.init_program.clone().unwrap_or(JsonValue::Bool(false)),
                update_program: self.update_program.clone().unwrap_or(JsonValue::Bool(false)),
            }],
        }
    }
}
