pub mod ast;
pub mod compile;

use crate::accumulator::AccumulatorRegistry;
use accuflow_common::value::Value;
use ast::CompiledPhase;
use std::collections::BTreeMap;

pub use compile::compile;

/// A descriptor after submission-time compilation: validated declarations,
/// resolved bindings, and one compiled phase per stage (a bare init/update
/// pair arrives as a single phase).
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub result_field: String,
    pub max_gss: u64,
    pub registry: AccumulatorRegistry,
    pub bindings: BTreeMap<String, Value>,
    pub phases: Vec<CompiledPhase>,
}
