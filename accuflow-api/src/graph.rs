pub use accuflow_common::types::{EdgeRecord, VertexRecord};
use accuflow_common::error::AccuFlowResult;
use accuflow_common::value::Value;

/// Read surface the engine consumes from graph storage, plus the result
/// write-back applied once a run halts.
pub trait GraphStore: Send + Sync {
    fn vertices(&self) -> &[VertexRecord];

    /// Outbound edges of a vertex, in edge-storage order.
    fn outbound_edges(&self, vertex_id: &str) -> &[EdgeRecord];

    /// Writes each vertex's final accumulator snapshot into its document
    /// under `result_field`.
    fn write_results(
        &mut self,
        result_field: &str,
        results: Vec<(String, Value)>,
    ) -> AccuFlowResult<()>;
}
