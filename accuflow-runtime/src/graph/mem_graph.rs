use accuflow_api::graph::GraphStore;
use accuflow_common::error::{AccuFlowError, AccuFlowResult};
use accuflow_common::types::{EdgeRecord, VertexRecord};
use accuflow_common::value::Value;
use std::collections::HashMap;

/// In-process graph store: vertex records in load order plus an adjacency
/// map built once at construction.
#[derive(Debug)]
pub struct InMemoryGraph {
    vertices: Vec<VertexRecord>,
    by_id: HashMap<String, usize>,
    adjacency: HashMap<String, Vec<EdgeRecord>>,
}

impl InMemoryGraph {
    pub fn new(vertices: Vec<VertexRecord>, edges: Vec<EdgeRecord>) -> Self {
        let mut by_id = HashMap::new();
        for (i, v) in vertices.iter().enumerate() {
            by_id.insert(v.id.clone(), i);
        }
        let mut adjacency: HashMap<String, Vec<EdgeRecord>> = HashMap::new();
        for e in edges {
            adjacency.entry(e.from.clone()).or_default().push(e);
        }
        Self {
            vertices,
            by_id,
            adjacency,
        }
    }

    pub fn vertex(&self, id: &str) -> Option<&VertexRecord> {
        self.by_id.get(id).map(|&i| &self.vertices[i])
    }
}

impl GraphStore for InMemoryGraph {
    fn vertices(&self) -> &[VertexRecord] {
        &self.vertices
    }

    fn outbound_edges(&self, vertex_id: &str) -> &[EdgeRecord] {
        self.adjacency
            .get(vertex_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn write_results(
        &mut self,
        result_field: &str,
        results: Vec<(String, Value)>,
    ) -> AccuFlowResult<()> {
        for (id, snapshot) in results {
            let index = *self.by_id.get(&id).ok_or_else(|| {
                AccuFlowError::Internal(format!("result for unknown vertex `{id}`"))
            })?;
            self.vertices[index]
                .document
                .insert(result_field.to_string(), snapshot);
        }
        Ok(())
    }
}
