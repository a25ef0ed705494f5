use crate::accumulator::{AccumulatorRegistry, AccumulatorSlot};
use accuflow_common::types::VertexRecord;
use accuflow_common::value::Value;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Per-vertex runtime state: one slot per declared accumulator plus the
/// active flag driving superstep participation.
#[derive(Debug, Clone)]
pub struct VertexState {
    /// Document id, the value of `this` in programs and the sender id
    /// carried on messages.
    pub id: String,
    /// Engine-assigned integer id in graph-load order, the value of
    /// `vertex-unique-id`.
    pub unique_id: u64,
    pub document: BTreeMap<String, Value>,
    pub accumulators: IndexMap<String, AccumulatorSlot>,
    pub active: bool,
}

impl VertexState {
    pub fn from_record(
        record: &VertexRecord,
        unique_id: u64,
        registry: &AccumulatorRegistry,
    ) -> Self {
        let accumulators = registry
            .handles()
            .map(|h| (h.name.clone(), registry.initial_slot(h)))
            .collect();
        Self {
            id: record.id.clone(),
            unique_id,
            document: record.document.clone(),
            accumulators,
            active: false,
        }
    }

    /// Final accumulator snapshot written under the descriptor's result
    /// field: accumulator name to value, wrapped as `{value, sender}` for
    /// sender-storing accumulators.
    pub fn snapshot(&self, registry: &AccumulatorRegistry) -> Value {
        let mut out = BTreeMap::new();
        for handle in registry.handles() {
            let Some(slot) = self.accumulators.get(&handle.name) else {
                continue;
            };
            let value = if handle.store_sender {
                let mut wrapped = BTreeMap::new();
                wrapped.insert("value".to_string(), slot.value.clone());
                wrapped.insert(
                    "sender".to_string(),
                    slot.sender
                        .clone()
                        .map(Value::String)
                        .unwrap_or(Value::Null),
                );
                Value::Object(wrapped)
            } else {
                slot.value.clone()
            };
            out.insert(handle.name.clone(), value);
        }
        Value::Object(out)
    }
}
