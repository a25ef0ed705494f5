use crate::accumulator::{AccumulatorRegistry, MergeOutcome};
use crate::vertex::VertexState;
use accuflow_common::error::{AccuFlowError, AccuFlowResult};
use accuflow_common::value::Value;
use std::collections::HashMap;

/// One `update` emission: merged into the target's accumulator at the next
/// barrier. The sole cross-vertex communication primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorMessage {
    pub target: String,
    pub accumulator: String,
    pub value: Value,
    pub sender: String,
}

/// Applies one barrier's worth of messages. Every message produced in
/// superstep `s` is merged here before any vertex evaluates in `s+1`.
///
/// Delivery order is fixed by a stable sort on (target, sender), which is
/// what makes `store` overwrites and `list` append order reproducible:
/// among same-barrier writers the highest sender id wins a `store`. Each
/// message is consumed exactly once, so non-idempotent merges (`sum`,
/// `list`) see no re-delivery.
pub fn route(
    mut messages: Vec<AccumulatorMessage>,
    vertices: &mut [VertexState],
    index: &HashMap<String, usize>,
    registry: &AccumulatorRegistry,
) -> AccuFlowResult<u64> {
    let total = messages.len() as u64;
    messages.sort_by(|a, b| {
        a.target
            .cmp(&b.target)
            .then_with(|| a.sender.cmp(&b.sender))
    });

    let mut activated = 0u64;
    for message in messages {
        let Some(&slot_index) = index.get(&message.target) else {
            tracing::warn!(
                target: "accuflow::router",
                vertex = %message.target,
                accumulator = %message.accumulator,
                "dropping message for unknown vertex"
            );
            continue;
        };
        let vertex = &mut vertices[slot_index];
        let handle = registry.handle(&message.accumulator)?;
        let slot = vertex
            .accumulators
            .get_mut(&message.accumulator)
            .ok_or_else(|| {
                AccuFlowError::Internal(format!(
                    "vertex `{}` has no slot for accumulator `{}`",
                    vertex.id, message.accumulator
                ))
            })?;
        if registry.merge(handle, slot, message.value, &message.sender)? == MergeOutcome::Changed {
            if !vertex.active {
                activated += 1;
            }
            vertex.active = true;
        }
    }

    metrics::counter!("accuflow_router_messages_total").increment(total);
    metrics::counter!("accuflow_router_activations_total").increment(activated);
    Ok(activated)
}
