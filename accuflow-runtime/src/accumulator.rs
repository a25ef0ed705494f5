use accuflow_api::descriptor::{AccumulatorDeclaration, AccumulatorKind};
use accuflow_common::error::{AccuFlowError, AccuFlowResult};
use accuflow_common::value::{Value, ValueType};
use indexmap::IndexMap;
use std::cmp::Ordering;

/// A declared accumulator resolved into its merge strategy and value domain.
#[derive(Debug, Clone)]
pub struct AccumulatorHandle {
    pub name: String,
    pub kind: AccumulatorKind,
    pub value_type: ValueType,
    pub store_sender: bool,
}

/// Per-vertex storage of one accumulator: the current value, and the id of
/// the vertex whose message last changed it when `storeSender` is declared.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorSlot {
    pub value: Value,
    pub sender: Option<String>,
}

/// Whether a merge moved the stored value. Reactivation of the target vertex
/// hangs off this, so an ignored message (a worse distance, say) does not
/// wake anyone up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Changed,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct AccumulatorRegistry {
    accumulators: IndexMap<String, AccumulatorHandle>,
}

impl AccumulatorRegistry {
    pub fn from_declarations(
        declarations: &IndexMap<String, AccumulatorDeclaration>,
    ) -> AccuFlowResult<Self> {
        let mut accumulators = IndexMap::new();
        for (name, decl) in declarations {
            check_kind_compatibility(name, decl)?;
            accumulators.insert(
                name.clone(),
                AccumulatorHandle {
                    name: name.clone(),
                    kind: decl.accumulator_type,
                    value_type: decl.value_type,
                    store_sender: decl.store_sender,
                },
            );
        }
        Ok(Self { accumulators })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.accumulators.contains_key(name)
    }

    pub fn handle(&self, name: &str) -> AccuFlowResult<&AccumulatorHandle> {
        self.accumulators
            .get(name)
            .ok_or_else(|| AccuFlowError::UnknownAccumulator(name.to_string()))
    }

    pub fn handles(&self) -> impl Iterator<Item = &AccumulatorHandle> {
        self.accumulators.values()
    }

    pub fn initial_slot(&self, handle: &AccumulatorHandle) -> AccumulatorSlot {
        AccumulatorSlot {
            value: initial_value(handle),
            sender: None,
        }
    }

    /// Merges an incoming message value into a slot. Min/max/sum/and/or are
    /// commutative; store and list depend on the router's fixed delivery
    /// order (ascending sender id).
    pub fn merge(
        &self,
        handle: &AccumulatorHandle,
        slot: &mut AccumulatorSlot,
        incoming: Value,
        sender: &str,
    ) -> AccuFlowResult<MergeOutcome> {
        let outcome = match handle.kind {
            AccumulatorKind::Min => self.merge_extremum(handle, slot, incoming, Ordering::Less)?,
            AccumulatorKind::Max => {
                self.merge_extremum(handle, slot, incoming, Ordering::Greater)?
            }
            AccumulatorKind::Sum => {
                let incoming = adopt_scalar(handle, incoming)?;
                let next = numeric_add(handle, &slot.value, &incoming)?;
                replace_if_changed(slot, next)
            }
            AccumulatorKind::And => {
                let incoming = adopt_scalar(handle, incoming)?;
                let next = Value::Bool(slot.value.is_truthy() && incoming.is_truthy());
                replace_if_changed(slot, next)
            }
            AccumulatorKind::Or => {
                let incoming = adopt_scalar(handle, incoming)?;
                let next = Value::Bool(slot.value.is_truthy() || incoming.is_truthy());
                replace_if_changed(slot, next)
            }
            AccumulatorKind::Store => {
                let incoming = adopt_scalar(handle, incoming)?;
                replace_if_changed(slot, incoming)
            }
            AccumulatorKind::List => {
                let element = adopt_scalar(handle, incoming)?;
                match &mut slot.value {
                    Value::List(items) => items.push(element),
                    other => {
                        let prior = std::mem::replace(other, Value::Null);
                        *other = Value::List(vec![prior, element]);
                    }
                }
                MergeOutcome::Changed
            }
        };
        if outcome == MergeOutcome::Changed && handle.store_sender {
            slot.sender = Some(sender.to_string());
        }
        Ok(outcome)
    }

    /// Local `set`: overwrites the slot without routing. Local writes carry
    /// no sender.
    pub fn set_local(
        &self,
        handle: &AccumulatorHandle,
        slot: &mut AccumulatorSlot,
        value: Value,
    ) -> AccuFlowResult<()> {
        let value = match handle.kind {
            AccumulatorKind::List => match value {
                Value::List(items) => {
                    let adopted = items
                        .into_iter()
                        .map(|item| adopt_scalar(handle, item))
                        .collect::<AccuFlowResult<Vec<_>>>()?;
                    Value::List(adopted)
                }
                other => {
                    return Err(type_mismatch(handle, "list", &other));
                }
            },
            _ => adopt_scalar(handle, value)?,
        };
        slot.value = value;
        slot.sender = None;
        Ok(())
    }

    fn merge_extremum(
        &self,
        handle: &AccumulatorHandle,
        slot: &mut AccumulatorSlot,
        incoming: Value,
        keep_when: Ordering,
    ) -> AccuFlowResult<MergeOutcome> {
        let incoming = adopt_scalar(handle, incoming)?;
        if matches!(slot.value, Value::Null) {
            slot.value = incoming;
            return Ok(MergeOutcome::Changed);
        }
        match incoming.compare(&slot.value) {
            Some(ordering) if ordering == keep_when => {
                slot.value = incoming;
                Ok(MergeOutcome::Changed)
            }
            Some(_) => Ok(MergeOutcome::Unchanged),
            None => Err(AccuFlowError::TypeMismatch {
                context: format!("accumulator `{}`", handle.name),
                expected: "comparable values".to_string(),
                found: format!("{} vs {}", incoming.type_name(), slot.value.type_name()),
            }),
        }
    }
}

fn check_kind_compatibility(name: &str, decl: &AccumulatorDeclaration) -> AccuFlowResult<()> {
    let ok = match decl.accumulator_type {
        AccumulatorKind::Sum => matches!(decl.value_type, ValueType::Ints | ValueType::Doubles),
        AccumulatorKind::And | AccumulatorKind::Or => matches!(decl.value_type, ValueType::Bool),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(AccuFlowError::MalformedDescriptor(format!(
            "accumulator `{name}`: `{}` cannot aggregate `{}` values",
            decl.accumulator_type, decl.value_type
        )))
    }
}

fn initial_value(handle: &AccumulatorHandle) -> Value {
    match handle.kind {
        AccumulatorKind::Min => match handle.value_type {
            ValueType::Ints => Value::Int(i64::MAX),
            ValueType::Doubles => Value::Double(f64::INFINITY),
            _ => Value::Null,
        },
        AccumulatorKind::Max => match handle.value_type {
            ValueType::Ints => Value::Int(i64::MIN),
            ValueType::Doubles => Value::Double(f64::NEG_INFINITY),
            _ => Value::Null,
        },
        AccumulatorKind::Sum => match handle.value_type {
            ValueType::Doubles => Value::Double(0.0),
            _ => Value::Int(0),
        },
        AccumulatorKind::And => Value::Bool(true),
        AccumulatorKind::Or => Value::Bool(false),
        AccumulatorKind::Store => Value::Null,
        AccumulatorKind::List => Value::List(Vec::new()),
    }
}

fn adopt_scalar(handle: &AccumulatorHandle, value: Value) -> AccuFlowResult<Value> {
    let found = value.type_name();
    handle
        .value_type
        .adopt(value)
        .ok_or_else(|| AccuFlowError::TypeMismatch {
            context: format!("accumulator `{}`", handle.name),
            expected: handle.value_type.name().to_string(),
            found: found.to_string(),
        })
}

fn type_mismatch(handle: &AccumulatorHandle, expected: &str, found: &Value) -> AccuFlowError {
    AccuFlowError::TypeMismatch {
        context: format!("accumulator `{}`", handle.name),
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
}

fn replace_if_changed(slot: &mut AccumulatorSlot, next: Value) -> MergeOutcome {
    if slot.value.value_eq(&next) {
        MergeOutcome::Unchanged
    } else {
        slot.value = next;
        MergeOutcome::Changed
    }
}

fn numeric_add(
    handle: &AccumulatorHandle,
    current: &Value,
    incoming: &Value,
) -> AccuFlowResult<Value> {
    match (current, incoming) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| AccuFlowError::Internal(format!(
                "integer overflow in accumulator `{}`",
                handle.name
            ))),
        _ => match (current.as_f64(), incoming.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Double(a + b)),
            _ => Err(type_mismatch(handle, "number", incoming)),
        },
    }
}
