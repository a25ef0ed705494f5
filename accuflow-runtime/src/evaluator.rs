use crate::accumulator::{AccumulatorRegistry, AccumulatorSlot};
use crate::program::ast::{BinaryOp, Expr};
use crate::router::AccumulatorMessage;
use accuflow_common::error::{AccuFlowError, AccuFlowResult};
use accuflow_common::types::EdgeRecord;
use accuflow_common::value::Value;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Everything one program evaluation may touch: the vertex's own state, its
/// outbound edges, the run's bindings, and the outbox collecting `update`
/// emissions for the barrier.
pub struct EvalContext<'a> {
    pub vertex_id: &'a str,
    pub unique_id: u64,
    pub accumulators: &'a mut IndexMap<String, AccumulatorSlot>,
    pub registry: &'a AccumulatorRegistry,
    pub edges: &'a [EdgeRecord],
    pub bindings: &'a BTreeMap<String, Value>,
    pub global_superstep: u64,
    pub missing_attribute_fatal: bool,
    pub outbox: Vec<AccumulatorMessage>,
    vars: Vec<(String, Value)>,
}

impl<'a> EvalContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vertex_id: &'a str,
        unique_id: u64,
        accumulators: &'a mut IndexMap<String, AccumulatorSlot>,
        registry: &'a AccumulatorRegistry,
        edges: &'a [EdgeRecord],
        bindings: &'a BTreeMap<String, Value>,
        global_superstep: u64,
        missing_attribute_fatal: bool,
    ) -> Self {
        Self {
            vertex_id,
            unique_id,
            accumulators,
            registry,
            edges,
            bindings,
            global_superstep,
            missing_attribute_fatal,
            outbox: Vec::new(),
            vars: Vec::new(),
        }
    }

    fn lookup_var(&self, name: &str) -> Option<&Value> {
        self.vars
            .iter()
            .rev()
            .find(|(var, _)| var == name)
            .map(|(_, value)| value)
    }

    pub fn evaluate(&mut self, expr: &Expr) -> AccuFlowResult<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::This => Ok(Value::String(self.vertex_id.to_string())),
            Expr::VertexUniqueId => Ok(Value::Int(self.unique_id as i64)),
            Expr::GlobalSuperstep => Ok(Value::Int(self.global_superstep as i64)),
            Expr::AccumRef(name) => {
                self.registry.handle(name)?;
                Ok(self
                    .accumulators
                    .get(name)
                    .map(|slot| slot.value.clone())
                    .unwrap_or(Value::Null))
            }
            Expr::VarRef(name) => self
                .lookup_var(name)
                .cloned()
                .ok_or_else(|| AccuFlowError::UnknownVariable(name.clone())),
            Expr::BindRef(name) => self
                .bindings
                .get(name)
                .cloned()
                .ok_or_else(|| AccuFlowError::UnknownBinding(name.clone())),
            Expr::Attrib { field, record } => {
                let record = self.evaluate(record)?;
                let Value::Object(map) = record else {
                    return Err(AccuFlowError::TypeMismatch {
                        context: format!("attrib `{field}`"),
                        expected: "record".to_string(),
                        found: record.type_name().to_string(),
                    });
                };
                match map.get(field) {
                    Some(value) => Ok(value.clone()),
                    None if self.missing_attribute_fatal => {
                        Err(AccuFlowError::MissingAttribute(field.clone()))
                    }
                    None => Ok(Value::Null),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.evaluate(lhs)?;
                let rhs = self.evaluate(rhs)?;
                apply_binary(*op, lhs, rhs)
            }
            Expr::Not(inner) => {
                let value = self.evaluate(inner)?;
                Ok(Value::Bool(!value.is_truthy()))
            }
            Expr::Seq(exprs) => {
                let mut last = Value::Null;
                for e in exprs {
                    last = self.evaluate(e)?;
                }
                Ok(last)
            }
            Expr::If(clauses) => {
                for clause in clauses {
                    if self.evaluate(&clause.condition)?.is_truthy() {
                        return self.evaluate(&clause.body);
                    }
                }
                // No matching clause: do nothing, evaluate to false.
                Ok(Value::Bool(false))
            }
            Expr::ForOutbound { var, body } => {
                for i in 0..self.edges.len() {
                    let edge = self.edges[i].to_value();
                    self.vars.push((var.clone(), edge));
                    let result = self.evaluate(body);
                    self.vars.pop();
                    result?;
                }
                Ok(Value::Null)
            }
            Expr::ForEach { var, list, body } => {
                let list = self.evaluate(list)?;
                let Value::List(items) = list else {
                    return Err(AccuFlowError::TypeMismatch {
                        context: "for-each".to_string(),
                        expected: "list".to_string(),
                        found: list.type_name().to_string(),
                    });
                };
                for item in items {
                    self.vars.push((var.clone(), item));
                    let result = self.evaluate(body);
                    self.vars.pop();
                    result?;
                }
                Ok(Value::Null)
            }
            Expr::Update {
                accumulator,
                target,
                value,
            } => {
                self.registry.handle(accumulator)?;
                let target = self.evaluate(target)?;
                let Some(target) = target.as_str().map(str::to_string) else {
                    return Err(AccuFlowError::TypeMismatch {
                        context: format!("update target of `{accumulator}`"),
                        expected: "vertex id string".to_string(),
                        found: target.type_name().to_string(),
                    });
                };
                let value = self.evaluate(value)?;
                self.outbox.push(AccumulatorMessage {
                    target,
                    accumulator: accumulator.clone(),
                    value,
                    sender: self.vertex_id.to_string(),
                });
                Ok(Value::Null)
            }
            Expr::Set { accumulator, value } => {
                let value = self.evaluate(value)?;
                let handle = self.registry.handle(accumulator)?;
                let slot = self
                    .accumulators
                    .get_mut(accumulator)
                    .ok_or_else(|| AccuFlowError::UnknownAccumulator(accumulator.clone()))?;
                self.registry.set_local(handle, slot, value)?;
                Ok(Value::Null)
            }
            Expr::Print(args) => {
                let mut parts = Vec::with_capacity(args.len());
                for arg in args {
                    parts.push(self.evaluate(arg)?.to_string());
                }
                tracing::debug!(
                    target: "accuflow::program",
                    vertex = %self.vertex_id,
                    "{}",
                    parts.join(" ")
                );
                Ok(Value::Null)
            }
        }
    }
}

fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> AccuFlowResult<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            apply_arithmetic(op, lhs, rhs)
        }
        BinaryOp::Eq => Ok(Value::Bool(lhs.value_eq(&rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!lhs.value_eq(&rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let Some(ordering) = lhs.compare(&rhs) else {
                return Err(AccuFlowError::TypeMismatch {
                    context: format!("operator `{}`", op.symbol()),
                    expected: "comparable values".to_string(),
                    found: format!("{} vs {}", lhs.type_name(), rhs.type_name()),
                });
            };
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::And => Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
    }
}

fn apply_arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> AccuFlowResult<Value> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        let result = match op {
            BinaryOp::Add => a.checked_add(*b),
            BinaryOp::Sub => a.checked_sub(*b),
            BinaryOp::Mul => a.checked_mul(*b),
            // Integer division falls through to doubles below.
            _ => None,
        };
        if let Some(v) = result {
            return Ok(Value::Int(v));
        }
    }
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => {
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                _ => a / b,
            };
            Ok(Value::Double(result))
        }
        _ => {
            let found = if lhs.as_f64().is_none() { &lhs } else { &rhs };
            Err(AccuFlowError::TypeMismatch {
                context: format!("operator `{}`", op.symbol()),
                expected: "number".to_string(),
                found: found.type_name().to_string(),
            })
        }
    }
}
