use crate::accumulator::AccumulatorRegistry;
use crate::program::ast::{BinaryOp, CompiledPhase, Expr, IfClause, Program};
use crate::program::CompiledProgram;
use accuflow_api::descriptor::ProgramDescriptor;
use accuflow_common::config::EngineOptions;
use accuflow_common::error::{AccuFlowError, AccuFlowResult};
use accuflow_common::value::Value;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

struct CompileContext<'a> {
    registry: &'a AccumulatorRegistry,
    bindings: &'a BTreeMap<String, Value>,
    options: &'a EngineOptions,
    /// Loop variables currently in scope, innermost last.
    scope: Vec<String>,
}

/// Compiles a parsed descriptor into the executable program, rejecting every
/// structural problem here so nothing fails mid-run: unknown operators,
/// arity errors, references to undeclared accumulators or bindings, and
/// loop variables used outside their loop.
pub fn compile(
    descriptor: &ProgramDescriptor,
    options: &EngineOptions,
) -> AccuFlowResult<CompiledProgram> {
    let registry = AccumulatorRegistry::from_declarations(&descriptor.accumulators_declaration)?;
    let bindings: BTreeMap<String, Value> = descriptor
        .bindings
        .iter()
        .map(|(name, v)| (name.clone(), Value::from_json(v)))
        .collect();

    let mut ctx = CompileContext {
        registry: &registry,
        bindings: &bindings,
        options,
        scope: Vec::new(),
    };

    let phase_descriptors = descriptor.phase_list();
    let mut phases = Vec::with_capacity(phase_descriptors.len());
    for phase in phase_descriptors {
        let init = compile_program(&phase.init_program, &mut ctx).map_err(|e| {
            annotate_phase(e, &phase.name, "initProgram")
        })?;
        let update = compile_program(&phase.update_program, &mut ctx).map_err(|e| {
            annotate_phase(e, &phase.name, "updateProgram")
        })?;
        phases.push(CompiledPhase {
            name: phase.name.clone(),
            init,
            update,
        });
    }

    Ok(CompiledProgram {
        result_field: descriptor.result_field.clone(),
        max_gss: descriptor.max_gss,
        registry,
        bindings,
        phases,
    })
}

fn annotate_phase(err: AccuFlowError, phase: &str, which: &str) -> AccuFlowError {
    match err {
        AccuFlowError::MalformedDescriptor(msg) => AccuFlowError::MalformedDescriptor(format!(
            "phase `{phase}` {which}: {msg}"
        )),
        other => other,
    }
}

fn compile_program(wire: &JsonValue, ctx: &mut CompileContext<'_>) -> AccuFlowResult<Program> {
    if matches!(wire, JsonValue::Bool(false)) {
        return Ok(Program::NoOp);
    }
    Ok(Program::Run(compile_expr(wire, ctx)?))
}

fn compile_expr(wire: &JsonValue, ctx: &mut CompileContext<'_>) -> AccuFlowResult<Expr> {
    let items = match wire {
        JsonValue::Array(items) => items,
        other => return Ok(Expr::Literal(Value::from_json(other))),
    };
    let head = items
        .first()
        .ok_or_else(|| malformed("empty expression"))?;
    let op = head
        .as_str()
        .ok_or_else(|| malformed("expression must start with an operator name"))?;
    let args = &items[1..];

    match op {
        "seq" => {
            if args.is_empty() {
                return Err(malformed("`seq` needs at least one sub-expression"));
            }
            let exprs = args
                .iter()
                .map(|a| compile_expr(a, ctx))
                .collect::<AccuFlowResult<Vec<_>>>()?;
            Ok(Expr::Seq(exprs))
        }
        "if" => compile_if(args, ctx),
        "for" => compile_for(args, ctx),
        "for-each" => compile_for_each(args, ctx),
        "update" => {
            expect_arity(op, args, 3)?;
            let accumulator = accumulator_name(op, &args[0], ctx)?;
            let target = Box::new(compile_expr(&args[1], ctx)?);
            let value = Box::new(compile_expr(&args[2], ctx)?);
            Ok(Expr::Update {
                accumulator,
                target,
                value,
            })
        }
        "set" => {
            expect_arity(op, args, 2)?;
            let accumulator = accumulator_name(op, &args[0], ctx)?;
            let value = Box::new(compile_expr(&args[1], ctx)?);
            Ok(Expr::Set { accumulator, value })
        }
        "accum-ref" => {
            expect_arity(op, args, 1)?;
            Ok(Expr::AccumRef(accumulator_name(op, &args[0], ctx)?))
        }
        "var-ref" => {
            expect_arity(op, args, 1)?;
            let name = name_arg(op, &args[0])?;
            if !ctx.scope.iter().any(|v| v == &name) {
                return Err(AccuFlowError::UnknownVariable(name));
            }
            Ok(Expr::VarRef(name))
        }
        "bind-ref" => {
            expect_arity(op, args, 1)?;
            let name = name_arg(op, &args[0])?;
            if !ctx.bindings.contains_key(&name) {
                return Err(AccuFlowError::UnknownBinding(name));
            }
            Ok(Expr::BindRef(name))
        }
        "attrib" => {
            expect_arity(op, args, 2)?;
            let field = name_arg(op, &args[0])?;
            let record = Box::new(compile_expr(&args[1], ctx)?);
            Ok(Expr::Attrib { field, record })
        }
        "this" => {
            expect_arity(op, args, 0)?;
            Ok(Expr::This)
        }
        "vertex-unique-id" => {
            expect_arity(op, args, 0)?;
            Ok(Expr::VertexUniqueId)
        }
        "global-superstep" => {
            expect_arity(op, args, 0)?;
            Ok(Expr::GlobalSuperstep)
        }
        "quote" => Ok(Expr::Literal(quoted_value(args))),
        "print" => {
            let exprs = args
                .iter()
                .map(|a| compile_expr(a, ctx))
                .collect::<AccuFlowResult<Vec<_>>>()?;
            Ok(Expr::Print(exprs))
        }
        "not" => {
            expect_arity(op, args, 1)?;
            Ok(Expr::Not(Box::new(compile_expr(&args[0], ctx)?)))
        }
        "+" | "-" | "*" | "/" | "eq?" | "ne?" | "lt?" | "le?" | "gt?" | "ge?" | "and" | "or" => {
            expect_arity(op, args, 2)?;
            let binary_op = match op {
                "+" => BinaryOp::Add,
                "-" => BinaryOp::Sub,
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                "eq?" => BinaryOp::Eq,
                "ne?" => BinaryOp::Ne,
                "lt?" => BinaryOp::Lt,
                "le?" => BinaryOp::Le,
                "gt?" => BinaryOp::Gt,
                "ge?" => BinaryOp::Ge,
                "and" => BinaryOp::And,
                _ => BinaryOp::Or,
            };
            Ok(Expr::Binary {
                op: binary_op,
                lhs: Box::new(compile_expr(&args[0], ctx)?),
                rhs: Box::new(compile_expr(&args[1], ctx)?),
            })
        }
        other => Err(malformed(&format!("unknown operation `{other}`"))),
    }
}

fn compile_if(args: &[JsonValue], ctx: &mut CompileContext<'_>) -> AccuFlowResult<Expr> {
    let mut clauses = Vec::with_capacity(args.len());
    for clause in args {
        let pair = clause
            .as_array()
            .filter(|p| p.len() == 2)
            .ok_or_else(|| malformed("`if` clauses must be [condition, body] pairs"))?;
        clauses.push(IfClause {
            condition: compile_expr(&pair[0], ctx)?,
            body: compile_expr(&pair[1], ctx)?,
        });
    }
    if !clauses.iter().any(IfClause::is_catch_all) {
        if ctx.options.require_catch_all {
            return Err(malformed(
                "`if` without a literal-true catch-all clause; a non-matching `if` does nothing",
            ));
        }
        tracing::warn!(
            target: "accuflow::compile",
            "`if` without a literal-true catch-all clause; a non-matching `if` does nothing"
        );
    }
    Ok(Expr::If(clauses))
}

/// `["for", "outbound", ["quote", var], ["quote", body...]]`; the quoted
/// body tail is spliced back into a single expression.
fn compile_for(args: &[JsonValue], ctx: &mut CompileContext<'_>) -> AccuFlowResult<Expr> {
    expect_arity("for", args, 3)?;
    match args[0].as_str() {
        Some("outbound") => {}
        _ => {
            return Err(malformed("`for` only iterates over \"outbound\" edges"));
        }
    }
    let var = quoted_name(&args[1])
        .ok_or_else(|| malformed("`for` loop variable must be [\"quote\", name]"))?;
    let body_wire = unquote_body(&args[2])
        .ok_or_else(|| malformed("`for` body must be quoted"))?;

    ctx.scope.push(var.clone());
    let body = compile_expr(&body_wire, ctx);
    ctx.scope.pop();

    Ok(Expr::ForOutbound {
        var,
        body: Box::new(body?),
    })
}

/// `["for-each", [var, list-expr], body]`.
fn compile_for_each(args: &[JsonValue], ctx: &mut CompileContext<'_>) -> AccuFlowResult<Expr> {
    expect_arity("for-each", args, 2)?;
    let binding = args[0]
        .as_array()
        .filter(|p| p.len() == 2)
        .ok_or_else(|| malformed("`for-each` binding must be [variable, list]"))?;
    let var = binding[0]
        .as_str()
        .ok_or_else(|| malformed("`for-each` variable must be a name"))?
        .to_string();
    let list = Box::new(compile_expr(&binding[1], ctx)?);

    ctx.scope.push(var.clone());
    let body = compile_expr(&args[1], ctx);
    ctx.scope.pop();

    Ok(Expr::ForEach {
        var,
        list,
        body: Box::new(body?),
    })
}

fn quoted_value(args: &[JsonValue]) -> Value {
    match args {
        [single] => Value::from_json(single),
        many => Value::List(many.iter().map(Value::from_json).collect()),
    }
}

fn quoted_name(wire: &JsonValue) -> Option<String> {
    let items = wire.as_array()?;
    match items.as_slice() {
        [head, name] if head.as_str() == Some("quote") => name.as_str().map(str::to_string),
        _ => None,
    }
}

fn unquote_body(wire: &JsonValue) -> Option<JsonValue> {
    let items = wire.as_array()?;
    let (head, tail) = items.split_first()?;
    if head.as_str() != Some("quote") {
        return None;
    }
    match tail {
        [single] => Some(single.clone()),
        many => Some(JsonValue::Array(many.to_vec())),
    }
}

fn accumulator_name(
    op: &str,
    wire: &JsonValue,
    ctx: &CompileContext<'_>,
) -> AccuFlowResult<String> {
    let name = name_arg(op, wire)?;
    if !ctx.registry.contains(&name) {
        return Err(AccuFlowError::UnknownAccumulator(name));
    }
    Ok(name)
}

fn name_arg(op: &str, wire: &JsonValue) -> AccuFlowResult<String> {
    wire.as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(&format!("`{op}` expects a name here")))
}

fn expect_arity(op: &str, args: &[JsonValue], expected: usize) -> AccuFlowResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(malformed(&format!(
            "`{op}` takes {expected} argument(s), got {}",
            args.len()
        )))
    }
}

fn malformed(msg: &str) -> AccuFlowError {
    AccuFlowError::MalformedDescriptor(msg.to_string())
}
