//! Short-circuit control flow and boolean operators.
//!
//! `if`, `and` and `or` are lazy: each operand is evaluated only once the
//! results before it say it is needed. Operands that are never reached are
//! never visited, so custom operators inside them run no side effects.

use super::require_arity;
use crate::runtime::{Context, EvalResult, Operator, Operators};
use crate::value::{Value, truthy};
use tracing::info;

pub(super) fn install(ops: &Operators) {
    ops.install("if", Operator::lazy(op_if));
    ops.install("?:", Operator::lazy(op_if));
    ops.install("and", Operator::lazy(op_and));
    ops.install("or", Operator::lazy(op_or));
    ops.install("!", Operator::eager(op_not));
    ops.install("!!", Operator::eager(op_truthy));
    ops.install("log", Operator::eager(op_log));
}

/// `[cond1, then1, cond2, then2, ..., else?]`
fn op_if(args: &[Value], ctx: &mut Context) -> EvalResult {
    let mut branches = args.chunks_exact(2);
    for branch in branches.by_ref() {
        if truthy(&ctx.evaluate(&branch[0])?) {
            return ctx.evaluate(&branch[1]);
        }
    }
    match branches.remainder() {
        [otherwise] => ctx.evaluate(otherwise),
        _ => Ok(Value::Null),
    }
}

/// First falsy result, or the last result. No operands: `true`.
fn op_and(args: &[Value], ctx: &mut Context) -> EvalResult {
    let mut last = Value::Bool(true);
    for arg in args {
        last = ctx.evaluate(arg)?;
        if !truthy(&last) {
            return Ok(last);
        }
    }
    Ok(last)
}

/// First truthy result, or the last result. No operands: `false`.
fn op_or(args: &[Value], ctx: &mut Context) -> EvalResult {
    let mut last = Value::Bool(false);
    for arg in args {
        last = ctx.evaluate(arg)?;
        if truthy(&last) {
            return Ok(last);
        }
    }
    Ok(last)
}

fn op_not(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("!", args, 1, 1)?;
    Ok(Value::Bool(!truthy(&args[0])))
}

fn op_truthy(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("!!", args, 1, 1)?;
    Ok(Value::Bool(truthy(&args[0])))
}

fn op_log(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("log", args, 1, 1)?;
    info!(target: "jlogic::log", value = %args[0], "log");
    Ok(args[0].clone())
}
