use super::require_arity;
use crate::coerce::{loose_cmp, loose_eq, strict_eq};
use crate::runtime::{Context, EvalResult, Operator, Operators};
use crate::value::Value;
use std::cmp::Ordering;

pub(super) fn install(ops: &Operators) {
    ops.install("==", Operator::eager(op_eq));
    ops.install("===", Operator::eager(op_strict_eq));
    ops.install("!=", Operator::eager(op_neq));
    ops.install("!==", Operator::eager(op_strict_neq));
    ops.install(">", Operator::eager(op_gt));
    ops.install(">=", Operator::eager(op_gte));
    ops.install("<", Operator::eager(op_lt));
    ops.install("<=", Operator::eager(op_lte));
}

fn op_eq(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("==", args, 2, 2)?;
    Ok(Value::Bool(loose_eq(&args[0], &args[1])))
}

fn op_strict_eq(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("===", args, 2, 2)?;
    Ok(Value::Bool(strict_eq(&args[0], &args[1])))
}

fn op_neq(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("!=", args, 2, 2)?;
    Ok(Value::Bool(!loose_eq(&args[0], &args[1])))
}

fn op_strict_neq(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("!==", args, 2, 2)?;
    Ok(Value::Bool(!strict_eq(&args[0], &args[1])))
}

fn holds(a: &Value, b: &Value, accept: fn(Ordering) -> bool) -> bool {
    loose_cmp(a, b).is_some_and(accept)
}

fn op_gt(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity(">", args, 2, 2)?;
    Ok(Value::Bool(holds(&args[0], &args[1], Ordering::is_gt)))
}

fn op_gte(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity(">=", args, 2, 2)?;
    Ok(Value::Bool(holds(&args[0], &args[1], Ordering::is_ge)))
}

// `<` and `<=` take an optional third operand: `a < b < c`.
fn op_lt(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("<", args, 2, 3)?;
    Ok(Value::Bool(
        args.windows(2).all(|pair| holds(&pair[0], &pair[1], Ordering::is_lt)),
    ))
}

fn op_lte(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("<=", args, 2, 3)?;
    Ok(Value::Bool(
        args.windows(2).all(|pair| holds(&pair[0], &pair[1], Ordering::is_le)),
    ))
}
