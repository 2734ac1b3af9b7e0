use super::require_arity;
use crate::coerce::{parse_float_prefix, parse_number};
use crate::error::EvalError;
use crate::runtime::{Context, EvalResult, Operator, Operators};
use crate::value::Value;

pub(super) fn install(ops: &Operators) {
    ops.install("+", Operator::eager(op_add));
    ops.install("*", Operator::eager(op_mul));
    ops.install("-", Operator::eager(op_sub));
    ops.install("/", Operator::eager(op_div));
    ops.install("%", Operator::eager(op_mod));
    ops.install("min", Operator::eager(op_min));
    ops.install("max", Operator::eager(op_max));
}

/// Numeric operand: numbers as-is, strings parsed with `parse`. Every other
/// kind is a type error.
fn number(op: &str, value: &Value, parse: fn(&str) -> f64) -> Result<f64, EvalError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::String(s) => Ok(parse(s)),
        other => Err(EvalError::type_mismatch(
            op,
            format!("expected a number, got {}", other.kind()),
        )),
    }
}

/// `+` and `*` fold over their operands and over the elements of array
/// operands; strings contribute their leading numeric prefix.
fn fold(op: &str, args: &[Value], init: f64, step: fn(f64, f64) -> f64) -> Result<f64, EvalError> {
    let mut acc = init;
    for arg in args {
        match arg {
            Value::Array(items) => {
                for item in items {
                    acc = step(acc, number(op, item, parse_float_prefix)?);
                }
            }
            other => acc = step(acc, number(op, other, parse_float_prefix)?),
        }
    }
    Ok(acc)
}

fn op_add(args: &[Value], _ctx: &mut Context) -> EvalResult {
    Ok(Value::Number(fold("+", args, 0.0, |a, b| a + b)?))
}

fn op_mul(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("*", args, 1, usize::MAX)?;
    Ok(Value::Number(fold("*", args, 1.0, |a, b| a * b)?))
}

fn op_sub(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("-", args, 1, 2)?;
    let a = number("-", &args[0], parse_number)?;
    match args.get(1) {
        Some(b) => Ok(Value::Number(a - number("-", b, parse_number)?)),
        None => Ok(Value::Number(-a)),
    }
}

fn op_div(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("/", args, 2, 2)?;
    let a = number("/", &args[0], parse_number)?;
    let b = number("/", &args[1], parse_number)?;
    Ok(Value::Number(a / b))
}

fn op_mod(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("%", args, 2, 2)?;
    let a = number("%", &args[0], parse_number)?;
    let b = number("%", &args[1], parse_number)?;
    Ok(Value::Number(a % b))
}

fn extreme(op: &str, args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> EvalResult {
    let mut acc = init;
    for arg in args {
        let n = number(op, arg, parse_number)?;
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        acc = pick(acc, n);
    }
    Ok(Value::Number(acc))
}

fn op_min(args: &[Value], _ctx: &mut Context) -> EvalResult {
    extreme("min", args, f64::INFINITY, f64::min)
}

fn op_max(args: &[Value], _ctx: &mut Context) -> EvalResult {
    extreme("max", args, f64::NEG_INFINITY, f64::max)
}
