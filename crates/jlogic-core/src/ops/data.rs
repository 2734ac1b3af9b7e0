use super::require_arity;
use crate::coerce::{format_number, to_number};
use crate::error::EvalError;
use crate::path::get_path;
use crate::runtime::{Context, EvalResult, Operator, Operators};
use crate::value::Value;
use std::borrow::Cow;
use tracing::debug;

pub(super) fn install(ops: &Operators) {
    ops.install("var", Operator::eager(op_var));
    ops.install("missing", Operator::eager(op_missing));
    ops.install("missing_some", Operator::eager(op_missing_some));
    ops.install("method", Operator::eager(op_method));
}

/// Resolve one `var`-style key against `data`. `Ok(None)` when the path
/// does not resolve; a null key is the whole context.
fn lookup(op: &str, data: &Value, key: &Value) -> Result<Option<Value>, EvalError> {
    let path: Cow<'_, str> = match key {
        Value::Null => return Ok(Some(data.clone())),
        Value::String(s) => Cow::Borrowed(s),
        Value::Number(n) => Cow::Owned(format_number(*n)),
        other => {
            return Err(EvalError::type_mismatch(
                op,
                format!("path must be a string or number, got {}", other.kind()),
            ));
        }
    };
    Ok(get_path(data, &path))
}

/// `path`, `[path]` or `[path, default]`.
fn op_var(args: &[Value], ctx: &mut Context) -> EvalResult {
    require_arity("var", args, 0, 2)?;
    let Some(key) = args.first() else {
        return Ok(ctx.data.clone());
    };
    let found = lookup("var", ctx.data, key)?;
    Ok(found.unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::Null)))
}

fn missing_keys(op: &str, keys: &[Value], data: &Value) -> Result<Vec<Value>, EvalError> {
    let mut missing = Vec::new();
    for key in keys {
        let absent = match lookup(op, data, key)? {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if absent {
            missing.push(key.clone());
        }
    }
    Ok(missing)
}

/// Keys whose value is absent, null or `""`. Keys come from the first
/// operand when it is an array, otherwise from all operands.
fn op_missing(args: &[Value], ctx: &mut Context) -> EvalResult {
    let keys = match args.first() {
        Some(Value::Array(keys)) => keys.as_slice(),
        _ => args,
    };
    Ok(Value::Array(missing_keys("missing", keys, ctx.data)?))
}

/// `[need, keys]`: empty when at least `need` keys are present, otherwise
/// the missing keys.
fn op_missing_some(args: &[Value], ctx: &mut Context) -> EvalResult {
    require_arity("missing_some", args, 2, 2)?;
    let need = to_number(&args[0]);
    let Value::Array(keys) = &args[1] else {
        return Err(EvalError::type_mismatch(
            "missing_some",
            format!("keys must be an array, got {}", args[1].kind()),
        ));
    };
    let missing = missing_keys("missing_some", keys, ctx.data)?;
    if (keys.len() - missing.len()) as f64 >= need {
        return Ok(Value::Array(Vec::new()));
    }
    Ok(Value::Array(missing))
}

/// `[receiver, method, args?]`: call a named method on a host object.
fn op_method(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("method", args, 2, 3)?;
    let Value::String(name) = &args[1] else {
        return Err(EvalError::type_mismatch(
            "method",
            format!("method name must be a string, got {}", args[1].kind()),
        ));
    };
    let Value::Host(receiver) = &args[0] else {
        return Err(EvalError::invocation(
            name.as_str(),
            format!("receiver is {} and exposes no methods", args[0].kind()),
        ));
    };
    let call_args: &[Value] = match args.get(2) {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(EvalError::type_mismatch(
                "method",
                format!("arguments must be an array, got {}", other.kind()),
            ));
        }
    };
    debug!(method = %name, receiver = %receiver.type_name(), args = call_args.len(), "invoke");
    receiver.invoke(name, call_args)
}
