//! Array operators. `map`, `filter`, `reduce`, `all`, `some` and `none` are
//! lazy: their first operand is evaluated against the current data, the
//! second once per element with that element as the data context.

use super::require_arity;
use crate::coerce::{strict_eq, to_text};
use crate::error::EvalError;
use crate::runtime::{Context, EvalResult, Operator, Operators};
use crate::value::{Map, Value, truthy};

pub(super) fn install(ops: &Operators) {
    ops.install("in", Operator::eager(op_in));
    ops.install("merge", Operator::eager(op_merge));
    ops.install("map", Operator::lazy(op_map));
    ops.install("filter", Operator::lazy(op_filter));
    ops.install("reduce", Operator::lazy(op_reduce));
    ops.install("all", Operator::lazy(op_all));
    ops.install("some", Operator::lazy(op_some));
    ops.install("none", Operator::lazy(op_none));
}

/// Membership in an array, or substring of a string. Anything else holds
/// nothing.
fn op_in(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("in", args, 2, 2)?;
    let found = match &args[1] {
        Value::String(haystack) => haystack.contains(to_text(&args[0]).as_str()),
        Value::Array(items) => items.iter().any(|item| strict_eq(item, &args[0])),
        _ => false,
    };
    Ok(Value::Bool(found))
}

/// Concatenate operands, flattening array operands one level.
fn op_merge(args: &[Value], _ctx: &mut Context) -> EvalResult {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Value::Array(items) => out.extend(items.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Ok(Value::Array(out))
}

/// Evaluate the scoped source operand; `None` when it is not an array.
fn scoped_items(op: &str, args: &[Value], ctx: &mut Context) -> Result<Option<Vec<Value>>, EvalError> {
    require_arity(op, args, 2, 2)?;
    match ctx.evaluate(&args[0])? {
        Value::Array(items) => Ok(Some(items)),
        _ => Ok(None),
    }
}

fn op_map(args: &[Value], ctx: &mut Context) -> EvalResult {
    let Some(items) = scoped_items("map", args, ctx)? else {
        return Ok(Value::Array(Vec::new()));
    };
    let mut out = Vec::with_capacity(items.len());
    for item in &items {
        out.push(ctx.evaluate_with(&args[1], item)?);
    }
    Ok(Value::Array(out))
}

fn filter_items(op: &str, args: &[Value], ctx: &mut Context) -> Result<Vec<Value>, EvalError> {
    let Some(items) = scoped_items(op, args, ctx)? else {
        return Ok(Vec::new());
    };
    let mut kept = Vec::new();
    for item in items {
        if truthy(&ctx.evaluate_with(&args[1], &item)?) {
            kept.push(item);
        }
    }
    Ok(kept)
}

fn op_filter(args: &[Value], ctx: &mut Context) -> EvalResult {
    Ok(Value::Array(filter_items("filter", args, ctx)?))
}

/// `[source, logic, initial?]`. `logic` sees `{"current", "accumulator"}`.
fn op_reduce(args: &[Value], ctx: &mut Context) -> EvalResult {
    require_arity("reduce", args, 2, 3)?;
    let source = ctx.evaluate(&args[0])?;
    let mut accumulator = match args.get(2) {
        Some(initial) => ctx.evaluate(initial)?,
        None => Value::Null,
    };
    let Value::Array(items) = source else {
        return Ok(accumulator);
    };
    for current in items {
        let mut scope = Map::new();
        scope.insert("current".to_string(), current);
        scope.insert("accumulator".to_string(), accumulator);
        accumulator = ctx.evaluate_with(&args[1], &Value::Object(scope))?;
    }
    Ok(accumulator)
}

/// False for an empty source; otherwise stops at the first falsy element.
fn op_all(args: &[Value], ctx: &mut Context) -> EvalResult {
    let Some(items) = scoped_items("all", args, ctx)? else {
        return Ok(Value::Bool(false));
    };
    if items.is_empty() {
        return Ok(Value::Bool(false));
    }
    for item in &items {
        if !truthy(&ctx.evaluate_with(&args[1], item)?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn op_some(args: &[Value], ctx: &mut Context) -> EvalResult {
    Ok(Value::Bool(!filter_items("some", args, ctx)?.is_empty()))
}

fn op_none(args: &[Value], ctx: &mut Context) -> EvalResult {
    Ok(Value::Bool(filter_items("none", args, ctx)?.is_empty()))
}

#[cfg(test)]
mod tests {
    use crate::ops::testing::{apply, eval_json};
    use serde_json::json;

    #[test]
    fn membership() {
        assert_eq!(eval_json(json!({"in": ["Spring", "Springfield"]}), json!({})), json!(true));
        assert_eq!(eval_json(json!({"in": ["i", "team"]}), json!({})), json!(false));
        assert_eq!(eval_json(json!({"in": ["Bart", ["Bart", "Homer"]]}), json!({})), json!(true));
        assert_eq!(eval_json(json!({"in": ["1", [1, 2]]}), json!({})), json!(false));
        assert_eq!(eval_json(json!({"in": ["a", null]}), json!({})), json!(false));
    }

    #[test]
    fn merge_flattens_one_level() {
        assert_eq!(eval_json(json!({"merge": []}), json!({})), json!([]));
        assert_eq!(eval_json(json!({"merge": [[1]]}), json!({})), json!([1]));
        assert_eq!(eval_json(json!({"merge": [[1], [2, 3]]}), json!({})), json!([1, 2, 3]));
        assert_eq!(eval_json(json!({"merge": [1, [2, [3]]]}), json!({})), json!([1, 2, [3]]));
    }

    #[test]
    fn map_filter_reduce_scope_to_elements() {
        let data = json!({"integers": [1, 2, 3, 4, 5]});
        assert_eq!(
            eval_json(json!({"map": [{"var": "integers"}, {"*": [{"var": ""}, 2]}]}), data.clone()),
            json!([2, 4, 6, 8, 10])
        );
        assert_eq!(
            eval_json(json!({"filter": [{"var": "integers"}, {"%": [{"var": ""}, 2]}]}), data.clone()),
            json!([1, 3, 5])
        );
        assert_eq!(
            eval_json(
                json!({"reduce": [
                    {"var": "integers"},
                    {"+": [{"var": "current"}, {"var": "accumulator"}]},
                    0
                ]}),
                data.clone()
            ),
            json!(15)
        );
        assert_eq!(
            eval_json(json!({"reduce": [{"var": "missing"}, {"var": "current"}, 7]}), data),
            json!(7)
        );
    }

    #[test]
    fn non_array_sources_yield_empty_results() {
        assert_eq!(eval_json(json!({"map": [{"var": "x"}, {"var": ""}]}), json!({})), json!([]));
        assert_eq!(eval_json(json!({"filter": [5, true]}), json!({})), json!([]));
        assert_eq!(eval_json(json!({"all": [null, true]}), json!({})), json!(false));
    }

    #[test]
    fn quantifiers() {
        let data = json!({"pies": [{"filling": "pumpkin", "temp": 110}, {"filling": "rhubarb", "temp": 210}]});
        assert_eq!(
            eval_json(json!({"all": [{"var": "pies"}, {">": [{"var": "temp"}, 100]}]}), data.clone()),
            json!(true)
        );
        assert_eq!(
            eval_json(json!({"some": [{"var": "pies"}, {"==": [{"var": "filling"}, "apple"]}]}), data.clone()),
            json!(false)
        );
        assert_eq!(
            eval_json(json!({"none": [{"var": "pies"}, {"==": [{"var": "filling"}, "apple"]}]}), data),
            json!(true)
        );
        assert_eq!(eval_json(json!({"all": [[], {"var": ""}]}), json!({})), json!(false));
        assert_eq!(eval_json(json!({"some": [[], {"var": ""}]}), json!({})), json!(false));
        assert_eq!(eval_json(json!({"none": [[], {"var": ""}]}), json!({})), json!(true));
    }

    #[test]
    fn scoped_logic_is_not_evaluated_against_outer_data() {
        // With eager dispatch the unknown op inside the logic would fail
        // even though the source is empty.
        assert_eq!(eval_json(json!({"map": [[], {"nope": []}]}), json!({})), json!([]));
        let err = apply(json!({"map": [[1], {"nope": []}]}), json!({})).unwrap_err();
        assert_eq!(err.code(), "JLOGIC_E_UNKNOWN_OP");
    }
}
