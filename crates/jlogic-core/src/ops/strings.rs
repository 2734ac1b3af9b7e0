use super::require_arity;
use crate::coerce::{to_number, to_text};
use crate::runtime::{Context, EvalResult, Operator, Operators};
use crate::value::Value;

pub(super) fn install(ops: &Operators) {
    ops.install("cat", Operator::eager(op_cat));
    ops.install("substr", Operator::eager(op_substr));
}

fn op_cat(args: &[Value], _ctx: &mut Context) -> EvalResult {
    let mut out = String::new();
    for arg in args {
        match arg {
            Value::Null => {}
            other => out.push_str(&to_text(other)),
        }
    }
    Ok(Value::String(out))
}

fn to_integer(value: &Value) -> i64 {
    let n = to_number(value);
    if n.is_nan() { 0 } else { n.trunc() as i64 }
}

/// `[source, start, length?]`. A negative start counts from the end; a
/// negative length drops that many characters from the end. Only an absent
/// length means "to the end": a `null` length is zero.
fn op_substr(args: &[Value], _ctx: &mut Context) -> EvalResult {
    require_arity("substr", args, 2, 3)?;
    let chars: Vec<char> = to_text(&args[0]).chars().collect();
    let size = chars.len() as i64;
    let start = to_integer(&args[1]);
    let start = if start < 0 { (size + start).max(0) } else { start.min(size) };
    let rest = size - start;
    let take = match args.get(2) {
        None => rest,
        Some(length) => {
            let length = to_integer(length);
            if length < 0 { (rest + length).max(0) } else { length.min(rest) }
        }
    };
    let (start, take) = (start as usize, take as usize);
    Ok(Value::String(chars[start..start + take].iter().collect()))
}

#[cfg(test)]
mod tests {
    use crate::ops::testing::{apply, eval_json};
    use serde_json::json;

    #[test]
    fn cat_joins_text_forms() {
        assert_eq!(eval_json(json!({"cat": "ice"}), json!({})), json!("ice"));
        assert_eq!(eval_json(json!({"cat": ["ice", "cream"]}), json!({})), json!("icecream"));
        assert_eq!(eval_json(json!({"cat": [1, 2]}), json!({})), json!("12"));
        assert_eq!(
            eval_json(json!({"cat": ["I love", " pie"]}), json!({})),
            json!("I love pie")
        );
        assert_eq!(
            eval_json(json!({"cat": ["I love ", {"var": "filling"}, " pie"]}), json!({"filling": "apple"})),
            json!("I love apple pie")
        );
        assert_eq!(eval_json(json!({"cat": ["a", null, 3.5]}), json!({})), json!("a3.5"));
    }

    #[test]
    fn substr_start_and_length() {
        assert_eq!(eval_json(json!({"substr": ["jsonlogic", 4]}), json!({})), json!("logic"));
        assert_eq!(eval_json(json!({"substr": ["jsonlogic", -5]}), json!({})), json!("logic"));
        assert_eq!(eval_json(json!({"substr": ["jsonlogic", 0, 1]}), json!({})), json!("j"));
        assert_eq!(eval_json(json!({"substr": ["jsonlogic", -1, 1]}), json!({})), json!("c"));
        assert_eq!(eval_json(json!({"substr": ["jsonlogic", 4, 5]}), json!({})), json!("logic"));
        assert_eq!(eval_json(json!({"substr": ["jsonlogic", -5, 5]}), json!({})), json!("logic"));
        assert_eq!(eval_json(json!({"substr": ["jsonlogic", -5, -2]}), json!({})), json!("log"));
        assert_eq!(eval_json(json!({"substr": ["jsonlogic", 1, -5]}), json!({})), json!("son"));
        assert_eq!(eval_json(json!({"substr": ["abc", 10]}), json!({})), json!(""));
        assert_eq!(eval_json(json!({"substr": ["abc", 1, null]}), json!({})), json!(""));
        assert_eq!(eval_json(json!({"substr": ["abc", 1, {"var": "len"}]}), json!({})), json!(""));
        assert_eq!(eval_json(json!({"substr": ["héllo", 1, 3]}), json!({})), json!("éll"));
    }

    #[test]
    fn substr_needs_a_start() {
        let err = apply(json!({"substr": ["abc"]}), json!({})).unwrap_err();
        assert_eq!(err.code(), "JLOGIC_E_ARITY");
    }
}
