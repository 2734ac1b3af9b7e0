//! Host object with state that survives across evaluations.
//!
//! cargo run -p jlogic-core --example counter_method

use jlogic_core::{Engine, EvalError, EvalMode, HostObject, HostRef, Map, Value};
use serde_json::json;

fn main() -> Result<(), EvalError> {
    let counter = HostRef::new(
        HostObject::new("counter")
            .with_field("count", 0)
            .with_method("increment", |fields, _| bump(fields, 1.0))
            .with_method("add", |fields, args| {
                let by = args
                    .first()
                    .and_then(Value::as_f64)
                    .ok_or_else(|| EvalError::type_mismatch("add", "expected a number"))?;
                bump(fields, by)
            }),
    );

    let engine = Engine::new();
    engine
        .add_operation("double", EvalMode::Eager, |args, _| {
            let n = args.first().and_then(Value::as_f64).unwrap_or(0.0);
            Ok(Value::from(n * 2.0))
        })
        .map_err(|e| EvalError::custom("double", e.to_string()))?;

    let mut data = Map::new();
    data.insert("a".to_string(), Value::Host(counter.clone()));
    let data = Value::Object(data);

    let increment = Value::from(json!({"method": [{"var": "a"}, "increment"]}));
    let add = Value::from(json!({"double": {"method": [{"var": "a"}, "add", [20]]}}));

    println!("increment -> {}", engine.apply(&increment, &data)?);
    println!("double(add 20) -> {}", engine.apply(&add, &data)?);
    println!("count field -> {:?}", counter.field("count"));
    Ok(())
}

fn bump(fields: &mut Map, by: f64) -> Result<Value, EvalError> {
    let next = fields.get("count").and_then(Value::as_f64).unwrap_or(0.0) + by;
    fields.insert("count".to_string(), next.into());
    Ok(next.into())
}
