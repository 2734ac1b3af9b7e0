use crate::error::EvalError;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

pub type Map = BTreeMap<String, Value>;

/// Generic value walked by the evaluator: both rules and data contexts are
/// made of these.
///
/// Numbers are doubles; non-finite results survive evaluation and only turn
/// into `null` when encoded as JSON. `Host` carries a shared reference to a
/// caller-provided object and never serializes.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Host(HostRef),
}

/// One entry of the falsy table consulted by `and`, `or`, `if` and `!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Falsy {
    False,
    Null,
    Zero,
    NaN,
    EmptyString,
    EmptyArray,
}

/// Every value matching one of these is falsy; everything else, including
/// `{}` and host references, is truthy.
pub const FALSY_VALUES: [Falsy; 6] = [
    Falsy::False,
    Falsy::Null,
    Falsy::Zero,
    Falsy::NaN,
    Falsy::EmptyString,
    Falsy::EmptyArray,
];

impl Falsy {
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (Falsy::False, Value::Bool(b)) => !b,
            (Falsy::Null, Value::Null) => true,
            (Falsy::Zero, Value::Number(n)) => *n == 0.0,
            (Falsy::NaN, Value::Number(n)) => n.is_nan(),
            (Falsy::EmptyString, Value::String(s)) => s.is_empty(),
            (Falsy::EmptyArray, Value::Array(a)) => a.is_empty(),
            _ => false,
        }
    }
}

#[inline]
pub fn truthy(value: &Value) -> bool {
    !FALSY_VALUES.iter().any(|f| f.matches(value))
}

impl Value {
    #[inline]
    pub fn is_truthy(&self) -> bool {
        truthy(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_host(&self) -> Option<&HostRef> {
        match self {
            Value::Host(h) => Some(h),
            _ => None,
        }
    }

    /// Short kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Host(_) => "host object",
        }
    }

    /// Lossy JSON encoding: non-finite numbers and host references become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Host(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

// Integers inside the exactly-representable range encode without a fraction.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER).then_some(n as i64)
}

fn number_to_json(n: f64) -> serde_json::Value {
    if let Some(i) = integral(n) {
        return serde_json::Value::Number(Number::from(i));
    }
    Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Host(host) => write!(f, "<{}>", host.type_name()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        v.clone().into()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl From<HostRef> for Value {
    fn from(host: HostRef) -> Self {
        Value::Host(host)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None if n.is_finite() => serializer.serialize_f64(*n),
                None => serializer.serialize_unit(),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Host(host) => Err(S::Error::custom(format!(
                "host object <{}> is not serializable",
                host.type_name()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Capability exposed by host objects placed in the data context: a named
/// method table the `method` operator dispatches into.
pub trait Invocable {
    fn type_name(&self) -> &str {
        "host object"
    }

    fn has_method(&self, name: &str) -> bool;

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError>;

    /// Readable field, used by `var` paths that walk through the object.
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Shared handle to a host object. Clones point at the same receiver, so
/// state changes made by one call are seen by the next.
#[derive(Clone)]
pub struct HostRef(Rc<RefCell<dyn Invocable>>);

impl HostRef {
    pub fn new<T: Invocable + 'static>(object: T) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    /// Wrap an object the caller keeps a typed handle to.
    pub fn from_shared<T: Invocable + 'static>(shared: Rc<RefCell<T>>) -> Self {
        Self(shared)
    }

    pub fn ptr_eq(&self, other: &HostRef) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    pub fn type_name(&self) -> String {
        match self.0.try_borrow() {
            Ok(object) => object.type_name().to_string(),
            Err(_) => "host object".to_string(),
        }
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.try_borrow().ok()?.field(name)
    }

    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, EvalError> {
        let mut receiver = self
            .0
            .try_borrow_mut()
            .map_err(|_| EvalError::invocation(method, "receiver is already in use"))?;
        if !receiver.has_method(method) {
            return Err(EvalError::invocation(
                method,
                format!("{} has no such method", receiver.type_name()),
            ));
        }
        receiver.invoke(method, args)
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostRef").field(&self.type_name()).finish()
    }
}

pub type HostMethod = Rc<dyn Fn(&mut Map, &[Value]) -> Result<Value, EvalError>>;

/// Ready-made host object: named fields plus a method table whose entries
/// may read and rewrite those fields.
#[derive(Clone, Default)]
pub struct HostObject {
    name: String,
    fields: Map,
    methods: HashMap<String, HostMethod>,
}

impl HostObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut Map, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    pub fn fields(&self) -> &Map {
        &self.fields
    }
}

impl Invocable for HostObject {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        let method = self
            .methods
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::invocation(name, format!("{} has no such method", self.name)))?;
        method(&mut self.fields, args)
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn falsy_table_matches_only_listed_values() {
        for falsy in [
            json!(false),
            json!(null),
            json!(0),
            json!(-0.0),
            json!(""),
            json!([]),
        ] {
            assert!(!truthy(&Value::from(falsy.clone())), "{falsy} should be falsy");
        }
        for truthy_value in [json!(true), json!(1), json!("0"), json!([0]), json!({}), json!("a")] {
            assert!(truthy(&Value::from(truthy_value.clone())), "{truthy_value} should be truthy");
        }
        assert!(!truthy(&Value::Number(f64::NAN)));
        assert!(truthy(&Value::Host(HostRef::new(HostObject::new("h")))));
    }

    #[test]
    fn integral_numbers_encode_as_json_integers() {
        assert_eq!(Value::Number(42.0).to_json(), json!(42));
        assert_eq!(Value::Number(1.5).to_json(), json!(1.5));
        assert_eq!(Value::Number(f64::INFINITY).to_json(), json!(null));
        assert_eq!(serde_json::to_value(Value::Number(-3.0)).unwrap(), json!(-3));
    }

    #[test]
    fn host_references_compare_by_identity() {
        let a = HostRef::new(HostObject::new("a"));
        let b = HostRef::new(HostObject::new("a"));
        assert_eq!(Value::Host(a.clone()), Value::Host(a.clone()));
        assert_ne!(Value::Host(a), Value::Host(b));
    }

    #[test]
    fn host_references_refuse_serialization() {
        let value = Value::Array(vec![Value::Host(HostRef::new(HostObject::new("svc")))]);
        let err = serde_json::to_string(&value).expect_err("host must not serialize");
        assert!(err.to_string().contains("svc"));
        assert_eq!(value.to_json(), json!([null]));
    }

    #[test]
    fn host_object_methods_mutate_fields() {
        let host = HostRef::new(
            HostObject::new("counter")
                .with_field("count", 0)
                .with_method("bump", |fields, _| {
                    let next = fields.get("count").and_then(Value::as_f64).unwrap_or(0.0) + 1.0;
                    fields.insert("count".to_string(), next.into());
                    Ok(next.into())
                }),
        );
        assert_eq!(host.invoke("bump", &[]).unwrap(), Value::from(1));
        assert_eq!(host.clone().invoke("bump", &[]).unwrap(), Value::from(2));
        assert_eq!(host.field("count"), Some(Value::from(2)));

        let err = host.invoke("reset", &[]).expect_err("unknown method");
        assert_eq!(err.code(), "JLOGIC_E_INVOKE");
    }

    #[test]
    fn deserializes_through_serde_json() {
        let value: Value = serde_json::from_str(r#"{"a":[1,"x",null]}"#).unwrap();
        assert_eq!(value, Value::from(json!({"a": [1, "x", null]})));
    }
}
