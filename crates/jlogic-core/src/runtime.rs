use crate::error::{ConfigError, EvalError};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

pub type EvalResult = Result<Value, EvalError>;

/// Operator body. Eager operators receive evaluated operand values, lazy
/// operators receive the raw operand rules and evaluate them through the
/// context themselves.
pub type Handler = dyn Fn(&[Value], &mut Context) -> EvalResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    Eager,
    Lazy,
}

/// Registry entry: handler plus evaluation mode.
#[derive(Clone)]
pub struct Operator {
    handler: Rc<Handler>,
    mode: EvalMode,
}

impl Operator {
    pub fn new<F>(mode: EvalMode, handler: F) -> Self
    where
        F: Fn(&[Value], &mut Context) -> EvalResult + 'static,
    {
        Self {
            handler: Rc::new(handler),
            mode,
        }
    }

    pub fn eager<F>(handler: F) -> Self
    where
        F: Fn(&[Value], &mut Context) -> EvalResult + 'static,
    {
        Self::new(EvalMode::Eager, handler)
    }

    pub fn lazy<F>(handler: F) -> Self
    where
        F: Fn(&[Value], &mut Context) -> EvalResult + 'static,
    {
        Self::new(EvalMode::Lazy, handler)
    }

    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    pub fn call(&self, args: &[Value], ctx: &mut Context) -> EvalResult {
        (self.handler)(args, ctx)
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Name to operator table.
///
/// Registration goes through `&self` so a running handler can extend the
/// table; lookups clone the entry out, so a replacement only affects
/// dispatches that happen after it. Not `Sync`: share across threads only
/// behind external synchronization, or give each thread its own table.
pub struct Operators {
    ops: RefCell<HashMap<String, Operator>>,
}

impl Operators {
    /// Table preloaded with the built-in operator set.
    pub fn new() -> Self {
        let operators = Self::empty();
        crate::ops::install(&operators);
        operators
    }

    pub fn empty() -> Self {
        Self {
            ops: RefCell::new(HashMap::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<Operator> {
        self.ops.borrow().get(name).cloned()
    }

    pub fn lookup(&self, name: &str) -> Result<Operator, EvalError> {
        self.get(name)
            .ok_or_else(|| EvalError::unknown_operator(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.borrow().contains_key(name)
    }

    /// Register or replace an operator. Returns the replaced entry.
    pub fn register(
        &self,
        name: impl Into<String>,
        operator: Operator,
    ) -> Result<Option<Operator>, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyOperatorName);
        }
        let previous = self.ops.borrow_mut().insert(name.clone(), operator);
        if previous.is_some() {
            debug!(op = %name, "operator replaced");
        } else {
            debug!(op = %name, "operator registered");
        }
        Ok(previous)
    }

    pub(crate) fn install(&self, name: &str, operator: Operator) {
        self.ops.borrow_mut().insert(name.to_string(), operator);
    }

    pub fn remove(&self, name: &str) -> Option<Operator> {
        self.ops.borrow_mut().remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ops.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Operators {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-evaluation state handed to every operator: the data context rules
/// resolve against, the operator table, and the current nesting depth.
pub struct Context<'a> {
    pub data: &'a Value,
    pub operators: &'a Operators,
    depth: usize,
    max_depth: usize,
}

impl<'a> Context<'a> {
    pub fn new(data: &'a Value, operators: &'a Operators, max_depth: usize) -> Self {
        Self {
            data,
            operators,
            depth: 0,
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn evaluate(&mut self, rule: &Value) -> EvalResult {
        evaluate(rule, self)
    }

    /// Evaluate `rule` against a different data context (one array element,
    /// a reduce accumulator) at the current depth.
    pub fn evaluate_with(&mut self, rule: &Value, data: &Value) -> EvalResult {
        let mut scoped = Context {
            data,
            operators: self.operators,
            depth: self.depth,
            max_depth: self.max_depth,
        };
        evaluate(rule, &mut scoped)
    }
}

/// Operator name and raw payload when `value` is an operation node, i.e. an
/// object with exactly one key.
pub fn operation(value: &Value) -> Option<(&str, &Value)> {
    match value {
        Value::Object(map) if map.len() == 1 => {
            map.iter().next().map(|(name, payload)| (name.as_str(), payload))
        }
        _ => None,
    }
}

pub fn is_operation(value: &Value) -> bool {
    operation(value).is_some()
}

/// Operand list of a payload: an array payload is the list, anything else
/// is a one-element list. `{"var": "a"}` and `{"var": ["a"]}` are the same
/// call.
pub fn operands(payload: &Value) -> &[Value] {
    match payload {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

pub fn evaluate(rule: &Value, ctx: &mut Context) -> EvalResult {
    if ctx.depth >= ctx.max_depth {
        warn!(limit = ctx.max_depth, "rule nesting exceeds maximum depth");
        return Err(EvalError::DepthExceeded {
            limit: ctx.max_depth,
        });
    }
    ctx.depth += 1;
    let out = evaluate_node(rule, ctx);
    ctx.depth -= 1;
    out
}

fn evaluate_node(rule: &Value, ctx: &mut Context) -> EvalResult {
    if let Some((name, payload)) = operation(rule) {
        let operator = ctx.operators.lookup(name)?;
        let args = operands(payload);
        trace!(op = name, mode = ?operator.mode(), args = args.len(), depth = ctx.depth, "dispatch");
        return match operator.mode() {
            EvalMode::Lazy => operator.call(args, ctx),
            EvalMode::Eager => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(evaluate(arg, ctx)?);
                }
                operator.call(&values, ctx)
            }
        };
    }
    match rule {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(evaluate(item, ctx)?);
            }
            Ok(Value::Array(out))
        }
        _ => Ok(rule.clone()),
    }
}
