//! Structural comparison of rule trees.
//!
//! A pattern is an ordinary rule in which some positions are wildcards
//! (`"@"`, or `"@name"` to capture) or type placeholders (`"number"`,
//! `"string"`, `"array"`). Matching never evaluates anything.

use crate::coerce::format_number;
use crate::runtime::{operands, operation};
use crate::value::{Map, Value};

pub const WILDCARD: &str = "@";

/// Matcher with a configurable wildcard prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    prefix: String,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(WILDCARD)
    }
}

impl Matcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Every wildcard position matches independently; a name used twice may
    /// stand for different values.
    pub fn is_like(&self, candidate: &Value, pattern: &Value) -> bool {
        let mut bound = Bindings::new(false);
        self.walk(candidate, pattern, &mut bound)
    }

    /// Bindings for the named wildcards in `pattern`, or `None` when the
    /// candidate does not match. Stricter than [`Matcher::is_like`]: a name
    /// bound twice must bind equal values.
    pub fn captures(&self, candidate: &Value, pattern: &Value) -> Option<Map> {
        let mut bound = Bindings::new(true);
        self.walk(candidate, pattern, &mut bound).then_some(bound.map)
    }

    /// `Some(name)` when `text` is a wildcard; the name is empty for the
    /// bare prefix.
    fn wildcard<'p>(&self, text: &'p str) -> Option<&'p str> {
        text.strip_prefix(self.prefix.as_str())
    }

    fn walk(&self, candidate: &Value, pattern: &Value, bound: &mut Bindings) -> bool {
        if let Value::String(text) = pattern {
            if let Some(name) = self.wildcard(text) {
                return bound.bind(name, candidate);
            }
            if candidate == pattern {
                return true;
            }
            match text.as_str() {
                "number" => return matches!(candidate, Value::Number(_)),
                "string" => return matches!(candidate, Value::String(_)),
                "array" => return matches!(candidate, Value::Array(_)),
                _ => {}
            }
        }

        if let Some((pattern_op, pattern_payload)) = operation(pattern) {
            let Some((candidate_op, candidate_payload)) = operation(candidate) else {
                return false;
            };
            let op_matches = match self.wildcard(pattern_op) {
                Some(name) => bound.bind(name, &Value::from(candidate_op)),
                None => pattern_op == candidate_op,
            };
            return op_matches && self.walk(candidate_payload, pattern_payload, bound);
        }

        match (candidate, pattern) {
            (Value::Array(items), Value::Array(expected)) => {
                items.len() == expected.len()
                    && items
                        .iter()
                        .zip(expected)
                        .all(|(item, want)| self.walk(item, want, bound))
            }
            (Value::Object(fields), Value::Object(expected)) => {
                fields.len() == expected.len()
                    && expected.iter().all(|(key, want)| {
                        fields
                            .get(key)
                            .is_some_and(|field| self.walk(field, want, bound))
                    })
            }
            _ => candidate == pattern,
        }
    }
}

struct Bindings {
    map: Map,
    unify: bool,
}

impl Bindings {
    fn new(unify: bool) -> Self {
        Self {
            map: Map::new(),
            unify,
        }
    }

    /// First binding of a name wins. With `unify`, a later binding to a
    /// different value fails the match.
    fn bind(&mut self, name: &str, value: &Value) -> bool {
        if name.is_empty() {
            return true;
        }
        match self.map.get(name) {
            Some(previous) => !self.unify || previous == value,
            None => {
                self.map.insert(name.to_string(), value.clone());
                true
            }
        }
    }
}

pub fn rule_like(candidate: &Value, pattern: &Value) -> bool {
    Matcher::default().is_like(candidate, pattern)
}

pub fn rule_captures(candidate: &Value, pattern: &Value) -> Option<Map> {
    Matcher::default().captures(candidate, pattern)
}

/// Distinct `var` paths read by `rule`, in first-seen order. Computed
/// paths contribute the paths they read themselves.
pub fn uses_data(rule: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(rule, &mut paths);
    paths
}

fn collect_paths(rule: &Value, paths: &mut Vec<String>) {
    if let Some((name, payload)) = operation(rule) {
        let args = operands(payload);
        if name == "var" {
            let path = match args.first() {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => format_number(*n),
                Some(computed) => return collect_paths(computed, paths),
                None => return,
            };
            if !paths.contains(&path) {
                paths.push(path);
            }
            return;
        }
        for arg in args {
            collect_paths(arg, paths);
        }
        return;
    }
    if let Value::Array(items) = rule {
        for item in items {
            collect_paths(item, paths);
        }
    }
}
