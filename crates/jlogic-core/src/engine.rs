use crate::error::{ConfigError, EvalError};
use crate::matcher::{Matcher, WILDCARD};
use crate::runtime::{Context, EvalMode, EvalResult, Operator, Operators, evaluate};
use crate::value::{Map, Value};
use serde::{Deserialize, Serialize};

/// Engine settings. Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest rule nesting `apply` will walk before failing with
    /// `DepthExceeded`.
    pub max_depth: usize,
    /// Prefix that marks wildcard positions in `rule_like` patterns.
    pub wildcard_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            wildcard_prefix: WILDCARD.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.wildcard_prefix.is_empty() {
            return Err(ConfigError::EmptyWildcardPrefix);
        }
        Ok(())
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Engine-scoped evaluation surface.
///
/// Operator registration is instance-local, so engines configured with
/// different custom operators never see each other's entries.
pub struct Engine {
    operators: Operators,
    matcher: Matcher,
    config: EngineConfig,
}

impl Engine {
    /// Engine with the built-in operators and the default configuration.
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            operators: Operators::new(),
            matcher: Matcher::new(config.wildcard_prefix.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register or replace an operator. Later dispatches, including ones
    /// later in an evaluation already under way, use the new entry.
    pub fn register(
        &self,
        name: impl Into<String>,
        operator: Operator,
    ) -> Result<Option<Operator>, ConfigError> {
        self.operators.register(name, operator)
    }

    pub fn add_operation<F>(
        &self,
        name: impl Into<String>,
        mode: EvalMode,
        handler: F,
    ) -> Result<Option<Operator>, ConfigError>
    where
        F: Fn(&[Value], &mut Context) -> EvalResult + 'static,
    {
        self.register(name, Operator::new(mode, handler))
    }

    pub fn remove_operation(&self, name: &str) -> Option<Operator> {
        self.operators.remove(name)
    }

    /// Evaluate `rule` against `data`.
    pub fn apply(&self, rule: &Value, data: &Value) -> EvalResult {
        let mut ctx = Context::new(data, &self.operators, self.config.max_depth);
        evaluate(rule, &mut ctx)
    }

    /// `apply` for callers holding decoded JSON. Non-finite numbers in the
    /// result encode as `null`.
    pub fn apply_json(
        &self,
        rule: &serde_json::Value,
        data: &serde_json::Value,
    ) -> Result<serde_json::Value, EvalError> {
        let out = self.apply(&Value::from(rule), &Value::from(data))?;
        Ok(out.to_json())
    }

    pub fn rule_like(&self, candidate: &Value, pattern: &Value) -> bool {
        self.matcher.is_like(candidate, pattern)
    }

    pub fn rule_captures(&self, candidate: &Value, pattern: &Value) -> Option<Map> {
        self.matcher.captures(candidate, pattern)
    }

    /// Access the operator registry.
    pub fn operators(&self) -> &Operators {
        &self.operators
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static DEFAULT_ENGINE: Engine = Engine::new();
}

/// Run `f` with this thread's shared default engine.
pub fn with_default_engine<R>(f: impl FnOnce(&Engine) -> R) -> R {
    DEFAULT_ENGINE.with(f)
}

/// Evaluate with this thread's default engine.
pub fn apply(rule: &Value, data: &Value) -> EvalResult {
    with_default_engine(|engine| engine.apply(rule, data))
}

/// Register an operator on this thread's default engine.
pub fn add_operation<F>(
    name: impl Into<String>,
    mode: EvalMode,
    handler: F,
) -> Result<Option<Operator>, ConfigError>
where
    F: Fn(&[Value], &mut Context) -> EvalResult + 'static,
{
    with_default_engine(|engine| engine.add_operation(name, mode, handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::HostObject;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn config_defaults_and_validation() {
        let config = EngineConfig::default();
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.wildcard_prefix, "@");
        assert!(config.validate().is_ok());

        assert_eq!(EngineConfig::from_json("{}").unwrap(), config);
        assert_eq!(EngineConfig::from_json(r#"{"max_depth": 8}"#).unwrap().max_depth, 8);
        assert_eq!(
            EngineConfig::from_json(r#"{"max_depth": 0}"#).unwrap_err(),
            ConfigError::ZeroDepth
        );
        assert_eq!(
            EngineConfig::from_json(r#"{"wildcard_prefix": ""}"#).unwrap_err(),
            ConfigError::EmptyWildcardPrefix
        );
        assert!(matches!(
            EngineConfig::from_json(r#"{"max_depth": "deep"}"#),
            Err(ConfigError::Invalid(_))
        ));
        let bad = EngineConfig {
            max_depth: 0,
            ..EngineConfig::default()
        };
        assert!(Engine::with_config(bad).is_err());
    }

    #[test]
    fn apply_json_round_trips_decoded_values() {
        let engine = Engine::new();
        let out = engine
            .apply_json(
                &json!({"if": [{"<": [{"var": "temp"}, 110]}, "eat", "wait"]}),
                &json!({"temp": 100}),
            )
            .unwrap();
        assert_eq!(out, json!("eat"));
        assert_eq!(engine.apply_json(&json!({"var": "a"}), &json!({})).unwrap(), json!(null));
    }

    #[test]
    fn scenario_var_lookups() {
        let engine = Engine::new();
        assert_eq!(
            engine.apply_json(&json!({"var": ["a.b", 9]}), &json!({"a": {"c": 1}})).unwrap(),
            json!(9)
        );
        assert_eq!(
            engine.apply_json(&json!({"var": "a.b"}), &json!({"a": {"b": 2}})).unwrap(),
            json!(2)
        );
    }

    #[test]
    fn re_registering_a_name_uses_only_the_latest_handler() {
        let engine = Engine::new();
        engine
            .add_operation("x", EvalMode::Eager, |_, _| Ok(Value::from("first")))
            .unwrap();
        let replaced = engine
            .add_operation("x", EvalMode::Eager, |_, _| Ok(Value::from("second")))
            .unwrap();
        assert!(replaced.is_some());
        let rule = Value::from(json!({"x": []}));
        assert_eq!(engine.apply(&rule, &Value::Null).unwrap(), Value::from("second"));
    }

    #[test]
    fn builtins_can_be_overridden_and_removed() {
        let engine = Engine::new();
        engine
            .add_operation("+", EvalMode::Eager, |args, _| Ok(Value::from(args.len())))
            .unwrap();
        let rule = Value::from(json!({"+": [5, 5, 5]}));
        assert_eq!(engine.apply(&rule, &Value::Null).unwrap(), Value::from(3));
        assert!(engine.remove_operation("+").is_some());
        assert_eq!(
            engine.apply(&rule, &Value::Null).unwrap_err(),
            EvalError::unknown_operator("+")
        );
    }

    #[test]
    fn engines_do_not_share_registrations() {
        let a = Engine::new();
        let b = Engine::new();
        a.add_operation("only_a", EvalMode::Eager, |_, _| Ok(Value::Bool(true)))
            .unwrap();
        let rule = Value::from(json!({"only_a": []}));
        assert_eq!(a.apply(&rule, &Value::Null).unwrap(), Value::Bool(true));
        assert_eq!(b.apply(&rule, &Value::Null).unwrap_err().code(), "JLOGIC_E_UNKNOWN_OP");
    }

    #[test]
    fn lazy_custom_operators_choose_what_to_evaluate() {
        let engine = Engine::new();
        engine
            .add_operation("first_ok", EvalMode::Lazy, |args, ctx| {
                for arg in args {
                    if let Ok(value) = ctx.evaluate(arg) {
                        return Ok(value);
                    }
                }
                Err(EvalError::custom("first_ok", "no operand evaluated"))
            })
            .unwrap();
        let out = engine
            .apply_json(&json!({"first_ok": [{"nope": []}, {"var": "a"}]}), &json!({"a": 3}))
            .unwrap();
        assert_eq!(out, json!(3));
        let err = engine
            .apply_json(&json!({"first_ok": [{"nope": []}]}), &json!({}))
            .unwrap_err();
        assert_eq!(err.code(), "JLOGIC_E_CUSTOM");
    }

    #[test]
    fn depth_comes_from_config() {
        let engine = Engine::with_config(EngineConfig {
            max_depth: 3,
            ..EngineConfig::default()
        })
        .unwrap();
        let shallow = json!({"!": [{"!": [true]}]});
        let deep = json!({"!": [{"!": [{"!": [{"!": [true]}]}]}]});
        assert_eq!(engine.apply_json(&shallow, &json!(null)).unwrap(), json!(true));
        assert_eq!(
            engine.apply_json(&deep, &json!(null)).unwrap_err(),
            EvalError::DepthExceeded { limit: 3 }
        );
    }

    #[test]
    fn matcher_follows_configured_prefix() {
        let engine = Engine::with_config(EngineConfig {
            wildcard_prefix: "?".to_string(),
            ..EngineConfig::default()
        })
        .unwrap();
        let candidate = Value::from(json!({"var": "x"}));
        assert!(engine.rule_like(&candidate, &Value::from(json!({"var": "?any"}))));
        assert!(!engine.rule_like(&candidate, &Value::from(json!({"var": "@any"}))));
        let bound = engine
            .rule_captures(&candidate, &Value::from(json!({"var": "?path"})))
            .unwrap();
        assert_eq!(bound.get("path"), Some(&Value::from("x")));
    }

    #[test]
    fn default_engine_is_shared_within_a_thread() {
        add_operation("twice", EvalMode::Eager, |args, _| {
            let n = args.first().and_then(Value::as_f64).unwrap_or(0.0);
            Ok(Value::from(n * 2.0))
        })
        .unwrap();
        let rule = Value::from(json!({"twice": [21]}));
        assert_eq!(apply(&rule, &Value::Null).unwrap(), Value::from(42));
        assert!(with_default_engine(|engine| engine.operators().contains("twice")));

        let other = std::thread::spawn(|| {
            with_default_engine(|engine| engine.operators().contains("twice"))
        });
        assert!(!other.join().unwrap());
    }

    #[test]
    fn host_state_survives_between_applies() {
        let engine = Engine::new();
        let counter = crate::value::HostRef::new(HostObject::new("counter").with_field("count", 0).with_method(
            "increment",
            |fields, _| {
                let next = fields.get("count").and_then(Value::as_f64).unwrap_or(0.0) + 1.0;
                fields.insert("count".to_string(), next.into());
                Ok(next.into())
            },
        ));
        let mut data = Map::new();
        data.insert("a".to_string(), Value::Host(counter.clone()));
        let data = Value::Object(data);
        let rule = Value::from(json!({"method": [{"var": "a"}, "increment"]}));
        assert_eq!(engine.apply(&rule, &data).unwrap(), Value::from(1));
        assert_eq!(engine.apply(&rule, &data).unwrap(), Value::from(2));
        assert_eq!(counter.field("count"), Some(Value::from(2)));
    }
}
