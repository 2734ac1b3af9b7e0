//! jlogic core crate.
//!
//! Rules are JSON-shaped trees: an object with exactly one key is an
//! operation (`{"op": operands}`), arrays evaluate element-wise, everything
//! else is a literal. Layers:
//!
//! - `value` + `coerce`: the value model, truthiness and the loose
//!   conversions operators apply to their operands.
//! - `runtime`: operator registry, evaluation context and the tree walker.
//!   Operators are either eager (operands evaluated before dispatch) or
//!   lazy (handler decides which operands to evaluate, and when).
//! - `ops`: the built-in operator set.
//! - `matcher`: structural pattern matching over unevaluated rules.
//! - `engine`: configured registry + matcher, plus a per-thread default
//!   engine behind the free functions [`apply`] and [`add_operation`].
//!
//! ```
//! use jlogic_core::Engine;
//! use serde_json::json;
//!
//! let engine = Engine::new();
//! let out = engine
//!     .apply_json(&json!({"<": [{"var": "temp"}, 110]}), &json!({"temp": 100}))
//!     .unwrap();
//! assert_eq!(out, json!(true));
//! ```

pub mod coerce;
pub mod engine;
pub mod error;
pub mod matcher;
mod ops;
pub mod path;
pub mod runtime;
pub mod value;

pub use engine::{Engine, EngineConfig, add_operation, apply, with_default_engine};
pub use error::{ConfigError, EvalError};
pub use matcher::{Matcher, WILDCARD, rule_captures, rule_like, uses_data};
pub use path::get_path;
pub use runtime::{
    Context, EvalMode, EvalResult, Operator, Operators, evaluate, is_operation, operands, operation,
};
pub use value::{FALSY_VALUES, Falsy, HostObject, HostRef, Invocable, Map, Value, truthy};
