use thiserror::Error;

/// Failure raised while evaluating a rule.
///
/// Every variant carries a stable machine-readable code (see [`EvalError::code`])
/// next to its human-readable message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unrecognized operation '{name}'")]
    UnknownOperator { name: String },

    #[error("'{op}' expects {expected} argument(s), got {got}")]
    InvalidArity {
        op: String,
        expected: String,
        got: usize,
    },

    #[error("'{op}': {message}")]
    TypeMismatch { op: String, message: String },

    #[error("method '{method}': {message}")]
    Invocation { method: String, message: String },

    #[error("rule nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { limit: usize },

    /// Raised by user-registered operators.
    #[error("'{op}': {message}")]
    Custom { op: String, message: String },
}

impl EvalError {
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::UnknownOperator { .. } => "JLOGIC_E_UNKNOWN_OP",
            EvalError::InvalidArity { .. } => "JLOGIC_E_ARITY",
            EvalError::TypeMismatch { .. } => "JLOGIC_E_TYPE",
            EvalError::Invocation { .. } => "JLOGIC_E_INVOKE",
            EvalError::DepthExceeded { .. } => "JLOGIC_E_DEPTH",
            EvalError::Custom { .. } => "JLOGIC_E_CUSTOM",
        }
    }

    pub fn unknown_operator(name: impl Into<String>) -> Self {
        EvalError::UnknownOperator { name: name.into() }
    }

    pub fn arity(op: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        EvalError::InvalidArity {
            op: op.into(),
            expected: expected.into(),
            got,
        }
    }

    pub fn type_mismatch(op: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::TypeMismatch {
            op: op.into(),
            message: message.into(),
        }
    }

    pub fn invocation(method: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Invocation {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn custom(op: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Custom {
            op: op.into(),
            message: message.into(),
        }
    }
}

/// Rejected engine or registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("operator name must not be empty")]
    EmptyOperatorName,

    #[error("max_depth must be greater than zero")]
    ZeroDepth,

    #[error("wildcard_prefix must not be empty")]
    EmptyWildcardPrefix,

    #[error("invalid engine configuration: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_per_kind() {
        assert_eq!(EvalError::unknown_operator("x").code(), "JLOGIC_E_UNKNOWN_OP");
        assert_eq!(EvalError::arity("!", "1", 2).code(), "JLOGIC_E_ARITY");
        assert_eq!(
            EvalError::DepthExceeded { limit: 3 }.code(),
            "JLOGIC_E_DEPTH"
        );
    }

    #[test]
    fn messages_name_the_operator() {
        let err = EvalError::arity("substr", "2 or 3", 1);
        assert_eq!(err.to_string(), "'substr' expects 2 or 3 argument(s), got 1");
        let err = EvalError::unknown_operator("fubar");
        assert_eq!(err.to_string(), "unrecognized operation 'fubar'");
    }
}
