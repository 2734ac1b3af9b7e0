//! Built-in operator set installed by [`Operators::new`].

mod arith;
mod arrays;
mod compare;
mod control;
mod data;
mod strings;

use crate::error::EvalError;
use crate::runtime::Operators;
use crate::value::Value;

pub(crate) fn install(operators: &Operators) {
    compare::install(operators);
    arith::install(operators);
    strings::install(operators);
    arrays::install(operators);
    control::install(operators);
    data::install(operators);
}

/// Fail with `InvalidArity` unless `min <= args.len() <= max`.
pub(crate) fn require_arity(
    op: &str,
    args: &[Value],
    min: usize,
    max: usize,
) -> Result<(), EvalError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = match (min, max) {
        (min, max) if min == max => min.to_string(),
        (min, usize::MAX) => format!("at least {min}"),
        (min, max) if max == min + 1 => format!("{min} or {max}"),
        (min, max) => format!("{min} to {max}"),
    };
    Err(EvalError::arity(op, expected, args.len()))
}
