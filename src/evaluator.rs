use std::borrow::Cow;

use crate::error::ConditionError;
use crate::expr::Expr;
use crate::operators;
use crate::value::Bindings;

/// Evaluates a parsed condition against a set of bindings.
///
/// The tree is only read, so one parsed condition can be evaluated repeatedly and concurrently,
/// each call with its own bindings. Any error aborts the evaluation; there is no partial result.
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<bool, ConditionError> {
    let verdict = match reduce(expr, bindings)?.as_ref() {
        Expr::Boolean { value } => *value,
        other => return Err(ConditionError::NonBooleanResult { found: other.kind() }),
    };
    log::debug!("condition {} evaluated to {}", expr, verdict);
    Ok(verdict)
}

/// Reduces a node to a literal. Literal leaves are returned as they are; variables are replaced
/// by their bound value and binary nodes by the boolean their operator produces.
fn reduce<'e>(expr: &'e Expr, bindings: &Bindings) -> Result<Cow<'e, Expr>, ConditionError> {
    let reduced = match expr {
        Expr::Grouping { expr } => return reduce(expr, bindings),
        Expr::Variable { name } => {
            let value = bindings
                .get(name)
                .ok_or_else(|| ConditionError::BindingNotFound { name: name.clone() })?;
            Cow::Owned(value.to_literal(name)?)
        }
        Expr::Binary { left, operator, right } => {
            let left = reduce(left, bindings)?;
            let right = reduce(right, bindings)?;
            let value = operators::apply(*operator, &left, &right)?;
            Cow::Owned(Expr::Boolean { value })
        }
        Expr::Boolean { .. }
        | Expr::Number { .. }
        | Expr::Str { .. }
        | Expr::StringSet { .. }
        | Expr::NumberSet { .. } => Cow::Borrowed(expr),
    };
    log::trace!("reduced {} to {}", expr, reduced);
    Ok(reduced)
}
