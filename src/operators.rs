//! One handler per binary operator. Each handler checks the operand kinds it needs and reports a
//! `TypeMismatch` naming the operand otherwise. Equality is the exception: operands of different
//! kinds simply compare unequal.

use regex::Regex;

use crate::error::{ConditionError, Side};
use crate::expr::Expr;
use crate::token_type::TokenType;

/// Applies `operator` to two reduced operands.
pub(crate) fn apply(operator: TokenType, left: &Expr, right: &Expr) -> Result<bool, ConditionError> {
    match operator {
        TokenType::And => logical(operator, left, right, |a, b| a && b),
        TokenType::Or => logical(operator, left, right, |a, b| a || b),
        TokenType::Xor => logical(operator, left, right, |a, b| a != b),
        TokenType::Nand => logical(operator, left, right, |a, b| !(a && b)),
        TokenType::EqualEqual => Ok(equal(left, right)),
        // no shared kind compares unequal, so != is true there
        TokenType::BangEqual => Ok(!equal(left, right)),
        TokenType::Greater => compare(operator, left, right, |a, b| a > b),
        TokenType::GreaterEqual => compare(operator, left, right, |a, b| a >= b),
        TokenType::Less => compare(operator, left, right, |a, b| a < b),
        TokenType::LessEqual => compare(operator, left, right, |a, b| a <= b),
        TokenType::In => contains(operator, left, right),
        TokenType::NotIn => contains(operator, left, right).map(|found| !found),
        TokenType::Intersects => intersects(operator, left, right),
        TokenType::Has => has(operator, left, right),
        TokenType::Matches => matches(operator, left, right),
        TokenType::NotMatches => matches(operator, left, right).map(|found| !found),
        _ => Err(ConditionError::UnsupportedOperator { operator }),
    }
}

fn mismatch(operator: TokenType, side: Side, expected: &'static str, found: &Expr) -> ConditionError {
    ConditionError::TypeMismatch {
        operator,
        side,
        expected,
        found: found.kind(),
    }
}

fn boolean(operator: TokenType, side: Side, expr: &Expr) -> Result<bool, ConditionError> {
    match expr {
        Expr::Boolean { value } => Ok(*value),
        _ => Err(mismatch(operator, side, "boolean", expr)),
    }
}

fn number(operator: TokenType, side: Side, expr: &Expr) -> Result<f64, ConditionError> {
    match expr {
        Expr::Number { value } => Ok(*value),
        _ => Err(mismatch(operator, side, "number", expr)),
    }
}

fn string<'e>(operator: TokenType, side: Side, expr: &'e Expr) -> Result<&'e str, ConditionError> {
    match expr {
        Expr::Str { value } => Ok(value),
        _ => Err(mismatch(operator, side, "string", expr)),
    }
}

fn string_set<'e>(operator: TokenType, side: Side, expr: &'e Expr) -> Result<&'e [String], ConditionError> {
    match expr {
        Expr::StringSet { values } => Ok(values),
        _ => Err(mismatch(operator, side, "string set", expr)),
    }
}

fn number_set<'e>(operator: TokenType, side: Side, expr: &'e Expr) -> Result<&'e [f64], ConditionError> {
    match expr {
        Expr::NumberSet { values } => Ok(values),
        _ => Err(mismatch(operator, side, "number set", expr)),
    }
}

fn logical<F>(operator: TokenType, left: &Expr, right: &Expr, op: F) -> Result<bool, ConditionError>
where
    F: Fn(bool, bool) -> bool,
{
    let a = boolean(operator, Side::Left, left)?;
    let b = boolean(operator, Side::Right, right)?;
    Ok(op(a, b))
}

fn compare<F>(operator: TokenType, left: &Expr, right: &Expr, cmp: F) -> Result<bool, ConditionError>
where
    F: Fn(f64, f64) -> bool,
{
    let a = number(operator, Side::Left, left)?;
    let b = number(operator, Side::Right, right)?;
    Ok(cmp(a, b))
}

/// The left operand picks the kind (string, then number, then boolean). A right operand of
/// another kind, or a left operand of none of them, is unequal rather than an error.
fn equal(left: &Expr, right: &Expr) -> bool {
    match (left, right) {
        (Expr::Str { value: a }, Expr::Str { value: b }) => a == b,
        (Expr::Number { value: a }, Expr::Number { value: b }) => a == b,
        (Expr::Boolean { value: a }, Expr::Boolean { value: b }) => a == b,
        _ => false,
    }
}

/// Membership of a string in a string set or of a number in a number set.
fn contains(operator: TokenType, left: &Expr, right: &Expr) -> Result<bool, ConditionError> {
    match left {
        Expr::Str { value } => {
            let set = string_set(operator, Side::Right, right)?;
            Ok(set.iter().any(|element| element == value))
        }
        Expr::Number { value } => {
            let set = number_set(operator, Side::Right, right)?;
            Ok(set.iter().any(|element| element == value))
        }
        _ => Err(mismatch(operator, Side::Left, "string or number", left)),
    }
}

fn intersects(operator: TokenType, left: &Expr, right: &Expr) -> Result<bool, ConditionError> {
    let a = string_set(operator, Side::Left, left)?;
    let b = string_set(operator, Side::Right, right)?;
    Ok(a.iter().any(|element| b.contains(element)))
}

fn has(operator: TokenType, left: &Expr, right: &Expr) -> Result<bool, ConditionError> {
    let set = string_set(operator, Side::Left, left)?;
    let needle = string(operator, Side::Right, right)?;
    Ok(set.iter().any(|element| element == needle))
}

/// Compiles the right operand as a pattern and searches the left operand with it. Patterns are
/// compiled on every call.
fn matches(operator: TokenType, left: &Expr, right: &Expr) -> Result<bool, ConditionError> {
    let subject = string(operator, Side::Left, left)?;
    let pattern = string(operator, Side::Right, right)?;
    let regex = Regex::new(pattern).map_err(|source| ConditionError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(regex.is_match(subject))
}
