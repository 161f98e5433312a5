use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ConditionError;
use crate::expr::Expr;

/// Name to value environment a condition is evaluated against. Names are the dotted paths
/// produced by bracket references, e.g. `[foo][bar]` looks up `"foo.bar"`.
pub type Bindings = HashMap<String, Value>;

/// A value supplied by the host for a variable.
///
/// Deserializes from plain JSON, so bindings can be loaded with
/// `serde_json::from_str::<Bindings>(...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Null,
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Null => "null",
        }
    }

    /// Converts the bound value into the literal node the operators work on. Numbers are widened
    /// to `f64`; a list is accepted only when every element is a string.
    pub(crate) fn to_literal(&self, name: &str) -> Result<Expr, ConditionError> {
        let literal = match self {
            Value::Bool(value) => Expr::Boolean { value: *value },
            Value::Int(value) => Expr::Number { value: *value as f64 },
            Value::UInt(value) => Expr::Number { value: *value as f64 },
            Value::Float(value) => Expr::Number { value: *value },
            Value::Str(value) => Expr::Str { value: value.clone() },
            Value::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Str(s) => values.push(s.clone()),
                        _ => {
                            return Err(ConditionError::UnsupportedBinding {
                                name: name.to_string(),
                                kind: "non-string list",
                            });
                        }
                    }
                }
                Expr::StringSet { values }
            }
            Value::Null => {
                return Err(ConditionError::UnsupportedBinding {
                    name: name.to_string(),
                    kind: self.kind(),
                });
            }
        };
        Ok(literal)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::Int(i64::from(value))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::UInt(u64::from(value))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}
