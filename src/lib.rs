//! A small language for boolean conditions.
//!
//! Condition text such as `([status] > 10) AND ([mode] == "OFF")` is parsed once into an
//! expression tree and then evaluated against named bindings supplied by the host:
//!
//! ```
//! use conditions::{Bindings, Value};
//!
//! let expr = conditions::parse(r#"([status] > 10) AND ([mode] == "OFF")"#).unwrap();
//! assert_eq!(conditions::variables(&expr), vec!["status", "mode"]);
//!
//! let mut bindings = Bindings::new();
//! bindings.insert("status".to_string(), Value::from(14));
//! bindings.insert("mode".to_string(), Value::from("OFF"));
//! assert_eq!(conditions::evaluate(&expr, &bindings), Ok(true));
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod expr;
mod operators;
pub mod parser;
pub mod scanner;
pub mod token_type;
pub mod value;

pub use config::ParserConfig;
pub use error::{ConditionError, ErrorKind};
pub use evaluator::evaluate;
pub use expr::Expr;
pub use value::{Bindings, Value};

use parser::Parser;

/// Parses condition text with the default configuration.
pub fn parse(source: &str) -> Result<Expr, ConditionError> {
    parse_with(source, &ParserConfig::default())
}

pub fn parse_with(source: &str, config: &ParserConfig) -> Result<Expr, ConditionError> {
    Parser::new(source, config).parse()
}

/// Variables a condition references, in order of first appearance and without duplicates. These
/// are the bindings a host has to provide before calling `evaluate`.
pub fn variables(expr: &Expr) -> Vec<String> {
    expr.variables()
}
