use std::collections::HashSet;
use std::fmt;

use crate::token_type::TokenType;

/// Node of a parsed condition. A tree is built once by the parser and only read afterwards, so
/// the same tree can be evaluated any number of times, from any number of threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Boolean {
        value: bool,
    },
    Number {
        value: f64,
    },
    Str {
        value: String,
    },
    StringSet {
        values: Vec<String>,
    },
    NumberSet {
        values: Vec<f64>,
    },
    /// Reference to a binding, by its dotted path.
    Variable {
        name: String,
    },
    Grouping {
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: TokenType,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Names of all variables the expression references, in order of first appearance and
    /// without duplicates.
    pub fn variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();
        self.collect_variables(&mut names, &mut seen);
        names
    }

    fn collect_variables<'e>(&'e self, names: &mut Vec<String>, seen: &mut HashSet<&'e str>) {
        match self {
            Expr::Variable { name } => {
                if seen.insert(name.as_str()) {
                    names.push(name.clone());
                }
            }
            Expr::Grouping { expr } => expr.collect_variables(names, seen),
            Expr::Binary { left, right, .. } => {
                left.collect_variables(names, seen);
                right.collect_variables(names, seen);
            }
            _ => {}
        }
    }

    /// Human readable name of the node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Boolean { .. } => "boolean",
            Expr::Number { .. } => "number",
            Expr::Str { .. } => "string",
            Expr::StringSet { .. } => "string set",
            Expr::NumberSet { .. } => "number set",
            Expr::Variable { .. } => "variable",
            Expr::Grouping { .. } => "grouping",
            Expr::Binary { .. } => "binary expression",
        }
    }
}

fn write_list<T: fmt::Debug>(f: &mut fmt::Formatter, values: &[T]) -> Result<(), fmt::Error> {
    write!(f, "[")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{:?}", value)?;
    }
    write!(f, "]")
}

/// Prints the expression back as condition text.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Expr::Boolean { value } => write!(f, "{}", value),
            Expr::Number { value } => write!(f, "{}", value),
            Expr::Str { value } => write!(f, "{:?}", value),
            Expr::StringSet { values } => write_list(f, values),
            Expr::NumberSet { values } => write_list(f, values),
            Expr::Variable { name } => {
                let segments: Vec<&str> = name.split('.').collect();
                write!(f, "[{}]", segments.join("]["))
            }
            Expr::Grouping { expr } => write!(f, "({})", expr),
            Expr::Binary { left, operator, right } => write!(f, "{} {} {}", left, operator, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Variable { name: name.to_string() })
    }

    #[test]
    fn test_variables_first_seen_order_without_duplicates() {
        // ([b] == [a]) AND ([a] IN [c][d] OR [b])
        let expr = Expr::Binary {
            left: Box::new(Expr::Grouping {
                expr: Box::new(Expr::Binary { left: var("b"), operator: TokenType::EqualEqual, right: var("a") }),
            }),
            operator: TokenType::And,
            right: Box::new(Expr::Grouping {
                expr: Box::new(Expr::Binary {
                    left: Box::new(Expr::Binary { left: var("a"), operator: TokenType::In, right: var("c.d") }),
                    operator: TokenType::Or,
                    right: var("b"),
                }),
            }),
        };

        assert_eq!(expr.variables(), vec!["b", "a", "c.d"]);
    }

    #[test]
    fn test_literals_have_no_variables() {
        assert!(Expr::Boolean { value: true }.variables().is_empty());
        assert!(Expr::StringSet { values: vec!["a".to_string()] }.variables().is_empty());
    }

    #[test]
    fn test_display() {
        let expr = Expr::Binary {
            left: Box::new(Expr::Grouping {
                expr: Box::new(Expr::Binary {
                    left: var("status"),
                    operator: TokenType::Greater,
                    right: Box::new(Expr::Number { value: -10.5 }),
                }),
            }),
            operator: TokenType::And,
            right: Box::new(Expr::Binary {
                left: var("foo.@bar"),
                operator: TokenType::NotIn,
                right: Box::new(Expr::StringSet { values: vec!["a".to_string(), "b".to_string()] }),
            }),
        };

        assert_eq!(expr.to_string(), r#"([status] > -10.5) AND [foo][@bar] NOT IN ["a", "b"]"#);
    }

    #[test]
    fn test_kind() {
        assert_eq!(Expr::NumberSet { values: vec![] }.kind(), "number set");
        assert_eq!(Expr::Str { value: String::new() }.kind(), "string");
    }
}
