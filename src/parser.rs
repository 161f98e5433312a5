/// A precedence-climbing parser for condition expressions.
///
/// Grammar:
///
/// expr  -> unary ( OPERATOR unary )*
/// unary -> "(" expr ")" | IDENTIFIER | STRING | NUMBER | TRUE | FALSE | ARRAY
///
/// Operator precedence: OR (1) < AND, XOR, NAND (2) < comparisons, membership and regex
/// operators (3). Operators of equal precedence group to the right.
///
/// Examples: "[status] > 10 AND [mode] == \"OFF\"", "[tag] in [\"a\", \"b\"]",
/// "([code] =~ /^5\d\d/) OR [retry]"
use serde_json::Value as Json;

use crate::config::ParserConfig;
use crate::error::ConditionError;
use crate::expr::Expr;
use crate::scanner::{Literal, Scanner, Token};
use crate::token_type::TokenType::*;

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    config: &'a ParserConfig,
    depth: usize,     // open parentheses
    operators: usize, // binary operators read so far
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, config: &'a ParserConfig) -> Self {
        Parser {
            scanner: Scanner::new(source, config),
            config,
            depth: 0,
            operators: 0,
        }
    }

    /// Parses one complete expression. Anything left after it is an error.
    pub fn parse(&mut self) -> Result<Expr, ConditionError> {
        let expr = self.expr()?;

        let token = self.scanner.next();
        match token.variant {
            EOF => {
                log::debug!("parsed condition: {}", expr);
                Ok(expr)
            }
            Illegal => Err(Self::illegal(token)),
            _ => Err(Self::error("Expected end of condition", token)),
        }
    }

    /// Matches production: expr -> unary ( OPERATOR unary )*
    ///
    /// Every operator is attached to the tree built so far by `attach`, which keeps the right
    /// spine ordered by precedence.
    fn expr(&mut self) -> Result<Expr, ConditionError> {
        let mut root = self.unary()?;

        loop {
            let token = self.scanner.next();
            if token.variant == Illegal {
                return Err(Self::illegal(token));
            }
            if !token.variant.is_operator() {
                self.scanner.pushback();
                return Ok(root);
            }

            self.operators += 1;
            if self.operators > self.config.max_operators {
                return Err(Self::error("Condition has too many operators", token));
            }

            let right = self.unary()?;
            root = Self::attach(root, token, right);
        }
    }

    /// Adds `operator right` to the tree. While the node on the right spine is a binary node
    /// whose operator binds no tighter than the new one, the new operator moves down into its
    /// right subtree; where that stops, the new operator takes the node as its left operand.
    fn attach(node: Expr, operator: Token, right: Expr) -> Expr {
        match node {
            Expr::Binary {
                left,
                operator: spine_operator,
                right: spine_right,
            } if spine_operator.precedence() <= operator.variant.precedence() => Expr::Binary {
                left,
                operator: spine_operator,
                right: Box::new(Self::attach(*spine_right, operator, right)),
            },
            node => Expr::Binary {
                left: Box::new(node),
                operator: operator.variant,
                right: Box::new(right),
            },
        }
    }

    /// Matches production: unary -> "(" expr ")" | IDENTIFIER | STRING | NUMBER | TRUE | FALSE | ARRAY
    fn unary(&mut self) -> Result<Expr, ConditionError> {
        let token = self.scanner.next();

        match token.variant {
            LeftParen => {
                if self.depth >= self.config.max_nesting {
                    return Err(Self::error("Condition nested too deeply", token));
                }
                self.depth += 1;
                let expr = self.expr()?;
                self.depth -= 1;
                let closing = self.scanner.next();
                match closing.variant {
                    RightParen => Ok(Expr::Grouping { expr: Box::new(expr) }),
                    Illegal => Err(Self::illegal(closing)),
                    _ => Err(Self::error("Expected ')'", closing)),
                }
            }
            Identifier => Ok(Expr::Variable { name: token.lexeme }),
            Str => match token.literal {
                Some(Literal::Str(value)) => Ok(Expr::Str { value }),
                _ => Ok(Expr::Str { value: token.lexeme }),
            },
            Number => match token.literal {
                Some(Literal::Number(value)) => Ok(Expr::Number { value }),
                _ => Err(Self::error("Unable to parse number", token)),
            },
            True => Ok(Expr::Boolean { value: true }),
            False => Ok(Expr::Boolean { value: false }),
            Array => Self::list(token),
            Illegal => Err(Self::illegal(token)),
            _ => Err(Self::error("Expected operand", token)),
        }
    }

    /// Decodes the body of a bracketed list as a JSON array. The first element decides whether
    /// it becomes a string set or a number set; every other element must be of the same kind.
    fn list(token: Token) -> Result<Expr, ConditionError> {
        let values: Vec<Json> = match serde_json::from_str(&format!("[{}]", token.lexeme)) {
            Ok(values) => values,
            Err(e) => return Err(Self::error(&format!("Malformed list literal: {}", e), token)),
        };

        let Some(first) = values.first() else {
            return Err(Self::error("Empty list not castable", token));
        };

        if first.is_string() {
            let strings: Option<Vec<String>> = values
                .into_iter()
                .map(|value| match value {
                    Json::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            strings
                .map(|values| Expr::StringSet { values })
                .ok_or_else(|| Self::error("Mixed list literal, expected only strings", token))
        } else if first.is_number() {
            let numbers: Option<Vec<f64>> = values.iter().map(Json::as_f64).collect();
            numbers
                .map(|values| Expr::NumberSet { values })
                .ok_or_else(|| Self::error("Mixed list literal, expected only numbers", token))
        } else {
            Err(Self::error("List elements must be strings or numbers", token))
        }
    }

    fn illegal(token: Token) -> ConditionError {
        ConditionError::Lexical {
            position: token.position(),
            lexeme: token.lexeme,
        }
    }

    fn error(message: &str, token: Token) -> ConditionError {
        let position = token.position();
        let lexeme = if token.variant == EOF {
            "end of input".to_string()
        } else {
            token.lexeme
        };
        ConditionError::Syntax {
            message: message.to_string(),
            lexeme,
            position,
        }
    }
}
