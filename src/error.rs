use ariadne::{Config, Label, Report, ReportKind, Source};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

use crate::token_type::TokenType;

/// Which side of a binary operator an operand sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Side {
    #[strum(to_string = "left")]
    Left,
    #[strum(to_string = "right")]
    Right,
}

/// Coarse error category, one per failure stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Resolution,
    Type,
    Pattern,
}

/// Location of a lexeme in the source text. `span` counts chars, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub span: Range<usize>,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("illegal token '{lexeme}' ({position})")]
    Lexical { lexeme: String, position: Position },

    #[error("{message}, found '{lexeme}' ({position})")]
    Syntax {
        message: String,
        lexeme: String,
        position: Position,
    },

    #[error("binding not found: {name}")]
    BindingNotFound { name: String },

    #[error("unsupported {kind} value bound to '{name}'")]
    UnsupportedBinding { name: String, kind: &'static str },

    #[error("{side} operand of {operator} must be {expected}, found {found}")]
    TypeMismatch {
        operator: TokenType,
        side: Side,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{operator}' is not a binary operator")]
    UnsupportedOperator { operator: TokenType },

    #[error("condition reduced to {found}, expected a boolean")]
    NonBooleanResult { found: &'static str },

    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ConditionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConditionError::Lexical { .. } => ErrorKind::Lexical,
            ConditionError::Syntax { .. } | ConditionError::UnsupportedOperator { .. } => ErrorKind::Syntax,
            ConditionError::BindingNotFound { .. } | ConditionError::UnsupportedBinding { .. } => {
                ErrorKind::Resolution
            }
            ConditionError::TypeMismatch { .. } | ConditionError::NonBooleanResult { .. } => ErrorKind::Type,
            ConditionError::Pattern { .. } => ErrorKind::Pattern,
        }
    }

    /// Source location of the error, if it was raised while reading the condition text.
    pub fn position(&self) -> Option<&Position> {
        match self {
            ConditionError::Lexical { position, .. } | ConditionError::Syntax { position, .. } => Some(position),
            _ => None,
        }
    }

    /// Renders the error as a diagnostic report against the condition text it came from.
    /// Evaluation errors carry no location and are reported as a note, as is anything raised
    /// against empty text.
    pub fn render(&self, source: &str) -> String {
        let source_name = "condition";

        // ariadne needs a non-empty range inside the source to draw the marker
        let length = source.chars().count();
        let span = match self.position() {
            Some(position) => {
                let start = position.span.start.min(length.saturating_sub(1));
                start..position.span.end.clamp(start + 1, length.max(start + 1))
            }
            None => 0..0,
        };

        let mut report = Report::build(ReportKind::Error, (source_name, span.clone()))
            .with_config(Config::default().with_color(false))
            .with_message(format!("{} error", self.kind()));

        if self.position().is_some() && length > 0 {
            report = report.with_label(Label::new((source_name, span)).with_message(self.to_string()));
        } else {
            report = report.with_note(self.to_string());
        }

        let mut buffer = Vec::new();
        match report.finish().write((source_name, Source::from(source)), &mut buffer) {
            Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}
