use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error as ThisError;

/// Classification of every way an evaluation can fail.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[error("Empty expression")]
    EmptyExpression,
    #[error("Expression too long")]
    ExpressionTooLong,
    #[error("Invalid expression syntax")]
    InvalidSyntax,
    #[error("Expression too complex")]
    ExpressionTooComplex,
    #[error("division by zero")]
    DivisionByZero,
    #[error("Numerical result out of range")]
    NumericOverflow,
    #[error("Result is not a real number")]
    UndefinedResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Option<usize>,
}

impl Error {
    /// Failure carrying only the kind's own message.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, message: kind.to_string(), position: None }
    }

    pub fn with_detail<M: Into<String>>(kind: ErrorKind, detail: M, position: Option<usize>) -> Self {
        Self { kind, message: format!("{}: {}", kind, detail.into()), position }
    }

    pub fn syntax<M: Into<String>>(detail: M, position: Option<usize>) -> Self {
        Self::with_detail(ErrorKind::InvalidSyntax, detail, position)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} at position {}", self.message, pos),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position_when_known() {
        let e = Error::syntax("Unexpected character", Some(3));
        assert_eq!(e.to_string(), "Invalid expression syntax: Unexpected character at position 3");
        assert_eq!(Error::new(ErrorKind::DivisionByZero).to_string(), "division by zero");
    }
}
