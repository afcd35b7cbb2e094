// ABOUTME: Error types for lex/parse diagnostics and evaluator control flow

use crate::object::Object;
use crate::rca;
use thiserror::Error;

/// A lexical or syntactic diagnostic, already formatted (header, offending
/// line, caret, message) by the Lexer's `fmt_error`. The parser accumulates
/// these rather than panicking on the first error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LexParseError(pub String);

impl LexParseError {
    pub fn new(formatted: impl Into<String>) -> Self {
        LexParseError(formatted.into())
    }
}

/// The control-flow error threaded through every evaluator function.
///
/// A `Simple` error has no location context (raised by builtins and
/// low-level helpers); a `Detailed` error already carries a formatted
/// source-context string. Every evaluator entry that receives a `Simple`
/// error promotes it to `Detailed` using the current expression's
/// Location before propagating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("{0}")]
    Simple(String),
    #[error("{0}")]
    Detailed(String),
}

impl EvalError {
    pub fn simple(msg: impl Into<String>) -> Self {
        EvalError::Simple(msg.into())
    }

    pub fn is_detailed(&self) -> bool {
        matches!(self, EvalError::Detailed(_))
    }

    pub fn message(&self) -> &str {
        match self {
            EvalError::Simple(s) | EvalError::Detailed(s) => s,
        }
    }

    /// Promotes a Simple error into a Detailed one by formatting it against
    /// the Lexer at `loc`. Already-detailed errors pass through unchanged
    /// (an evaluator entry further up the call chain has already attached
    /// the most specific Location available).
    pub fn promote(self, lexer: &crate::lexer::Lexer, loc: crate::token::Location) -> EvalError {
        match self {
            EvalError::Simple(msg) => EvalError::Detailed(lexer.fmt_error(loc, &msg)),
            detailed @ EvalError::Detailed(_) => detailed,
        }
    }

    /// Materializes this error as a first-class Object (the `simple-error`
    /// / `detailed-error` object variants).
    pub fn into_object(self) -> rca::Handle {
        match self {
            EvalError::Simple(msg) => rca::alloc(Object::SimpleError(msg)),
            EvalError::Detailed(msg) => rca::alloc(Object::DetailedError(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::token::Location;

    #[test]
    fn promote_formats_simple_errors_with_location() {
        let lexer = Lexer::new("t.eta", "let x = 1;");
        let err = EvalError::simple("undefined identifier").promote(&lexer, Location::start());
        assert!(err.is_detailed());
        assert!(err.message().contains("undefined identifier"));
        assert!(err.message().contains("t.eta"));
    }

    #[test]
    fn promote_leaves_detailed_errors_untouched() {
        let lexer = Lexer::new("t.eta", "x");
        let detailed = EvalError::Detailed("already formatted".to_string());
        let promoted = detailed.clone().promote(&lexer, Location::start());
        assert_eq!(promoted, detailed);
    }
}
