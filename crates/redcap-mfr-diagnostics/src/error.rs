//! Logic and dictionary error types

use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable reason codes surfaced in report rows.
///
/// Every indeterminate field instance carries one of these so operators can
/// see why a field could not be classified instead of having it silently
/// absorbed into the missing or hidden buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    /// Unrecognized character in the logic string
    LexError,
    /// Logic string outside the supported grammar
    ParseError,
    /// Call to a function outside the allow-list (smart variables, action
    /// tag expressions and other extended REDCap syntax land here)
    UnsupportedFunction,
    /// Field annotated with an action tag that affects visibility in a way
    /// this engine does not interpret
    UnsupportedAnnotation,
    /// Reference to an unknown field or event, or a forward event reference
    UnresolvedReference,
    /// Operand kinds incompatible with the operator
    TypeMismatch,
    /// A visible field instance with no data (missing rows, not a defect)
    VisibleBlank,
}

impl ReasonCode {
    /// Stable string form used in report output
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LexError => "lex_error",
            Self::ParseError => "parse_error",
            Self::UnsupportedFunction => "unsupported_function",
            Self::UnsupportedAnnotation => "unsupported_annotation",
            Self::UnresolvedReference => "unresolved_reference",
            Self::TypeMismatch => "type_mismatch",
            Self::VisibleBlank => "visible_blank",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while lexing, parsing or evaluating a single branching-logic
/// string.
///
/// These are recoverable at field granularity: the owning field resolves to
/// an indeterminate result carrying the matching [`ReasonCode`] and the run
/// continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError {
    /// Unrecognized character in the logic string
    #[error("unrecognized character '{ch}' at offset {position}")]
    Lex { position: usize, ch: char },

    /// Token sequence outside the grammar
    #[error("parse error at {span}: expected {expected}, found {found}")]
    Parse {
        span: Span,
        expected: String,
        found: String,
    },

    /// Call to a function outside the allow-list
    #[error("unsupported function '{name}'")]
    UnsupportedFunction { name: String, span: Span },

    /// Reference that cannot be resolved against the dictionary or schedule
    #[error("unresolved reference: {reference}")]
    UnresolvedReference { reference: String },

    /// Operand kinds incompatible with the operator
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },
}

impl LogicError {
    /// Create a lex error
    pub fn lex(position: usize, ch: char) -> Self {
        Self::Lex { position, ch }
    }

    /// Create a parse error with expected-vs-found detail
    pub fn parse(span: Span, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Parse {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unsupported-function error
    pub fn unsupported_function(name: impl Into<String>, span: Span) -> Self {
        Self::UnsupportedFunction {
            name: name.into(),
            span,
        }
    }

    /// Create an unresolved-reference error
    pub fn unresolved_reference(reference: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reference: reference.into(),
        }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    /// The reason code reported for fields that failed with this error
    pub const fn reason_code(&self) -> ReasonCode {
        match self {
            Self::Lex { .. } => ReasonCode::LexError,
            Self::Parse { .. } => ReasonCode::ParseError,
            Self::UnsupportedFunction { .. } => ReasonCode::UnsupportedFunction,
            Self::UnresolvedReference { .. } => ReasonCode::UnresolvedReference,
            Self::TypeMismatch { .. } => ReasonCode::TypeMismatch,
        }
    }
}

/// Structural defects in the project dictionary itself.
///
/// These invalidate the dependency ordering every record relies on, so they
/// are fatal to the whole run and surfaced before any record processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictionaryError {
    /// The embedding graph contains a cycle
    #[error("cyclic field embedding: {cycle}")]
    CyclicEmbedding { cycle: String },

    /// Dictionary content violates a structural invariant
    #[error("malformed dictionary: {message}")]
    Malformed { message: String },
}

impl DictionaryError {
    /// Create a cyclic-embedding error from the fields on the cycle
    pub fn cyclic_embedding(fields: &[&str]) -> Self {
        Self::CyclicEmbedding {
            cycle: fields.join(" -> "),
        }
    }

    /// Create a malformed-dictionary error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(ReasonCode::ParseError.as_str(), "parse_error");
        assert_eq!(ReasonCode::UnsupportedAnnotation.to_string(), "unsupported_annotation");
    }

    #[test]
    fn test_logic_error_maps_to_reason() {
        let err = LogicError::lex(4, '@');
        assert_eq!(err.reason_code(), ReasonCode::LexError);
        assert!(err.to_string().contains("offset 4"));

        let err = LogicError::parse(Span::new(0, 3), "']'", "'-'");
        assert_eq!(err.reason_code(), ReasonCode::ParseError);
    }

    #[test]
    fn test_cycle_rendering() {
        let err = DictionaryError::cyclic_embedding(&["a", "b", "a"]);
        assert_eq!(err.to_string(), "cyclic field embedding: a -> b -> a");
    }
}
