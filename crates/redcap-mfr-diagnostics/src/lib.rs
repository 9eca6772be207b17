//! Error taxonomy and source spans for branching-logic diagnostics
//!
//! Per-field logic errors ([`LogicError`]) are recoverable: the owning field
//! resolves to an indeterminate result and processing continues. Dictionary
//! errors ([`DictionaryError`]) are structural defects in the project setup
//! and abort the run before any record is touched.

mod error;
mod span;

pub use error::{DictionaryError, LogicError, ReasonCode};
pub use span::{Span, Spanned};
