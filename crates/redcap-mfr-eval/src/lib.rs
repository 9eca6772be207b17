//! Ternary evaluator for branching-logic expressions
//!
//! Evaluation never aborts a run: every failure mode (type mismatch,
//! unresolved reference) folds into [`Ternary::Unknown`] carrying the
//! originating error, and the logical connectives propagate unknowns with
//! Kleene semantics.

mod engine;
mod functions;
mod ternary;

pub use engine::{Bindings, Evaluator};
pub use ternary::Ternary;
