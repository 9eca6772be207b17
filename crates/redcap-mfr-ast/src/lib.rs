//! Branching-logic abstract syntax tree definitions
//!
//! This crate defines the AST for the supported subset of the REDCap
//! branching-logic language. The node kinds mirror the grammar: literals,
//! field references (plain, checkbox-choice and event-qualified), unary and
//! binary operators, and allow-listed function calls.

mod expression;
mod function;
mod operator;

pub use expression::*;
pub use function::*;
pub use operator::*;

/// A node with source span information
pub type Spanned<T> = redcap_mfr_diagnostics::Spanned<T>;

/// Type alias for boxed expressions
pub type BoxExpr = Box<Spanned<Expression>>;
