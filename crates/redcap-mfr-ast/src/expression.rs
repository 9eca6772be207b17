//! Expression node definitions

use crate::{BinaryOp, BoxExpr, Function, Spanned, UnaryOp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A branching-logic expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Literal(Literal),
    /// Field reference: `[field]` or `[field(code)]`
    FieldRef(FieldRef),
    /// Event-qualified field reference: `[event][field]`
    EventFieldRef(EventFieldRef),
    /// Unary operation
    UnaryOp(UnaryOpExpr),
    /// Binary operation
    BinaryOp(BinaryOpExpr),
    /// Allow-listed function call
    FunctionCall(FunctionCallExpr),
}

/// Literal values in logic strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Numeric literal
    Number(Decimal),
    /// Quoted string literal; `''` is the explicit blankness test
    Text(String),
}

impl Literal {
    /// Whether this is the empty-string literal used to test for blankness
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

/// A reference to a field in the current event's scope.
///
/// Checkbox fields are referenced per choice as `[field(code)]`; the choice
/// code resolves through the exported `field___code` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Field variable name
    pub field: String,
    /// Checkbox choice code, if any
    pub choice: Option<String>,
}

impl FieldRef {
    /// Create a plain field reference
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            choice: None,
        }
    }

    /// Create a checkbox choice reference
    pub fn choice(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            choice: Some(code.into()),
        }
    }

    /// The export name this reference resolves through
    pub fn export_name(&self) -> String {
        match &self.choice {
            Some(code) => format!("{}___{}", self.field, code.to_lowercase()),
            None => self.field.clone(),
        }
    }
}

/// A field reference qualified with an event name: `[event][field]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFieldRef {
    /// Unique event name
    pub event: String,
    /// The referenced field
    pub field_ref: FieldRef,
}

/// A unary operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryOpExpr {
    /// The operator
    pub op: UnaryOp,
    /// The operand
    pub operand: BoxExpr,
}

/// A binary operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryOpExpr {
    /// Left operand
    pub left: BoxExpr,
    /// The operator
    pub op: BinaryOp,
    /// Right operand
    pub right: BoxExpr,
}

/// A call to an allow-listed function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallExpr {
    /// The resolved function
    pub function: Function,
    /// Argument expressions in call order
    pub args: Vec<Spanned<Expression>>,
}

impl Expression {
    /// Collect every field name referenced anywhere in this expression
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Literal(_) => {}
            Self::FieldRef(r) => out.push(&r.field),
            Self::EventFieldRef(r) => out.push(&r.field_ref.field),
            Self::UnaryOp(e) => e.operand.inner.collect_fields(out),
            Self::BinaryOp(e) => {
                e.left.inner.collect_fields(out);
                e.right.inner.collect_fields(out);
            }
            Self::FunctionCall(e) => {
                for arg in &e.args {
                    arg.inner.collect_fields(out);
                }
            }
        }
    }
}
