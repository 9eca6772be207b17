//! The expression evaluator

use crate::functions;
use crate::Ternary;
use redcap_mfr_ast::{
    BinaryOp, BinaryOpExpr, Expression, FieldRef, Literal, Spanned, UnaryOp,
};
use redcap_mfr_diagnostics::LogicError;
use redcap_mfr_types::Value;
use rust_decimal::Decimal;

/// Value resolution against the current record, event and dictionary.
///
/// The engine crate implements this over its dictionary, event schedule and
/// record snapshot; the evaluator itself stays independent of how values are
/// stored. Implementations must scope resolution to events at or before the
/// current field's own event and answer forward or unknown references with
/// [`LogicError::UnresolvedReference`].
pub trait Bindings {
    /// Resolve a field reference, optionally qualified with an event name
    fn field_value(&self, event: Option<&str>, field_ref: &FieldRef) -> Result<Value, LogicError>;
}

/// Evaluates a parsed branching-logic expression to a ternary result
#[derive(Debug, Default, Clone, Copy)]
pub struct Evaluator;

impl Evaluator {
    /// Create an evaluator
    pub fn new() -> Self {
        Self
    }

    /// Evaluate an expression in boolean position.
    ///
    /// Never fails: every error folds into [`Ternary::Unknown`].
    pub fn evaluate(&self, expr: &Spanned<Expression>, bindings: &dyn Bindings) -> Ternary {
        self.eval_truth(expr, bindings)
    }

    fn eval_truth(&self, expr: &Spanned<Expression>, b: &dyn Bindings) -> Ternary {
        match &expr.inner {
            Expression::BinaryOp(op) if op.op == BinaryOp::And => self
                .eval_truth(&op.left, b)
                .and_with(|| self.eval_truth(&op.right, b)),
            Expression::BinaryOp(op) if op.op == BinaryOp::Or => self
                .eval_truth(&op.left, b)
                .or_with(|| self.eval_truth(&op.right, b)),
            Expression::BinaryOp(op) if op.op.is_comparison() => self.eval_comparison(op, b),
            Expression::UnaryOp(op) if op.op == UnaryOp::Not => {
                self.eval_truth(&op.operand, b).negate()
            }
            // Any value-producing expression in boolean position
            _ => match self.eval_value(expr, b) {
                Ok(value) => Ternary::from_bool(value.is_truthy()),
                Err(err) => Ternary::Unknown(err),
            },
        }
    }

    /// Comparison with the platform's blank convention.
    ///
    /// A blank string literal is an explicit blankness test and compares
    /// normally. A blank bound value against anything else is neither equal
    /// nor unequal: both `=` and `<>` come out false, as does any ordering.
    fn eval_comparison(&self, op: &BinaryOpExpr, b: &dyn Bindings) -> Ternary {
        let left = match self.eval_value(&op.left, b) {
            Ok(v) => v,
            Err(err) => return Ternary::Unknown(err),
        };
        let right = match self.eval_value(&op.right, b) {
            Ok(v) => v,
            Err(err) => return Ternary::Unknown(err),
        };

        let explicit_blank_test =
            is_blank_literal(&op.left.inner) || is_blank_literal(&op.right.inner);

        if (left.is_blank() || right.is_blank()) && !explicit_blank_test {
            return match op.op {
                // blank = blank holds even without an explicit test
                BinaryOp::Equal => Ternary::from_bool(left.is_blank() && right.is_blank()),
                _ => Ternary::False,
            };
        }

        match op.op {
            BinaryOp::Equal => Ternary::from_bool(left.loose_eq(&right)),
            BinaryOp::NotEqual => Ternary::from_bool(!left.loose_eq(&right)),
            BinaryOp::Less | BinaryOp::LessOrEqual | BinaryOp::Greater | BinaryOp::GreaterOrEqual => {
                if left.is_blank() || right.is_blank() {
                    return Ternary::False;
                }
                match left.try_ordering(&right) {
                    Some(ordering) => Ternary::from_bool(match op.op {
                        BinaryOp::Less => ordering.is_lt(),
                        BinaryOp::LessOrEqual => ordering.is_le(),
                        BinaryOp::Greater => ordering.is_gt(),
                        _ => ordering.is_ge(),
                    }),
                    None => Ternary::Unknown(LogicError::type_mismatch(format!(
                        "cannot order {} against {}",
                        left.kind(),
                        right.kind()
                    ))),
                }
            }
            _ => Ternary::Unknown(LogicError::type_mismatch(format!(
                "operator '{}' is not a comparison",
                op.op
            ))),
        }
    }

    /// Evaluate an expression in value position
    pub(crate) fn eval_value(
        &self,
        expr: &Spanned<Expression>,
        b: &dyn Bindings,
    ) -> Result<Value, LogicError> {
        match &expr.inner {
            Expression::Literal(Literal::Number(n)) => Ok(Value::Number(*n)),
            Expression::Literal(Literal::Text(s)) => Ok(Value::text(s.clone())),
            Expression::FieldRef(r) => b.field_value(None, r),
            Expression::EventFieldRef(r) => b.field_value(Some(&r.event), &r.field_ref),
            Expression::UnaryOp(op) => match op.op {
                UnaryOp::Negate => {
                    let n = self.numeric_operand(&op.operand, b, "unary '-'")?;
                    Ok(Value::Number(-n))
                }
                UnaryOp::Not => match self.eval_truth(&op.operand, b) {
                    Ternary::True => Ok(Value::Number(Decimal::ZERO)),
                    Ternary::False => Ok(Value::Number(Decimal::ONE)),
                    Ternary::Unknown(err) => Err(err),
                },
            },
            Expression::BinaryOp(op) if op.op.is_logical() || op.op.is_comparison() => {
                // Boolean result used as a number (e.g. inside sum or if)
                match self.eval_truth(expr, b) {
                    Ternary::True => Ok(Value::Number(Decimal::ONE)),
                    Ternary::False => Ok(Value::Number(Decimal::ZERO)),
                    Ternary::Unknown(err) => Err(err),
                }
            }
            Expression::BinaryOp(op) => self.eval_arithmetic(op, b),
            Expression::FunctionCall(call) => functions::call(self, call, b),
        }
    }

    fn eval_arithmetic(&self, op: &BinaryOpExpr, b: &dyn Bindings) -> Result<Value, LogicError> {
        let symbol = op.op.symbol();
        let left = self.numeric_operand(&op.left, b, symbol)?;
        let right = self.numeric_operand(&op.right, b, symbol)?;

        let result = match op.op {
            BinaryOp::Add => left + right,
            BinaryOp::Subtract => left - right,
            BinaryOp::Multiply => left * right,
            BinaryOp::Divide => {
                if right.is_zero() {
                    return Err(LogicError::type_mismatch("division by zero"));
                }
                left / right
            }
            other => {
                return Err(LogicError::type_mismatch(format!(
                    "operator '{other}' is not arithmetic"
                )));
            }
        };
        Ok(Value::Number(result))
    }

    /// Evaluate an operand that must be numeric
    pub(crate) fn numeric_operand(
        &self,
        expr: &Spanned<Expression>,
        b: &dyn Bindings,
        context: &str,
    ) -> Result<Decimal, LogicError> {
        let value = self.eval_value(expr, b)?;
        value.as_number().ok_or_else(|| {
            LogicError::type_mismatch(format!(
                "{} operand for {context} is not a number",
                value.kind()
            ))
        })
    }
}

fn is_blank_literal(expr: &Expression) -> bool {
    matches!(expr, Expression::Literal(lit) if lit.is_blank_text())
}
