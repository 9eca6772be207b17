//! Implementations of the allow-listed functions

use crate::engine::{Bindings, Evaluator};
use crate::Ternary;
use redcap_mfr_ast::{Expression, Function, FunctionCallExpr, Spanned};
use redcap_mfr_diagnostics::LogicError;
use redcap_mfr_types::Value;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Seconds per day
const SECONDS_PER_DAY: Decimal = Decimal::from_parts(86_400, 0, 0, false, 0);

/// Dispatch an allow-listed call.
///
/// The parser enforces arity, but the AST types are open, so the contract
/// is re-checked here before any argument is indexed.
pub(crate) fn call(
    eval: &Evaluator,
    call: &FunctionCallExpr,
    b: &dyn Bindings,
) -> Result<Value, LogicError> {
    if !call.function.accepts_arity(call.args.len()) {
        return Err(LogicError::type_mismatch(format!(
            "{} called with {} arguments",
            call.function,
            call.args.len()
        )));
    }
    match call.function {
        Function::DateDiff => datediff(eval, &call.args, b),
        Function::Sum => fold_numeric(eval, &call.args, b, Fold::Sum),
        Function::Min => fold_numeric(eval, &call.args, b, Fold::Min),
        Function::Max => fold_numeric(eval, &call.args, b, Fold::Max),
        Function::Round => round(eval, &call.args, b),
        Function::If => if_then_else(eval, &call.args, b),
    }
}

/// `datediff(date1, date2, units[, returnSignedValue])`
///
/// Units: `y` years, `M` months, `d` days, `h` hours, `m` minutes,
/// `s` seconds (months and minutes differ by case, as on the platform).
/// The result is an absolute difference unless the signed flag is truthy.
fn datediff(
    eval: &Evaluator,
    args: &[Spanned<Expression>],
    b: &dyn Bindings,
) -> Result<Value, LogicError> {
    let from = temporal_operand(eval, &args[0], b)?;
    let to = temporal_operand(eval, &args[1], b)?;

    let unit = match eval.eval_value(&args[2], b)? {
        Value::Text(s) => s,
        other => {
            return Err(LogicError::type_mismatch(format!(
                "datediff units must be a string, got {}",
                other.kind()
            )));
        }
    };

    let signed = match args.get(3) {
        Some(arg) => eval.eval_value(arg, b)?.is_truthy(),
        None => false,
    };

    let seconds = Decimal::from((to - from).num_seconds());
    let days = seconds / SECONDS_PER_DAY;

    // Average month and year lengths, matching the platform's calculation
    let diff = match unit.as_str() {
        "s" => seconds,
        "m" => seconds / Decimal::from(60),
        "h" => seconds / Decimal::from(3600),
        "d" => days,
        "M" => days / Decimal::new(3044, 2),
        "y" => days / Decimal::new(3_652_425, 4),
        other => {
            return Err(LogicError::type_mismatch(format!(
                "unknown datediff unit '{other}'"
            )));
        }
    };

    Ok(Value::Number(if signed { diff } else { diff.abs() }))
}

fn temporal_operand(
    eval: &Evaluator,
    expr: &Spanned<Expression>,
    b: &dyn Bindings,
) -> Result<chrono::NaiveDateTime, LogicError> {
    let value = eval.eval_value(expr, b)?;
    value.as_datetime().ok_or_else(|| {
        LogicError::type_mismatch(format!("{} operand for datediff is not a date", value.kind()))
    })
}

enum Fold {
    Sum,
    Min,
    Max,
}

/// `sum`, `min` and `max` over numeric operands; blank operands are
/// skipped. An all-blank `sum` is 0; all-blank `min`/`max` are blank.
fn fold_numeric(
    eval: &Evaluator,
    args: &[Spanned<Expression>],
    b: &dyn Bindings,
    fold: Fold,
) -> Result<Value, LogicError> {
    let mut acc: Option<Decimal> = None;

    for arg in args {
        let value = eval.eval_value(arg, b)?;
        if value.is_blank() {
            continue;
        }
        let n = value.as_number().ok_or_else(|| {
            LogicError::type_mismatch(format!(
                "{} operand in numeric aggregate",
                value.kind()
            ))
        })?;
        acc = Some(match (acc, &fold) {
            (None, _) => n,
            (Some(a), Fold::Sum) => a + n,
            (Some(a), Fold::Min) => a.min(n),
            (Some(a), Fold::Max) => a.max(n),
        });
    }

    Ok(match (acc, fold) {
        (Some(n), _) => Value::Number(n),
        (None, Fold::Sum) => Value::Number(Decimal::ZERO),
        (None, _) => Value::Blank,
    })
}

/// `round(number[, decimal_places])`, rounding halves away from zero
fn round(
    eval: &Evaluator,
    args: &[Spanned<Expression>],
    b: &dyn Bindings,
) -> Result<Value, LogicError> {
    let n = eval.numeric_operand(&args[0], b, "round")?;

    let places = match args.get(1) {
        Some(arg) => {
            let p = eval.numeric_operand(arg, b, "round")?;
            p.to_u32().ok_or_else(|| {
                LogicError::type_mismatch(format!("invalid decimal places {p} for round"))
            })?
        }
        None => 0,
    };

    Ok(Value::Number(n.round_dp_with_strategy(
        places,
        RoundingStrategy::MidpointAwayFromZero,
    )))
}

/// `if(condition, value_if_true, value_if_false)`
fn if_then_else(
    eval: &Evaluator,
    args: &[Spanned<Expression>],
    b: &dyn Bindings,
) -> Result<Value, LogicError> {
    match eval.evaluate(&args[0], b) {
        Ternary::True => eval.eval_value(&args[1], b),
        Ternary::False => eval.eval_value(&args[2], b),
        Ternary::Unknown(err) => Err(err),
    }
}
