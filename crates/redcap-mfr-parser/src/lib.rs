//! Lexer and parser for the supported REDCap branching-logic grammar
//!
//! Grammar (precedence low to high): `or`, `and`, `not`, comparison
//! (`= <> < <= > >=`), additive (`+ -`), multiplicative (`* /`), factor.
//! Field references use `[field]`, `[field(code)]` and `[event][field]`
//! forms; function calls are checked against an explicit allow-list.
//!
//! Anything outside this grammar — smart variables, action-tag expressions,
//! the wider calculation library — fails with a positioned [`LogicError`]
//! so the owning field can degrade to an indeterminate classification.

mod expression;
mod lexer;

pub use lexer::{lex, Token, TokenKind};

use redcap_mfr_ast::{Expression, Spanned};
use redcap_mfr_diagnostics::LogicError;

/// Parse a branching-logic string into its AST.
///
/// Pure and deterministic: the same string always yields the same tree.
pub fn parse_expression(input: &str) -> Result<Spanned<Expression>, LogicError> {
    let tokens = lex(input)?;
    expression::Parser::new(input, tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use redcap_mfr_ast::{BinaryOp, FieldRef, Function, Literal, UnaryOp};
    use rstest::rstest;

    fn parse(input: &str) -> Expression {
        parse_expression(input).unwrap().inner
    }

    #[test]
    fn test_simple_comparison() {
        let expr = parse("[dob] <> ''");
        let Expression::BinaryOp(op) = expr else {
            panic!("expected binary op");
        };
        assert_eq!(op.op, BinaryOp::NotEqual);
        assert_eq!(
            op.left.inner,
            Expression::FieldRef(FieldRef::new("dob"))
        );
        assert_eq!(
            op.right.inner,
            Expression::Literal(Literal::Text(String::new()))
        );
    }

    #[test]
    fn test_precedence_and_binds_tighter_than_or() {
        // a = 1 or b = 1 and c = 1  =>  a = 1 or (b = 1 and c = 1)
        let expr = parse("[a] = 1 or [b] = 1 and [c] = 1");
        let Expression::BinaryOp(top) = expr else {
            panic!("expected binary op");
        };
        assert_eq!(top.op, BinaryOp::Or);
        let Expression::BinaryOp(rhs) = &top.right.inner else {
            panic!("expected binary op on the right");
        };
        assert_eq!(rhs.op, BinaryOp::And);
    }

    #[test]
    fn test_precedence_arithmetic() {
        // 1 + 2 * 3 groups as 1 + (2 * 3)
        let expr = parse("[x] = 1 + 2 * 3");
        let Expression::BinaryOp(cmp) = expr else {
            panic!("expected comparison");
        };
        let Expression::BinaryOp(add) = &cmp.right.inner else {
            panic!("expected addition");
        };
        assert_eq!(add.op, BinaryOp::Add);
        let Expression::BinaryOp(mul) = &add.right.inner else {
            panic!("expected multiplication");
        };
        assert_eq!(mul.op, BinaryOp::Multiply);
    }

    #[test]
    fn test_parenthesized_grouping() {
        let expr = parse("([a] = 1 or [b] = 1) and [c] = 1");
        let Expression::BinaryOp(top) = expr else {
            panic!("expected binary op");
        };
        assert_eq!(top.op, BinaryOp::And);
        let Expression::BinaryOp(lhs) = &top.left.inner else {
            panic!("expected binary op on the left");
        };
        assert_eq!(lhs.op, BinaryOp::Or);
    }

    #[test]
    fn test_not_expression() {
        let expr = parse("not [consent] = '1'");
        let Expression::UnaryOp(op) = expr else {
            panic!("expected unary op");
        };
        assert_eq!(op.op, UnaryOp::Not);
    }

    #[test]
    fn test_checkbox_reference() {
        let expr = parse("[race(5)] = '1'");
        let Expression::BinaryOp(op) = expr else {
            panic!("expected binary op");
        };
        assert_eq!(
            op.left.inner,
            Expression::FieldRef(FieldRef::choice("race", "5"))
        );
    }

    #[test]
    fn test_event_qualified_reference() {
        let expr = parse("[baseline_arm_1][weight] > 100");
        let Expression::BinaryOp(op) = expr else {
            panic!("expected binary op");
        };
        let Expression::EventFieldRef(r) = &op.left.inner else {
            panic!("expected event-qualified reference");
        };
        assert_eq!(r.event, "baseline_arm_1");
        assert_eq!(r.field_ref, FieldRef::new("weight"));
    }

    #[test]
    fn test_function_call() {
        let expr = parse("datediff([dob], '2024-01-01', 'y') >= 18");
        let Expression::BinaryOp(op) = expr else {
            panic!("expected binary op");
        };
        let Expression::FunctionCall(call) = &op.left.inner else {
            panic!("expected function call");
        };
        assert_eq!(call.function, Function::DateDiff);
        assert_eq!(call.args.len(), 3);
    }

    #[test]
    fn test_unsupported_function_is_flagged() {
        let err = parse_expression("rounddown([weight] / 2)").unwrap_err();
        assert!(matches!(
            err,
            LogicError::UnsupportedFunction { ref name, .. } if name == "rounddown"
        ));
    }

    #[test]
    fn test_wrong_arity_is_a_parse_error() {
        let err = parse_expression("if([a] = 1, 2)").unwrap_err();
        assert!(matches!(err, LogicError::Parse { .. }));
    }

    #[rstest]
    // Smart variables are outside the grammar
    #[case("[record-dag-name] = 'site_a'")]
    // Dangling operator
    #[case("[age] >=")]
    // Unbalanced parenthesis
    #[case("([a] = 1")]
    // Adjacent values with no operator
    #[case("18 [a]")]
    // Doubled comparison
    #[case("[a] = = 1")]
    fn test_rejected_syntax(#[case] input: &str) {
        let err = parse_expression(input).unwrap_err();
        assert!(matches!(err, LogicError::Parse { .. }));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse_expression("[age] >= 18 and [consent] = '1'").unwrap();
        let b = parse_expression("[age] >= 18 and [consent] = '1'").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_spans_cover_source() {
        let spanned = parse_expression("[age] >= 18").unwrap();
        assert_eq!(spanned.span.start, 0);
        assert_eq!(spanned.span.end, 11);
    }
}
