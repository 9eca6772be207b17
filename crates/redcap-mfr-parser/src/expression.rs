//! Recursive-descent expression parser with precedence climbing
//!
//! One function per precedence level, lowest first: or, and, not,
//! comparison, additive, multiplicative, factor. The parser is pure and
//! deterministic; any accepted string has exactly one AST.

use crate::lexer::{Token, TokenKind};
use redcap_mfr_ast::{
    BinaryOp, BinaryOpExpr, EventFieldRef, Expression, FieldRef, Function, FunctionCallExpr,
    Literal, Spanned, UnaryOp, UnaryOpExpr,
};
use redcap_mfr_diagnostics::{LogicError, Span};

pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    /// Parse a complete expression; trailing tokens are an error
    pub(crate) fn parse(mut self) -> Result<Spanned<Expression>, LogicError> {
        let expr = self.or_expression()?;
        match self.peek() {
            None => Ok(expr),
            Some(_) => Err(self.error_here("end of input")),
        }
    }

    // === Precedence levels ===

    fn or_expression(&mut self) -> Result<Spanned<Expression>, LogicError> {
        let mut left = self.and_expression()?;

        while self.eat_keyword("or") {
            let right = self.and_expression()?;
            left = binary(left, BinaryOp::Or, right);
        }

        Ok(left)
    }

    fn and_expression(&mut self) -> Result<Spanned<Expression>, LogicError> {
        let mut left = self.not_expression()?;

        while self.eat_keyword("and") {
            let right = self.not_expression()?;
            left = binary(left, BinaryOp::And, right);
        }

        Ok(left)
    }

    fn not_expression(&mut self) -> Result<Spanned<Expression>, LogicError> {
        if let Some(span) = self.eat_keyword_spanned("not") {
            let operand = self.comparison()?;
            let full = span.merge(operand.span);
            return Ok(Spanned::new(
                Expression::UnaryOp(UnaryOpExpr {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                }),
                full,
            ));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Spanned<Expression>, LogicError> {
        let left = self.additive()?;

        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Eq) => Some(BinaryOp::Equal),
            Some(TokenKind::Ne) => Some(BinaryOp::NotEqual),
            Some(TokenKind::Lt) => Some(BinaryOp::Less),
            Some(TokenKind::Le) => Some(BinaryOp::LessOrEqual),
            Some(TokenKind::Gt) => Some(BinaryOp::Greater),
            Some(TokenKind::Ge) => Some(BinaryOp::GreaterOrEqual),
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance();
                let right = self.additive()?;
                Ok(binary(left, op, right))
            }
            None => Ok(left),
        }
    }

    fn additive(&mut self) -> Result<Spanned<Expression>, LogicError> {
        let mut left = self.multiplicative()?;

        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Spanned<Expression>, LogicError> {
        let mut left = self.factor()?;

        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Multiply,
                Some(TokenKind::Slash) => BinaryOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn factor(&mut self) -> Result<Spanned<Expression>, LogicError> {
        let token = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.error_here("expression")),
        };

        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Spanned::new(
                    Expression::Literal(Literal::Number(n)),
                    token.span,
                ))
            }
            TokenKind::Text(s) => {
                self.advance();
                Ok(Spanned::new(Expression::Literal(Literal::Text(s)), token.span))
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.factor()?;
                let full = token.span.merge(operand.span);
                Ok(Spanned::new(
                    Expression::UnaryOp(UnaryOpExpr {
                        op: UnaryOp::Negate,
                        operand: Box::new(operand),
                    }),
                    full,
                ))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.or_expression()?;
                let close = self.expect(&TokenKind::RParen)?;
                Ok(Spanned::new(inner.inner, token.span.merge(close)))
            }
            TokenKind::LBracket => self.reference(),
            TokenKind::Ident(name) => self.function_call(&name, token.span),
            _ => Err(self.error_here("expression")),
        }
    }

    // === References and calls ===

    /// Parse `[name]`, `[name(code)]`, `[event][name]` or `[event][name(code)]`
    fn reference(&mut self) -> Result<Spanned<Expression>, LogicError> {
        let (first, start) = self.bracket_group()?;

        // Two adjacent bracket groups form an event-qualified reference;
        // the qualifier itself cannot carry a choice code
        if first.choice.is_none() && matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LBracket))
        {
            let (field_ref, end) = self.bracket_group()?;
            return Ok(Spanned::new(
                Expression::EventFieldRef(EventFieldRef {
                    event: first.field,
                    field_ref,
                }),
                start.merge(end),
            ));
        }

        Ok(Spanned::new(Expression::FieldRef(first), start))
    }

    /// Parse one `[name]` or `[name(code)]` group, returning its span
    fn bracket_group(&mut self) -> Result<(FieldRef, Span), LogicError> {
        let open = self.expect(&TokenKind::LBracket)?;
        let name = self.expect_ident()?;

        let mut choice = None;
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LParen)) {
            self.advance();
            choice = Some(self.choice_code()?);
            self.expect(&TokenKind::RParen)?;
        }

        let close = self.expect(&TokenKind::RBracket)?;
        let field_ref = match choice {
            Some(code) => FieldRef::choice(name, code),
            None => FieldRef::new(name),
        };
        Ok((field_ref, open.merge(close)))
    }

    /// A checkbox choice code: an identifier or a number, taken verbatim
    /// from the source so codes like `05` keep their spelling
    fn choice_code(&mut self) -> Result<String, LogicError> {
        match self.peek() {
            Some(token) if matches!(token.kind, TokenKind::Ident(_) | TokenKind::Number(_)) => {
                let code = self.source[token.span.as_range()].to_string();
                self.advance();
                Ok(code)
            }
            _ => Err(self.error_here("choice code")),
        }
    }

    fn function_call(
        &mut self,
        name: &str,
        name_span: Span,
    ) -> Result<Spanned<Expression>, LogicError> {
        let function = Function::from_name(name)
            .ok_or_else(|| LogicError::unsupported_function(name, name_span))?;

        self.advance();
        self.expect(&TokenKind::LParen)?;

        let mut args = Vec::new();
        if !matches!(self.peek().map(|t| &t.kind), Some(TokenKind::RParen)) {
            loop {
                args.push(self.or_expression()?);
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Comma)) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let close = self.expect(&TokenKind::RParen)?;

        if !function.accepts_arity(args.len()) {
            let expected = match function.max_arity() {
                Some(max) if max == function.min_arity() => {
                    format!("{} arguments to {}", max, function)
                }
                Some(max) => format!(
                    "{} to {} arguments to {}",
                    function.min_arity(),
                    max,
                    function
                ),
                None => format!("at least {} arguments to {}", function.min_arity(), function),
            };
            return Err(LogicError::parse(
                name_span.merge(close),
                expected,
                format!("{} arguments", args.len()),
            ));
        }

        Ok(Spanned::new(
            Expression::FunctionCall(FunctionCallExpr { function, args }),
            name_span.merge(close),
        ))
    }

    // === Token helpers ===

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn eof_span(&self) -> Span {
        Span::point(self.source.len())
    }

    fn error_here(&self, expected: &str) -> LogicError {
        match self.peek() {
            Some(token) => LogicError::parse(token.span, expected, token.kind.describe()),
            None => LogicError::parse(self.eof_span(), expected, "end of input"),
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Span, LogicError> {
        match self.peek() {
            Some(token) if token.kind == *kind => {
                let span = token.span;
                self.advance();
                Ok(span)
            }
            _ => Err(self.error_here(&kind.describe())),
        }
    }

    fn expect_ident(&mut self) -> Result<String, LogicError> {
        match self.peek() {
            Some(token) => {
                if let TokenKind::Ident(name) = &token.kind {
                    let name = name.clone();
                    self.advance();
                    Ok(name)
                } else {
                    Err(self.error_here("identifier"))
                }
            }
            None => Err(self.error_here("identifier")),
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        self.eat_keyword_spanned(kw).is_some()
    }

    fn eat_keyword_spanned(&mut self, kw: &str) -> Option<Span> {
        match self.peek() {
            Some(token) if token.kind.is_keyword(kw) => {
                let span = token.span;
                self.advance();
                Some(span)
            }
            _ => None,
        }
    }
}

fn binary(
    left: Spanned<Expression>,
    op: BinaryOp,
    right: Spanned<Expression>,
) -> Spanned<Expression> {
    let span = left.span.merge(right.span);
    Spanned::new(
        Expression::BinaryOp(BinaryOpExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }),
        span,
    )
}
