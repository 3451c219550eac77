//! Expression productions.
//!
//! The precedence spine (disjunction down to primary) is memoized; each
//! rule follows the protocol of mark / cache / attempt / reset.

use adder_ir::{
    BoolOp, CmpOp, Expr, ExprContext, ExprKind, Keyword, Operator, Token, TokenKind, UnaryOp,
};

use super::rules;
use crate::Parser;

impl<'e> Parser<'e> {
    /// `expressions: expression (',' expression)* [','] | expression`
    pub(crate) fn expressions(&mut self) -> Option<Expr> {
        self.comma_series(Self::expression)
    }

    /// `star_expressions: star_expression (',' star_expression)* [',']`
    pub(crate) fn star_expressions(&mut self) -> Option<Expr> {
        self.comma_series(Self::star_expression)
    }

    /// Shared comma-series shape producing a tuple when a comma appears.
    fn comma_series(&mut self, element: fn(&mut Self) -> Option<Expr>) -> Option<Expr> {
        let first = element(self)?;
        let mut elts = vec![first];
        let mut is_tuple = false;
        loop {
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
            is_tuple = true;
            let after_comma = self.mark();
            match element(self) {
                Some(expr) => elts.push(expr),
                None => {
                    if self.error_indicator {
                        return None;
                    }
                    self.reset(after_comma);
                    break;
                }
            }
        }
        if is_tuple {
            let range = elts[0]
                .range
                .with_end(self.last_consumed_range());
            Some(Expr::new(
                ExprKind::Tuple {
                    elts,
                    ctx: ExprContext::Load,
                },
                range,
            ))
        } else {
            elts.pop()
        }
    }

    /// `star_expression: '*' bitwise_or | expression`
    fn star_expression(&mut self) -> Option<Expr> {
        let mark = self.mark();
        if let Some(star) = self.expect(TokenKind::Star) {
            if let Some(value) = self.bitwise_or() {
                let range = star.range.with_end(value.range);
                return Some(Expr::new(
                    ExprKind::Starred {
                        value: Box::new(value),
                        ctx: ExprContext::Load,
                    },
                    range,
                ));
            }
            self.reset(mark);
            return None;
        }
        self.expression()
    }

    /// `named_expression: NAME ':=' expression | expression`
    pub(crate) fn named_expression(&mut self) -> Option<Expr> {
        let mark = self.mark();
        if let Some(name) = self.expect(TokenKind::Name) {
            if self.expect(TokenKind::ColonEqual).is_some() {
                if let Some(value) = self.expression() {
                    let target = Expr::new(
                        ExprKind::Name {
                            id: self.token_text(&name),
                            ctx: ExprContext::Store,
                        },
                        name.range,
                    );
                    let range = name.range.with_end(value.range);
                    return Some(Expr::new(
                        ExprKind::NamedExpr {
                            target: Box::new(target),
                            value: Box::new(value),
                        },
                        range,
                    ));
                }
                self.reset(mark);
                return None;
            }
        }
        self.reset(mark);
        self.expression()
    }

    /// `expression: disjunction ['if' disjunction 'else' expression]`
    pub(crate) fn expression(&mut self) -> Option<Expr> {
        self.memoize(rules::EXPRESSION, Self::expression_raw)
    }

    fn expression_raw(&mut self) -> Option<Expr> {
        let body = self.disjunction()?;
        let mark = self.mark();
        if self.expect(TokenKind::If).is_some() {
            if let Some(test) = self.disjunction() {
                if self.expect(TokenKind::Else).is_some() {
                    if let Some(orelse) = self.expression() {
                        let range = body.range.with_end(orelse.range);
                        return Some(Expr::new(
                            ExprKind::IfExp {
                                test: Box::new(test),
                                body: Box::new(body),
                                orelse: Box::new(orelse),
                            },
                            range,
                        ));
                    }
                }
            }
            if self.error_indicator {
                return None;
            }
        }
        self.reset(mark);
        Some(body)
    }

    /// `disjunction: conjunction ('or' conjunction)*`
    pub(crate) fn disjunction(&mut self) -> Option<Expr> {
        self.memoize(rules::DISJUNCTION, |p| {
            p.bool_op_chain(TokenKind::Or, BoolOp::Or, Self::conjunction)
        })
    }

    /// `conjunction: inversion ('and' inversion)*`
    fn conjunction(&mut self) -> Option<Expr> {
        self.memoize(rules::CONJUNCTION, |p| {
            p.bool_op_chain(TokenKind::And, BoolOp::And, Self::inversion)
        })
    }

    fn bool_op_chain(
        &mut self,
        token: TokenKind,
        op: BoolOp,
        operand: fn(&mut Self) -> Option<Expr>,
    ) -> Option<Expr> {
        let first = operand(self)?;
        let mut values = vec![first];
        loop {
            let mark = self.mark();
            if self.expect(token).is_none() {
                break;
            }
            match operand(self) {
                Some(expr) => values.push(expr),
                None => {
                    self.reset(mark);
                    break;
                }
            }
        }
        if values.len() == 1 {
            return values.pop();
        }
        let range = values[0].range.with_end(values[values.len() - 1].range);
        Some(Expr::new(ExprKind::BoolOp { op, values }, range))
    }

    /// `inversion: 'not' inversion | comparison`
    fn inversion(&mut self) -> Option<Expr> {
        self.memoize(rules::INVERSION, Self::inversion_raw)
    }

    fn inversion_raw(&mut self) -> Option<Expr> {
        let mark = self.mark();
        if let Some(not) = self.expect(TokenKind::Not) {
            if let Some(operand) = self.inversion() {
                let range = not.range.with_end(operand.range);
                return Some(Expr::new(
                    ExprKind::UnaryOp {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    range,
                ));
            }
            self.reset(mark);
            return None;
        }
        self.comparison()
    }

    /// `comparison: bitwise_or compare_op_bitwise_or_pair*`
    fn comparison(&mut self) -> Option<Expr> {
        self.memoize(rules::COMPARISON, Self::comparison_raw)
    }

    fn comparison_raw(&mut self) -> Option<Expr> {
        let left = self.bitwise_or()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        loop {
            let mark = self.mark();
            let op = match self.comparison_op() {
                Some(op) => op,
                None => {
                    if self.error_indicator {
                        return None;
                    }
                    self.reset(mark);
                    break;
                }
            };
            match self.bitwise_or() {
                Some(right) => {
                    ops.push(op);
                    comparators.push(right);
                }
                None => {
                    self.reset(mark);
                    break;
                }
            }
        }
        if ops.is_empty() {
            return Some(left);
        }
        let range = left
            .range
            .with_end(comparators[comparators.len() - 1].range);
        Some(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                ops,
                comparators,
            },
            range,
        ))
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let token = self.fill_token();
        let op = match token.kind {
            TokenKind::EqEqual => CmpOp::Eq,
            TokenKind::NotEqual => {
                if self.check_barry_as_flufl(&token) {
                    return None;
                }
                CmpOp::NotEq
            }
            TokenKind::LessEqual => CmpOp::LtE,
            TokenKind::Less => CmpOp::Lt,
            TokenKind::GreaterEqual => CmpOp::GtE,
            TokenKind::Greater => CmpOp::Gt,
            TokenKind::In => CmpOp::In,
            TokenKind::Not => {
                // 'not in'
                let mark = self.mark();
                self.stream.advance();
                if self.expect(TokenKind::In).is_some() {
                    return Some(CmpOp::NotIn);
                }
                self.reset(mark);
                return None;
            }
            TokenKind::Is => {
                let mark = self.mark();
                self.stream.advance();
                if self.expect(TokenKind::Not).is_some() {
                    return Some(CmpOp::IsNot);
                }
                self.reset(mark);
                let _ = self.expect(TokenKind::Is);
                return Some(CmpOp::Is);
            }
            _ => return None,
        };
        self.stream.advance();
        Some(op)
    }

    /// `bitwise_or: bitwise_xor ('|' bitwise_xor)*`
    pub(crate) fn bitwise_or(&mut self) -> Option<Expr> {
        self.memoize(rules::BITWISE_OR, |p| {
            p.binary_chain(&[(TokenKind::VBar, Operator::BitOr)], Self::bitwise_xor)
        })
    }

    fn bitwise_xor(&mut self) -> Option<Expr> {
        self.memoize(rules::BITWISE_XOR, |p| {
            p.binary_chain(&[(TokenKind::Circumflex, Operator::BitXor)], Self::bitwise_and)
        })
    }

    fn bitwise_and(&mut self) -> Option<Expr> {
        self.memoize(rules::BITWISE_AND, |p| {
            p.binary_chain(&[(TokenKind::Amper, Operator::BitAnd)], Self::shift_expr)
        })
    }

    fn shift_expr(&mut self) -> Option<Expr> {
        self.memoize(rules::SHIFT, |p| {
            p.binary_chain(
                &[
                    (TokenKind::LeftShift, Operator::LShift),
                    (TokenKind::RightShift, Operator::RShift),
                ],
                Self::sum,
            )
        })
    }

    fn sum(&mut self) -> Option<Expr> {
        self.memoize(rules::SUM, |p| {
            p.binary_chain(
                &[
                    (TokenKind::Plus, Operator::Add),
                    (TokenKind::Minus, Operator::Sub),
                ],
                Self::term,
            )
        })
    }

    fn term(&mut self) -> Option<Expr> {
        self.memoize(rules::TERM, |p| {
            p.binary_chain(
                &[
                    (TokenKind::Star, Operator::Mult),
                    (TokenKind::Slash, Operator::Div),
                    (TokenKind::DoubleSlash, Operator::FloorDiv),
                    (TokenKind::Percent, Operator::Mod),
                    (TokenKind::At, Operator::MatMult),
                ],
                Self::factor,
            )
        })
    }

    /// Left-associative binary operator chain.
    fn binary_chain(
        &mut self,
        table: &[(TokenKind, Operator)],
        operand: fn(&mut Self) -> Option<Expr>,
    ) -> Option<Expr> {
        let mut left = operand(self)?;
        'outer: loop {
            let mark = self.mark();
            let kind = self.peek_kind();
            for &(token, op) in table {
                if kind == token {
                    self.stream.advance();
                    match operand(self) {
                        Some(right) => {
                            let range = left.range.with_end(right.range);
                            left = Expr::new(
                                ExprKind::BinOp {
                                    left: Box::new(left),
                                    op,
                                    right: Box::new(right),
                                },
                                range,
                            );
                            continue 'outer;
                        }
                        None => {
                            self.reset(mark);
                            break 'outer;
                        }
                    }
                }
            }
            break;
        }
        Some(left)
    }

    /// `factor: ('+' | '-' | '~') factor | power`
    fn factor(&mut self) -> Option<Expr> {
        self.memoize(rules::FACTOR, Self::factor_raw)
    }

    fn factor_raw(&mut self) -> Option<Expr> {
        let token = self.fill_token();
        let op = match token.kind {
            TokenKind::Plus => Some(UnaryOp::UAdd),
            TokenKind::Minus => Some(UnaryOp::USub),
            TokenKind::Tilde => Some(UnaryOp::Invert),
            _ => None,
        };
        if let Some(op) = op {
            let mark = self.mark();
            self.stream.advance();
            if let Some(operand) = self.factor() {
                let range = token.range.with_end(operand.range);
                return Some(Expr::new(
                    ExprKind::UnaryOp {
                        op,
                        operand: Box::new(operand),
                    },
                    range,
                ));
            }
            self.reset(mark);
            return None;
        }
        self.power()
    }

    /// `power: primary ['**' factor]` (right-associative)
    fn power(&mut self) -> Option<Expr> {
        self.memoize(rules::POWER, Self::power_raw)
    }

    fn power_raw(&mut self) -> Option<Expr> {
        let base = self.primary()?;
        let mark = self.mark();
        if self.expect(TokenKind::DoubleStar).is_some() {
            if let Some(exponent) = self.factor() {
                let range = base.range.with_end(exponent.range);
                return Some(Expr::new(
                    ExprKind::BinOp {
                        left: Box::new(base),
                        op: Operator::Pow,
                        right: Box::new(exponent),
                    },
                    range,
                ));
            }
            self.reset(mark);
            return None;
        }
        Some(base)
    }

    /// `primary: atom postfix*` where postfix is attribute access, a call,
    /// or a subscript.
    pub(crate) fn primary(&mut self) -> Option<Expr> {
        self.memoize(rules::PRIMARY, Self::primary_raw)
    }

    fn primary_raw(&mut self) -> Option<Expr> {
        let atom = self.atom()?;
        self.postfix_chain(atom)
    }

    /// Apply trailing `.NAME`, `(...)` and `[...]` to a base expression.
    pub(crate) fn postfix_chain(&mut self, mut result: Expr) -> Option<Expr> {
        loop {
            let mark = self.mark();
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.stream.advance();
                    match self.expect(TokenKind::Name) {
                        Some(name) => {
                            let range = result.range.with_end(name.range);
                            result = Expr::new(
                                ExprKind::Attribute {
                                    value: Box::new(result),
                                    attr: self.token_text(&name),
                                    ctx: ExprContext::Load,
                                },
                                range,
                            );
                        }
                        None => {
                            self.reset(mark);
                            break;
                        }
                    }
                }
                TokenKind::LPar => {
                    self.stream.advance();
                    let (args, keywords) = match self.call_arguments() {
                        Some(parsed) => parsed,
                        None => {
                            self.reset(mark);
                            break;
                        }
                    };
                    match self.expect(TokenKind::RPar) {
                        Some(close) => {
                            let range = result.range.with_end(close.range);
                            result = Expr::new(
                                ExprKind::Call {
                                    func: Box::new(result),
                                    args,
                                    keywords,
                                },
                                range,
                            );
                        }
                        None => {
                            self.reset(mark);
                            break;
                        }
                    }
                }
                TokenKind::LSqb => {
                    self.stream.advance();
                    let slice = match self.slices() {
                        Some(slice) => slice,
                        None => {
                            self.reset(mark);
                            break;
                        }
                    };
                    match self.expect(TokenKind::RSqb) {
                        Some(close) => {
                            let range = result.range.with_end(close.range);
                            result = Expr::new(
                                ExprKind::Subscript {
                                    value: Box::new(result),
                                    slice: Box::new(slice),
                                    ctx: ExprContext::Load,
                                },
                                range,
                            );
                        }
                        None => {
                            self.reset(mark);
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
        Some(result)
    }

    /// Call argument list: positional expressions, `*iterable`,
    /// `name=value` keywords and `**mapping`.
    fn call_arguments(&mut self) -> Option<(Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        loop {
            if self.peek_kind() == TokenKind::RPar {
                break;
            }
            let mark = self.mark();
            if let Some(star) = self.expect(TokenKind::DoubleStar) {
                let value = self.expression()?;
                let range = star.range.with_end(value.range);
                keywords.push(Keyword {
                    arg: None,
                    value,
                    range,
                });
            } else if let Some(star) = self.expect(TokenKind::Star) {
                let value = self.expression()?;
                let range = star.range.with_end(value.range);
                args.push(Expr::new(
                    ExprKind::Starred {
                        value: Box::new(value),
                        ctx: ExprContext::Load,
                    },
                    range,
                ));
            } else if let Some(keyword) = self.keyword_argument() {
                keywords.push(keyword);
            } else {
                self.reset(mark);
                match self.named_expression() {
                    Some(expr) => args.push(expr),
                    None => {
                        if self.error_indicator {
                            return None;
                        }
                        self.reset(mark);
                        break;
                    }
                }
            }
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
        }
        Some((args, keywords))
    }

    /// `NAME '=' expression`, only when both tokens line up.
    fn keyword_argument(&mut self) -> Option<Keyword> {
        let mark = self.mark();
        let name = self.expect(TokenKind::Name)?;
        if self.expect(TokenKind::Equal).is_none() {
            self.reset(mark);
            return None;
        }
        match self.expression() {
            Some(value) => {
                let range = name.range.with_end(value.range);
                Some(Keyword {
                    arg: Some(self.token_text(&name)),
                    value,
                    range,
                })
            }
            None => {
                self.reset(mark);
                None
            }
        }
    }

    /// `slices: slice (',' slice)* [',']`
    fn slices(&mut self) -> Option<Expr> {
        self.comma_series(Self::slice)
    }

    /// `slice: [expression] ':' [expression] [':' [expression]] | named_expression`
    fn slice(&mut self) -> Option<Expr> {
        let mark = self.mark();
        let start_range = self.peek_range();
        let lower = self.expression();
        if self.error_indicator {
            return None;
        }
        if self.expect(TokenKind::Colon).is_some() {
            let upper = self.maybe_expression();
            let step = if self.expect(TokenKind::Colon).is_some() {
                self.maybe_expression()
            } else {
                None
            };
            let range = lower
                .as_ref()
                .map(|l| l.range)
                .unwrap_or(start_range)
                .with_end(self.last_consumed_range());
            return Some(Expr::new(
                ExprKind::Slice {
                    lower: lower.map(Box::new),
                    upper: upper.map(Box::new),
                    step: step.map(Box::new),
                },
                range,
            ));
        }
        self.reset(mark);
        self.named_expression()
    }

    fn maybe_expression(&mut self) -> Option<Expr> {
        let mark = self.mark();
        match self.expression() {
            Some(expr) => Some(expr),
            None => {
                self.reset(mark);
                None
            }
        }
    }

    /// `atom`: names, literals, groups and displays.
    fn atom(&mut self) -> Option<Expr> {
        let token = self.fill_token();
        match token.kind {
            TokenKind::Name => {
                self.stream.advance();
                Some(Expr::new(
                    ExprKind::Name {
                        id: self.token_text(&token),
                        ctx: ExprContext::Load,
                    },
                    token.range,
                ))
            }
            TokenKind::True => self.constant_atom(adder_ir::ConstantValue::Bool(true)),
            TokenKind::False => self.constant_atom(adder_ir::ConstantValue::Bool(false)),
            TokenKind::None => self.constant_atom(adder_ir::ConstantValue::None),
            TokenKind::Ellipsis => self.constant_atom(adder_ir::ConstantValue::Ellipsis),
            TokenKind::Number => self.number_token(),
            TokenKind::Str | TokenKind::FStringStart => self.strings(),
            TokenKind::LPar => self.group_or_tuple(),
            TokenKind::LSqb => self.list_display(),
            _ => None,
        }
    }

    fn constant_atom(&mut self, value: adder_ir::ConstantValue) -> Option<Expr> {
        let token = self.fill_token();
        self.stream.advance();
        Some(Expr::new(
            ExprKind::Constant { value, kind: None },
            token.range,
        ))
    }

    /// `'(' ')' | '(' star_named_expression (',' ...)* [','] ')'`
    fn group_or_tuple(&mut self) -> Option<Expr> {
        let mark = self.mark();
        let open = self.expect(TokenKind::LPar)?;
        if let Some(close) = self.expect(TokenKind::RPar) {
            return Some(Expr::new(
                ExprKind::Tuple {
                    elts: Vec::new(),
                    ctx: ExprContext::Load,
                },
                open.range.with_end(close.range),
            ));
        }
        let (elts, saw_comma) = match self.star_named_expression_list() {
            Some(parsed) => parsed,
            None => {
                self.reset(mark);
                return None;
            }
        };
        let close = match self.expect(TokenKind::RPar) {
            Some(close) => close,
            None => {
                self.reset(mark);
                return None;
            }
        };
        if saw_comma || elts.len() != 1 {
            Some(Expr::new(
                ExprKind::Tuple {
                    elts,
                    ctx: ExprContext::Load,
                },
                open.range.with_end(close.range),
            ))
        } else {
            // A parenthesized expression keeps the inner node and range.
            elts.into_iter().next()
        }
    }

    /// `'[' [star_named_expressions] ']'`
    fn list_display(&mut self) -> Option<Expr> {
        let mark = self.mark();
        let open = self.expect(TokenKind::LSqb)?;
        let (elts, _) = if self.peek_kind() == TokenKind::RSqb {
            (Vec::new(), false)
        } else {
            match self.star_named_expression_list() {
                Some(parsed) => parsed,
                None => {
                    self.reset(mark);
                    return None;
                }
            }
        };
        let close = match self.expect(TokenKind::RSqb) {
            Some(close) => close,
            None => {
                self.reset(mark);
                return None;
            }
        };
        Some(Expr::new(
            ExprKind::List {
                elts,
                ctx: ExprContext::Load,
            },
            open.range.with_end(close.range),
        ))
    }

    fn star_named_expression_list(&mut self) -> Option<(Vec<Expr>, bool)> {
        let first = self.star_named_expression()?;
        let mut elts = vec![first];
        let mut saw_comma = false;
        loop {
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
            saw_comma = true;
            let after_comma = self.mark();
            match self.star_named_expression() {
                Some(expr) => elts.push(expr),
                None => {
                    self.reset(after_comma);
                    break;
                }
            }
        }
        Some((elts, saw_comma))
    }

    /// `star_named_expression: '*' bitwise_or | named_expression`
    fn star_named_expression(&mut self) -> Option<Expr> {
        let mark = self.mark();
        if let Some(star) = self.expect(TokenKind::Star) {
            if let Some(value) = self.bitwise_or() {
                let range = star.range.with_end(value.range);
                return Some(Expr::new(
                    ExprKind::Starred {
                        value: Box::new(value),
                        ctx: ExprContext::Load,
                    },
                    range,
                ));
            }
            self.reset(mark);
            return None;
        }
        self.named_expression()
    }

    // ── Target grammar ──────────────────────────────────────────────────

    /// `star_targets: star_target (',' star_target)* [',']`
    pub(crate) fn star_targets(&mut self) -> Option<Expr> {
        let first = self.star_target()?;
        let mut elts = vec![first];
        let mut is_tuple = false;
        loop {
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
            is_tuple = true;
            let after_comma = self.mark();
            match self.star_target() {
                Some(expr) => elts.push(expr),
                None => {
                    self.reset(after_comma);
                    break;
                }
            }
        }
        if is_tuple {
            let range = elts[0].range.with_end(self.last_consumed_range());
            Some(Expr::new(
                ExprKind::Tuple {
                    elts,
                    ctx: ExprContext::Load,
                },
                range,
            ))
        } else {
            elts.pop()
        }
    }

    /// `star_target: '*' star_target | target_atom`
    pub(crate) fn star_target(&mut self) -> Option<Expr> {
        let mark = self.mark();
        if let Some(star) = self.expect(TokenKind::Star) {
            if let Some(inner) = self.star_target() {
                let range = star.range.with_end(inner.range);
                return Some(Expr::new(
                    ExprKind::Starred {
                        value: Box::new(inner),
                        ctx: ExprContext::Load,
                    },
                    range,
                ));
            }
            self.reset(mark);
            return None;
        }
        self.target_atom()
    }

    /// A target's base: a name or a bracketed target list, then postfix
    /// chains. Whether the final shape is assignable is checked by the
    /// caller's invalid-target analysis, not here.
    fn target_atom(&mut self) -> Option<Expr> {
        let mark = self.mark();
        let base = match self.peek_kind() {
            TokenKind::Name => {
                let token = self.fill_token();
                self.stream.advance();
                Expr::new(
                    ExprKind::Name {
                        id: self.token_text(&token),
                        ctx: ExprContext::Load,
                    },
                    token.range,
                )
            }
            TokenKind::LPar => {
                let open = self.expect(TokenKind::LPar)?;
                let inner = self.star_targets();
                let close = match self.expect(TokenKind::RPar) {
                    Some(close) => close,
                    None => {
                        self.reset(mark);
                        return None;
                    }
                };
                match inner {
                    Some(expr) => expr,
                    None => Expr::new(
                        ExprKind::Tuple {
                            elts: Vec::new(),
                            ctx: ExprContext::Load,
                        },
                        open.range.with_end(close.range),
                    ),
                }
            }
            TokenKind::LSqb => {
                let open = self.expect(TokenKind::LSqb)?;
                let mut elts = Vec::new();
                if self.peek_kind() != TokenKind::RSqb {
                    let first = match self.star_target() {
                        Some(expr) => expr,
                        None => {
                            self.reset(mark);
                            return None;
                        }
                    };
                    elts.push(first);
                    loop {
                        let comma_mark = self.mark();
                        if self.expect(TokenKind::Comma).is_none() {
                            break;
                        }
                        match self.star_target() {
                            Some(expr) => elts.push(expr),
                            None => {
                                self.reset(comma_mark);
                                let _ = self.expect(TokenKind::Comma);
                                break;
                            }
                        }
                    }
                }
                let close = match self.expect(TokenKind::RSqb) {
                    Some(close) => close,
                    None => {
                        self.reset(mark);
                        return None;
                    }
                };
                Expr::new(
                    ExprKind::List {
                        elts,
                        ctx: ExprContext::Load,
                    },
                    open.range.with_end(close.range),
                )
            }
            _ => return None,
        };
        self.postfix_chain(base)
    }

    /// A plain name expression in load context.
    pub fn name_token(&mut self) -> Option<Expr> {
        let token = self.expect(TokenKind::Name)?;
        Some(Expr::new(
            ExprKind::Name {
                id: self.token_text(&token),
                ctx: ExprContext::Load,
            },
            token.range,
        ))
    }

    /// The not-equal token spelled per the Barry-as-BDFL flag.
    pub fn not_equal_token(&mut self) -> Option<Token> {
        let token = self.expect(TokenKind::NotEqual)?;
        if self.check_barry_as_flufl(&token) {
            return None;
        }
        Some(token)
    }
}
