//! Statement productions.

use adder_ir::{set_context, Arg, Arguments, Expr, ExprContext, Stmt, StmtKind, TokenKind};

use super::TargetsType;
use crate::Parser;

impl<'e> Parser<'e> {
    /// `compound_stmt: function_def | if_stmt | while_stmt | for_stmt`
    pub(crate) fn compound_stmt(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::Def => self.function_def(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::For => self.for_stmt(),
            _ => None,
        }
    }

    /// `simple_stmts: simple_stmt (';' simple_stmt)* [';'] NEWLINE`
    pub(crate) fn simple_stmts(&mut self) -> Option<Vec<Stmt>> {
        let mark = self.mark();
        let first = self.simple_stmt()?;
        let mut stmts = vec![first];
        loop {
            let before_semi = self.mark();
            if self.expect(TokenKind::Semi).is_none() {
                break;
            }
            match self.simple_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => {
                    if self.error_indicator {
                        return None;
                    }
                    // Trailing semicolon: keep it consumed.
                    self.reset(before_semi);
                    let _ = self.expect(TokenKind::Semi);
                    break;
                }
            }
        }
        if self.expect(TokenKind::Newline).is_none() {
            if self.error_indicator {
                return None;
            }
            self.reset(mark);
            return None;
        }
        Some(stmts)
    }

    /// One small statement.
    pub(crate) fn simple_stmt(&mut self) -> Option<Stmt> {
        if self.error_indicator {
            return None;
        }
        let mark = self.mark();
        match self.peek_kind() {
            TokenKind::Return => return self.return_stmt(),
            TokenKind::Del => return self.del_stmt(),
            TokenKind::Global => return self.name_list_stmt(TokenKind::Global),
            TokenKind::Nonlocal => return self.name_list_stmt(TokenKind::Nonlocal),
            TokenKind::Pass => {
                let token = self.expect(TokenKind::Pass)?;
                return Some(Stmt::new(StmtKind::Pass, token.range));
            }
            TokenKind::Break => {
                let token = self.expect(TokenKind::Break)?;
                return Some(Stmt::new(StmtKind::Break, token.range));
            }
            TokenKind::Continue => {
                let token = self.expect(TokenKind::Continue)?;
                return Some(Stmt::new(StmtKind::Continue, token.range));
            }
            _ => {}
        }
        if let Some(stmt) = self.assignment() {
            return Some(stmt);
        }
        if self.error_indicator {
            return None;
        }
        self.reset(mark);
        if let Some(value) = self.star_expressions() {
            let range = value.range;
            return Some(Stmt::new(
                StmtKind::ExprStmt {
                    value: Box::new(value),
                },
                range,
            ));
        }
        self.reset(mark);
        None
    }

    /// `assignment: (star_targets '=')+ star_expressions !'='`
    ///
    /// The diagnostic pass adds the invalid-target alternative that turns
    /// `1 = x` into "cannot assign to literal".
    pub(crate) fn assignment(&mut self) -> Option<Stmt> {
        let mark = self.mark();
        let mut targets: Vec<Expr> = Vec::new();
        loop {
            let pair_mark = self.mark();
            let candidate = match self.star_targets() {
                Some(expr) => expr,
                None => {
                    self.reset(pair_mark);
                    break;
                }
            };
            if self.expect(TokenKind::Equal).is_none() {
                self.reset(pair_mark);
                break;
            }
            targets.push(candidate);
        }
        if !targets.is_empty() {
            if let Some(value) = self.star_expressions() {
                if self.error_indicator {
                    return None;
                }
                // A further '=' means the value was itself meant as a
                // target that the target grammar rejected.
                if self.lookahead(false, TokenKind::Equal) {
                    let mut bad = None;
                    for target in &targets {
                        if let Some(invalid) =
                            super::invalid::invalid_target(target, TargetsType::StarTargets)
                        {
                            bad = Some(invalid.clone());
                            break;
                        }
                    }
                    match bad {
                        None => {
                            let range = targets[0].range.with_end(value.range);
                            let targets = targets
                                .into_iter()
                                .map(|t| set_context(t, ExprContext::Store))
                                .collect();
                            return Some(Stmt::new(
                                StmtKind::Assign {
                                    targets,
                                    value: Box::new(value),
                                },
                                range,
                            ));
                        }
                        Some(invalid) => {
                            if self.call_invalid_rules {
                                return self.raise_syntax_error_known_location(
                                    invalid.range,
                                    &format!("cannot assign to {}", invalid.expr_name()),
                                );
                            }
                        }
                    }
                }
            } else if self.error_indicator {
                return None;
            }
        }
        // Diagnostic-pass alternative: skip the valid `target =` prefix,
        // then a general expression on the left of an '=' names the
        // precise invalid target.
        if self.call_invalid_rules && !self.error_indicator {
            self.reset(mark);
            loop {
                let pair_mark = self.mark();
                if self.star_targets().is_none() || self.expect(TokenKind::Equal).is_none() {
                    self.reset(pair_mark);
                    break;
                }
            }
            if let Some(expr) = self.star_expressions() {
                if self.expect(TokenKind::Equal).is_some() {
                    return self.raise_invalid_target(TargetsType::StarTargets, &expr);
                }
            }
        }
        self.reset(mark);
        None
    }

    /// `return_stmt: 'return' [star_expressions]`
    fn return_stmt(&mut self) -> Option<Stmt> {
        let keyword = self.expect(TokenKind::Return)?;
        let mark = self.mark();
        let value = match self.star_expressions() {
            Some(expr) => Some(Box::new(expr)),
            None => {
                if self.error_indicator {
                    return None;
                }
                self.reset(mark);
                None
            }
        };
        let range = value
            .as_deref()
            .map(|v| keyword.range.with_end(v.range))
            .unwrap_or(keyword.range);
        Some(Stmt::new(StmtKind::Return { value }, range))
    }

    /// `del_stmt: 'del' del_targets &(';' | NEWLINE)`
    ///
    /// The diagnostic pass re-parses the targets as a general expression
    /// to name the offender ("cannot delete comparison" and friends).
    fn del_stmt(&mut self) -> Option<Stmt> {
        let mark = self.mark();
        let keyword = self.expect(TokenKind::Del)?;
        let after_keyword = self.mark();

        if let Some(targets) = self.del_target_list() {
            let ends_cleanly = self.lookahead(true, TokenKind::Semi)
                || self.lookahead(true, TokenKind::Newline);
            if ends_cleanly {
                let mut offender = None;
                for target in &targets {
                    if let Some(invalid) =
                        super::invalid::invalid_target(target, TargetsType::DelTargets)
                    {
                        offender = Some(invalid.clone());
                        break;
                    }
                }
                match offender {
                    None => {
                        let end = targets.last().map(|t| t.range).unwrap_or(keyword.range);
                        let targets = targets
                            .into_iter()
                            .map(|t| set_context(t, ExprContext::Del))
                            .collect();
                        return Some(Stmt::new(
                            StmtKind::Delete { targets },
                            keyword.range.with_end(end),
                        ));
                    }
                    Some(invalid) => {
                        if self.call_invalid_rules {
                            return self.raise_syntax_error_known_location(
                                invalid.range,
                                &format!("cannot delete {}", invalid.expr_name()),
                            );
                        }
                    }
                }
            }
        }
        if self.error_indicator {
            return None;
        }
        if self.call_invalid_rules {
            self.reset(after_keyword);
            if let Some(expr) = self.star_expressions() {
                return self.raise_invalid_target(TargetsType::DelTargets, &expr);
            }
            return self.raise_syntax_error("invalid syntax");
        }
        self.reset(mark);
        None
    }

    fn del_target_list(&mut self) -> Option<Vec<Expr>> {
        let first = self.star_target()?;
        let mut targets = vec![first];
        loop {
            let mark = self.mark();
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
            match self.star_target() {
                Some(expr) => targets.push(expr),
                None => {
                    self.reset(mark);
                    break;
                }
            }
        }
        Some(targets)
    }

    /// `global_stmt` / `nonlocal_stmt`: keyword plus a name list.
    fn name_list_stmt(&mut self, keyword_kind: TokenKind) -> Option<Stmt> {
        let keyword = self.expect(keyword_kind)?;
        let first = self.expect(TokenKind::Name)?;
        let mut names = vec![self.token_text(&first)];
        let mut end = first.range;
        loop {
            let mark = self.mark();
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
            match self.expect(TokenKind::Name) {
                Some(name) => {
                    names.push(self.token_text(&name));
                    end = name.range;
                }
                None => {
                    self.reset(mark);
                    break;
                }
            }
        }
        let range = keyword.range.with_end(end);
        let kind = if keyword_kind == TokenKind::Global {
            StmtKind::Global { names }
        } else {
            StmtKind::Nonlocal { names }
        };
        Some(Stmt::new(kind, range))
    }

    /// `function_def: 'def' NAME '(' [parameters] ')' ['->' expression] &&':' block`
    fn function_def(&mut self) -> Option<Stmt> {
        let mark = self.mark();
        let keyword = self.expect(TokenKind::Def)?;
        let name_token = match self.expect(TokenKind::Name) {
            Some(token) => token,
            None => {
                if self.call_invalid_rules {
                    return self.raise_syntax_error("invalid syntax");
                }
                self.reset(mark);
                return None;
            }
        };
        if self.expect(TokenKind::LPar).is_none() {
            if self.call_invalid_rules {
                return self.raise_syntax_error("expected '('");
            }
            self.reset(mark);
            return None;
        }
        let params = match self.parameters() {
            Some(params) => params,
            None => {
                if self.call_invalid_rules && !self.error_indicator {
                    return self.invalid_parameters();
                }
                self.reset(mark);
                return None;
            }
        };
        if self.expect(TokenKind::RPar).is_none() {
            if self.call_invalid_rules && !self.error_indicator {
                return self.invalid_parameters();
            }
            self.reset(mark);
            return None;
        }
        let returns = if self.expect(TokenKind::RArrow).is_some() {
            match self.expression() {
                Some(expr) => Some(Box::new(expr)),
                None => {
                    if self.call_invalid_rules && !self.error_indicator {
                        return self.raise_syntax_error("expected expression after '->'");
                    }
                    self.reset(mark);
                    return None;
                }
            }
        } else {
            None
        };
        self.expect_forced(TokenKind::Colon, ":")?;
        let body = self.block()?;
        let end = body.last().map(|s| s.range).unwrap_or(keyword.range);
        Some(Stmt::new(
            StmtKind::FunctionDef {
                name: self.token_text(&name_token),
                params,
                body,
                returns,
            },
            keyword.range.with_end(end),
        ))
    }

    /// `parameters`: plain parameters with optional defaults, then `*args`
    /// and `**kwargs`. Stops (successfully) at the first token that cannot
    /// continue the list; the caller's `')'` check decides whether that
    /// was the end or a malformed list.
    fn parameters(&mut self) -> Option<Arguments> {
        let mut params = Arguments::default();
        let mut seen_default = false;
        loop {
            match self.peek_kind() {
                TokenKind::Star => {
                    let mark = self.mark();
                    let _ = self.expect(TokenKind::Star);
                    if params.vararg.is_some() || params.kwarg.is_some() {
                        self.reset(mark);
                        return None;
                    }
                    params.vararg = Some(self.param()?);
                }
                TokenKind::DoubleStar => {
                    let mark = self.mark();
                    let _ = self.expect(TokenKind::DoubleStar);
                    if params.kwarg.is_some() {
                        self.reset(mark);
                        return None;
                    }
                    params.kwarg = Some(self.param()?);
                }
                TokenKind::Name => {
                    let param = self.param()?;
                    if self.expect(TokenKind::Equal).is_some() {
                        let default = match self.expression() {
                            Some(expr) => expr,
                            None => return None,
                        };
                        seen_default = true;
                        params.defaults.push(default);
                    } else if seen_default && params.vararg.is_none() {
                        if self.call_invalid_rules {
                            return self.raise_syntax_error_known_location(
                                param.range,
                                "parameter without a default follows parameter with a default",
                            );
                        }
                        return None;
                    }
                    params.args.push(param);
                }
                _ => break,
            }
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
        }
        Some(params)
    }

    /// `param: NAME [':' expression]`
    fn param(&mut self) -> Option<Arg> {
        let name = self.expect(TokenKind::Name)?;
        let mut range = name.range;
        let annotation = if self.expect(TokenKind::Colon).is_some() {
            let expr = self.expression()?;
            range = range.with_end(expr.range);
            Some(expr)
        } else {
            None
        };
        Some(Arg {
            arg: self.token_text(&name),
            annotation,
            range,
        })
    }

    /// `if_stmt: 'if' named_expression &&':' block [elif/else]`
    fn if_stmt(&mut self) -> Option<Stmt> {
        let mark = self.mark();
        let keyword = self.expect(TokenKind::If)?;
        let test = match self.named_expression() {
            Some(expr) => expr,
            None => {
                if self.call_invalid_rules && !self.error_indicator {
                    return self.raise_syntax_error("invalid syntax");
                }
                self.reset(mark);
                return None;
            }
        };
        self.expect_forced(TokenKind::Colon, ":")?;
        let body = self.block()?;
        let orelse = self.elif_or_else()?;
        let end = orelse
            .last()
            .or(body.last())
            .map(|s| s.range)
            .unwrap_or(keyword.range);
        Some(Stmt::new(
            StmtKind::If {
                test: Box::new(test),
                body,
                orelse,
            },
            keyword.range.with_end(end),
        ))
    }

    fn elif_or_else(&mut self) -> Option<Vec<Stmt>> {
        if let Some(keyword) = self.expect(TokenKind::Elif) {
            let test = match self.named_expression() {
                Some(expr) => expr,
                None => {
                    if self.call_invalid_rules && !self.error_indicator {
                        return self.raise_syntax_error("invalid syntax");
                    }
                    return None;
                }
            };
            self.expect_forced(TokenKind::Colon, ":")?;
            let body = self.block()?;
            let orelse = self.elif_or_else()?;
            let end = orelse
                .last()
                .or(body.last())
                .map(|s| s.range)
                .unwrap_or(keyword.range);
            return Some(vec![Stmt::new(
                StmtKind::If {
                    test: Box::new(test),
                    body,
                    orelse,
                },
                keyword.range.with_end(end),
            )]);
        }
        if self.expect(TokenKind::Else).is_some() {
            self.expect_forced(TokenKind::Colon, ":")?;
            return self.block();
        }
        Some(Vec::new())
    }

    /// `while_stmt: 'while' named_expression &&':' block ['else' ':' block]`
    fn while_stmt(&mut self) -> Option<Stmt> {
        let mark = self.mark();
        let keyword = self.expect(TokenKind::While)?;
        let test = match self.named_expression() {
            Some(expr) => expr,
            None => {
                if self.call_invalid_rules && !self.error_indicator {
                    return self.raise_syntax_error("invalid syntax");
                }
                self.reset(mark);
                return None;
            }
        };
        self.expect_forced(TokenKind::Colon, ":")?;
        let body = self.block()?;
        let orelse = if self.expect(TokenKind::Else).is_some() {
            self.expect_forced(TokenKind::Colon, ":")?;
            self.block()?
        } else {
            Vec::new()
        };
        let end = orelse
            .last()
            .or(body.last())
            .map(|s| s.range)
            .unwrap_or(keyword.range);
        Some(Stmt::new(
            StmtKind::While {
                test: Box::new(test),
                body,
                orelse,
            },
            keyword.range.with_end(end),
        ))
    }

    /// `for_stmt: 'for' star_targets 'in' star_expressions &&':' block ['else' ':' block]`
    fn for_stmt(&mut self) -> Option<Stmt> {
        let mark = self.mark();
        let keyword = self.expect(TokenKind::For)?;
        let target = match self.star_targets() {
            Some(expr) => expr,
            None => {
                if self.call_invalid_rules && !self.error_indicator {
                    if let Some(expr) = self.star_expressions() {
                        return self.raise_invalid_target(TargetsType::ForTargets, &expr);
                    }
                    return self.raise_syntax_error("invalid syntax");
                }
                self.reset(mark);
                return None;
            }
        };
        if let Some(invalid) = super::invalid::invalid_target(&target, TargetsType::ForTargets) {
            if self.call_invalid_rules {
                let invalid = invalid.clone();
                return self.raise_syntax_error_known_location(
                    invalid.range,
                    &format!("cannot assign to {}", invalid.expr_name()),
                );
            }
            self.reset(mark);
            return None;
        }
        if self.expect(TokenKind::In).is_none() {
            if self.call_invalid_rules && !self.error_indicator {
                return self.raise_syntax_error("expected 'in'");
            }
            self.reset(mark);
            return None;
        }
        let iter = match self.star_expressions() {
            Some(expr) => expr,
            None => {
                if self.call_invalid_rules && !self.error_indicator {
                    return self.raise_syntax_error("invalid syntax");
                }
                self.reset(mark);
                return None;
            }
        };
        self.expect_forced(TokenKind::Colon, ":")?;
        let body = self.block()?;
        let orelse = if self.expect(TokenKind::Else).is_some() {
            self.expect_forced(TokenKind::Colon, ":")?;
            self.block()?
        } else {
            Vec::new()
        };
        let target = set_context(target, ExprContext::Store);
        let end = orelse
            .last()
            .or(body.last())
            .map(|s| s.range)
            .unwrap_or(keyword.range);
        Some(Stmt::new(
            StmtKind::For {
                target: Box::new(target),
                iter: Box::new(iter),
                body,
                orelse,
            },
            keyword.range.with_end(end),
        ))
    }

    /// `block: NEWLINE INDENT statements DEDENT | simple_stmts`
    pub(crate) fn block(&mut self) -> Option<Vec<Stmt>> {
        if self.error_indicator {
            return None;
        }
        let mark = self.mark();
        if self.expect(TokenKind::Newline).is_some() {
            if self.expect(TokenKind::Indent).is_some() {
                let stmts = self.statements()?;
                if self.expect(TokenKind::Dedent).is_none() {
                    if self.error_indicator {
                        return None;
                    }
                    self.reset(mark);
                    return None;
                }
                return Some(stmts);
            }
            if self.call_invalid_rules && !self.error_indicator {
                return self.raise_indentation_error("expected an indented block");
            }
            self.reset(mark);
            return None;
        }
        if let Some(stmts) = self.simple_stmts() {
            return Some(stmts);
        }
        if self.error_indicator {
            return None;
        }
        self.reset(mark);
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use crate::{parse, InputType, ParserFlags, DEFAULT_FEATURE_VERSION};
    use adder_diagnostic::DiagnosticCollector;
    use adder_ir::{ExprContext, ExprKind, ModTy, StmtKind};

    fn parse_module(source: &str) -> (Option<ModTy>, DiagnosticCollector) {
        let sink = DiagnosticCollector::new();
        let result = parse(
            source,
            InputType::Module,
            &sink,
            ParserFlags::empty(),
            DEFAULT_FEATURE_VERSION,
        );
        (result, sink)
    }

    fn module_body(m: ModTy) -> Vec<adder_ir::Stmt> {
        match m {
            ModTy::Module { body, .. } => body,
            other => panic!("expected module, got {other:?}"),
        }
    }

    #[test]
    fn parses_pass() {
        let (result, sink) = parse_module("pass\n");
        assert!(!sink.has_errors());
        let body = module_body(result.expect("parse"));
        assert!(matches!(body[0].kind, StmtKind::Pass));
    }

    #[test]
    fn parses_assignment_with_store_context() {
        let (result, sink) = parse_module("x = 1\n");
        assert!(!sink.has_errors());
        let body = module_body(result.expect("parse"));
        let StmtKind::Assign { targets, value } = &body[0].kind else {
            panic!("expected assignment");
        };
        assert!(matches!(
            &targets[0].kind,
            ExprKind::Name {
                ctx: ExprContext::Store,
                ..
            }
        ));
        assert!(matches!(
            value.kind,
            ExprKind::Constant {
                value: adder_ir::ConstantValue::Int(1),
                ..
            }
        ));
    }

    #[test]
    fn parses_chained_assignment() {
        let (result, _) = parse_module("a = b = 1\n");
        let body = module_body(result.expect("parse"));
        let StmtKind::Assign { targets, .. } = &body[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn parses_tuple_unpacking() {
        let (result, _) = parse_module("a, b = 1, 2\n");
        let body = module_body(result.expect("parse"));
        let StmtKind::Assign { targets, .. } = &body[0].kind else {
            panic!("expected assignment");
        };
        let ExprKind::Tuple { elts, ctx } = &targets[0].kind else {
            panic!("expected tuple target");
        };
        assert_eq!(*ctx, ExprContext::Store);
        assert_eq!(elts.len(), 2);
        assert!(elts
            .iter()
            .all(|e| matches!(&e.kind, ExprKind::Name { ctx: ExprContext::Store, .. })));
    }

    #[test]
    fn parses_function_def() {
        let (result, sink) = parse_module("def f(a, b=1, *args, **kw):\n    return a\n");
        assert!(!sink.has_errors(), "{:?}", sink.errors());
        let body = module_body(result.expect("parse"));
        let StmtKind::FunctionDef { name, params, body, .. } = &body[0].kind else {
            panic!("expected function");
        };
        assert_eq!(name, "f");
        assert_eq!(params.args.len(), 2);
        assert_eq!(params.defaults.len(), 1);
        assert!(params.vararg.is_some());
        assert!(params.kwarg.is_some());
        assert!(matches!(body[0].kind, StmtKind::Return { .. }));
    }

    #[test]
    fn parses_annotated_params_and_return_type() {
        let (result, sink) = parse_module("def f(a: int) -> str:\n    pass\n");
        assert!(!sink.has_errors(), "{:?}", sink.errors());
        let body = module_body(result.expect("parse"));
        let StmtKind::FunctionDef { params, returns, .. } = &body[0].kind else {
            panic!("expected function");
        };
        assert!(params.args[0].annotation.is_some());
        assert!(returns.is_some());
    }

    #[test]
    fn parses_if_elif_else() {
        let (result, sink) =
            parse_module("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        assert!(!sink.has_errors(), "{:?}", sink.errors());
        let body = module_body(result.expect("parse"));
        let StmtKind::If { orelse, .. } = &body[0].kind else {
            panic!("expected if");
        };
        let StmtKind::If { orelse: inner, .. } = &orelse[0].kind else {
            panic!("expected elif as nested if");
        };
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn parses_while_and_for() {
        let (result, sink) = parse_module("while x:\n    break\nfor i in xs:\n    continue\n");
        assert!(!sink.has_errors(), "{:?}", sink.errors());
        let body = module_body(result.expect("parse"));
        assert!(matches!(body[0].kind, StmtKind::While { .. }));
        let StmtKind::For { target, .. } = &body[1].kind else {
            panic!("expected for");
        };
        assert!(matches!(
            target.kind,
            ExprKind::Name {
                ctx: ExprContext::Store,
                ..
            }
        ));
    }

    #[test]
    fn parses_del_with_del_context() {
        let (result, sink) = parse_module("del a, b\n");
        assert!(!sink.has_errors());
        let body = module_body(result.expect("parse"));
        let StmtKind::Delete { targets } = &body[0].kind else {
            panic!("expected delete");
        };
        assert_eq!(targets.len(), 2);
        assert!(targets
            .iter()
            .all(|t| matches!(&t.kind, ExprKind::Name { ctx: ExprContext::Del, .. })));
    }

    #[test]
    fn parses_semicolon_separated_stmts() {
        let (result, sink) = parse_module("x = 1; y = 2;\n");
        assert!(!sink.has_errors());
        let body = module_body(result.expect("parse"));
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn parses_global_and_nonlocal() {
        let (result, sink) = parse_module("global a, b\n");
        assert!(!sink.has_errors());
        let body = module_body(result.expect("parse"));
        let StmtKind::Global { names } = &body[0].kind else {
            panic!("expected global");
        };
        assert_eq!(names, &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn non_default_after_default_fails() {
        let (result, sink) = parse_module("def f(a=1, b):\n    pass\n");
        assert!(result.is_none());
        assert!(sink.has_errors());
        assert!(sink.errors().iter().any(|d| d
            .message
            .contains("parameter without a default follows parameter with a default")));
    }
}
