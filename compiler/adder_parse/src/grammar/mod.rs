//! Grammar rules.
//!
//! Hand-written productions following the engine's rule protocol: read the
//! mark, try the body, reset on failure so sibling alternatives see an
//! unconsumed cursor, and memoize the expression spine. Alternatives that
//! exist only to report specific malformed constructs live in `invalid`
//! and run only during the diagnostic pass.

mod expr;
mod invalid;
mod stmt;

pub(crate) use invalid::TargetsType;

use adder_ir::{ModTy, SourceRange, Stmt, StmtKind, TokenKind};

use crate::Parser;

/// Stable rule identifiers for the memoized productions.
pub(crate) mod rules {
    use crate::memo::RuleId;

    pub const EXPRESSION: RuleId = RuleId(1);
    pub const DISJUNCTION: RuleId = RuleId(2);
    pub const CONJUNCTION: RuleId = RuleId(3);
    pub const INVERSION: RuleId = RuleId(4);
    pub const COMPARISON: RuleId = RuleId(5);
    pub const BITWISE_OR: RuleId = RuleId(6);
    pub const BITWISE_XOR: RuleId = RuleId(7);
    pub const BITWISE_AND: RuleId = RuleId(8);
    pub const SHIFT: RuleId = RuleId(9);
    pub const SUM: RuleId = RuleId(10);
    pub const TERM: RuleId = RuleId(11);
    pub const FACTOR: RuleId = RuleId(12);
    pub const POWER: RuleId = RuleId(13);
    pub const PRIMARY: RuleId = RuleId(14);
    pub const STRINGS: RuleId = RuleId(15);
}

impl<'e> Parser<'e> {
    /// `file: [statements] ENDMARKER`
    pub(crate) fn file_rule(&mut self) -> Option<ModTy> {
        let mark = self.mark();
        let body = match self.statements() {
            Some(body) => body,
            None => {
                if self.error_indicator {
                    return None;
                }
                self.reset(mark);
                Vec::new()
            }
        };
        if self.error_indicator {
            return None;
        }
        let end = self.expect(TokenKind::Endmarker)?;
        let range = body
            .first()
            .map(|s: &Stmt| s.range.with_end(body[body.len() - 1].range))
            .unwrap_or(end.range);
        Some(ModTy::Module {
            body,
            type_ignores: self.stream.take_type_ignores(),
            range,
        })
    }

    /// `interactive: statement_newline`
    pub(crate) fn interactive_rule(&mut self) -> Option<ModTy> {
        let body = self.statement_newline()?;
        let range = body
            .first()
            .map(|s| s.range.with_end(body[body.len() - 1].range))
            .unwrap_or(SourceRange::ARTIFICIAL);
        Some(ModTy::Interactive { body, range })
    }

    /// `eval: expressions NEWLINE* ENDMARKER`
    pub(crate) fn eval_rule(&mut self) -> Option<ModTy> {
        let body = self.expressions()?;
        if self.error_indicator {
            return None;
        }
        while self.expect(TokenKind::Newline).is_some() {}
        self.expect(TokenKind::Endmarker)?;
        let range = body.range;
        Some(ModTy::Expression {
            body: Box::new(body),
            range,
        })
    }

    /// `statements: statement+`
    pub(crate) fn statements(&mut self) -> Option<Vec<Stmt>> {
        let mut result = self.statement()?;
        loop {
            let mark = self.mark();
            match self.statement() {
                Some(mut more) => result.append(&mut more),
                None => {
                    self.reset(mark);
                    break;
                }
            }
        }
        Some(result)
    }

    /// `statement: compound_stmt | simple_stmts`
    pub(crate) fn statement(&mut self) -> Option<Vec<Stmt>> {
        if self.error_indicator {
            return None;
        }
        let mark = self.mark();
        if let Some(stmt) = self.compound_stmt() {
            return Some(vec![stmt]);
        }
        if self.error_indicator {
            return None;
        }
        self.reset(mark);
        if let Some(stmts) = self.simple_stmts() {
            return Some(stmts);
        }
        self.reset(mark);
        None
    }

    /// `statement_newline: compound_stmt NEWLINE | simple_stmts | NEWLINE | ENDMARKER`
    ///
    /// The `ENDMARKER` alternative is the interactive-exit path: it fails
    /// the rule so the embedder can end the REPL loop.
    pub(crate) fn statement_newline(&mut self) -> Option<Vec<Stmt>> {
        if self.error_indicator {
            return None;
        }
        let mark = self.mark();
        if let Some(stmt) = self.compound_stmt() {
            if self.expect(TokenKind::Newline).is_some() {
                return Some(vec![stmt]);
            }
        }
        if self.error_indicator {
            return None;
        }
        self.reset(mark);
        if let Some(stmts) = self.simple_stmts() {
            return Some(stmts);
        }
        if self.error_indicator {
            return None;
        }
        self.reset(mark);
        if let Some(newline) = self.expect(TokenKind::Newline) {
            return Some(vec![Stmt::new(StmtKind::Pass, newline.range)]);
        }
        // End of interactive input: fail without a diagnostic.
        self.reset(mark);
        None
    }
}
