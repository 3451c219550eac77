//! Backtracking PEG parser engine for Adder source.
//!
//! The engine owns a buffered token stream with mark/reset checkpoints, a
//! per-rule memoization cache, and a two-pass driver: an optimistic pass
//! that takes the grammar's fastest valid path, and a diagnostic re-parse
//! (invalid-only alternatives enabled) that localizes the failure when the
//! first pass does not produce a clean result. Literal decoding (numbers,
//! string/bytes escapes, f-string assembly and concatenation folding)
//! lives in [`literal`] and reports through the diagnostic channel.
//!
//! One parser instance processes exactly one source unit start-to-finish
//! and must not be shared across concurrent invocations; create a fresh
//! instance per source unit.

mod grammar;
mod keywords;
mod literal;
mod memo;
mod stream;

pub use literal::UnicodeNameSource;
pub use memo::{RuleCache, RuleId};
pub use stream::TokenStream;

use adder_diagnostic::{ErrorAction, ErrorCallback, ErrorType};
use adder_ir::{Expr, ModTy, SourceRange, Token, TokenKind};
use adder_lexer::{LexerFlags, StatusCode, Tokenizer};
use bitflags::bitflags;

/// Requested input mode for one parse.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum InputType {
    /// A whole module.
    Module,
    /// One interactive statement.
    Single,
    /// A bare expression.
    Eval,
}

bitflags! {
    /// Parse entry-point flag set.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct ParserFlags: u8 {
        /// `<>` replaces `!=`.
        const BARRY_AS_BDFL = 1 << 0;
        /// Recognize `# type:` comments.
        const TYPE_COMMENTS = 1 << 1;
        /// The single-statement input comes from an interactive terminal.
        const INTERACTIVE_TERMINAL = 1 << 2;
    }
}

/// The default language feature version, used when callers have no
/// version gate of their own.
pub const DEFAULT_FEATURE_VERSION: u32 = 12;

const BARRY_MSG: &str = "with Barry as BDFL, use '<>' instead of '!='";

/// The parser: token stream, memo cache, error state, and driver.
pub struct Parser<'e> {
    pub(crate) stream: TokenStream<'e>,
    pub(crate) cache: RuleCache<Expr>,
    errors: &'e dyn ErrorCallback,
    start_rule: InputType,
    pub(crate) flags: ParserFlags,
    pub(crate) feature_version: u32,
    /// Invalid-only grammar alternatives run only in the diagnostic pass.
    pub(crate) call_invalid_rules: bool,
    /// Sticky: a diagnostic was raised; backtracking must not mask it.
    pub(crate) error_indicator: bool,
    /// The diagnostic channel asked to stop.
    halted: bool,
    /// Resolver for `\N{NAME}` escapes beyond the control-character table.
    pub(crate) unicode_names: Option<&'e dyn UnicodeNameSource>,
}

impl<'e> Parser<'e> {
    pub fn new(
        source: &str,
        errors: &'e dyn ErrorCallback,
        start_rule: InputType,
        flags: ParserFlags,
        feature_version: u32,
    ) -> Self {
        let mut lexer_flags = LexerFlags::empty();
        if start_rule == InputType::Module {
            lexer_flags |= LexerFlags::EXEC_INPUT;
        } else if start_rule == InputType::Single
            && flags.contains(ParserFlags::INTERACTIVE_TERMINAL)
        {
            lexer_flags |= LexerFlags::INTERACTIVE;
        }
        if flags.contains(ParserFlags::TYPE_COMMENTS) {
            lexer_flags |= LexerFlags::TYPE_COMMENT;
        }
        let tokenizer = Tokenizer::new(source, errors, lexer_flags);
        Parser {
            stream: TokenStream::new(tokenizer, start_rule == InputType::Single),
            cache: RuleCache::new(),
            errors,
            start_rule,
            flags,
            feature_version,
            call_invalid_rules: false,
            error_indicator: false,
            halted: false,
            unicode_names: None,
        }
    }

    /// Install a Unicode name database for `\N{NAME}` escapes. The
    /// built-in control-character name table is always consulted first.
    #[must_use]
    pub fn with_unicode_name_source(mut self, source: &'e dyn UnicodeNameSource) -> Self {
        self.unicode_names = Some(source);
        self
    }

    // ── Two-pass driver ─────────────────────────────────────────────────

    /// Run the parse to completion.
    ///
    /// Optimistic pass first; on failure (or a sticky error) the parser
    /// state is reset, invalid-only alternatives are enabled, and the same
    /// top-level rule re-runs to produce one precise diagnostic. If even
    /// the re-parse raises nothing, the last consumed token is diagnosed
    /// structurally.
    pub fn parse(&mut self) -> Option<ModTy> {
        let result = self.run_start_rule();
        if result.is_none() || self.error_indicator {
            if self.halted {
                return None;
            }
            tracing::debug!("optimistic pass failed; entering diagnostic re-parse");
            self.reset_parser_state();
            let _ = self.run_start_rule();
            if self.error_indicator {
                return None;
            }
            // The re-parse unexpectedly raised nothing: diagnose the last
            // consumed token structurally.
            self.structural_diagnosis();
            return None;
        }
        if self.start_rule == InputType::Single && self.stream.tokenizer().is_bad_single_statement()
        {
            return self
                .raise_syntax_error("multiple statements found while compiling a single statement");
        }
        result
    }

    fn run_start_rule(&mut self) -> Option<ModTy> {
        match self.start_rule {
            InputType::Module => self.file_rule(),
            InputType::Single => self.interactive_rule(),
            InputType::Eval => self.eval_rule(),
        }
    }

    /// Full state reset on entry to the diagnostic pass: cursor to zero,
    /// cache cleared, error flag cleared; already-lexed tokens are reused.
    fn reset_parser_state(&mut self) {
        self.error_indicator = false;
        self.call_invalid_rules = true;
        self.cache.clear();
        self.stream.reset(0);
        self.stream
            .tokenizer_mut()
            .report_incomplete_source_if_interactive = false;
    }

    fn structural_diagnosis(&mut self) {
        let fill = self.stream.fill();
        if fill == 0 {
            let _: Option<()> = self.raise_syntax_error("error at start before reading any input");
            return;
        }
        let last = self.stream.peek_at(fill - 1).clone();
        if last.kind == TokenKind::ErrorToken
            && self.stream.tokenizer().done() == StatusCode::Eof
        {
            if self.stream.tokenizer().bracket_depth() > 0 {
                self.raise_unclosed_parentheses_error();
            } else {
                let _: Option<()> = self.raise_syntax_error("unexpected EOF while parsing");
            }
        } else if last.kind == TokenKind::Indent {
            let _: Option<()> = self.raise_indentation_error("unexpected indent");
        } else if last.kind == TokenKind::Dedent {
            let _: Option<()> = self.raise_indentation_error("unexpected unindent");
        } else {
            let _: Option<()> =
                self.raise_error_known_location(ErrorType::Syntax, last.range, "invalid syntax");
        }
    }

    // ── Rule-invocation protocol ────────────────────────────────────────

    /// Current cursor position; the sole backtracking checkpoint.
    #[inline]
    pub fn mark(&self) -> usize {
        self.stream.mark()
    }

    /// Rewind the cursor to a previously returned mark.
    #[inline]
    pub fn reset(&mut self, pos: usize) {
        self.stream.reset(pos);
    }

    /// The token at the cursor, finalized. Raises the pending tokenizer
    /// diagnostic the first time an error token is touched.
    pub(crate) fn fill_token(&mut self) -> Token {
        let token = self.stream.peek().clone();
        if token.kind == TokenKind::ErrorToken && !self.error_indicator {
            self.tokenizer_error(&token);
        }
        token
    }

    #[inline]
    pub(crate) fn peek_kind(&mut self) -> TokenKind {
        self.fill_token().kind
    }

    pub(crate) fn peek_range(&mut self) -> SourceRange {
        self.stream.peek().range
    }

    /// Range of the most recently consumed token.
    pub(crate) fn last_consumed_range(&self) -> SourceRange {
        let pos = self.stream.mark();
        if pos == 0 {
            SourceRange::ARTIFICIAL
        } else {
            self.stream.peek_at(pos - 1).range
        }
    }

    pub(crate) fn token_text(&self, token: &Token) -> String {
        self.stream.text(token)
    }

    /// Copy of a token's payload codepoints.
    pub(crate) fn token_codepoints(&self, token: &Token) -> Vec<char> {
        let cps = self.stream.tokenizer().code_points();
        let start = (token.start as usize).min(cps.len());
        let end = (token.end as usize).min(cps.len());
        cps[start..end].to_vec()
    }

    /// If the current token has the expected kind, consume and return it;
    /// otherwise leave the cursor untouched. This is the backtracking
    /// primitive: no shared state may be mutated before a match confirms.
    pub fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        let token = self.fill_token();
        if token.kind == kind {
            self.stream.advance();
            return Some(token);
        }
        None
    }

    /// Like [`expect`], matching on exact token text instead of kind.
    pub fn expect_text(&mut self, text: &str) -> Option<Token> {
        let token = self.fill_token();
        if self.token_text(&token) == text {
            self.stream.advance();
            return Some(token);
        }
        None
    }

    /// Committed expectation: a mismatch raises "expected 'x'" instead of
    /// soft-failing. Used after the parse has committed to a construct.
    pub fn expect_forced(&mut self, kind: TokenKind, expected: &str) -> Option<Token> {
        let token = self.fill_token();
        if token.kind != kind {
            return self.raise_error_known_location(
                ErrorType::Syntax,
                token.range,
                &format!("expected '{expected}'"),
            );
        }
        self.stream.advance();
        Some(token)
    }

    /// Match a soft keyword: a `Name` token with this exact text.
    pub fn expect_soft_keyword(&mut self, keyword: &str) -> Option<Token> {
        let token = self.fill_token();
        if token.kind == TokenKind::Name && self.token_text(&token) == keyword {
            self.stream.advance();
            return Some(token);
        }
        None
    }

    /// Probe for a token kind without consuming input. Never memoized;
    /// unconditionally restores the cursor.
    pub fn lookahead(&mut self, want_match: bool, kind: TokenKind) -> bool {
        let pos = self.mark();
        let token = self.expect(kind);
        self.reset(pos);
        token.is_some() == want_match
    }

    /// Text-matching variant of [`lookahead`].
    pub fn lookahead_text(&mut self, want_match: bool, text: &str) -> bool {
        let pos = self.mark();
        let token = self.expect_text(text);
        self.reset(pos);
        token.is_some() == want_match
    }

    /// Memoize an expression-producing rule.
    ///
    /// Implements the full rule protocol: read the mark, consult the cache
    /// (a hit repositions the cursor to the recorded end), otherwise run
    /// the rule body and record its outcome, failures included, at the
    /// cursor position reached.
    pub fn memoize<F>(&mut self, rule: RuleId, body: F) -> Option<Expr>
    where
        F: FnOnce(&mut Self) -> Option<Expr>,
    {
        if self.error_indicator {
            return None;
        }
        let pos = self.mark();
        if let Some((result, end)) = self.cache.get(pos, rule) {
            self.reset(end);
            return result;
        }
        let result = body(self);
        if result.is_none() {
            // Failed rules leave the cursor where they started, so sibling
            // alternatives see an unconsumed stream.
            self.reset(pos);
        }
        let end = self.mark();
        self.cache.put(pos, rule, result, end)
    }

    // ── Diagnostics ─────────────────────────────────────────────────────

    /// Warnings never fail the parse and never touch the error flag.
    pub(crate) fn warn(
        &mut self,
        category: adder_diagnostic::WarningType,
        range: SourceRange,
        message: &str,
    ) {
        self.errors.on_warning(category, range, message);
    }

    /// Deliver an error through the channel and make the failure sticky.
    fn deliver(&mut self, error_type: ErrorType, range: SourceRange, message: &str) {
        self.error_indicator = true;
        if self.halted {
            return;
        }
        tracing::debug!(?error_type, %range, message, "raising diagnostic");
        if self.errors.on_error(error_type, range, message) == ErrorAction::Halt {
            self.halted = true;
        }
    }

    pub(crate) fn raise_error_known_location<T>(
        &mut self,
        error_type: ErrorType,
        range: SourceRange,
        message: &str,
    ) -> Option<T> {
        self.deliver(error_type, range, message);
        None
    }

    /// Syntax error at the current token.
    pub(crate) fn raise_syntax_error<T>(&mut self, message: &str) -> Option<T> {
        let range = self.peek_range();
        self.raise_error_known_location(ErrorType::Syntax, range, message)
    }

    pub(crate) fn raise_syntax_error_known_location<T>(
        &mut self,
        range: SourceRange,
        message: &str,
    ) -> Option<T> {
        self.raise_error_known_location(ErrorType::Syntax, range, message)
    }

    /// Syntax error extending from a start range to the current position.
    pub(crate) fn raise_syntax_error_starting_from<T>(
        &mut self,
        start: SourceRange,
        message: &str,
    ) -> Option<T> {
        let range = self.stream.tokenizer().extend_range_to_current_position(start);
        self.raise_error_known_location(ErrorType::Syntax, range, message)
    }

    pub(crate) fn raise_indentation_error<T>(&mut self, message: &str) -> Option<T> {
        let range = self.peek_range();
        self.raise_error_known_location(ErrorType::Indentation, range, message)
    }

    fn raise_unclosed_parentheses_error(&mut self) {
        let open = self.stream.tokenizer().open_brackets().last().copied();
        if let Some(open) = open {
            let range = SourceRange::new(open.line, open.column, open.line, open.column + 1);
            self.deliver(
                ErrorType::Syntax,
                range,
                &format!("'{}' was never closed", open.ch),
            );
        }
    }

    /// Map the tokenizer's terminal status onto a diagnostic.
    fn tokenizer_error(&mut self, token: &Token) {
        let done = self.stream.tokenizer().done();
        if token.kind == TokenKind::ErrorToken && done == StatusCode::SyntaxError {
            let message = token
                .meta
                .clone()
                .unwrap_or_else(|| "invalid syntax".into());
            self.deliver(ErrorType::Syntax, token.range, &message);
            return;
        }
        let line = self.stream.tokenizer().current_line_number();
        let column = self.stream.tokenizer().current_column();
        match done {
            StatusCode::BadToken => {
                self.deliver(
                    ErrorType::Syntax,
                    SourceRange::point(line, 0),
                    "invalid token",
                );
            }
            StatusCode::Eof => {
                if self.stream.tokenizer().bracket_depth() > 0 {
                    self.raise_unclosed_parentheses_error();
                } else {
                    let _: Option<()> = self.raise_syntax_error("unexpected EOF while parsing");
                }
            }
            StatusCode::DedentInvalid => {
                let _: Option<()> = self
                    .raise_indentation_error("unindent does not match any outer indentation level");
            }
            StatusCode::TabsSpacesInconsistent => {
                self.deliver(
                    ErrorType::Tab,
                    SourceRange::point(line, 0),
                    "inconsistent use of tabs and spaces in indentation",
                );
            }
            StatusCode::TooDeepIndentation => {
                self.deliver(
                    ErrorType::Indentation,
                    SourceRange::point(line, 0),
                    "too many levels of indentation",
                );
            }
            StatusCode::LineContinuationError => {
                self.deliver(
                    ErrorType::Syntax,
                    SourceRange::point(line, column),
                    "unexpected character after line continuation character",
                );
            }
            _ => {
                self.deliver(
                    ErrorType::Syntax,
                    SourceRange::point(line, 0),
                    "unknown parsing error",
                );
            }
        }
    }

    /// Barry-as-BDFL gate for the not-equal token.
    ///
    /// Returns true when the spelling is rejected; without the flag a
    /// wrong spelling just fails to match, with it the error is explicit.
    pub(crate) fn check_barry_as_flufl(&mut self, token: &Token) -> bool {
        let text = self.token_text(token);
        if self.flags.contains(ParserFlags::BARRY_AS_BDFL) {
            if text != "<>" {
                self.deliver(ErrorType::Syntax, token.range, BARRY_MSG);
                return true;
            }
            return false;
        }
        text != "!="
    }
}

/// Parse one source unit.
///
/// Returns the completed top-level node, or `None` after delivering a
/// diagnostic through the channel.
pub fn parse(
    source: &str,
    start_rule: InputType,
    errors: &dyn ErrorCallback,
    flags: ParserFlags,
    feature_version: u32,
) -> Option<ModTy> {
    Parser::new(source, errors, start_rule, flags, feature_version).parse()
}
