//! Position stream and token buffer.
//!
//! Wraps the tokenizer and buffers every token it produces, so that
//! backtracking rewinds a cursor instead of re-lexing. The cursor is the
//! parser's only backtracking checkpoint: `mark` reads it, `reset` moves
//! it, both O(1) with no other side effects.
//!
//! Tokens are finalized at buffer-insertion time: `Name` tokens are
//! reclassified against the reserved-word table, type-ignore pseudo-tokens
//! are archived into a side list instead of entering the stream, and in
//! single-statement mode the first end-of-input token seen after parsing
//! has started is rewritten to a newline with any pending indentation
//! force-closed. Buffered tokens are immutable afterwards.

use adder_ir::{Token, TokenKind, TypeIgnore};
use adder_lexer::Tokenizer;

use crate::keywords;

pub struct TokenStream<'e> {
    tokenizer: Tokenizer<'e>,
    tokens: Vec<Token>,
    pos: usize,
    single_mode: bool,
    parsing_started: bool,
    type_ignores: Vec<TypeIgnore>,
}

impl<'e> TokenStream<'e> {
    pub fn new(tokenizer: Tokenizer<'e>, single_mode: bool) -> Self {
        TokenStream {
            tokenizer,
            tokens: Vec::new(),
            pos: 0,
            single_mode,
            parsing_started: false,
            type_ignores: Vec::new(),
        }
    }

    /// Current cursor position; the backtracking checkpoint.
    #[inline]
    pub fn mark(&self) -> usize {
        self.pos
    }

    /// Rewind (or replay) the cursor to a previously returned mark.
    #[inline]
    pub fn reset(&mut self, pos: usize) {
        debug_assert!(pos <= self.tokens.len(), "reset past the fetched frontier");
        self.pos = pos;
    }

    /// Number of tokens fetched so far.
    #[inline]
    pub fn fill(&self) -> usize {
        self.tokens.len()
    }

    /// Advance the cursor one token.
    #[inline]
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// The token at the cursor, lexing forward as needed.
    pub fn peek(&mut self) -> &Token {
        while self.pos >= self.tokens.len() {
            self.fetch();
        }
        &self.tokens[self.pos]
    }

    /// An already-fetched token.
    pub fn peek_at(&self, pos: usize) -> &Token {
        debug_assert!(pos < self.tokens.len());
        &self.tokens[pos]
    }

    pub fn text(&self, token: &Token) -> String {
        self.tokenizer.token_text(token)
    }

    pub fn tokenizer(&self) -> &Tokenizer<'e> {
        &self.tokenizer
    }

    pub fn tokenizer_mut(&mut self) -> &mut Tokenizer<'e> {
        &mut self.tokenizer
    }

    /// Archived `# type: ignore` pseudo-tokens, surfaced on the module.
    pub fn take_type_ignores(&mut self) -> Vec<TypeIgnore> {
        std::mem::take(&mut self.type_ignores)
    }

    /// Pull one real token into the buffer, applying finalization.
    fn fetch(&mut self) {
        loop {
            let mut token = self.tokenizer.next();

            if token.kind == TokenKind::TypeIgnore {
                let tag = self.tokenizer.token_text(&token);
                self.type_ignores.push(TypeIgnore {
                    lineno: token.range.start_line,
                    tag,
                    range: token.range,
                });
                continue;
            }

            if self.single_mode && token.kind == TokenKind::Endmarker && self.parsing_started {
                // End of one interactive statement: the end-of-input token
                // becomes the statement's newline and open indentation is
                // closed out.
                token.kind = TokenKind::Newline;
                self.parsing_started = false;
                if self.tokenizer.indent_depth() > 0 {
                    self.tokenizer.force_dedent_all();
                }
            } else {
                self.parsing_started = true;
            }

            if token.kind == TokenKind::Name {
                let text = self.tokenizer.token_text(&token);
                if let Some(kw) = keywords::lookup(&text) {
                    token.kind = kw;
                }
            }

            self.tokens.push(token);
            return;
        }
    }
}
