//! F-string piece tokenization.
//!
//! An f-string lexes as `FStringStart`, then alternating `FStringMiddle`
//! literal fragments and `{` … `}` replacement fields whose interiors lex
//! as ordinary tokens, then `FStringEnd`. Doubled braces are emitted as
//! their own two-codepoint middle fragment, which the literal decoder
//! collapses to a single brace. After a `:` at replacement-field depth the
//! format spec lexes as middle fragments again, possibly interrupted by
//! nested fields.

use adder_ir::{Token, TokenKind};

use crate::tokenizer::Tokenizer;

/// Per-f-string lexing mode, stacked to support nesting.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct FStringState {
    pub quote: char,
    pub quote_size: usize,
    /// Inside `{` … `}`, lexing ordinary tokens.
    pub in_expr: bool,
    /// Inside the format spec after `:`.
    pub in_format_spec: bool,
    /// Bracket-stack depth just inside the replacement field's `{`.
    pub expr_bracket_depth: usize,
    /// Open replacement fields; fields nest only through format specs, so
    /// closing an inner field resumes the outer field's spec.
    pub field_depth: usize,
}

impl<'e> Tokenizer<'e> {
    /// Whether the next token comes from f-string literal text.
    pub(crate) fn in_fstring_middle(&self) -> bool {
        self.fstrings.last().is_some_and(|t| !t.in_expr)
    }

    /// The opening prefix and quote(s) of an f-string. The prefix run has
    /// been consumed; `quote` is the first quote character. Raw mode is the
    /// literal decoder's concern: it re-reads the prefix from this token.
    pub(crate) fn fstring_start(&mut self, quote: char) -> Token {
        self.first_line_number = self.current_line_number;
        self.multi_line_start_index = self.line_start_index;
        let mut quote_size = 1usize;
        let c = self.next_cp();
        if c == Some(quote) {
            let c2 = self.next_cp();
            if c2 == Some(quote) {
                quote_size = 3;
            } else {
                // `f""`: the second quote is the closer, leave it unread.
                self.one_back_if(c2);
                self.one_back();
            }
        } else {
            self.one_back_if(c);
        }
        self.fstrings.push(FStringState {
            quote,
            quote_size,
            in_expr: false,
            in_format_spec: false,
            expr_bracket_depth: 0,
            field_depth: 0,
        });
        self.make_token(TokenKind::FStringStart)
    }

    /// Scan literal f-string text up to the next brace, closing quote run,
    /// or error.
    pub(crate) fn fstring_middle_token(&mut self) -> Token {
        self.token_start = self.next_char_index;
        self.first_line_number = self.current_line_number;
        self.multi_line_start_index = self.line_start_index;
        let top = match self.fstrings.last().copied() {
            Some(t) => t,
            None => return self.make_token(TokenKind::ErrorToken),
        };
        loop {
            let c = self.next_cp();
            match c {
                None => return self.unterminated_fstring_error(top.quote_size == 3),
                Some('\n') if top.quote_size == 1 => {
                    return self.unterminated_fstring_error(false);
                }
                Some('\\') => {
                    // Escapes stay opaque here; decoding happens in the
                    // literal subsystem.
                    let _ = self.next_cp();
                }
                Some(q) if q == top.quote => {
                    let run_start = self.next_char_index - 1;
                    let is_close = top.quote_size == 1
                        || (self.source_at(run_start + 1) == Some(q)
                            && self.source_at(run_start + 2) == Some(q));
                    if is_close {
                        if run_start > self.token_start {
                            // Emit the pending text; the closer is handled
                            // on the next call.
                            self.one_back();
                            return self.make_token(TokenKind::FStringMiddle);
                        }
                        if top.quote_size == 3 {
                            let _ = self.next_cp();
                            let _ = self.next_cp();
                        }
                        let token = self.make_token(TokenKind::FStringEnd);
                        self.fstrings.pop();
                        return token;
                    }
                    // Literal quote inside a triple-quoted f-string.
                }
                Some(b @ ('{' | '}')) => {
                    // Brace doubling applies only to literal text; in a
                    // format spec `{` always opens a nested field.
                    if !top.in_format_spec && self.peek_raw() == Some(b) {
                        // Doubled brace: its own two-codepoint fragment.
                        let pair_start = self.next_char_index - 1;
                        if pair_start > self.token_start {
                            self.one_back();
                            return self.make_token(TokenKind::FStringMiddle);
                        }
                        let _ = self.next_cp();
                        return self.make_token(TokenKind::FStringMiddle);
                    }
                    let brace_start = self.next_char_index - 1;
                    if b == '{' {
                        if brace_start > self.token_start {
                            self.one_back();
                            return self.make_token(TokenKind::FStringMiddle);
                        }
                        return self.open_replacement_field();
                    }
                    if top.in_format_spec {
                        if brace_start > self.token_start {
                            self.one_back();
                            return self.make_token(TokenKind::FStringMiddle);
                        }
                        return self.close_replacement_field();
                    }
                    return self.syntax_error_token("f-string: single '}' is not allowed");
                }
                Some(_) => {}
            }
        }
    }

    /// The `{` opening a replacement field; switches to expression mode.
    fn open_replacement_field(&mut self) -> Token {
        self.token_start = self.next_char_index - 1;
        self.push_field_bracket();
        let depth = self.bracket_depth();
        if let Some(top) = self.fstrings.last_mut() {
            top.in_expr = true;
            top.in_format_spec = false;
            top.expr_bracket_depth = depth;
            top.field_depth += 1;
        }
        self.make_token(TokenKind::LBrace)
    }

    /// The `}` ending a replacement field, reached from the format spec.
    fn close_replacement_field(&mut self) -> Token {
        self.token_start = self.next_char_index - 1;
        self.pop_field_bracket();
        if let Some(top) = self.fstrings.last_mut() {
            top.field_depth = top.field_depth.saturating_sub(1);
            top.in_expr = false;
            top.in_format_spec = top.field_depth > 0;
        }
        self.make_token(TokenKind::RBrace)
    }
}

#[cfg(test)]
mod tests {
    use crate::{LexerFlags, Tokenizer};
    use adder_diagnostic::DiagnosticCollector;
    use adder_ir::TokenKind;

    fn lex_with_text(source: &str) -> Vec<(TokenKind, String)> {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new(source, &sink, LexerFlags::EXEC_INPUT);
        let mut out = Vec::new();
        for _ in 0..64 {
            let t = tok.next();
            let kind = t.kind;
            out.push((kind, tok.token_text(&t)));
            if matches!(kind, TokenKind::Endmarker | TokenKind::ErrorToken) {
                break;
            }
        }
        out
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex_with_text(source).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn plain_fstring_pieces() {
        assert_eq!(
            kinds("f'ab'"),
            vec![
                TokenKind::FStringStart,
                TokenKind::FStringMiddle,
                TokenKind::FStringEnd,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn empty_fstring_has_no_middle() {
        assert_eq!(
            kinds("f''"),
            vec![
                TokenKind::FStringStart,
                TokenKind::FStringEnd,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn replacement_field_pieces() {
        assert_eq!(
            kinds("f'a{x}b'"),
            vec![
                TokenKind::FStringStart,
                TokenKind::FStringMiddle,
                TokenKind::LBrace,
                TokenKind::Name,
                TokenKind::RBrace,
                TokenKind::FStringMiddle,
                TokenKind::FStringEnd,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn doubled_braces_are_their_own_fragment() {
        let toks = lex_with_text("f'a{{b'");
        let texts: Vec<&str> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::FStringMiddle)
            .map(|(_, s)| s.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "{{", "b"]);
    }

    #[test]
    fn format_spec_lexes_as_middle() {
        assert_eq!(
            kinds("f'{x:>10}'"),
            vec![
                TokenKind::FStringStart,
                TokenKind::LBrace,
                TokenKind::Name,
                TokenKind::Colon,
                TokenKind::FStringMiddle,
                TokenKind::RBrace,
                TokenKind::FStringEnd,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn empty_format_spec() {
        assert_eq!(
            kinds("f'{x:}'"),
            vec![
                TokenKind::FStringStart,
                TokenKind::LBrace,
                TokenKind::Name,
                TokenKind::Colon,
                TokenKind::RBrace,
                TokenKind::FStringEnd,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn conversion_lexes_as_exclamation_name() {
        assert_eq!(
            kinds("f'{x!r}'"),
            vec![
                TokenKind::FStringStart,
                TokenKind::LBrace,
                TokenKind::Name,
                TokenKind::Exclamation,
                TokenKind::Name,
                TokenKind::RBrace,
                TokenKind::FStringEnd,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn not_equal_still_works_inside_field() {
        let ks = kinds("f'{a != b}'");
        assert!(ks.contains(&TokenKind::NotEqual));
    }

    #[test]
    fn nested_field_in_format_spec() {
        assert_eq!(
            kinds("f'{x:{w}}'"),
            vec![
                TokenKind::FStringStart,
                TokenKind::LBrace,
                TokenKind::Name,
                TokenKind::Colon,
                TokenKind::LBrace,
                TokenKind::Name,
                TokenKind::RBrace,
                TokenKind::RBrace,
                TokenKind::FStringEnd,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn nested_string_with_same_quote_in_field() {
        let ks = kinds("f'{'a'}'");
        assert!(ks.contains(&TokenKind::Str));
    }

    #[test]
    fn single_closing_brace_is_error() {
        let toks = lex_with_text("f'a}b'");
        assert_eq!(
            toks.last().map(|(k, _)| *k),
            Some(TokenKind::ErrorToken)
        );
    }

    #[test]
    fn unterminated_fstring_is_error() {
        let toks = lex_with_text("f'abc");
        assert_eq!(toks.last().map(|(k, _)| *k), Some(TokenKind::ErrorToken));
    }

    #[test]
    fn triple_quoted_fstring_with_newline() {
        let ks = kinds("f'''a\nb{x}'''");
        assert_eq!(
            ks,
            vec![
                TokenKind::FStringStart,
                TokenKind::FStringMiddle,
                TokenKind::LBrace,
                TokenKind::Name,
                TokenKind::RBrace,
                TokenKind::FStringEnd,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn raw_prefix_reaches_start_token_text() {
        let toks = lex_with_text("rf'a\\nb'");
        assert_eq!(toks[0].0, TokenKind::FStringStart);
        assert!(toks[0].1.contains('r'));
    }
}
