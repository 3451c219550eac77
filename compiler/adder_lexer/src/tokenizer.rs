//! The tokenizer state machine.
//!
//! Operates over a codepoint buffer so that token payload bounds are stable
//! codepoint offsets. `\r\n` and lone `\r` normalize to `\n` during reading;
//! the buffer itself is left untouched so offsets match the source.

use adder_diagnostic::{ErrorCallback, WarningType};
use adder_ir::{SourceRange, Token, TokenKind};
use smallvec::{smallvec, SmallVec};

use crate::fstring::FStringState;
use crate::{operators, LexerFlags, StatusCode};

const TAB_SIZE: u32 = 8;
const ALT_TAB_SIZE: u32 = 1;
const MAX_INDENT: usize = 100;
const MAX_BRACKET_DEPTH: usize = 200;

/// An unclosed opening bracket, kept for "'(' was never closed" diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct OpenBracket {
    pub ch: char,
    pub line: u32,
    pub column: u32,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
struct IndentLevel {
    col: u32,
    alt_col: u32,
}

/// Tokenizer over one source unit.
pub struct Tokenizer<'e> {
    errors: &'e dyn ErrorCallback,
    source: Vec<char>,
    pub(crate) next_char_index: usize,
    pub(crate) token_start: usize,
    pub(crate) done: StatusCode,
    pub(crate) current_line_number: u32,
    pub(crate) line_start_index: usize,
    /// A newline was read; the line counter advances on the next read.
    read_newline: bool,
    at_beginning_of_line: bool,
    pending_indents: i32,
    /// Invariant: never empty; the base entry is column zero.
    indents: SmallVec<[IndentLevel; 16]>,
    brackets: SmallVec<[OpenBracket; 8]>,
    pub(crate) fstrings: SmallVec<[FStringState; 2]>,
    /// Start line of the current (possibly multi-line) string token.
    pub(crate) first_line_number: u32,
    pub(crate) multi_line_start_index: usize,
    exec_input: bool,
    interactive: bool,
    look_for_type_comments: bool,
    /// While true, hitting end of interactive input reports
    /// "incomplete source" instead of stopping the stream.
    pub report_incomplete_source_if_interactive: bool,
}

impl<'e> Tokenizer<'e> {
    pub fn new(source: &str, errors: &'e dyn ErrorCallback, flags: LexerFlags) -> Self {
        // Normalize newlines up front so token payload bounds index a
        // buffer free of `\r`; literal decoding reads these codepoints
        // directly.
        let normalized: Vec<char> = if source.contains('\r') {
            source
                .replace("\r\n", "\n")
                .chars()
                .map(|c| if c == '\r' { '\n' } else { c })
                .collect()
        } else {
            source.chars().collect()
        };
        Tokenizer {
            errors,
            source: normalized,
            next_char_index: 0,
            token_start: 0,
            done: StatusCode::Ok,
            current_line_number: 1,
            line_start_index: 0,
            read_newline: false,
            at_beginning_of_line: true,
            pending_indents: 0,
            indents: smallvec![IndentLevel::default()],
            brackets: SmallVec::new(),
            fstrings: SmallVec::new(),
            first_line_number: 1,
            multi_line_start_index: 0,
            exec_input: flags.contains(LexerFlags::EXEC_INPUT),
            interactive: flags.contains(LexerFlags::INTERACTIVE),
            look_for_type_comments: flags.contains(LexerFlags::TYPE_COMMENT),
            report_incomplete_source_if_interactive: true,
        }
    }

    // ── Collaborator surface ────────────────────────────────────────────

    pub fn done(&self) -> StatusCode {
        self.done
    }

    pub fn bracket_depth(&self) -> usize {
        self.brackets.len()
    }

    pub fn open_brackets(&self) -> &[OpenBracket] {
        &self.brackets
    }

    pub fn current_line_number(&self) -> u32 {
        self.current_line_number
    }

    /// Column of the read cursor within the current line.
    pub fn current_column(&self) -> u32 {
        self.next_char_index.saturating_sub(self.line_start_index) as u32
    }

    /// The codepoint buffer; token payload bounds index into this.
    pub fn code_points(&self) -> &[char] {
        &self.source
    }

    /// Slice the source for a token, with newlines normalized.
    pub fn token_text(&self, token: &Token) -> String {
        let start = token.start as usize;
        if start >= self.source.len() {
            return String::new();
        }
        let end = (token.end as usize).min(self.source.len());
        let s: String = self.source[start..end].iter().collect();
        if s.contains('\r') {
            s.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            s
        }
    }

    /// Number of open indentation levels above the base.
    pub fn indent_depth(&self) -> usize {
        self.indents.len() - 1
    }

    /// Force-close all open indentation: queue the matching dedents and
    /// reset the stack. Used by the interactive end-of-statement rewrite.
    pub fn force_dedent_all(&mut self) {
        let depth = self.indent_depth();
        if depth > 0 {
            self.pending_indents -= depth as i32;
            self.indents.truncate(1);
        }
    }

    pub fn extend_range_to_current_position(&self, start: SourceRange) -> SourceRange {
        start.with_end(SourceRange::point(
            self.current_line_number,
            self.next_char_index.saturating_sub(self.line_start_index) as u32,
        ))
    }

    /// Whether one-statement input has further statements after the first.
    pub fn is_bad_single_statement(&self) -> bool {
        let mut cur = self.next_char_index;
        if cur >= self.source.len() {
            return false;
        }
        let mut c = self.source[cur];
        loop {
            while matches!(c, ' ' | '\t' | '\n' | '\x0c') {
                cur += 1;
                if cur >= self.source.len() {
                    return false;
                }
                c = self.source[cur];
            }
            if c != '#' {
                return true;
            }
            while c != '\n' {
                cur += 1;
                if cur >= self.source.len() {
                    return false;
                }
                c = self.source[cur];
            }
        }
    }

    // ── Character reading ───────────────────────────────────────────────

    pub(crate) fn next_cp(&mut self) -> Option<char> {
        if self.read_newline {
            self.read_newline = false;
            if self.next_char_index < self.source.len() {
                self.current_line_number += 1;
            }
            self.line_start_index = self.next_char_index;
        }
        if self.next_char_index < self.source.len() {
            let mut c = self.source[self.next_char_index];
            if c == '\r' {
                if self.source.get(self.next_char_index + 1) == Some(&'\n') {
                    self.next_char_index += 1;
                }
                c = '\n';
            }
            self.next_char_index += 1;
            if c == '\n' {
                self.read_newline = true;
            }
            return Some(c);
        }
        if self.next_char_index == self.source.len() && self.exec_input {
            // Inject a missing newline before end of input.
            if self.source.is_empty() || self.source[self.next_char_index - 1] != '\n' {
                self.next_char_index += 1;
                self.read_newline = true;
                return Some('\n');
            }
        }
        if self.interactive {
            if self.report_incomplete_source_if_interactive {
                self.errors.report_incomplete_source(self.current_line_number);
            } else {
                self.done = StatusCode::InteractiveStop;
            }
            return None;
        }
        self.done = StatusCode::Eof;
        None
    }

    pub(crate) fn one_back(&mut self) {
        if self.next_char_index > 0 && self.done != StatusCode::Eof {
            self.next_char_index -= 1;
            if self.next_char_index < self.source.len()
                && self.source[self.next_char_index] == '\n'
                && self.next_char_index > 0
                && self.source[self.next_char_index - 1] == '\r'
            {
                self.next_char_index -= 1;
            }
            self.read_newline = false;
        }
    }

    /// Back up only when a real character was consumed.
    pub(crate) fn one_back_if(&mut self, c: Option<char>) {
        if c.is_some() {
            self.one_back();
        }
    }

    /// Raw peek without consuming; `\r` reads as `\n`.
    pub(crate) fn peek_raw(&self) -> Option<char> {
        self.source.get(self.next_char_index).map(|&c| if c == '\r' { '\n' } else { c })
    }

    pub(crate) fn source_at(&self, idx: usize) -> Option<char> {
        self.source.get(idx).copied()
    }

    /// Unterminated f-string, reported from the first fragment line.
    pub(crate) fn unterminated_fstring_error(&mut self, triple: bool) -> Token {
        let detected = self.current_line_number;
        self.read_newline = false;
        self.current_line_number = self.first_line_number;
        if triple {
            self.syntax_error_token(&format!(
                "unterminated triple-quoted f-string literal (detected at line {detected})"
            ))
        } else {
            self.syntax_error_token(&format!(
                "unterminated f-string literal (detected at line {detected})"
            ))
        }
    }

    // ── Token construction ──────────────────────────────────────────────

    pub(crate) fn make_token(&self, kind: TokenKind) -> Token {
        self.make_token_with(kind, None)
    }

    fn make_token_with(&self, kind: TokenKind, meta: Option<String>) -> Token {
        let range = if kind == TokenKind::Endmarker {
            SourceRange::new(self.current_line_number, 0, self.current_line_number, 0)
        } else {
            self.current_token_range(matches!(kind, TokenKind::Str | TokenKind::FStringMiddle))
        };
        let mut token = Token::new(kind, range, self.token_start as u32, self.next_char_index as u32);
        if let Some(m) = meta {
            token = token.with_meta(m);
        }
        token
    }

    fn current_token_range(&self, multi_line: bool) -> SourceRange {
        let line_start = if multi_line {
            self.multi_line_start_index
        } else {
            self.line_start_index
        };
        let lineno = if multi_line {
            self.first_line_number
        } else {
            self.current_line_number
        };
        SourceRange::new(
            lineno,
            self.token_start.saturating_sub(line_start) as u32,
            self.current_line_number,
            self.next_char_index.saturating_sub(self.line_start_index) as u32,
        )
    }

    pub(crate) fn syntax_error_token(&mut self, message: &str) -> Token {
        self.done = StatusCode::SyntaxError;
        self.make_token_with(TokenKind::ErrorToken, Some(message.to_string()))
    }

    fn indent_error_token(&mut self) -> Token {
        self.done = StatusCode::TabsSpacesInconsistent;
        self.make_token(TokenKind::ErrorToken)
    }

    fn parser_warn(&self, message: &str) {
        self.errors
            .on_warning(WarningType::Syntax, self.current_token_range(false), message);
    }

    // ── Scanning helpers ────────────────────────────────────────────────

    fn continuation_line(&mut self) -> bool {
        let c = self.next_cp();
        if c != Some('\n') {
            self.done = StatusCode::LineContinuationError;
            return false;
        }
        let c = self.next_cp();
        if c.is_none() {
            self.done = StatusCode::Eof;
            return false;
        }
        self.one_back();
        true
    }

    /// Source lookahead for a keyword tail with an identifier boundary.
    fn word_lookahead(&self, tail: &[char]) -> bool {
        let end = self.next_char_index + tail.len();
        if end + 1 >= self.source.len() {
            return false;
        }
        self.source[self.next_char_index..end]
            .iter()
            .eq(tail.iter())
            && !is_ident_char(self.source[end])
    }

    /// Remainder of a decimal digit run with single underscores between
    /// groups. `None` means a misplaced underscore; the caller reports
    /// "invalid decimal literal".
    fn decimal_tail(&mut self) -> Option<Option<char>> {
        let mut c;
        loop {
            loop {
                c = self.next_cp();
                if !c.is_some_and(|d| d.is_ascii_digit()) {
                    break;
                }
            }
            if c != Some('_') {
                break;
            }
            c = self.next_cp();
            if !c.is_some_and(|d| d.is_ascii_digit()) {
                self.one_back_if(c);
                return None;
            }
        }
        Some(c)
    }

    /// A numeric literal must not run straight into an identifier. A
    /// following keyword that can legally appear after a number (`and`,
    /// `else`, `for`, `if`, `in`, `is`, `or`, `not`) only warns.
    fn verify_end_of_number(&mut self, c: Option<char>, kind: &str) -> Option<Token> {
        let keyword_follows = match c {
            Some('a') => self.word_lookahead(&['n', 'd']),
            Some('e') => self.word_lookahead(&['l', 's', 'e']),
            Some('f') => self.word_lookahead(&['o', 'r']),
            Some('i') => {
                let c2 = self.next_cp();
                let hit = matches!(c2, Some('f' | 'n' | 's'));
                self.one_back_if(c2);
                hit
            }
            Some('o') => self.word_lookahead(&['r']),
            Some('n') => self.word_lookahead(&['o', 't']),
            _ => false,
        };
        if keyword_follows {
            self.one_back();
            self.parser_warn(&format!("invalid {kind} literal"));
            let _ = self.next_cp();
            None
        } else if c.is_some_and(|ch| ch.is_ascii() && is_ident_char(ch)) {
            self.one_back();
            Some(self.syntax_error_token(&format!("invalid {kind} literal")))
        } else {
            None
        }
    }

    // ── Main machine ────────────────────────────────────────────────────

    /// Produce the next token.
    pub fn next(&mut self) -> Token {
        if self.in_fstring_middle() {
            return self.fstring_middle_token();
        }
        let mut blankline;
        'nextline: loop {
            blankline = false;

            if self.at_beginning_of_line {
                if let Some(err) = self.handle_indentation(&mut blankline) {
                    return err;
                }
            }

            self.token_start = self.next_char_index;

            // Return pending indents/dedents one at a time.
            if self.pending_indents != 0 {
                if self.pending_indents < 0 {
                    self.pending_indents += 1;
                    return self.make_token(TokenKind::Dedent);
                }
                self.pending_indents -= 1;
                return self.make_token(TokenKind::Indent);
            }

            let mut c = self.next_cp();
            loop {
                // Skip horizontal whitespace.
                while matches!(c, Some(' ' | '\t' | '\x0c')) {
                    c = self.next_cp();
                }
                self.token_start = if c.is_some() {
                    self.next_char_index - 1
                } else {
                    self.next_char_index
                };

                // Comments; possibly a type comment.
                if c == Some('#') {
                    while !matches!(c, None | Some('\n')) {
                        c = self.next_cp();
                    }
                    if self.look_for_type_comments {
                        if let Some(token) = self.try_type_comment(c, blankline) {
                            return token;
                        }
                    }
                }

                if self.done == StatusCode::InteractiveStop {
                    return self.make_token(TokenKind::Endmarker);
                }

                let ch = match c {
                    None => {
                        self.token_start = self.next_char_index;
                        if !self.brackets.is_empty() {
                            // The driver turns this into an unclosed-bracket
                            // diagnostic.
                            return self.make_token(TokenKind::ErrorToken);
                        }
                        if self.done == StatusCode::Eof {
                            return self.make_token(TokenKind::Endmarker);
                        }
                        return self.make_token(TokenKind::ErrorToken);
                    }
                    Some(ch) => ch,
                };

                if is_ident_start(ch) {
                    return self.name_or_string(ch);
                }

                if ch == '\n' {
                    self.at_beginning_of_line = true;
                    if blankline || !self.brackets.is_empty() {
                        continue 'nextline;
                    }
                    return self.make_token(TokenKind::Newline);
                }

                if ch == '.' {
                    let c2 = self.next_cp();
                    if c2.is_some_and(|d| d.is_ascii_digit()) {
                        return self.fraction_and_rest(c2);
                    }
                    if c2 == Some('.') {
                        let c3 = self.next_cp();
                        if c3 == Some('.') {
                            return self.make_token(TokenKind::Ellipsis);
                        }
                        self.one_back_if(c3);
                        self.one_back();
                    } else {
                        self.one_back_if(c2);
                    }
                    return self.make_token(TokenKind::Dot);
                }

                if ch.is_ascii_digit() {
                    return self.number_token(ch);
                }

                if ch == '"' || ch == '\'' {
                    return self.string_token(ch);
                }

                if ch == '\\' {
                    if !self.continuation_line() {
                        return self.make_token(TokenKind::ErrorToken);
                    }
                    c = self.next_cp();
                    continue;
                }

                return self.operator_token(ch);
            }
        }
    }

    /// Column counting and the indent/dedent stack at the start of a
    /// logical line.
    fn handle_indentation(&mut self, blankline: &mut bool) -> Option<Token> {
        self.at_beginning_of_line = false;
        let mut col: u32 = 0;
        let mut alt_col: u32 = 0;
        let mut cont_line_col: u32 = 0;
        let c = loop {
            match self.next_cp() {
                Some(' ') => {
                    col += 1;
                    alt_col += 1;
                }
                Some('\t') => {
                    col = (col / TAB_SIZE + 1) * TAB_SIZE;
                    alt_col = (alt_col / ALT_TAB_SIZE + 1) * ALT_TAB_SIZE;
                }
                Some('\x0c') => {
                    col = 0;
                    alt_col = 0;
                }
                Some('\\') => {
                    // Indentation cannot be split over physical lines: the
                    // first continuation's column wins for what follows.
                    if cont_line_col == 0 {
                        cont_line_col = col;
                    }
                    if !self.continuation_line() {
                        return Some(self.make_token(TokenKind::ErrorToken));
                    }
                }
                other => break other,
            }
        };
        self.one_back_if(c);

        if matches!(c, Some('#' | '\n')) {
            // Whitespace-only and comment-only lines do not affect
            // indentation and produce no newline token, except totally
            // empty lines in interactive mode, which end a command group.
            if col == 0 && c == Some('\n') && self.interactive {
                *blankline = false;
            } else if self.interactive && self.current_line_number == 1 {
                *blankline = false;
                col = 0;
                alt_col = 0;
            } else {
                *blankline = true;
            }
        }

        if !*blankline && self.brackets.is_empty() {
            if cont_line_col != 0 {
                col = cont_line_col;
                alt_col = cont_line_col;
            }
            let current = self.indents.last().copied().unwrap_or_default();
            if col == current.col {
                if alt_col != current.alt_col {
                    return Some(self.indent_error_token());
                }
            } else if col > current.col {
                if self.indents.len() + 1 >= MAX_INDENT {
                    self.done = StatusCode::TooDeepIndentation;
                    return Some(self.make_token(TokenKind::ErrorToken));
                }
                if alt_col <= current.alt_col {
                    return Some(self.indent_error_token());
                }
                self.pending_indents += 1;
                self.indents.push(IndentLevel { col, alt_col });
            } else {
                // Dedent: any number of levels, but the target must match.
                while self.indents.len() > 1
                    && col < self.indents.last().copied().unwrap_or_default().col
                {
                    self.pending_indents -= 1;
                    self.indents.pop();
                }
                let current = self.indents.last().copied().unwrap_or_default();
                if col != current.col {
                    self.done = StatusCode::DedentInvalid;
                    return Some(self.make_token(TokenKind::ErrorToken));
                }
                if alt_col != current.alt_col {
                    return Some(self.indent_error_token());
                }
            }
        }
        None
    }

    /// Recognize `# type:` comments. The cursor sits after the comment
    /// body; `c` is the terminating newline or end of input.
    fn try_type_comment(&mut self, c: Option<char>, blankline: bool) -> Option<Token> {
        const PREFIX: &[char] = &['#', ' ', 't', 'y', 'p', 'e', ':', ' '];
        const IGNORE: &[char] = &['i', 'g', 'n', 'o', 'r', 'e'];
        let mut prefix_idx = 0;
        let mut ch_idx = self.token_start;
        while ch_idx < self.source.len() && prefix_idx < PREFIX.len() {
            if PREFIX[prefix_idx] == ' ' {
                while ch_idx < self.source.len() && matches!(self.source[ch_idx], ' ' | '\t') {
                    ch_idx += 1;
                }
            } else if PREFIX[prefix_idx] == self.source[ch_idx] {
                ch_idx += 1;
            } else {
                break;
            }
            prefix_idx += 1;
        }
        if prefix_idx != PREFIX.len() {
            return None;
        }

        let ignore_end = ch_idx + IGNORE.len();
        let end_char = self.source.get(ignore_end).copied();
        self.one_back_if(c); // don't eat the newline or EOF
        let type_start = ch_idx;

        // "type: ignore" followed by the end of the token or anything
        // ASCII and non-alphanumeric.
        let is_type_ignore = self.next_char_index >= ignore_end
            && self
                .source
                .get(ch_idx..ignore_end)
                .is_some_and(|s| s.iter().eq(IGNORE.iter()))
            && !(self.next_char_index > ignore_end
                && end_char.is_some_and(|ec| !ec.is_ascii() || ec.is_alphanumeric()));

        if is_type_ignore {
            if blankline {
                // Only thing on the line: consume the newline too.
                let _ = self.next_cp();
                self.at_beginning_of_line = true;
            }
            self.token_start = ignore_end;
            Some(self.make_token(TokenKind::TypeIgnore))
        } else {
            self.token_start = type_start;
            Some(self.make_token(TokenKind::TypeComment))
        }
    }

    /// An identifier, or a prefixed string when the prefix run ends at a
    /// quote.
    fn name_or_string(&mut self, first: char) -> Token {
        let mut saw_b = false;
        let mut saw_r = false;
        let mut saw_u = false;
        let mut saw_f = false;
        let mut c = Some(first);
        loop {
            let matched = match c {
                Some('b' | 'B') if !(saw_b || saw_u || saw_f) => {
                    saw_b = true;
                    true
                }
                Some('u' | 'U') if !(saw_b || saw_u || saw_r || saw_f) => {
                    saw_u = true;
                    true
                }
                Some('r' | 'R') if !(saw_r || saw_u) => {
                    saw_r = true;
                    true
                }
                Some('f' | 'F') if !(saw_f || saw_b || saw_u) => {
                    saw_f = true;
                    true
                }
                _ => false,
            };
            if !matched {
                break;
            }
            c = self.next_cp();
            if let Some(q @ ('"' | '\'')) = c {
                return if saw_f {
                    self.fstring_start(q)
                } else {
                    self.string_token(q)
                };
            }
        }
        while c.is_some_and(is_ident_char) {
            c = self.next_cp();
        }
        self.one_back_if(c);
        self.make_token(TokenKind::Name)
    }

    /// A complete (non-interpolated) string literal token, prefix included.
    fn string_token(&mut self, quote: char) -> Token {
        self.first_line_number = self.current_line_number;
        self.multi_line_start_index = self.line_start_index;

        let mut quote_size = 1usize;
        let mut end_quote_size = 0usize;
        let mut c = self.next_cp();
        if c == Some(quote) {
            c = self.next_cp();
            if c == Some(quote) {
                quote_size = 3;
            } else {
                end_quote_size = 1; // empty string
            }
        }
        if c != Some(quote) {
            self.one_back_if(c);
        }

        while end_quote_size != quote_size {
            c = self.next_cp();
            if c.is_none() || (quote_size == 1 && c == Some('\n')) {
                return self.unterminated_string_error(quote_size == 3);
            }
            if c == Some(quote) {
                end_quote_size += 1;
            } else {
                end_quote_size = 0;
                if c == Some('\\') {
                    let _ = self.next_cp(); // skip escaped char
                }
            }
        }
        self.make_token(TokenKind::Str)
    }

    /// Report from the opening quote, not where scanning stopped.
    pub(crate) fn unterminated_string_error(&mut self, triple: bool) -> Token {
        self.next_char_index = self.token_start + 1;
        self.line_start_index = self.multi_line_start_index;
        self.read_newline = false;
        let detected = self.current_line_number;
        self.current_line_number = self.first_line_number;
        if triple {
            self.syntax_error_token(&format!(
                "unterminated triple-quoted string literal (detected at line {detected})"
            ))
        } else {
            self.syntax_error_token(&format!(
                "unterminated string literal (detected at line {detected})"
            ))
        }
    }

    fn number_token(&mut self, first: char) -> Token {
        if first == '0' {
            let mut c = self.next_cp();
            match c {
                Some('x' | 'X') => {
                    c = self.next_cp();
                    loop {
                        if c == Some('_') {
                            c = self.next_cp();
                        }
                        if !c.is_some_and(is_hex_digit) {
                            self.one_back_if(c);
                            return self.syntax_error_token("invalid hexadecimal literal");
                        }
                        while c.is_some_and(is_hex_digit) {
                            c = self.next_cp();
                        }
                        if c != Some('_') {
                            break;
                        }
                    }
                    if let Some(err) = self.verify_end_of_number(c, "hexadecimal") {
                        return err;
                    }
                    self.one_back_if(c);
                    self.make_token(TokenKind::Number)
                }
                Some('o' | 'O') => self.radix_tail(|d| ('0'..'8').contains(&d), "octal"),
                Some('b' | 'B') => self.radix_tail(|d| d == '0' || d == '1', "binary"),
                _ => {
                    // Decimal starting with zero; "0" and runs of zeros are
                    // fine, a nonzero tail is the old octal spelling.
                    let mut nonzero = false;
                    loop {
                        if c == Some('_') {
                            c = self.next_cp();
                            if !c.is_some_and(|d| d.is_ascii_digit()) {
                                self.one_back_if(c);
                                return self.syntax_error_token("invalid decimal literal");
                            }
                        }
                        if c != Some('0') {
                            break;
                        }
                        c = self.next_cp();
                    }
                    let zeros_end = self.next_char_index;
                    if c.is_some_and(|d| d.is_ascii_digit()) {
                        nonzero = true;
                        c = match self.decimal_tail() {
                            Some(c) => c,
                            None => return self.syntax_error_token("invalid decimal literal"),
                        };
                    }
                    if c == Some('.') {
                        let c2 = self.next_cp();
                        return self.fraction_and_rest(c2);
                    }
                    if let Some(e @ ('e' | 'E')) = c {
                        return self.exponent_and_rest(e);
                    }
                    if matches!(c, Some('j' | 'J')) {
                        return self.imaginary_tail();
                    }
                    if nonzero {
                        self.one_back();
                        self.next_char_index = zeros_end;
                        return self.syntax_error_token(
                            "leading zeros in decimal integer literals are not permitted; \
                             use an 0o prefix for octal integers",
                        );
                    }
                    if let Some(err) = self.verify_end_of_number(c, "decimal") {
                        return err;
                    }
                    self.one_back_if(c);
                    self.make_token(TokenKind::Number)
                }
            }
        } else {
            let c = match self.decimal_tail() {
                Some(c) => c,
                None => return self.syntax_error_token("invalid decimal literal"),
            };
            if c == Some('.') {
                let c2 = self.next_cp();
                return self.fraction_and_rest(c2);
            }
            if let Some(e @ ('e' | 'E')) = c {
                return self.exponent_and_rest(e);
            }
            if matches!(c, Some('j' | 'J')) {
                return self.imaginary_tail();
            }
            if let Some(err) = self.verify_end_of_number(c, "decimal") {
                return err;
            }
            self.one_back_if(c);
            self.make_token(TokenKind::Number)
        }
    }

    /// Octal/binary digit runs with underscore grouping.
    fn radix_tail(&mut self, good: fn(char) -> bool, kind: &str) -> Token {
        let mut c = self.next_cp();
        loop {
            if c == Some('_') {
                c = self.next_cp();
            }
            match c {
                Some(d) if good(d) => {}
                Some(d) if d.is_ascii_digit() => {
                    self.one_back();
                    return self.syntax_error_token(&format!(
                        "invalid digit '{d}' in {kind} literal"
                    ));
                }
                _ => {
                    self.one_back_if(c);
                    return self.syntax_error_token(&format!("invalid {kind} literal"));
                }
            }
            while c.is_some_and(good) {
                c = self.next_cp();
            }
            if c != Some('_') {
                break;
            }
        }
        if let Some(d) = c.filter(|d| d.is_ascii_digit()) {
            return self.syntax_error_token(&format!("invalid digit '{d}' in {kind} literal"));
        }
        if let Some(err) = self.verify_end_of_number(c, kind) {
            return err;
        }
        self.one_back_if(c);
        self.make_token(TokenKind::Number)
    }

    /// After the decimal point; `c` is the first char past the dot.
    fn fraction_and_rest(&mut self, c: Option<char>) -> Token {
        let mut c = c;
        if c.is_some_and(|d| d.is_ascii_digit()) {
            c = match self.decimal_tail() {
                Some(c) => c,
                None => return self.syntax_error_token("invalid decimal literal"),
            };
        }
        if let Some(e @ ('e' | 'E')) = c {
            return self.exponent_and_rest(e);
        }
        if matches!(c, Some('j' | 'J')) {
            return self.imaginary_tail();
        }
        if let Some(err) = self.verify_end_of_number(c, "decimal") {
            return err;
        }
        self.one_back_if(c);
        self.make_token(TokenKind::Number)
    }

    fn exponent_and_rest(&mut self, e: char) -> Token {
        let mut c = self.next_cp();
        if matches!(c, Some('+' | '-')) {
            c = self.next_cp();
            if !c.is_some_and(|d| d.is_ascii_digit()) {
                self.one_back_if(c);
                return self.syntax_error_token("invalid decimal literal");
            }
        } else if !c.is_some_and(|d| d.is_ascii_digit()) {
            // Not an exponent after all: `10e` ends before the `e`.
            self.one_back_if(c);
            if let Some(err) = self.verify_end_of_number(Some(e), "decimal") {
                return err;
            }
            self.one_back();
            return self.make_token(TokenKind::Number);
        }
        c = match self.decimal_tail() {
            Some(c) => c,
            None => return self.syntax_error_token("invalid decimal literal"),
        };
        if matches!(c, Some('j' | 'J')) {
            return self.imaginary_tail();
        }
        if let Some(err) = self.verify_end_of_number(c, "decimal") {
            return err;
        }
        self.one_back_if(c);
        self.make_token(TokenKind::Number)
    }

    /// The `j` suffix is already consumed.
    fn imaginary_tail(&mut self) -> Token {
        let c = self.next_cp();
        if let Some(err) = self.verify_end_of_number(c, "decimal") {
            return err;
        }
        self.one_back_if(c);
        self.make_token(TokenKind::Number)
    }

    fn operator_token(&mut self, ch: char) -> Token {
        // Replacement-field delimiters of an enclosing f-string take
        // precedence over ordinary operators (so `:` starts a format spec
        // rather than `:=`).
        if let Some(top) = self.fstrings.last().copied() {
            if top.in_expr && self.brackets.len() == top.expr_bracket_depth {
                if ch == '}' {
                    self.brackets.pop();
                    if let Some(t) = self.fstrings.last_mut() {
                        t.field_depth = t.field_depth.saturating_sub(1);
                        t.in_expr = false;
                        t.in_format_spec = t.field_depth > 0;
                    }
                    return self.make_token(TokenKind::RBrace);
                }
                if ch == ':' {
                    if let Some(t) = self.fstrings.last_mut() {
                        t.in_expr = false;
                        t.in_format_spec = true;
                    }
                    return self.make_token(TokenKind::Colon);
                }
            }
        }

        // Two- and three-character operators.
        let c2 = self.next_cp();
        if let Some(c2v) = c2 {
            if let Some(kind2) = operators::two_chars(ch, c2v) {
                let c3 = self.next_cp();
                if let Some(c3v) = c3 {
                    if let Some(kind3) = operators::three_chars(ch, c2v, c3v) {
                        return self.make_token(kind3);
                    }
                }
                self.one_back_if(c3);
                return self.make_token(kind2);
            }
        }
        self.one_back_if(c2);

        // Bracket nesting bookkeeping.
        match ch {
            '(' | '[' | '{' => {
                if self.brackets.len() >= MAX_BRACKET_DEPTH {
                    return self.syntax_error_token("too many nested parentheses");
                }
                self.brackets.push(OpenBracket {
                    ch,
                    line: self.current_line_number,
                    column: self.token_start.saturating_sub(self.line_start_index) as u32,
                });
            }
            ')' | ']' | '}' => match self.brackets.pop() {
                None => {
                    return self.syntax_error_token(&format!("unmatched '{ch}'"));
                }
                Some(open) => {
                    let ok = matches!((open.ch, ch), ('(', ')') | ('[', ']') | ('{', '}'));
                    if !ok {
                        return if open.line != self.current_line_number {
                            self.syntax_error_token(&format!(
                                "closing parenthesis '{ch}' does not match opening parenthesis '{}' on line {}",
                                open.ch, open.line
                            ))
                        } else {
                            self.syntax_error_token(&format!(
                                "closing parenthesis '{ch}' does not match opening parenthesis '{}'",
                                open.ch
                            ))
                        };
                    }
                }
            },
            _ => {}
        }

        match operators::one_char(ch) {
            Some(kind) => self.make_token(kind),
            None => {
                self.done = StatusCode::BadToken;
                self.make_token(TokenKind::ErrorToken)
            }
        }
    }

    /// Register the `{` of a replacement field on the bracket stack.
    pub(crate) fn push_field_bracket(&mut self) {
        self.brackets.push(OpenBracket {
            ch: '{',
            line: self.current_line_number,
            column: self.token_start.saturating_sub(self.line_start_index) as u32,
        });
    }

    pub(crate) fn pop_field_bracket(&mut self) {
        self.brackets.pop();
    }
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

#[inline]
pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

#[inline]
fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adder_diagnostic::DiagnosticCollector;

    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new(source, &sink, LexerFlags::EXEC_INPUT);
        let mut kinds = Vec::new();
        loop {
            let t = tok.next();
            let kind = t.kind;
            kinds.push(kind);
            if matches!(kind, TokenKind::Endmarker | TokenKind::ErrorToken) {
                break;
            }
        }
        kinds
    }

    #[test]
    fn lexes_simple_expression() {
        assert_eq!(
            lex_kinds("x + 1"),
            vec![
                TokenKind::Name,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn indent_dedent_pairing() {
        let kinds = lex_kinds("if x:\n    y\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Name, // reclassification happens in the parser stream
                TokenKind::Name,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Name,
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_are_invisible() {
        let kinds = lex_kinds("x\n\n# comment\ny\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Name,
                TokenKind::Newline,
                TokenKind::Name,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn newline_injected_before_eof() {
        assert_eq!(
            lex_kinds("x"),
            vec![TokenKind::Name, TokenKind::Newline, TokenKind::Endmarker]
        );
    }

    #[test]
    fn newlines_inside_brackets_are_swallowed() {
        assert_eq!(
            lex_kinds("(1,\n 2)"),
            vec![
                TokenKind::LPar,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::RPar,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn barry_spelling() {
        let kinds = lex_kinds("a <> b");
        assert_eq!(kinds[1], TokenKind::NotEqual);
    }

    #[test]
    fn triple_quoted_string_is_one_token() {
        let kinds = lex_kinds("'''a\nb'''");
        assert_eq!(
            kinds,
            vec![TokenKind::Str, TokenKind::Newline, TokenKind::Endmarker]
        );
    }

    #[test]
    fn string_prefixes() {
        for src in ["r'x'", "b'x'", "rb'x'", "Rb'x'", "u'x'"] {
            let kinds = lex_kinds(src);
            assert_eq!(kinds[0], TokenKind::Str, "prefix case {src}");
        }
    }

    #[test]
    fn unterminated_string_reports_syntax_error() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("'abc", &sink, LexerFlags::EXEC_INPUT);
        let t = tok.next();
        assert_eq!(t.kind, TokenKind::ErrorToken);
        assert_eq!(tok.done(), StatusCode::SyntaxError);
        assert!(t
            .meta
            .as_deref()
            .is_some_and(|m| m.contains("unterminated string literal")));
    }

    #[test]
    fn misplaced_underscores_are_errors() {
        for src in ["1__0", "1_", "0x_"] {
            let sink = DiagnosticCollector::new();
            let mut tok = Tokenizer::new(src, &sink, LexerFlags::EXEC_INPUT);
            let t = tok.next();
            assert_eq!(t.kind, TokenKind::ErrorToken, "case {src}");
        }
    }

    #[test]
    fn grouped_underscores_lex_as_one_number() {
        let kinds = lex_kinds("10_000_000");
        assert_eq!(kinds[0], TokenKind::Number);
    }

    #[test]
    fn float_and_imaginary_forms() {
        for src in ["1.5", "1.", ".5", "1e10", "1E-3", "2j", "3.5J", "1_000.5"] {
            let kinds = lex_kinds(src);
            assert_eq!(kinds[0], TokenKind::Number, "case {src}");
        }
    }

    #[test]
    fn leading_zero_decimal_rejected() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("0123", &sink, LexerFlags::EXEC_INPUT);
        let t = tok.next();
        assert_eq!(t.kind, TokenKind::ErrorToken);
        assert!(t.meta.as_deref().is_some_and(|m| m.contains("leading zeros")));
    }

    #[test]
    fn bracket_stack_records_positions() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("(1, 2", &sink, LexerFlags::EXEC_INPUT);
        loop {
            let t = tok.next();
            if matches!(t.kind, TokenKind::Endmarker | TokenKind::ErrorToken) {
                break;
            }
        }
        assert_eq!(tok.bracket_depth(), 1);
        let open = tok.open_brackets()[0];
        assert_eq!((open.ch, open.line, open.column), ('(', 1, 0));
    }

    #[test]
    fn unmatched_close_is_syntax_error() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new(")", &sink, LexerFlags::EXEC_INPUT);
        let t = tok.next();
        assert_eq!(t.kind, TokenKind::ErrorToken);
        assert!(t.meta.as_deref().is_some_and(|m| m.contains("unmatched")));
    }

    #[test]
    fn mismatched_close_names_both() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("(]", &sink, LexerFlags::EXEC_INPUT);
        let _ = tok.next();
        let t = tok.next();
        assert_eq!(t.kind, TokenKind::ErrorToken);
        assert!(t.meta.as_deref().is_some_and(|m| m.contains("does not match")));
    }

    #[test]
    fn line_continuation_joins_lines() {
        assert_eq!(
            lex_kinds("1 + \\\n2"),
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Endmarker,
            ]
        );
    }

    #[test]
    fn tab_space_inconsistency() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("if x:\n\ty\n        z\n", &sink, LexerFlags::EXEC_INPUT);
        let mut saw_error = false;
        for _ in 0..32 {
            let t = tok.next();
            if t.kind == TokenKind::ErrorToken {
                saw_error = true;
                break;
            }
            if t.kind == TokenKind::Endmarker {
                break;
            }
        }
        assert!(saw_error);
        assert_eq!(tok.done(), StatusCode::TabsSpacesInconsistent);
    }

    #[test]
    fn dedent_to_unknown_level() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("if x:\n    y\n  z\n", &sink, LexerFlags::EXEC_INPUT);
        let mut status = StatusCode::Ok;
        for _ in 0..32 {
            let t = tok.next();
            if t.kind == TokenKind::ErrorToken {
                status = tok.done();
                break;
            }
            if t.kind == TokenKind::Endmarker {
                break;
            }
        }
        assert_eq!(status, StatusCode::DedentInvalid);
    }

    #[test]
    fn type_ignore_recognized() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new(
            "x # type: ignore\n",
            &sink,
            LexerFlags::EXEC_INPUT | LexerFlags::TYPE_COMMENT,
        );
        let kinds: Vec<_> = std::iter::from_fn(|| {
            let t = tok.next();
            (t.kind != TokenKind::Endmarker).then_some(t.kind)
        })
        .take(8)
        .collect();
        assert!(kinds.contains(&TokenKind::TypeIgnore));
    }

    #[test]
    fn type_comment_recognized() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new(
            "x # type: int\n",
            &sink,
            LexerFlags::EXEC_INPUT | LexerFlags::TYPE_COMMENT,
        );
        let mut found = None;
        for _ in 0..8 {
            let t = tok.next();
            if t.kind == TokenKind::TypeComment {
                found = Some(tok.token_text(&t));
                break;
            }
            if t.kind == TokenKind::Endmarker {
                break;
            }
        }
        assert_eq!(found.as_deref(), Some("int"));
    }

    #[test]
    fn bad_single_statement_detection() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("x\ny\n", &sink, LexerFlags::empty());
        // Consume the first logical line.
        loop {
            let t = tok.next();
            if t.kind == TokenKind::Newline {
                break;
            }
        }
        assert!(tok.is_bad_single_statement());
    }

    #[test]
    fn single_statement_input_is_clean() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("x\n# done\n", &sink, LexerFlags::empty());
        loop {
            let t = tok.next();
            if t.kind == TokenKind::Newline {
                break;
            }
        }
        assert!(!tok.is_bad_single_statement());
    }

    #[test]
    fn token_ranges_count_lines_from_one() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("a\nbb\n", &sink, LexerFlags::EXEC_INPUT);
        let a = tok.next();
        assert_eq!(a.range, SourceRange::new(1, 0, 1, 1));
        let _nl = tok.next();
        let b = tok.next();
        assert_eq!(b.range, SourceRange::new(2, 0, 2, 2));
    }

    #[test]
    fn force_dedent_all_flushes_stack() {
        let sink = DiagnosticCollector::new();
        let mut tok = Tokenizer::new("if x:\n    y", &sink, LexerFlags::empty());
        for _ in 0..5 {
            let _ = tok.next();
        }
        assert_eq!(tok.indent_depth(), 1);
        tok.force_dedent_all();
        assert_eq!(tok.indent_depth(), 0);
        assert_eq!(tok.next().kind, TokenKind::Dedent);
    }
}
