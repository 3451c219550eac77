//! String and bytes literal decoding.
//!
//! Prefix scanning (`b`/`r`/`u` in any legal combination), raw-mode copy,
//! and escape-run processing: C-style escapes, line continuation, octal
//! (1-3 digits), hex escapes fixed at 2/4/8 digits for `\x`/`\u`/`\U`, and
//! `\N{NAME}` resolved against the control-character name table first and
//! an embedder-supplied Unicode name database second. An unrecognized
//! escape decodes to a literal backslash plus the character, with one
//! deprecation/syntax warning per literal, suppressed during the
//! diagnostic re-parse to avoid double reporting.

use adder_diagnostic::ErrorType;
use adder_ir::{ConstantValue, Expr, ExprKind, Token, TokenKind};

use crate::Parser;

impl<'e> Parser<'e> {
    /// Decode a complete string token (prefix and quotes included) into a
    /// constant expression.
    pub(crate) fn parse_string_token(&mut self, token: &Token) -> Option<Expr> {
        let cps = self.token_codepoints(token);
        let kind = if cps.first() == Some(&'u') {
            Some("u".to_string())
        } else {
            None
        };

        let mut s = 0usize;
        let mut bytesmode = false;
        let mut rawmode = false;
        let mut quote = *cps.get(s)?;
        while !bytesmode || !rawmode {
            if quote == 'b' || quote == 'B' {
                s += 1;
                quote = *cps.get(s)?;
                bytesmode = true;
            } else if quote == 'u' || quote == 'U' {
                s += 1;
                quote = *cps.get(s)?;
            } else if quote == 'r' || quote == 'R' {
                s += 1;
                quote = *cps.get(s)?;
                rawmode = true;
            } else {
                break;
            }
        }
        debug_assert!(quote == '\'' || quote == '"');
        s += 1;
        let mut len = cps.len().checked_sub(s)?.checked_sub(1)?;
        debug_assert_eq!(cps.get(s + len), Some(&quote), "last quote must match");
        if len >= 4 && cps[s] == quote && cps[s + 1] == quote {
            // Triple-quoted: strip the extra pair on both ends.
            s += 2;
            len -= 4;
        }
        // Skip escape decoding entirely when there is nothing to decode.
        let rawmode = rawmode || !cps[s..s + len].contains(&'\\');

        let value = if bytesmode {
            if rawmode {
                let mut bytes = Vec::with_capacity(len);
                for &cp in &cps[s..s + len] {
                    if cp as u32 >= 0x80 {
                        return self.raise_syntax_error_known_location(
                            token.range,
                            "bytes can only contain ASCII literal characters",
                        );
                    }
                    bytes.push(cp as u8);
                }
                ConstantValue::Bytes(bytes)
            } else {
                ConstantValue::Bytes(self.decode_bytes_with_escapes(&cps, s, len, token)?)
            }
        } else {
            self.decode_string_value(&cps, rawmode, s, len, token)?
        };
        Some(Expr::new(
            ExprKind::Constant { value, kind },
            token.range,
        ))
    }

    /// Decode a run of string content: verbatim copy in raw mode, escape
    /// processing otherwise.
    pub(crate) fn decode_string_value(
        &mut self,
        cps: &[char],
        raw: bool,
        start: usize,
        len: usize,
        token: &Token,
    ) -> Option<ConstantValue> {
        if raw {
            return Some(ConstantValue::Str(cps[start..start + len].iter().collect()));
        }
        self.decode_unicode_with_escapes(cps, start, len, token)
            .map(ConstantValue::Str)
    }

    fn decode_unicode_with_escapes(
        &mut self,
        cps: &[char],
        start: usize,
        len: usize,
        token: &Token,
    ) -> Option<String> {
        let end = start + len;
        let mut out = String::with_capacity(len);
        let mut emitted_warning = false;
        let mut i = start;
        while i < end {
            let c = cps[i];
            if c != '\\' {
                out.push(c);
                i += 1;
                continue;
            }
            if i + 1 >= end {
                // Lone backslash at the end; occurs in f-string fragments.
                out.push('\\');
                break;
            }
            let next_index = self.process_escape_sequence(cps, i + 1, end, &mut out, token)?;
            if next_index == i + 1 {
                // Unrecognized escape: literal backslash, one warning.
                out.push('\\');
                if !emitted_warning {
                    emitted_warning = true;
                    self.warn_invalid_escape_sequence(cps, i + 1, token);
                }
            }
            i = next_index;
        }
        Some(out)
    }

    /// Process one escape after the backslash. Returns the index after the
    /// escape, or the start index unchanged for unrecognized escapes.
    fn process_escape_sequence(
        &mut self,
        cps: &[char],
        start_index: usize,
        end: usize,
        out: &mut String,
        token: &Token,
    ) -> Option<usize> {
        let cp = cps[start_index];
        let i = start_index + 1;
        match cp {
            '\\' => {
                out.push('\\');
                Some(i)
            }
            'a' => {
                out.push('\u{0007}');
                Some(i)
            }
            'b' => {
                out.push('\u{0008}');
                Some(i)
            }
            'f' => {
                out.push('\u{000c}');
                Some(i)
            }
            'n' => {
                out.push('\n');
                Some(i)
            }
            'r' => {
                out.push('\r');
                Some(i)
            }
            't' => {
                out.push('\t');
                Some(i)
            }
            'v' => {
                out.push('\u{000b}');
                Some(i)
            }
            '"' => {
                out.push('"');
                Some(i)
            }
            '\'' => {
                out.push('\'');
                Some(i)
            }
            // Backslash-newline decodes to nothing.
            '\n' => Some(i),
            '0'..='7' => {
                let mut value = cp as u32 - '0' as u32;
                let mut i = i;
                if let Some(d) = octal_digit(cps, i, end) {
                    value = value * 8 + d;
                    i += 1;
                    if let Some(d) = octal_digit(cps, i, end) {
                        value = value * 8 + d;
                        i += 1;
                    }
                }
                match char::from_u32(value) {
                    Some(ch) => out.push(ch),
                    None => out.push('\u{fffd}'),
                }
                Some(i)
            }
            'x' => {
                let value = self.hex_escape_value(cps, i, end, 2, token)?;
                match char::from_u32(value) {
                    Some(ch) => out.push(ch),
                    None => {
                        return self.raise_encoding_error(
                            token,
                            &format!(
                                "(unicode error) 'unicodeescape' codec can't decode bytes in \
                                 position {}-{}: illegal Unicode character",
                                i as isize - 2,
                                i + 1
                            ),
                        );
                    }
                }
                Some(i + 2)
            }
            'u' => {
                let value = self.hex_escape_value(cps, i, end, 4, token)?;
                match char::from_u32(value) {
                    Some(ch) => out.push(ch),
                    None => {
                        return self.raise_encoding_error(
                            token,
                            &format!(
                                "(unicode error) 'unicodeescape' codec can't decode bytes in \
                                 position {}-{}: illegal Unicode character",
                                i as isize - 2,
                                i + 3
                            ),
                        );
                    }
                }
                Some(i + 4)
            }
            'U' => {
                let value = self.hex_escape_value(cps, i, end, 8, token)?;
                match char::from_u32(value) {
                    Some(ch) => out.push(ch),
                    None => {
                        return self.raise_encoding_error(
                            token,
                            &format!(
                                "(unicode error) 'unicodeescape' codec can't decode bytes in \
                                 position {}-{}: illegal Unicode character",
                                i as isize - 2,
                                i + 7
                            ),
                        );
                    }
                }
                Some(i + 8)
            }
            'N' => self.named_character_escape(cps, i, end, out, token),
            _ => Some(start_index),
        }
    }

    /// Fixed-width hex escape value; reports the exact expected width when
    /// truncated or malformed.
    fn hex_escape_value(
        &mut self,
        cps: &[char],
        start: usize,
        end: usize,
        width: usize,
        token: &Token,
    ) -> Option<u32> {
        let mut result = 0u32;
        for index in start..start + width {
            let digit = if index < end {
                cps[index].to_digit(16)
            } else {
                None
            };
            match digit {
                Some(d) => result = result * 16 + d,
                None => {
                    let what = match width {
                        2 => "truncated \\xXX escape",
                        4 => "truncated \\uXXXX escape",
                        _ => "truncated \\UXXXXXXXX escape",
                    };
                    return self.raise_encoding_error(
                        token,
                        &format!(
                            "(unicode error) 'unicodeescape' codec can't decode bytes in \
                             position {}-{}: {}",
                            start as isize - 2,
                            index as isize - 1,
                            what
                        ),
                    );
                }
            }
        }
        Some(result)
    }

    /// `\N{NAME}`: control-character names first, then the pluggable
    /// Unicode name database.
    fn named_character_escape(
        &mut self,
        cps: &[char],
        offset: usize,
        end: usize,
        out: &mut String,
        token: &Token,
    ) -> Option<usize> {
        if offset >= end || cps[offset] != '{' {
            return self.raise_encoding_error(
                token,
                &format!(
                    "(unicode error) 'unicodeescape' codec can't decode bytes in position \
                     {}-{}: malformed \\N character escape",
                    offset as isize - 2,
                    offset as isize - 1
                ),
            );
        }
        let close = cps[offset + 1..end].iter().position(|&c| c == '}');
        let Some(rel_close) = close else {
            return self.raise_encoding_error(
                token,
                &format!(
                    "(unicode error) 'unicodeescape' codec can't decode bytes in position \
                     {}-{}: malformed \\N character escape",
                    offset as isize - 2,
                    offset as isize - 1
                ),
            );
        };
        let close_index = offset + 1 + rel_close;
        let name: String = cps[offset + 1..close_index]
            .iter()
            .collect::<String>()
            .to_uppercase();
        let resolved = control_char_name(&name)
            .or_else(|| self.unicode_names.and_then(|db| db.lookup(&name)));
        match resolved {
            Some(ch) => {
                out.push(ch);
                Some(close_index + 1)
            }
            None => self.raise_encoding_error(
                token,
                &format!(
                    "(unicode error) 'unicodeescape' codec can't decode bytes in position \
                     {}-{}: unknown Unicode character name",
                    offset as isize - 2,
                    close_index
                ),
            ),
        }
    }

    /// Bytes-literal escape decoding; rejects any codepoint ≥ 0x80.
    pub(crate) fn decode_bytes_with_escapes(
        &mut self,
        cps: &[char],
        s_input: usize,
        len: usize,
        token: &Token,
    ) -> Option<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        let mut s = s_input;
        let end = s_input + len;
        let mut emitted_warning = false;
        while s < end {
            let c = cps[s];
            s += 1;
            if c != '\\' {
                if c as u32 >= 0x80 {
                    return self.raise_syntax_error_known_location(
                        token.range,
                        "bytes can only contain ASCII literal characters",
                    );
                }
                out.push(c as u8);
                continue;
            }
            if s == end {
                return self.raise_error_known_location(
                    ErrorType::Value,
                    token.range,
                    "Trailing \\ in string",
                );
            }
            let c = cps[s];
            s += 1;
            match c {
                '\n' => {}
                '\\' => out.push(b'\\'),
                '\'' => out.push(b'\''),
                '"' => out.push(b'"'),
                'b' => out.push(0x08),
                'f' => out.push(0x0c),
                't' => out.push(b'\t'),
                'n' => out.push(b'\n'),
                'r' => out.push(b'\r'),
                'v' => out.push(0x0b),
                'a' => out.push(0x07),
                '0'..='7' => {
                    let mut value = c as u32 - '0' as u32;
                    if let Some(d) = octal_digit(cps, s, end) {
                        value = (value << 3) + d;
                        s += 1;
                        if let Some(d) = octal_digit(cps, s, end) {
                            value = (value << 3) + d;
                            s += 1;
                        }
                    }
                    if value > 255 && !emitted_warning {
                        emitted_warning = true;
                        self.warn_invalid_escape_sequence(cps, s - 3, token);
                    }
                    out.push((value & 0xff) as u8);
                }
                'x' => {
                    let d1 = if s < end { cps[s].to_digit(16) } else { None };
                    let d2 = if s + 1 < end { cps[s + 1].to_digit(16) } else { None };
                    if let (Some(d1), Some(d2)) = (d1, d2) {
                        out.push((d1 << 4 | d2) as u8);
                        s += 2;
                    } else {
                        let position = s as isize - 2 - (end as isize - len as isize);
                        return self.raise_error_known_location(
                            ErrorType::Value,
                            token.range,
                            &format!("invalid \\x escape at position {position}"),
                        );
                    }
                }
                _ => {
                    if !emitted_warning {
                        emitted_warning = true;
                        self.warn_invalid_escape_sequence(cps, s - 1, token);
                    }
                    out.push(b'\\');
                    s -= 1;
                }
            }
        }
        Some(out)
    }

    fn raise_encoding_error<T>(&mut self, token: &Token, message: &str) -> Option<T> {
        self.raise_error_known_location(ErrorType::Encoding, token.range, message)
    }

    /// Deprecated-escape warning, at most once per literal; suppressed
    /// entirely on the diagnostic re-parse.
    pub(crate) fn warn_invalid_escape_sequence(
        &mut self,
        cps: &[char],
        first_invalid: usize,
        token: &Token,
    ) {
        if self.call_invalid_rules {
            return;
        }
        let c = cps.get(first_invalid).copied().unwrap_or('\\');
        if matches!(token.kind, TokenKind::FStringMiddle | TokenKind::FStringEnd)
            && (c == '{' || c == '}')
        {
            // The tokenizer already warned for stray braces.
            return;
        }
        let category = if self.feature_version >= 12 {
            adder_diagnostic::WarningType::Syntax
        } else {
            adder_diagnostic::WarningType::Deprecation
        };
        let message = if ('4'..='7').contains(&c) {
            let c2 = cps.get(first_invalid + 1).copied().unwrap_or(' ');
            let c3 = cps.get(first_invalid + 2).copied().unwrap_or(' ');
            format!("invalid octal escape sequence '\\{c}{c2}{c3}'")
        } else {
            format!("invalid escape sequence '\\{c}'")
        };
        self.warn(category, token.range, &message);
    }
}

fn octal_digit(cps: &[char], index: usize, end: usize) -> Option<u32> {
    if index < end {
        let c = cps[index];
        if ('0'..='7').contains(&c) {
            return Some(c as u32 - '0' as u32);
        }
    }
    None
}

/// Names of the control characters (and the byte order mark), which the
/// Unicode character database proper does not name.
fn control_char_name(name: &str) -> Option<char> {
    Some(match name {
        "NULL" => '\u{0000}',
        "START OF HEADING" => '\u{0001}',
        "START OF TEXT" => '\u{0002}',
        "END OF TEXT" => '\u{0003}',
        "END OF TRANSMISSION" => '\u{0004}',
        "ENQUIRY" => '\u{0005}',
        "ACKNOWLEDGE" => '\u{0006}',
        "BELL" => '\u{0007}',
        "BACKSPACE" => '\u{0008}',
        "CHARACTER TABULATION" => '\u{0009}',
        "LINE FEED" => '\u{000A}',
        "LINE TABULATION" => '\u{000B}',
        "FORM FEED" => '\u{000C}',
        "CARRIAGE RETURN" => '\u{000D}',
        "SHIFT OUT" => '\u{000E}',
        "SHIFT IN" => '\u{000F}',
        "DATA LINK ESCAPE" => '\u{0010}',
        "DEVICE CONTROL ONE" => '\u{0011}',
        "DEVICE CONTROL TWO" => '\u{0012}',
        "DEVICE CONTROL THREE" => '\u{0013}',
        "DEVICE CONTROL FOUR" => '\u{0014}',
        "NEGATIVE ACKNOWLEDGE" => '\u{0015}',
        "SYNCHRONOUS IDLE" => '\u{0016}',
        "END OF TRANSMISSION BLOCK" => '\u{0017}',
        "CANCEL" => '\u{0018}',
        "END OF MEDIUM" => '\u{0019}',
        "SUBSTITUTE" => '\u{001A}',
        "ESCAPE" => '\u{001B}',
        "INFORMATION SEPARATOR FOUR" => '\u{001C}',
        "INFORMATION SEPARATOR THREE" => '\u{001D}',
        "INFORMATION SEPARATOR TWO" => '\u{001E}',
        "INFORMATION SEPARATOR ONE" => '\u{001F}',
        "BYTE ORDER MARK" => '\u{FEFF}',
        _ => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use crate::{parse, InputType, Parser, ParserFlags, DEFAULT_FEATURE_VERSION};
    use adder_diagnostic::{DiagnosticCollector, ErrorType, WarningType};
    use adder_ir::{ConstantValue, ExprKind, ModTy};
    use pretty_assertions::assert_eq;

    fn eval_with(source: &str) -> (Option<ConstantValue>, DiagnosticCollector) {
        let sink = DiagnosticCollector::new();
        let result = parse(
            source,
            InputType::Eval,
            &sink,
            ParserFlags::empty(),
            DEFAULT_FEATURE_VERSION,
        );
        let value = result.and_then(|m| match m {
            ModTy::Expression { body, .. } => match body.kind {
                ExprKind::Constant { value, .. } => Some(value),
                _ => None,
            },
            _ => None,
        });
        (value, sink)
    }

    fn eval_str(source: &str) -> String {
        let (value, sink) = eval_with(source);
        assert!(!sink.has_errors(), "unexpected errors: {:?}", sink.errors());
        match value.expect("constant") {
            ConstantValue::Str(s) => s,
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn plain_and_raw_strings() {
        assert_eq!(eval_str(r"'a\nb'"), "a\nb");
        assert_eq!(eval_str(r"r'a\nb'"), "a\\nb");
    }

    #[test]
    fn triple_quoted_keeps_newlines() {
        assert_eq!(eval_str("'''a\nb'''"), "a\nb");
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(eval_str(r"'\t\r\v\f\a\b\\'"), "\t\r\u{b}\u{c}\u{7}\u{8}\\");
        assert_eq!(eval_str(r#"'\"\''"#), "\"'");
    }

    #[test]
    fn line_continuation_decodes_to_nothing() {
        assert_eq!(eval_str("'a\\\nb'"), "ab");
    }

    #[test]
    fn octal_escapes() {
        assert_eq!(eval_str(r"'\0'"), "\0");
        assert_eq!(eval_str(r"'\101'"), "A");
        assert_eq!(eval_str(r"'\1018'"), "A8");
    }

    #[test]
    fn hex_escapes() {
        assert_eq!(eval_str(r"'\x41'"), "A");
        assert_eq!(eval_str(r"'A'"), "A");
        assert_eq!(eval_str(r"'\U00000041'"), "A");
        assert_eq!(eval_str(r"'\U0001F40D'"), "\u{1F40D}");
    }

    #[test]
    fn named_escape_from_control_table() {
        assert_eq!(eval_str(r"'\N{BELL}'"), "\u{7}");
        assert_eq!(eval_str(r"'\N{byte order mark}'"), "\u{FEFF}");
    }

    #[test]
    fn unknown_name_is_encoding_error() {
        let (value, sink) = eval_with(r"'\N{NO SUCH CHARACTER}'");
        assert!(value.is_none());
        assert!(sink
            .errors()
            .iter()
            .any(|d| d.error_type == Some(ErrorType::Encoding)
                && d.message.contains("unknown Unicode character name")));
    }

    #[test]
    fn pluggable_name_source() {
        struct Snake;
        impl crate::UnicodeNameSource for Snake {
            fn lookup(&self, name: &str) -> Option<char> {
                (name == "SNAKE").then_some('\u{1F40D}')
            }
        }
        let sink = DiagnosticCollector::new();
        let source = Snake;
        let result = Parser::new(
            r"'\N{snake}'",
            &sink,
            InputType::Eval,
            ParserFlags::empty(),
            DEFAULT_FEATURE_VERSION,
        )
        .with_unicode_name_source(&source)
        .parse();
        assert!(!sink.has_errors());
        let Some(ModTy::Expression { body, .. }) = result else {
            panic!("expected expression");
        };
        assert!(matches!(
            body.kind,
            ExprKind::Constant {
                value: ConstantValue::Str(ref s),
                ..
            } if s == "\u{1F40D}"
        ));
    }

    #[test]
    fn truncated_hex_escape_names_width() {
        let (value, sink) = eval_with(r"'\x4'");
        assert!(value.is_none());
        assert!(sink
            .errors()
            .iter()
            .any(|d| d.error_type == Some(ErrorType::Encoding)
                && d.message.contains("truncated \\xXX escape")));

        let (_, sink) = eval_with(r"'\uDEFG'");
        assert!(sink
            .errors()
            .iter()
            .any(|d| d.message.contains("truncated \\uXXXX escape")));

        let (_, sink) = eval_with(r"'\U0001'");
        assert!(sink
            .errors()
            .iter()
            .any(|d| d.message.contains("truncated \\UXXXXXXXX escape")));
    }

    #[test]
    fn unrecognized_escape_warns_once() {
        let (value, sink) = eval_with(r"'\q\w'");
        assert_eq!(value, Some(ConstantValue::Str("\\q\\w".to_string())));
        assert!(!sink.has_errors());
        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].warning_type, Some(WarningType::Syntax));
        assert!(warnings[0].message.contains("invalid escape sequence '\\q'"));
    }

    #[test]
    fn warning_category_depends_on_feature_version() {
        let sink = DiagnosticCollector::new();
        let _ = parse(r"'\q'", InputType::Eval, &sink, ParserFlags::empty(), 8);
        let warnings = sink.warnings();
        assert_eq!(warnings[0].warning_type, Some(WarningType::Deprecation));
    }

    #[test]
    fn bytes_literals() {
        let (value, sink) = eval_with(r"b'ab\x00'");
        assert!(!sink.has_errors());
        assert_eq!(value, Some(ConstantValue::Bytes(vec![b'a', b'b', 0])));
    }

    #[test]
    fn raw_bytes_copy_verbatim() {
        let (value, _) = eval_with(r"rb'a\nb'");
        assert_eq!(
            value,
            Some(ConstantValue::Bytes(b"a\\nb".to_vec()))
        );
    }

    #[test]
    fn bytes_reject_non_ascii() {
        let (value, sink) = eval_with("b'é'");
        assert!(value.is_none());
        assert!(sink
            .errors()
            .iter()
            .any(|d| d.message.contains("bytes can only contain ASCII literal characters")));
    }

    #[test]
    fn bytes_invalid_hex_escape_is_value_error() {
        let (value, sink) = eval_with(r"b'\xZZ'");
        assert!(value.is_none());
        assert!(sink
            .errors()
            .iter()
            .any(|d| d.error_type == Some(ErrorType::Value)
                && d.message.contains("invalid \\x escape")));
    }

    #[test]
    fn u_prefix_sets_constant_kind() {
        let sink = DiagnosticCollector::new();
        let result = parse(
            "u'a'",
            InputType::Eval,
            &sink,
            ParserFlags::empty(),
            DEFAULT_FEATURE_VERSION,
        );
        let Some(ModTy::Expression { body, .. }) = result else {
            panic!("expected expression");
        };
        let ExprKind::Constant { kind, .. } = body.kind else {
            panic!("expected constant");
        };
        assert_eq!(kind.as_deref(), Some("u"));
    }
}
