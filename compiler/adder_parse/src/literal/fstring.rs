//! Interpolated-string assembly and concatenation folding.
//!
//! An f-string arrives as piece tokens: literal fragments are decoded
//! (tracking raw mode from the opening quote prefix), empty fragments are
//! dropped, and replacement fields become formatted-value nodes with
//! validated conversion characters and assembled format specs. Adjacent
//! string literals of all flavors then fold: plain constants concatenate
//! into one constant inheriting the first fragment's kind tag, anything
//! involving an interpolated fragment flattens into one joined sequence,
//! and mixing bytes with text is a hard error.

use adder_diagnostic::ErrorType;
use adder_ir::{ConstantValue, Expr, ExprKind, SourceRange, Token, TokenKind};

use crate::grammar::rules;
use crate::Parser;

impl<'e> Parser<'e> {
    /// `strings: (STRING | fstring)+` with concatenation folding.
    pub(crate) fn strings(&mut self) -> Option<Expr> {
        self.memoize(rules::STRINGS, Self::strings_raw)
    }

    fn strings_raw(&mut self) -> Option<Expr> {
        let mut pieces: Vec<Expr> = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Str => {
                    let token = self.expect(TokenKind::Str)?;
                    pieces.push(self.parse_string_token(&token)?);
                }
                TokenKind::FStringStart => {
                    pieces.push(self.fstring()?);
                }
                _ => break,
            }
        }
        if pieces.is_empty() {
            return None;
        }
        let range = pieces[0].range.with_end(pieces[pieces.len() - 1].range);
        self.concatenate_strings(pieces, range)
    }

    /// One f-string: start token, decoded fragments and replacement
    /// fields, end token.
    fn fstring(&mut self) -> Option<Expr> {
        let start = self.expect(TokenKind::FStringStart)?;
        let quote_prefix = self.token_text(&start);
        let is_raw = quote_prefix.contains('r') || quote_prefix.contains('R');

        let mut raw_expressions = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::FStringMiddle => {
                    let token = self.expect(TokenKind::FStringMiddle)?;
                    raw_expressions.push(self.decode_fstring_part(is_raw, &token)?);
                }
                TokenKind::LBrace => {
                    raw_expressions.push(self.fstring_replacement_field()?);
                }
                _ => break,
            }
        }
        let end = self.expect(TokenKind::FStringEnd)?;
        self.joined_str(&start, raw_expressions, &end)
    }

    /// Decode one literal f-string fragment. A fragment that is exactly a
    /// doubled brace collapses to a single brace before decoding.
    fn decode_fstring_part(&mut self, is_raw: bool, token: &Token) -> Option<Expr> {
        let cps = self.token_codepoints(token);
        let len = if cps.len() == 2 && cps[0] == cps[1] && (cps[0] == '{' || cps[0] == '}') {
            1
        } else {
            cps.len()
        };
        let is_raw = is_raw || !cps[..len].contains(&'\\');
        let value = self.decode_string_value(&cps, is_raw, 0, len, token)?;
        Some(Expr::new(
            ExprKind::Constant { value, kind: None },
            token.range,
        ))
    }

    /// Assemble the fragment sequence of one f-string, flattening nested
    /// joins and dropping fragments that decoded to the empty string.
    fn joined_str(&mut self, start: &Token, exprs: Vec<Expr>, end: &Token) -> Option<Expr> {
        let mut flattened = Vec::with_capacity(exprs.len());
        for expr in exprs {
            if let ExprKind::JoinedStr { values } = expr.kind {
                flattened.extend(values);
            } else {
                flattened.push(expr);
            }
        }
        let values: Vec<Expr> = flattened
            .into_iter()
            .filter(|item| {
                !matches!(&item.kind, ExprKind::Constant { value, .. } if value.is_empty_str())
            })
            .collect();
        Some(Expr::new(
            ExprKind::JoinedStr { values },
            start.range.with_end(end.range),
        ))
    }

    /// `'{' star_expressions ['!' NAME] [':' format_spec] '}'`
    fn fstring_replacement_field(&mut self) -> Option<Expr> {
        let open = self.expect(TokenKind::LBrace)?;
        let value = match self.star_expressions() {
            Some(expr) => expr,
            None => {
                if self.call_invalid_rules && !self.error_indicator {
                    return self
                        .raise_syntax_error("f-string: expecting a valid expression after '{'");
                }
                return None;
            }
        };

        let mut conversion = None;
        if let Some(excl) = self.expect(TokenKind::Exclamation) {
            let conv_token = match self.expect(TokenKind::Name) {
                Some(token) => token,
                None => {
                    if self.call_invalid_rules && !self.error_indicator {
                        return self.raise_syntax_error("f-string: missing conversion character");
                    }
                    return None;
                }
            };
            // The conversion character must sit right after the mark.
            if excl.range.end_line != conv_token.range.start_line
                || excl.range.end_column != conv_token.range.start_column
            {
                return self.raise_syntax_error_known_location(
                    excl.range.with_end(conv_token.range),
                    "f-string: conversion type must come right after the exclamanation mark",
                );
            }
            let text = self.token_text(&conv_token);
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c @ ('s' | 'r' | 'a')), None) => conversion = Some(c),
                _ => {
                    return self.raise_syntax_error_known_location(
                        conv_token.range,
                        &format!(
                            "f-string: invalid conversion character '{text}': \
                             expected 's', 'r', or 'a'"
                        ),
                    );
                }
            }
        }

        let format_spec = if let Some(colon) = self.expect(TokenKind::Colon) {
            Some(Box::new(self.fstring_full_format_spec(&colon)?))
        } else {
            None
        };

        let close = match self.expect(TokenKind::RBrace) {
            Some(token) => token,
            None => {
                if self.call_invalid_rules && !self.error_indicator {
                    return self
                        .raise_syntax_error_starting_from(open.range, "f-string: expecting '}'");
                }
                return None;
            }
        };
        Some(Expr::new(
            ExprKind::FormattedValue {
                value: Box::new(value),
                conversion,
                format_spec,
            },
            open.range.with_end(close.range),
        ))
    }

    /// Format spec after the `:`: literal fragments and nested fields. An
    /// empty spec must produce an empty fragment sequence, not a
    /// one-element sequence holding an empty string.
    fn fstring_full_format_spec(&mut self, colon: &Token) -> Option<Expr> {
        let mut spec = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::FStringMiddle => {
                    let token = self.expect(TokenKind::FStringMiddle)?;
                    let cps = self.token_codepoints(&token);
                    let raw = !cps.contains(&'\\');
                    let len = cps.len();
                    let value = self.decode_string_value(&cps, raw, 0, len, &token)?;
                    spec.push(Expr::new(
                        ExprKind::Constant { value, kind: None },
                        token.range,
                    ));
                }
                TokenKind::LBrace => spec.push(self.fstring_replacement_field()?),
                _ => break,
            }
        }
        let fixed: Vec<Expr> = if spec.len() == 1
            && matches!(&spec[0].kind, ExprKind::Constant { value, .. } if value.is_empty_str())
        {
            Vec::new()
        } else {
            spec
        };
        let range = colon.range.with_end(self.last_consumed_range());
        if fixed.is_empty() || (fixed.len() == 1 && matches!(fixed[0].kind, ExprKind::Constant { .. }))
        {
            Some(Expr::new(ExprKind::JoinedStr { values: fixed }, range))
        } else {
            self.concatenate_strings(fixed, range)
        }
    }

    /// Fold a run of adjacent string literals.
    pub(crate) fn concatenate_strings(
        &mut self,
        strings: Vec<Expr>,
        range: SourceRange,
    ) -> Option<Expr> {
        let mut f_string_found = false;
        let mut unicode_found = false;
        let mut bytes_found = false;
        for elem in &strings {
            match &elem.kind {
                ExprKind::Constant { value, .. } => {
                    if value.is_bytes() {
                        bytes_found = true;
                    } else {
                        unicode_found = true;
                    }
                }
                _ => f_string_found = true,
            }
        }

        if (unicode_found || f_string_found) && bytes_found {
            return self.raise_error_known_location(
                ErrorType::Value,
                range,
                "cannot mix bytes and nonbytes literals",
            );
        }

        if bytes_found {
            let kind = match &strings[0].kind {
                ExprKind::Constant { kind, .. } => kind.clone(),
                _ => None,
            };
            let mut folded = Vec::new();
            for elem in &strings {
                if let ExprKind::Constant {
                    value: ConstantValue::Bytes(bytes),
                    ..
                } = &elem.kind
                {
                    folded.extend_from_slice(bytes);
                }
            }
            return Some(Expr::new(
                ExprKind::Constant {
                    value: ConstantValue::Bytes(folded),
                    kind,
                },
                range,
            ));
        }

        if !f_string_found && strings.len() == 1 {
            return strings.into_iter().next();
        }

        let mut flattened = Vec::with_capacity(strings.len());
        for elem in strings {
            if let ExprKind::JoinedStr { values } = elem.kind {
                flattened.extend(values);
            } else {
                flattened.push(elem);
            }
        }

        // Fold runs of adjacent constants; drop empties when interpolation
        // is involved so formatted values don't pick up phantom fragments.
        let mut values: Vec<Expr> = Vec::new();
        let mut iter = flattened.into_iter().peekable();
        while let Some(elem) = iter.next() {
            if let ExprKind::Constant { .. } = &elem.kind {
                let folded = if iter
                    .peek()
                    .is_some_and(|next| matches!(next.kind, ExprKind::Constant { .. }))
                {
                    let (first_kind, start_range) = match &elem.kind {
                        ExprKind::Constant { kind, .. } => (kind.clone(), elem.range),
                        _ => (None, elem.range),
                    };
                    let mut text = String::new();
                    let mut end_range = elem.range;
                    append_str_constant(&elem, &mut text);
                    while iter
                        .peek()
                        .is_some_and(|next| matches!(next.kind, ExprKind::Constant { .. }))
                    {
                        if let Some(next) = iter.next() {
                            end_range = next.range;
                            append_str_constant(&next, &mut text);
                        }
                    }
                    Expr::new(
                        ExprKind::Constant {
                            value: ConstantValue::Str(text),
                            kind: first_kind,
                        },
                        start_range.with_end(end_range),
                    )
                } else {
                    elem
                };
                let is_empty = matches!(
                    &folded.kind,
                    ExprKind::Constant { value, .. } if value.is_empty_str()
                );
                if f_string_found && is_empty {
                    continue;
                }
                values.push(folded);
            } else {
                values.push(elem);
            }
        }

        if !f_string_found {
            debug_assert_eq!(values.len(), 1, "plain concatenation folds to one constant");
            return values.into_iter().next();
        }
        Some(Expr::new(ExprKind::JoinedStr { values }, range))
    }
}

fn append_str_constant(expr: &Expr, out: &mut String) {
    if let ExprKind::Constant {
        value: ConstantValue::Str(s),
        ..
    } = &expr.kind
    {
        out.push_str(s);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use crate::{parse, InputType, ParserFlags, DEFAULT_FEATURE_VERSION};
    use adder_diagnostic::{DiagnosticCollector, ErrorType};
    use adder_ir::{ConstantValue, Expr, ExprKind, ModTy};
    use pretty_assertions::assert_eq;

    fn eval(source: &str) -> (Option<Expr>, DiagnosticCollector) {
        let sink = DiagnosticCollector::new();
        let result = parse(
            source,
            InputType::Eval,
            &sink,
            ParserFlags::empty(),
            DEFAULT_FEATURE_VERSION,
        );
        let body = result.and_then(|m| match m {
            ModTy::Expression { body, .. } => Some(*body),
            _ => None,
        });
        (body, sink)
    }

    fn eval_ok(source: &str) -> Expr {
        let (body, sink) = eval(source);
        assert!(!sink.has_errors(), "unexpected errors: {:?}", sink.errors());
        body.expect("expression")
    }

    fn joined_values(expr: Expr) -> Vec<Expr> {
        match expr.kind {
            ExprKind::JoinedStr { values } => values,
            other => panic!("expected joined string, got {other:?}"),
        }
    }

    #[test]
    fn plain_fstring_decodes_fragments() {
        let values = joined_values(eval_ok(r"f'a\n{x}b'"));
        assert_eq!(values.len(), 3);
        assert!(matches!(
            &values[0].kind,
            ExprKind::Constant { value: ConstantValue::Str(s), .. } if s == "a\n"
        ));
        assert!(matches!(values[1].kind, ExprKind::FormattedValue { .. }));
    }

    #[test]
    fn raw_fstring_keeps_backslashes() {
        let values = joined_values(eval_ok(r"rf'a\n{x}'"));
        assert!(matches!(
            &values[0].kind,
            ExprKind::Constant { value: ConstantValue::Str(s), .. } if s == "a\\n"
        ));
    }

    #[test]
    fn doubled_braces_collapse() {
        let values = joined_values(eval_ok("f'a{{b'"));
        let texts: Vec<String> = values
            .iter()
            .map(|v| match &v.kind {
                ExprKind::Constant {
                    value: ConstantValue::Str(s),
                    ..
                } => s.clone(),
                other => panic!("expected constant, got {other:?}"),
            })
            .collect();
        assert_eq!(texts.join("|"), "a|{|b");
    }

    #[test]
    fn expression_only_fstring_has_no_phantom_fragments() {
        let values = joined_values(eval_ok("f'{x}'"));
        assert_eq!(values.len(), 1);
        assert!(matches!(values[0].kind, ExprKind::FormattedValue { .. }));
    }

    #[test]
    fn conversion_character() {
        let values = joined_values(eval_ok("f'{x!r}'"));
        let ExprKind::FormattedValue { conversion, .. } = &values[0].kind else {
            panic!("expected formatted value");
        };
        assert_eq!(*conversion, Some('r'));
    }

    #[test]
    fn invalid_conversion_character_is_error() {
        let (body, sink) = eval("f'{x!z}'");
        assert!(body.is_none());
        assert!(sink
            .errors()
            .iter()
            .any(|d| d.message.contains("invalid conversion character")));
    }

    #[test]
    fn format_spec_is_joined_str() {
        let values = joined_values(eval_ok("f'{x:>10}'"));
        let ExprKind::FormattedValue { format_spec, .. } = &values[0].kind else {
            panic!("expected formatted value");
        };
        let spec = format_spec.as_ref().expect("format spec");
        let ExprKind::JoinedStr { values: spec_values } = &spec.kind else {
            panic!("expected joined spec");
        };
        assert_eq!(spec_values.len(), 1);
    }

    #[test]
    fn empty_format_spec_is_empty_sequence() {
        let values = joined_values(eval_ok("f'{x:}'"));
        let ExprKind::FormattedValue { format_spec, .. } = &values[0].kind else {
            panic!("expected formatted value");
        };
        let spec = format_spec.as_ref().expect("format spec");
        let ExprKind::JoinedStr { values: spec_values } = &spec.kind else {
            panic!("expected joined spec");
        };
        assert!(spec_values.is_empty());
    }

    #[test]
    fn nested_spec_field() {
        let values = joined_values(eval_ok("f'{x:{w}}'"));
        let ExprKind::FormattedValue { format_spec, .. } = &values[0].kind else {
            panic!("expected formatted value");
        };
        assert!(format_spec.is_some());
    }

    #[test]
    fn adjacent_plain_strings_fold() {
        let expr = eval_ok("'a' 'b'");
        assert!(matches!(
            &expr.kind,
            ExprKind::Constant { value: ConstantValue::Str(s), .. } if s == "ab"
        ));
    }

    #[test]
    fn folded_kind_comes_from_first_fragment() {
        let expr = eval_ok("u'a' 'b'");
        let ExprKind::Constant { kind, .. } = &expr.kind else {
            panic!("expected constant");
        };
        assert_eq!(kind.as_deref(), Some("u"));
    }

    #[test]
    fn bytes_concatenate() {
        let expr = eval_ok("b'a' b'b'");
        assert!(matches!(
            &expr.kind,
            ExprKind::Constant { value: ConstantValue::Bytes(b), .. } if b == b"ab"
        ));
    }

    #[test]
    fn mixing_bytes_and_text_is_value_error() {
        let (body, sink) = eval("b'a' 'b'");
        assert!(body.is_none());
        assert!(sink
            .errors()
            .iter()
            .any(|d| d.error_type == Some(ErrorType::Value)
                && d.message.contains("cannot mix bytes and nonbytes literals")));
    }

    #[test]
    fn string_fstring_concat_flattens() {
        let values = joined_values(eval_ok("'a' f'{x}' 'b'"));
        assert_eq!(values.len(), 3);
        assert!(matches!(values[1].kind, ExprKind::FormattedValue { .. }));
    }

    #[test]
    fn concat_reducing_to_single_constant() {
        // Both fragments are literal; the interpolation-free fold returns
        // one plain constant.
        let expr = eval_ok("'a' 'b' 'c'");
        assert!(matches!(
            &expr.kind,
            ExprKind::Constant { value: ConstantValue::Str(s), .. } if s == "abc"
        ));
    }

    #[test]
    fn fstring_concat_drops_empty_literals() {
        let values = joined_values(eval_ok("'' f'{x}' ''"));
        assert_eq!(values.len(), 1);
    }
}
