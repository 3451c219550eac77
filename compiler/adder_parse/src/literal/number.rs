//! Numeric literal decoding.
//!
//! Base detection from the `0x`/`0o`/`0b` prefix, float and complex form
//! detection, then digit-by-digit accumulation in a fixed-width signed
//! accumulator. Both multiply- and add-overflow are checked before they
//! would occur; the first would-be overflow switches the remainder of the
//! literal to arbitrary-precision accumulation.

use adder_diagnostic::ErrorType;
use adder_ir::{ConstantValue, Expr, ExprKind, TokenKind};
use num_bigint::BigInt;

use crate::Parser;

impl<'e> Parser<'e> {
    /// Decode the number token at the cursor into a constant expression.
    pub(crate) fn number_token(&mut self) -> Option<Expr> {
        let token = self.expect(TokenKind::Number)?;
        let mut number = self.token_text(&token);
        if number.contains('_') {
            if self.feature_version < 6 {
                return self.raise_syntax_error(
                    "Underscores in numeric literals are only supported in Python 3.6 and greater",
                );
            }
            number = number.replace('_', "");
        }

        let (base, digits_start) = if number.starts_with("0x") || number.starts_with("0X") {
            (16u32, 2)
        } else if number.starts_with("0o") || number.starts_with("0O") {
            (8, 2)
        } else if number.starts_with("0b") || number.starts_with("0B") {
            (2, 2)
        } else {
            (10, 0)
        };

        let mut is_float = false;
        let mut is_complex = false;
        if base == 10 {
            is_complex = number.ends_with('j') || number.ends_with('J');
            if !is_complex {
                is_float =
                    number.contains('.') || number.contains('e') || number.contains('E');
            }
        }

        if is_complex {
            let mantissa = &number[..number.len() - 1];
            let Ok(imag) = mantissa.parse::<f64>() else {
                return self.raise_error_known_location(
                    ErrorType::System,
                    token.range,
                    "malformed number token",
                );
            };
            return Some(Expr::new(
                ExprKind::Constant {
                    value: ConstantValue::Complex { real: 0.0, imag },
                    kind: None,
                },
                token.range,
            ));
        }
        if is_float {
            let Ok(value) = number.parse::<f64>() else {
                return self.raise_error_known_location(
                    ErrorType::System,
                    token.range,
                    "malformed number token",
                );
            };
            return Some(Expr::new(
                ExprKind::Constant {
                    value: ConstantValue::Float(value),
                    kind: None,
                },
                token.range,
            ));
        }

        let digits: Vec<char> = number[digits_start..].chars().collect();
        let base_wide = i64::from(base);
        let mult_max = i64::MAX / base_wide;
        let mut result: i64 = 0;
        let mut i = 0;
        while i < digits.len() {
            let digit = i64::from(digit_value(digits[i]));
            let mut overflow = false;
            let mut next = result;
            if next > mult_max {
                overflow = true;
            } else {
                next *= base_wide;
                if next > i64::MAX - digit {
                    overflow = true;
                } else {
                    next += digit;
                }
            }
            if overflow {
                // Pay for arbitrary precision only from here on.
                let mut big = BigInt::from(result);
                let big_base = BigInt::from(base_wide);
                while i < digits.len() {
                    big = big * &big_base + BigInt::from(digit_value(digits[i]));
                    i += 1;
                }
                return Some(Expr::new(
                    ExprKind::Constant {
                        value: ConstantValue::BigInt(big),
                        kind: None,
                    },
                    token.range,
                ));
            }
            result = next;
            i += 1;
        }
        Some(Expr::new(
            ExprKind::Constant {
                value: ConstantValue::Int(result),
                kind: None,
            },
            token.range,
        ))
    }
}

#[inline]
fn digit_value(c: char) -> u32 {
    match c {
        '0'..='9' => c as u32 - '0' as u32,
        'a'..='f' => c as u32 - 'a' as u32 + 10,
        'A'..='F' => c as u32 - 'A' as u32 + 10,
        _ => 0,
    }
}
