//! Operator and delimiter tables.

use adder_ir::TokenKind;

/// Single-character operator/delimiter kinds.
///
/// Returns `None` for characters no token can start with.
pub(crate) fn one_char(c: char) -> Option<TokenKind> {
    Some(match c {
        '(' => TokenKind::LPar,
        ')' => TokenKind::RPar,
        '[' => TokenKind::LSqb,
        ']' => TokenKind::RSqb,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        ':' => TokenKind::Colon,
        ',' => TokenKind::Comma,
        ';' => TokenKind::Semi,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '|' => TokenKind::VBar,
        '&' => TokenKind::Amper,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        '=' => TokenKind::Equal,
        '.' => TokenKind::Dot,
        '%' => TokenKind::Percent,
        '^' => TokenKind::Circumflex,
        '~' => TokenKind::Tilde,
        '@' => TokenKind::At,
        '!' => TokenKind::Exclamation,
        _ => return None,
    })
}

/// Two-character operator kinds.
pub(crate) fn two_chars(c1: char, c2: char) -> Option<TokenKind> {
    Some(match (c1, c2) {
        ('=', '=') => TokenKind::EqEqual,
        ('!', '=') => TokenKind::NotEqual,
        ('<', '>') => TokenKind::NotEqual,
        ('<', '=') => TokenKind::LessEqual,
        ('<', '<') => TokenKind::LeftShift,
        ('>', '=') => TokenKind::GreaterEqual,
        ('>', '>') => TokenKind::RightShift,
        ('+', '=') => TokenKind::PlusEqual,
        ('-', '=') => TokenKind::MinEqual,
        ('-', '>') => TokenKind::RArrow,
        ('*', '=') => TokenKind::StarEqual,
        ('*', '*') => TokenKind::DoubleStar,
        ('/', '=') => TokenKind::SlashEqual,
        ('/', '/') => TokenKind::DoubleSlash,
        ('|', '=') => TokenKind::VBarEqual,
        ('&', '=') => TokenKind::AmperEqual,
        ('%', '=') => TokenKind::PercentEqual,
        ('^', '=') => TokenKind::CircumflexEqual,
        ('@', '=') => TokenKind::AtEqual,
        (':', '=') => TokenKind::ColonEqual,
        _ => return None,
    })
}

/// Three-character operator kinds.
pub(crate) fn three_chars(c1: char, c2: char, c3: char) -> Option<TokenKind> {
    Some(match (c1, c2, c3) {
        ('*', '*', '=') => TokenKind::DoubleStarEqual,
        ('/', '/', '=') => TokenKind::DoubleSlashEqual,
        ('<', '<', '=') => TokenKind::LeftShiftEqual,
        ('>', '>', '=') => TokenKind::RightShiftEqual,
        _ => return None,
    })
}
