//! Reserved-word reclassification table.
//!
//! `Name` tokens are looked up here the first time the token stream
//! materializes them. The lookup buckets by length first (keywords are 2-8
//! characters), then matches the exact text.

use adder_ir::TokenKind;

/// Look up a reserved keyword by its text.
///
/// Returns `None` for ordinary identifiers. Soft keywords are not listed;
/// they are matched by text at the grammar's discretion.
#[inline]
pub(crate) fn lookup(text: &str) -> Option<TokenKind> {
    let len = text.len();
    if !(2..=8).contains(&len) {
        return None;
    }
    match len {
        2 => match text {
            "as" => Some(TokenKind::As),
            "if" => Some(TokenKind::If),
            "in" => Some(TokenKind::In),
            "is" => Some(TokenKind::Is),
            "or" => Some(TokenKind::Or),
            _ => None,
        },
        3 => match text {
            "and" => Some(TokenKind::And),
            "def" => Some(TokenKind::Def),
            "del" => Some(TokenKind::Del),
            "for" => Some(TokenKind::For),
            "not" => Some(TokenKind::Not),
            "try" => Some(TokenKind::Try),
            _ => None,
        },
        4 => match text {
            "None" => Some(TokenKind::None),
            "True" => Some(TokenKind::True),
            "elif" => Some(TokenKind::Elif),
            "else" => Some(TokenKind::Else),
            "from" => Some(TokenKind::From),
            "pass" => Some(TokenKind::Pass),
            "with" => Some(TokenKind::With),
            _ => None,
        },
        5 => match text {
            "False" => Some(TokenKind::False),
            "async" => Some(TokenKind::Async),
            "await" => Some(TokenKind::Await),
            "break" => Some(TokenKind::Break),
            "class" => Some(TokenKind::Class),
            "raise" => Some(TokenKind::Raise),
            "while" => Some(TokenKind::While),
            "yield" => Some(TokenKind::Yield),
            _ => None,
        },
        6 => match text {
            "assert" => Some(TokenKind::Assert),
            "except" => Some(TokenKind::Except),
            "global" => Some(TokenKind::Global),
            "import" => Some(TokenKind::Import),
            "lambda" => Some(TokenKind::Lambda),
            "return" => Some(TokenKind::Return),
            _ => None,
        },
        7 => match text {
            "finally" => Some(TokenKind::Finally),
            _ => None,
        },
        8 => match text {
            "continue" => Some(TokenKind::Continue),
            "nonlocal" => Some(TokenKind::Nonlocal),
            _ => None,
        },
        _ => None,
    }
}
