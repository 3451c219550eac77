//! Tokenizer for Adder source.
//!
//! Turns raw source text into a stream of [`adder_ir::Token`]s: significant
//! indentation (indent/dedent), logical newlines, bracket nesting with
//! per-bracket positions for unclosed-bracket diagnostics, string literals
//! with prefix detection, f-string piece tokens, and number scanning with
//! underscore-placement validation.
//!
//! The tokenizer is a collaborator of the parser: it never raises, it
//! records a [`StatusCode`] and returns an error token, and the parser's
//! driver decides what diagnostic to produce.

mod fstring;
mod operators;
mod tokenizer;

pub use tokenizer::{OpenBracket, Tokenizer};

use bitflags::bitflags;

bitflags! {
    /// Tokenizer behavior switches, derived from the parse entry point's
    /// input mode and flag set.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct LexerFlags: u8 {
        /// Module input: inject a missing final newline before end of input.
        const EXEC_INPUT = 1 << 0;
        /// Reading from an interactive terminal.
        const INTERACTIVE = 1 << 1;
        /// Recognize `# type:` comments as tokens.
        const TYPE_COMMENT = 1 << 2;
    }
}

/// Why the tokenizer stopped producing real tokens.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum StatusCode {
    #[default]
    Ok,
    /// Clean end of input.
    Eof,
    /// A character no token can start with.
    BadToken,
    /// Malformed token with a specific message on the error token.
    SyntaxError,
    /// Inconsistent use of tabs and spaces in indentation.
    TabsSpacesInconsistent,
    /// More indentation levels than the fixed stack allows.
    TooDeepIndentation,
    /// Dedent to a column that matches no outer indentation level.
    DedentInvalid,
    /// Unexpected character after a line-continuation backslash.
    LineContinuationError,
    /// Interactive stream ended mid-construct with incomplete-source
    /// reporting disabled.
    InteractiveStop,
}
