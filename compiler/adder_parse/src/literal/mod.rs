//! Literal decoding.
//!
//! Turns raw lexical text into typed constant values: numeric literals
//! (with overflow escalation to arbitrary precision), string and bytes
//! escape decoding, interpolated-string assembly, and concatenation
//! folding of adjacent literals. All malformed-construct detection reports
//! through the diagnostic channel and sets the parser's sticky error flag.

mod fstring;
mod number;
mod string;

/// Resolver for `\N{NAME}` escapes beyond the built-in control-character
/// name table, typically backed by a Unicode character database supplied
/// by the embedder.
pub trait UnicodeNameSource {
    fn lookup(&self, name: &str) -> Option<char>;
}
