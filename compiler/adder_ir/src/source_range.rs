//! Source location ranges.
//!
//! A range is a (start line, start column, end line, end column) tuple.
//! Lines count from one, columns from zero, both measured in codepoints.

use std::fmt;

/// Source location range carried by every token, AST node and diagnostic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct SourceRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceRange {
    /// Range used for synthesized nodes that have no source text.
    pub const ARTIFICIAL: SourceRange = SourceRange {
        start_line: 0,
        start_column: 0,
        end_line: 0,
        end_column: 0,
    };

    #[inline]
    pub const fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        SourceRange {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Merge the start of `self` with the end of `other`.
    ///
    /// This is the composition used for multi-token constructs: the result
    /// spans from the first token's start to the last token's end.
    #[inline]
    #[must_use]
    pub const fn with_end(self, other: SourceRange) -> SourceRange {
        SourceRange {
            start_line: self.start_line,
            start_column: self.start_column,
            end_line: other.end_line,
            end_column: other.end_column,
        }
    }

    /// A zero-width range at a single point.
    #[inline]
    pub const fn point(line: u32, column: u32) -> SourceRange {
        SourceRange {
            start_line: line,
            start_column: column,
            end_line: line,
            end_column: column,
        }
    }
}

impl fmt::Debug for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_column)
    }
}

// Size assertion to prevent accidental regressions: ranges are embedded in
// every token and AST node.
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::SourceRange;
    crate::static_assert_size!(SourceRange, 16);
}
