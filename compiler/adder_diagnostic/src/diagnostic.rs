//! Core diagnostic types.

use adder_ir::SourceRange;
use std::fmt;

/// Error categories reported through the channel.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorType {
    /// Uncategorized failure.
    Generic,
    /// Bad indent/dedent structure.
    Indentation,
    /// Inconsistent use of tabs and spaces.
    Tab,
    /// Malformed escape sequence.
    Encoding,
    /// Semantically invalid literal.
    Value,
    /// Grammar could not match.
    Syntax,
    /// Internal inconsistency.
    System,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorType::Generic => "error",
            ErrorType::Indentation => "IndentationError",
            ErrorType::Tab => "TabError",
            ErrorType::Encoding => "UnicodeDecodeError",
            ErrorType::Value => "ValueError",
            ErrorType::Syntax => "SyntaxError",
            ErrorType::System => "SystemError",
        };
        f.write_str(s)
    }
}

/// Warning categories.
///
/// Deprecated escape sequences report as `Deprecation` below feature
/// version 12 and as `Syntax` from 12 on.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum WarningType {
    Deprecation,
    Syntax,
}

impl fmt::Display for WarningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningType::Deprecation => "DeprecationWarning",
            WarningType::Syntax => "SyntaxWarning",
        };
        f.write_str(s)
    }
}

/// Severity of a recorded diagnostic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One recorded diagnostic: what, where, and how bad.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Error category, or `None` for warnings.
    pub error_type: Option<ErrorType>,
    /// Warning category, or `None` for errors.
    pub warning_type: Option<WarningType>,
    pub range: SourceRange,
    pub message: String,
}

impl Diagnostic {
    pub fn error(error_type: ErrorType, range: SourceRange, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            error_type: Some(error_type),
            warning_type: None,
            range,
            message: message.into(),
        }
    }

    pub fn warning(
        warning_type: WarningType,
        range: SourceRange,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            error_type: None,
            warning_type: Some(warning_type),
            range,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.error_type, self.warning_type) {
            (Some(e), _) => write!(f, "{}: {} ({})", e, self.message, self.range),
            (_, Some(w)) => write!(f, "{}: {} ({})", w, self.message, self.range),
            _ => write!(f, "{}: {} ({})", self.severity, self.message, self.range),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_display() {
        let d = Diagnostic::error(
            ErrorType::Syntax,
            SourceRange::new(1, 0, 1, 3),
            "invalid syntax",
        );
        assert_eq!(format!("{d}"), "SyntaxError: invalid syntax (1:0)");
    }

    #[test]
    fn warning_display() {
        let d = Diagnostic::warning(
            WarningType::Deprecation,
            SourceRange::new(2, 1, 2, 3),
            "invalid escape sequence '\\q'",
        );
        assert_eq!(
            format!("{d}"),
            "DeprecationWarning: invalid escape sequence '\\q' (2:1)"
        );
    }
}
