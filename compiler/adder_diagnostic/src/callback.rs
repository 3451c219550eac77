//! The `ErrorCallback` contract and a collecting implementation.

use std::cell::RefCell;

use adder_ir::SourceRange;

use crate::{Diagnostic, ErrorType, WarningType};

/// What the channel wants the caller to do after an error.
///
/// `Halt` supports "stop at first error" embedders; the parser treats it
/// like a failed rule and unwinds to the driver without reporting more.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ErrorAction {
    Continue,
    Halt,
}

/// Receiver for everything the parser has to say about bad input.
///
/// Implementations take `&self`; a parser instance is single-threaded by
/// contract, so interior mutability is sufficient for accumulation.
pub trait ErrorCallback {
    /// An error was detected. The returned action may request a halt.
    fn on_error(&self, error_type: ErrorType, range: SourceRange, message: &str) -> ErrorAction;

    /// A non-fatal warning (deprecated escape sequences and the like).
    fn on_warning(&self, warning_type: WarningType, range: SourceRange, message: &str);

    /// Interactive "need more input" signal: the tokenizer hit end of input
    /// inside an unfinished construct while reading from a terminal.
    fn report_incomplete_source(&self, line: u32);
}

/// An `ErrorCallback` that records everything for later inspection.
#[derive(Default, Debug)]
pub struct DiagnosticCollector {
    diagnostics: RefCell<Vec<Diagnostic>>,
    incomplete_source_line: RefCell<Option<u32>>,
    /// When set, the first error requests a halt.
    stop_on_first_error: bool,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        DiagnosticCollector::default()
    }

    /// Collector that asks the parser to stop after the first error.
    pub fn stopping() -> Self {
        DiagnosticCollector {
            stop_on_first_error: true,
            ..DiagnosticCollector::default()
        }
    }

    /// Drain all recorded diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }

    pub fn errors(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.error_type.is_some())
            .cloned()
            .collect()
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.warning_type.is_some())
            .cloned()
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.error_type.is_some())
    }

    pub fn incomplete_source_line(&self) -> Option<u32> {
        *self.incomplete_source_line.borrow()
    }
}

impl ErrorCallback for DiagnosticCollector {
    fn on_error(&self, error_type: ErrorType, range: SourceRange, message: &str) -> ErrorAction {
        self.diagnostics
            .borrow_mut()
            .push(Diagnostic::error(error_type, range, message));
        if self.stop_on_first_error {
            ErrorAction::Halt
        } else {
            ErrorAction::Continue
        }
    }

    fn on_warning(&self, warning_type: WarningType, range: SourceRange, message: &str) {
        self.diagnostics
            .borrow_mut()
            .push(Diagnostic::warning(warning_type, range, message));
    }

    fn report_incomplete_source(&self, line: u32) {
        *self.incomplete_source_line.borrow_mut() = Some(line);
    }
}
