//! Diagnostic channel for the Adder frontend.
//!
//! The parser never prints or panics on bad input: every diagnostic flows
//! sideways through the [`ErrorCallback`] trait while control flow proceeds
//! by ordinary match/no-match returns. Rendering is the embedder's job; this
//! crate only defines the wire shapes and a collecting sink.

mod callback;
mod diagnostic;

pub use callback::{DiagnosticCollector, ErrorAction, ErrorCallback};
pub use diagnostic::{Diagnostic, ErrorType, Severity, WarningType};
