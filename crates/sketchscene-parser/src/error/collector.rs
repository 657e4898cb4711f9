//! Collector for accumulating diagnostics while assembling a document.
//!
//! Row parsing never stops on a bad cell: every fallback is emitted here as
//! a warning and parsing continues.

use crate::error::{Diagnostic, ParseError};

/// A collector for accumulating diagnostics during assembly.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Finish collection and return a result.
    ///
    /// - If there are errors, returns `Err(ParseError)` with all diagnostics.
    /// - Otherwise returns the warnings, in emission order.
    pub fn finish(self) -> Result<Vec<Diagnostic>, ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_collector_new_finish_ok() {
        let collector = DiagnosticCollector::new();
        assert!(collector.finish().unwrap().is_empty());
    }

    #[test]
    fn test_collector_emit_error_finish_err() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::error("test error"));

        assert!(collector.finish().is_err());
    }

    #[test]
    fn test_collector_returns_warnings() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(
            Diagnostic::warning("warning 1")
                .with_code(ErrorCode::E100)
                .with_label(Span::new(10..20), "here"),
        );
        collector.emit(Diagnostic::warning("warning 2"));

        let warnings = collector.finish().unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].message(), "warning 1");
    }

    #[test]
    fn test_collector_error_keeps_all_diagnostics() {
        let mut collector = DiagnosticCollector::new();

        collector.emit(Diagnostic::warning("a warning"));
        collector.emit(Diagnostic::error("an error"));

        let err = collector.finish().unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
    }
}
