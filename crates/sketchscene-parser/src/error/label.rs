//! Spans of intermediate text attached to a diagnostic.

use crate::span::Span;

/// What a label points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// The cell (or run of cells) that caused the diagnostic.
    Offending,
    /// Surrounding context, e.g. the header name an earlier cell was bound to.
    Context,
}

/// A message anchored to a byte range of the intermediate text.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    kind: LabelKind,
}

impl Label {
    /// Label the offending cell.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, LabelKind::Offending)
    }

    /// Label surrounding context.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message, LabelKind::Context)
    }

    fn new(span: Span, message: impl Into<String>, kind: LabelKind) -> Self {
        Self {
            span,
            message: message.into(),
            kind,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    pub fn is_primary(&self) -> bool {
        self.kind == LabelKind::Offending
    }

    pub fn is_secondary(&self) -> bool {
        self.kind == LabelKind::Context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offending_cell_label() {
        let label = Label::primary(Span::new(10..20), "not a number");

        assert_eq!(label.span().start(), 10);
        assert_eq!(label.span().end(), 20);
        assert_eq!(label.kind(), LabelKind::Offending);
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_context_label() {
        let label = Label::secondary(Span::new(0..5), "column declared here");

        assert_eq!(label.kind(), LabelKind::Context);
        assert!(label.is_secondary());
    }
}
