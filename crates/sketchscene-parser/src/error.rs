//! Error and diagnostic system for the SketchScene parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Labeled spans pointing into the intermediate text
//! - Severity levels
//! - Diagnostic collector for accumulating fallback events
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, source
//! locations, and help text. Field-coercion fallbacks never abort parsing;
//! they are reported as warnings. The only fatal condition is a table with
//! too few lines, reported as a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use sketchscene_parser::error::{Diagnostic, ErrorCode};
//! # use sketchscene_parser::Span;
//!
//! let diag = Diagnostic::warning("`x` is not a number")
//!     .with_code(ErrorCode::E100)
//!     .with_label(Span::new(14..17), "defaulted to 0")
//!     .with_help("numeric fields accept decimal literals such as `12.5`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::{Label, LabelKind};
pub use parse_error::ParseError;
pub use severity::Severity;
