//! How serious a diagnostic is.
//!
//! Only an unusable table is fatal. Everything the row parser reports is a
//! degraded cell, so it maps onto `warn`-level logging rather than failure.

use std::fmt;

use log::Level;

/// Fatal or degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// No document can be assembled.
    Error,
    /// A cell was replaced by its fallback; the element is still produced.
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        *self == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        *self == Severity::Warning
    }

    /// The `log` level a diagnostic of this severity is reported at.
    pub fn log_level(&self) -> Level {
        match self {
            Severity::Error => Level::Error,
            Severity::Warning => Level::Warn,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}
