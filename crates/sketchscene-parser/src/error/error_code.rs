//! Error codes for the SketchScene diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Table structure (lines, header, cell counts)
//! - `E1xx` - Field coercion fallbacks

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Table Structure (E0xx)
    // =========================================================================
    /// Insufficient data.
    ///
    /// The intermediate text has fewer than two non-empty lines, so there is
    /// no header or no data row. This is the only fatal code.
    E001,

    /// Extra cells.
    ///
    /// A data row has more cells than the header has columns. The extra
    /// cells are ignored.
    E002,

    /// Duplicate column.
    ///
    /// A header column name appears more than once. The last cell wins.
    E003,

    // =========================================================================
    // Field Coercion (E1xx)
    // =========================================================================
    /// Invalid number.
    ///
    /// A numeric field held text that is not a finite decimal number. The
    /// field is set to `0`.
    E100,

    /// Malformed structured literal.
    ///
    /// A structured field could not be parsed, even after normalizing single
    /// quotes to double quotes. The field's fallback value is used.
    E101,

    /// Unexpected structured shape.
    ///
    /// A structured literal parsed but does not have the shape the field
    /// requires (for example `points` that are not coordinate pairs).
    E102,

    /// Quotes stripped.
    ///
    /// A free-form value contained quote characters but did not parse as a
    /// structured literal. The quotes are removed and the text kept.
    E103,

    /// Sequence re-normalized.
    ///
    /// A list-valued field (`groupIds`, `boundElements`) resolved to a bare
    /// string and was replaced by an empty sequence.
    E104,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Table structure
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            // Field coercion
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Table structure
            ErrorCode::E001 => "insufficient data",
            ErrorCode::E002 => "extra cells",
            ErrorCode::E003 => "duplicate column",
            // Field coercion
            ErrorCode::E100 => "invalid number",
            ErrorCode::E101 => "malformed structured literal",
            ErrorCode::E102 => "unexpected structured shape",
            ErrorCode::E103 => "quotes stripped",
            ErrorCode::E104 => "sequence re-normalized",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
