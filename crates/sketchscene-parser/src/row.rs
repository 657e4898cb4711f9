//! Row parser: one delimited row plus the header becomes one element record.
//!
//! Parsing is total. Each cell is coerced with the rule its column maps to,
//! fallbacks are reported as warnings, and the fixed-field passes run last so
//! their values always hold regardless of row content.

use std::time::{SystemTime, UNIX_EPOCH};

use log::trace;

use sketchscene_core::{element::ElementRecord, value::FieldValue};

use crate::{
    coercion::{CoercionRule, Fallback, FallbackReason, rule_for},
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    grammar::Cell,
    span::Span,
};

/// Line height asserted on every text element.
pub const TEXT_LINE_HEIGHT: f64 = 1.25;

/// List-valued fields that must never hold a bare string.
const SEQUENCE_FIELDS: [&str; 2] = ["groupIds", "boundElements"];

/// Milliseconds since the Unix epoch, or `0` if the clock is before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Parses data rows against a header, stamping a fixed `updated` instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowParser {
    updated: u64,
}

impl Default for RowParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RowParser {
    /// Create a parser that stamps the current time.
    pub fn new() -> Self {
        Self::at(now_millis())
    }

    /// Create a parser that stamps `updated` (epoch milliseconds).
    pub fn at(updated: u64) -> Self {
        Self { updated }
    }

    /// The `updated` value written into every record.
    pub fn updated(&self) -> u64 {
        self.updated
    }

    /// Parse one row of cell strings.
    ///
    /// Cells beyond the header are ignored and missing trailing cells are
    /// treated as absent. Fallback warnings are discarded; use
    /// [`crate::assemble`] to observe them.
    pub fn parse(&self, header: &[&str], row: &[&str]) -> ElementRecord {
        let header: Vec<Cell<'_>> = header
            .iter()
            .map(|name| Cell::new(*name, Span::default()))
            .collect();
        let row: Vec<Cell<'_>> = row
            .iter()
            .map(|raw| Cell::new(raw.trim(), Span::default()))
            .collect();

        let mut collector = DiagnosticCollector::new();
        self.parse_cells(&header, &row, &mut collector)
    }

    pub(crate) fn parse_cells(
        &self,
        header: &[Cell<'_>],
        row: &[Cell<'_>],
        collector: &mut DiagnosticCollector,
    ) -> ElementRecord {
        let mut record = ElementRecord::new();

        for (column, cell) in header.iter().zip(row) {
            let name = column.value();
            if name.is_empty() || cell.value().is_empty() {
                continue;
            }

            let coerced = rule_for(name).apply(name, cell.value());
            if let Some(reason) = coerced.fallback_reason() {
                trace!(field = name, raw = cell.value(); "Coercion fallback");
                collector.emit(fallback_diagnostic(name, reason, cell.span()));
            }
            record.insert(name, coerced.into_value());
        }

        if row.len() > header.len() {
            collector.emit(extra_cells_diagnostic(header.len(), &row[header.len()..]));
        }

        self.assert_fixed_fields(&mut record);
        if record.is_text() {
            assert_text_fields(&mut record);
        }
        renormalize_sequences(&mut record, header, row, collector);

        record
    }

    fn assert_fixed_fields(&self, record: &mut ElementRecord) {
        record.insert_if_absent("frameId", FieldValue::Null);
        // u64 milliseconds stay exact in f64 until the year 287396.
        record.insert("updated", self.updated as f64);
        record.insert("link", FieldValue::Null);
        record.insert("locked", false);
    }
}

/// Parse one row with a parser stamped at the current time.
///
/// # Example
///
/// ```
/// use sketchscene_parser::parse_row;
///
/// let record = parse_row(&["type", "x", "isDeleted"], &["ellipse", "12.5", "True"]);
/// assert_eq!(record.kind(), Some("ellipse"));
/// assert_eq!(record.get("x").and_then(|v| v.as_f64()), Some(12.5));
/// assert_eq!(record.get("isDeleted").and_then(|v| v.as_bool()), Some(false));
/// ```
pub fn parse_row(header: &[&str], row: &[&str]) -> ElementRecord {
    RowParser::new().parse(header, row)
}

fn assert_text_fields(record: &mut ElementRecord) {
    let original = match record.get("text") {
        Some(FieldValue::Text(text)) => FieldValue::Text(text.clone()),
        Some(other) => other.clone(),
        None => FieldValue::Text(String::new()),
    };

    record.insert("originalText", original);
    record.insert("lineHeight", TEXT_LINE_HEIGHT);
    record.insert("baseline", 0.0);
    record.insert("containerId", FieldValue::Null);
    record.insert("autoResize", true);
}

fn renormalize_sequences(
    record: &mut ElementRecord,
    header: &[Cell<'_>],
    row: &[Cell<'_>],
    collector: &mut DiagnosticCollector,
) {
    for field in SEQUENCE_FIELDS {
        if !record.get(field).is_some_and(FieldValue::is_text) {
            continue;
        }

        record.insert(field, FieldValue::empty_sequence());

        // The last occurrence is the one that won.
        let span = header
            .iter()
            .zip(row)
            .filter(|(column, cell)| column.value() == field && !cell.value().is_empty())
            .map(|(_, cell)| cell.span())
            .last()
            .unwrap_or_default();
        collector.emit(
            Diagnostic::warning(format!("`{field}` is not a sequence"))
                .with_code(ErrorCode::E104)
                .with_label(span, "replaced with `[]`"),
        );
    }
}

fn fallback_diagnostic(field: &str, reason: &FallbackReason, span: Span) -> Diagnostic {
    match reason {
        FallbackReason::InvalidNumber => Diagnostic::warning(format!("`{field}` is not a number"))
            .with_code(ErrorCode::E100)
            .with_label(span, "replaced with `0`"),
        FallbackReason::MalformedLiteral(err) => {
            Diagnostic::warning(format!("`{field}` is not a valid structured literal"))
                .with_code(ErrorCode::E101)
                .with_label(span, err.clone())
                .with_help(format!(
                    "structured literals use JSON syntax; single quotes are accepted. \
                     Replaced with `{}`",
                    fallback_for(field)
                ))
        }
        FallbackReason::UnexpectedShape => {
            Diagnostic::warning(format!("`{field}` must be a list of [x, y] pairs"))
                .with_code(ErrorCode::E102)
                .with_label(span, format!("replaced with `{}`", fallback_for(field)))
        }
        FallbackReason::QuotesStripped => {
            Diagnostic::warning(format!("`{field}` has unbalanced quotes"))
                .with_code(ErrorCode::E103)
                .with_label(span, "quote characters removed")
        }
    }
}

fn fallback_for(field: &str) -> Fallback {
    match rule_for(field) {
        CoercionRule::StructuredLiteral(fallback) => fallback,
        _ => Fallback::Null,
    }
}

fn extra_cells_diagnostic(columns: usize, extra: &[Cell<'_>]) -> Diagnostic {
    let span = extra
        .iter()
        .map(Cell::span)
        .reduce(|acc, span| acc.union(span))
        .unwrap_or_default();

    Diagnostic::warning(format!(
        "row has {} more cell(s) than the {columns} header column(s)",
        extra.len()
    ))
    .with_code(ErrorCode::E002)
    .with_label(span, "ignored")
    .with_help("quote cells that contain commas: \"a, b\"")
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use serde_json::json;

    use super::*;
    use sketchscene_core::value::Point;

    const STAMP: u64 = 1_700_000_000_000;

    fn parse(header: &[&str], row: &[&str]) -> ElementRecord {
        RowParser::at(STAMP).parse(header, row)
    }

    fn parse_with_diagnostics(header: &[&str], row: &[&str]) -> (ElementRecord, Vec<Diagnostic>) {
        let header: Vec<Cell<'_>> = header
            .iter()
            .enumerate()
            .map(|(i, name)| Cell::new(*name, Span::new(i..i + 1)))
            .collect();
        let row: Vec<Cell<'_>> = row
            .iter()
            .enumerate()
            .map(|(i, raw)| Cell::new(*raw, Span::new(100 + i..101 + i)))
            .collect();
        let mut collector = DiagnosticCollector::new();
        let record = RowParser::at(STAMP).parse_cells(&header, &row, &mut collector);
        (record, collector.finish().unwrap())
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
        diagnostics.iter().filter_map(Diagnostic::code).collect()
    }

    #[test]
    fn test_numeric_and_text_fields() {
        let record = parse(&["type", "x", "y", "text"], &["text", "10", "20", "Hello"]);

        assert_eq!(record.kind(), Some("text"));
        assert_approx_eq!(f64, record.get("x").unwrap().as_f64().unwrap(), 10.0);
        assert_approx_eq!(f64, record.get("y").unwrap().as_f64().unwrap(), 20.0);
        assert_eq!(record.get("text"), Some(&FieldValue::from("Hello")));
        assert_eq!(record.get("originalText"), Some(&FieldValue::from("Hello")));
    }

    #[test]
    fn test_fixed_fields_always_asserted() {
        let record = parse(
            &["type", "link", "locked", "updated"],
            &["rectangle", "https://example.com", "true", "5"],
        );

        assert_eq!(record.get("frameId"), Some(&FieldValue::Null));
        assert_eq!(record.get("link"), Some(&FieldValue::Null));
        assert_eq!(record.get("locked"), Some(&FieldValue::Bool(false)));
        assert_eq!(record.get("updated"), Some(&FieldValue::Number(STAMP as f64)));
    }

    #[test]
    fn test_frame_id_kept_when_present() {
        let record = parse(&["type", "frameId"], &["rectangle", "frame-1"]);
        assert_eq!(record.get("frameId"), Some(&FieldValue::from("frame-1")));
    }

    #[test]
    fn test_text_fields_override_row_content() {
        let record = parse(
            &["type", "text", "lineHeight", "baseline", "containerId", "autoResize"],
            &["text", "Hi", "3", "18", "box-1", "false"],
        );

        assert_eq!(record.get("originalText"), Some(&FieldValue::from("Hi")));
        assert_eq!(record.get("lineHeight"), Some(&FieldValue::Number(1.25)));
        assert_eq!(record.get("baseline"), Some(&FieldValue::Number(0.0)));
        assert_eq!(record.get("containerId"), Some(&FieldValue::Null));
        assert_eq!(record.get("autoResize"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn test_text_without_text_column() {
        let record = parse(&["type", "x"], &["text", "1"]);
        assert_eq!(record.get("originalText"), Some(&FieldValue::from("")));
        assert!(!record.contains("text"));
    }

    #[test]
    fn test_non_text_has_no_text_fields() {
        let record = parse(&["type", "text"], &["rectangle", "label"]);
        assert!(!record.contains("originalText"));
        assert!(!record.contains("lineHeight"));
        assert!(!record.contains("autoResize"));
    }

    #[test]
    fn test_empty_and_missing_cells_are_omitted() {
        let record = parse(&["type", "x", "y", "width"], &["rectangle", "", "5"]);

        assert!(!record.contains("x"));
        assert!(!record.contains("width"));
        assert_eq!(record.get("y"), Some(&FieldValue::Number(5.0)));
    }

    #[test]
    fn test_field_order_follows_header_then_fixed_fields() {
        let record = parse(&["type", "y", "x"], &["ellipse", "1", "2"]);
        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            ["type", "y", "x", "frameId", "updated", "link", "locked"]
        );
    }

    #[test]
    fn test_structured_fields() {
        let record = parse(
            &["type", "points", "startBinding", "groupIds"],
            &["arrow", "[[0,0],[100,50]]", "{'elementId': 'r1'}", "['g']"],
        );

        assert_eq!(
            record.get("points"),
            Some(&FieldValue::Points(vec![
                Point::origin(),
                Point::new(100.0, 50.0)
            ]))
        );
        assert_eq!(
            record.get("startBinding"),
            Some(&FieldValue::Structured(json!({"elementId": "r1"})))
        );
        assert_eq!(
            record.get("groupIds"),
            Some(&FieldValue::Structured(json!(["g"])))
        );
    }

    #[test]
    fn test_sequence_fields_renormalized_from_string() {
        let (record, diagnostics) = parse_with_diagnostics(
            &["type", "groupIds", "boundElements"],
            &["rectangle", "'g1'", "\"a1\""],
        );

        assert_eq!(record.get("groupIds"), Some(&FieldValue::empty_sequence()));
        assert_eq!(
            record.get("boundElements"),
            Some(&FieldValue::empty_sequence())
        );
        assert_eq!(codes(&diagnostics), [ErrorCode::E104, ErrorCode::E104]);
        assert_eq!(diagnostics[0].labels()[0].span(), Span::new(101..102));
    }

    #[test]
    fn test_fallback_diagnostics_carry_cell_span() {
        let (record, diagnostics) = parse_with_diagnostics(
            &["type", "x", "points", "endBinding"],
            &["line", "ten", "[1,2]", "{oops"],
        );

        assert_eq!(record.get("x"), Some(&FieldValue::Number(0.0)));
        assert_eq!(record.get("points"), Some(&Fallback::OriginPoint.value()));
        assert_eq!(record.get("endBinding"), Some(&FieldValue::Null));
        assert_eq!(
            codes(&diagnostics),
            [ErrorCode::E100, ErrorCode::E102, ErrorCode::E101]
        );
        assert_eq!(diagnostics[0].labels()[0].span(), Span::new(101..102));
        assert!(diagnostics.iter().all(|d| d.severity().is_warning()));
    }

    #[test]
    fn test_extra_cells_ignored_with_warning() {
        let (record, diagnostics) =
            parse_with_diagnostics(&["type", "x"], &["rectangle", "1", "2", "3"]);

        assert_eq!(record.get("x"), Some(&FieldValue::Number(1.0)));
        assert_eq!(codes(&diagnostics), [ErrorCode::E002]);
        assert_eq!(diagnostics[0].labels()[0].span(), Span::new(102..104));
    }

    #[test]
    fn test_empty_header_name_skipped() {
        let record = parse(&["type", "", "x"], &["rectangle", "lost", "3"]);
        assert_eq!(record.len(), 6);
        assert_eq!(record.get("x"), Some(&FieldValue::Number(3.0)));
    }

    #[test]
    fn test_now_millis_is_recent() {
        assert!(now_millis() > STAMP);
    }
}
