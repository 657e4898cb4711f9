//! Document assembler: intermediate text to scene document.

use log::{debug, info};

use sketchscene_core::document::SceneDocument;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    grammar::{Cell, split_row},
    row::RowParser,
    span::Span,
};

/// An assembled document together with the fallback warnings raised while
/// building it.
#[derive(Debug, Clone)]
pub struct Assembly {
    document: SceneDocument,
    diagnostics: Vec<Diagnostic>,
}

impl Assembly {
    /// The assembled document.
    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// Warnings raised during assembly, in source order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Split into the document and its warnings.
    pub fn into_parts(self) -> (SceneDocument, Vec<Diagnostic>) {
        (self.document, self.diagnostics)
    }
}

/// One non-empty line, trimmed, with the byte offset of its first character.
struct SourceLine<'a> {
    offset: usize,
    text: &'a str,
}

fn source_lines(source: &str) -> Vec<SourceLine<'_>> {
    let mut offset = 0;
    let mut lines = Vec::new();

    for raw in source.split('\n') {
        let leading = raw.len() - raw.trim_start().len();
        let text = raw.trim();
        if !text.is_empty() {
            lines.push(SourceLine {
                offset: offset + leading,
                text,
            });
        }
        offset += raw.len() + 1;
    }

    lines
}

/// Assemble intermediate text into a scene document.
///
/// The first non-empty line is the header; every following non-empty line
/// becomes one element, in order. Fails with an `E001` diagnostic when there
/// is no header or no data row.
///
/// # Example
///
/// ```
/// use sketchscene_parser::assemble;
///
/// let assembly = assemble("type,x,y,text\ntext,10,20,Hello\nrectangle,0,0,").unwrap();
/// let document = assembly.document();
/// assert_eq!(document.len(), 2);
/// assert_eq!(document.elements()[1].kind(), Some("rectangle"));
/// ```
pub fn assemble(source: &str) -> Result<Assembly, ParseError> {
    assemble_with(source, RowParser::new())
}

/// Assemble with an explicit row parser (and so a fixed `updated` stamp).
pub fn assemble_with(source: &str, parser: RowParser) -> Result<Assembly, ParseError> {
    let lines = source_lines(source);
    let [header_line, rows @ ..] = lines.as_slice() else {
        return Err(insufficient_data(source, "the text is empty").into());
    };
    if rows.is_empty() {
        return Err(insufficient_data(source, "the text has a header but no data rows").into());
    }

    let mut collector = DiagnosticCollector::new();
    let header = split_row(header_line.text, header_line.offset);
    check_duplicate_columns(&header, &mut collector);
    debug!(columns = header.len(), rows = rows.len(); "Parsed header");

    let elements = rows
        .iter()
        .map(|line| {
            let cells = split_row(line.text, line.offset);
            parser.parse_cells(&header, &cells, &mut collector)
        })
        .collect();

    let diagnostics = collector.finish()?;
    let document = SceneDocument::new(elements);
    info!(elements = document.len(), warnings = diagnostics.len(); "Document assembled");

    Ok(Assembly {
        document,
        diagnostics,
    })
}

fn insufficient_data(source: &str, message: &str) -> Diagnostic {
    Diagnostic::error(format!("insufficient data: {message}"))
        .with_code(ErrorCode::E001)
        .with_label(Span::new(0..source.len()), "expected a header and at least one row")
        .with_help("the first line names the columns; each following line is one element")
}

fn check_duplicate_columns(header: &[Cell<'_>], collector: &mut DiagnosticCollector) {
    for (index, column) in header.iter().enumerate() {
        if column.value().is_empty() {
            continue;
        }
        let first = header[..index]
            .iter()
            .find(|earlier| earlier.value() == column.value());
        if let Some(first) = first {
            collector.emit(
                Diagnostic::warning(format!("duplicate column `{}`", column.value()))
                    .with_code(ErrorCode::E003)
                    .with_label(column.span(), "this column's cells take precedence")
                    .with_secondary_label(first.span(), "first declared here"),
            );
        }
    }
}
