//! Row grammar for the delimited intermediate text.
//!
//! A line is split into cells on `,`. Three cell forms are recognised, tried
//! in order:
//!
//! 1. **Quoted**: starts with `"` and runs to the matching closing quote;
//!    `""` inside stands for one literal `"` (RFC 4180).
//! 2. **Bracketed**: starts with `[` or `{` and runs until the brackets
//!    balance, so structured literals such as `[[0,0],[10,5]]` stay whole.
//!    Brackets inside single- or double-quoted runs do not count.
//! 3. **Plain**: everything up to the next `,`.
//!
//! Cells are trimmed of surrounding spaces. A quoted or bracketed form that
//! is not followed by a comma or the end of the line falls back to a plain
//! cell. The entry point is [`split_row`], which never fails.

use std::borrow::Cow;

use winnow::{
    Parser as _,
    ascii::space0,
    combinator::{alt, delimited, eof, peek, repeat, separated, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_till},
};

use crate::span::Span;

/// Version of the row grammar implemented here.
pub const GRAMMAR_VERSION: u32 = 1;

type Input<'a> = LocatingSlice<&'a str>;

/// One cell of a delimited row, with its location in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cell<'a> {
    value: Cow<'a, str>,
    span: Span,
}

impl<'a> Cell<'a> {
    pub(crate) fn new(value: impl Into<Cow<'a, str>>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }

    /// The cell content with quoting removed.
    pub(crate) fn value(&self) -> &str {
        &self.value
    }

    /// Location of the cell in the source text.
    pub(crate) fn span(&self) -> Span {
        self.span
    }

    fn shifted(self, offset: usize) -> Self {
        let span = Span::new(self.span.start() + offset..self.span.end() + offset);
        Self { span, ..self }
    }
}

/// Parse an RFC 4180 quoted cell, returning its unescaped content.
fn quoted(input: &mut Input<'_>) -> ModalResult<String> {
    let content = alt((literal("\"\"").value('"'), none_of(['"'])));

    delimited(
        '"',
        repeat(0.., content).fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        }),
        '"',
    )
    .parse_next(input)
}

/// Parse a bracketed structured literal up to its balancing bracket.
fn bracketed<'a>(input: &mut Input<'a>) -> ModalResult<&'a str> {
    peek(one_of(['[', '{'])).parse_next(input)?;

    let mut depth = 0usize;
    let mut quote = None;
    let mut end = None;
    for (offset, ch) in input.iter_offsets() {
        match (quote, ch) {
            (Some(open), ch) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[' | '{') => depth += 1,
            (None, ']' | '}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    end = Some(offset + ch.len_utf8());
                    break;
                }
            }
            _ => {}
        }
    }

    match end {
        Some(end) => Ok(input.next_slice(end)),
        None => Err(ErrMode::Backtrack(ContextError::new())),
    }
}

/// Succeed, without consuming the delimiter, at the end of a cell.
fn cell_end(input: &mut Input<'_>) -> ModalResult<()> {
    (space0, peek(alt((','.void(), eof.void()))))
        .void()
        .parse_next(input)
}

fn cell<'a>(input: &mut Input<'a>) -> ModalResult<Cell<'a>> {
    space0.parse_next(input)?;
    let start = input.current_token_start();

    let (value, len) = alt((
        terminated(quoted.with_taken(), cell_end)
            .map(|(value, raw): (String, &str)| (Cow::Owned(value), raw.len())),
        terminated(bracketed, cell_end).map(|raw: &'a str| (Cow::Borrowed(raw), raw.len())),
        take_till(0.., ',').map(|raw: &'a str| {
            let raw = raw.trim_end();
            (Cow::Borrowed(raw), raw.len())
        }),
    ))
    .parse_next(input)?;

    Ok(Cell::new(value, Span::new(start..start + len)))
}

fn row<'a>(input: &mut Input<'a>) -> ModalResult<Vec<Cell<'a>>> {
    terminated(separated(1.., cell, ','), eof).parse_next(input)
}

/// Split one line into cells.
///
/// `offset` is the byte position of `line` within the full source and is
/// added to every cell span.
pub(crate) fn split_row(line: &str, offset: usize) -> Vec<Cell<'_>> {
    let mut input = LocatingSlice::new(line);
    match row(&mut input) {
        Ok(cells) => cells.into_iter().map(|cell| cell.shifted(offset)).collect(),
        // Every cell form falls back to a plain cell, so this is unreachable
        // in practice; keep the whole line as one cell rather than lose it.
        Err(_) => vec![Cell::new(line, Span::new(offset..offset + line.len()))],
    }
}
