//! # SketchScene Parser
//!
//! Deterministic parsing of the delimited intermediate text into a scene
//! document. This crate provides:
//!
//! 1. **Row grammar** - Split lines into cells (quoted, bracketed, plain)
//! 2. **Field coercion** - Map each column to a typed value with fallbacks
//! 3. **Row parsing** - Build one element record per data row
//! 4. **Assembly** - Wrap the ordered elements in the document envelope
//!
//! Parsing never aborts on a bad cell. Fallbacks are returned as warning
//! diagnostics alongside the document; the only fatal condition is text
//! without a header and at least one data row.
//!
//! ## Usage
//!
//! ```
//! # use sketchscene_parser::{assemble, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let text = "type,x,y,text\n\
//!                 text,10,20,Hello\n\
//!                 rectangle,0,0,";
//!
//!     let assembly = assemble(text)?;
//!     assert_eq!(assembly.document().len(), 2);
//!     for warning in assembly.diagnostics() {
//!         eprintln!("{warning}");
//!     }
//!     Ok(())
//! }
//! ```

mod assemble;
pub mod coercion;
pub mod error;
mod fence;
mod grammar;
mod row;
mod span;

pub use assemble::{Assembly, assemble, assemble_with};
pub use error::ParseError;
pub use fence::strip_code_fence;
pub use grammar::GRAMMAR_VERSION;
pub use row::{RowParser, TEXT_LINE_HEIGHT, now_millis, parse_row};
pub use span::Span;
