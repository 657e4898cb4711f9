//! Error types for SketchScene operations.
//!
//! This module provides the main error type [`SketchError`] which wraps the
//! error conditions of assembling and converting diagrams.

use std::io;

use thiserror::Error;

use sketchscene_parser::ParseError;

use crate::{
    pipeline::{PipelineError, Stage},
    transform::TransformError,
};

/// The main error type for SketchScene operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the intermediate text alongside the parser
/// diagnostics so callers can render labeled source snippets.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("{stage} stage failed: {error}")]
    Stage { stage: Stage, error: PipelineError },

    #[error("Transformation error: {0}")]
    Transform(#[from] TransformError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("run suspended before completion")]
    Suspended,
}

impl SketchError {
    /// Create a new `Parse` error with the associated intermediate text.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }

    /// The stage that failed, for pipeline failures.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
