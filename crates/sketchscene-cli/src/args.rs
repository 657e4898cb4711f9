//! Command-line argument definitions for the SketchScene CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, logging verbosity and whether the input is an image or
//! already-extracted intermediate text.

use clap::Parser;

/// Command-line arguments for the SketchScene converter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input image (or intermediate text with `--text`)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output Excalidraw file
    #[arg(short, long, default_value = "out.excalidraw")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Treat the input as intermediate CSV text and skip the model stages
    #[arg(long)]
    pub text: bool,
}
