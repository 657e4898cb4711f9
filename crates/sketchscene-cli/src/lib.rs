//! CLI logic for the SketchScene converter.
//!
//! Reads a diagram photograph (or intermediate CSV text in offline mode),
//! produces an Excalidraw scene and writes it to disk.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use sketchscene::{SceneBuilder, SketchError, transform::ImagePayload};

/// Run the SketchScene CLI application
///
/// In image mode the input is sent through every pipeline stage. With
/// `--text` the input is treated as intermediate text and only assembled,
/// so no model endpoint is contacted.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `SketchError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Assembly errors (insufficient data)
/// - Model transformation and validation failures
pub fn run(args: &Args) -> Result<(), SketchError> {
    info!(
        input_path = args.input,
        output_path = args.output,
        text_mode = args.text;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let builder = SceneBuilder::new(app_config);

    let scene = if args.text {
        let source = fs::read_to_string(&args.input)?;
        let document = builder.assemble(&source)?;
        info!(elements = document.len(); "Intermediate text assembled");
        serde_json::to_string_pretty(&document)?
    } else {
        let bytes = fs::read(&args.input)?;
        let image = ImagePayload::new(bytes);
        info!(mime_type = image.mime_type(), bytes = image.bytes().len(); "Image loaded");
        let document = builder.convert(&image)?;
        serde_json::to_string_pretty(&document)?
    };

    fs::write(&args.output, scene)?;

    info!(output_file = args.output; "Scene exported successfully");

    Ok(())
}
