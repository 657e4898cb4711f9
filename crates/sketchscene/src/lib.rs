//! SketchScene - Convert photographs of hand-drawn diagrams into Excalidraw
//! scene documents.
//!
//! An external model describes the image as delimited text and reviews its
//! own answer; the text is then parsed deterministically into a scene
//! document, and a second model call repairs the document until it is valid
//! JSON. The models are reached only through the [`transform`] traits.

pub mod cancel;
pub mod config;
pub mod openai;
pub mod pipeline;
pub mod prompts;
pub mod repair;
pub mod transform;

mod error;

pub use sketchscene_core::{document, element, value};
pub use sketchscene_parser::{Assembly, Span, error as diagnostics};

pub use error::SketchError;

use std::sync::Arc;

use log::{debug, info, log, trace};
use serde_json::Value;

use sketchscene_core::document::SceneDocument;

use config::AppConfig;
use openai::ChatClient;
use pipeline::{Pipeline, RunOutcome};
use transform::{ImagePayload, ImageToText, TextRepair};

/// Builder for assembling and converting scene documents.
///
/// # Examples
///
/// ```rust
/// use sketchscene::{SceneBuilder, config::AppConfig};
///
/// let builder = SceneBuilder::new(AppConfig::default());
///
/// // Offline: intermediate text straight to a document
/// let document = builder
///     .assemble("type,x,y,text\ntext,10,20,Hello")
///     .expect("Failed to assemble");
/// assert_eq!(document.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SceneBuilder {
    config: AppConfig,
}

impl SceneBuilder {
    /// Create a new builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Model endpoint and repair settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// The builder's configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Assemble intermediate text into a scene document.
    ///
    /// Fallback warnings are logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns `SketchError::Parse` if the text has no header or no data row.
    pub fn assemble(&self, text: &str) -> Result<SceneDocument, SketchError> {
        Ok(self.assemble_with_diagnostics(text)?.into_parts().0)
    }

    /// Assemble intermediate text, keeping the fallback warnings.
    ///
    /// # Errors
    ///
    /// Returns `SketchError::Parse` if the text has no header or no data row.
    pub fn assemble_with_diagnostics(&self, text: &str) -> Result<Assembly, SketchError> {
        info!("Assembling intermediate text");

        let source = sketchscene_parser::strip_code_fence(text);
        let assembly = sketchscene_parser::assemble(source)
            .map_err(|err| SketchError::new_parse_error(err, source))?;

        for diagnostic in assembly.diagnostics() {
            log!(
                diagnostic.severity().log_level(),
                code = diagnostic.code().map(|code| code.as_str());
                "{diagnostic}"
            );
        }
        debug!(elements = assembly.document().len(); "Intermediate text assembled");

        Ok(assembly)
    }

    /// Run the full pipeline on an image with the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns `SketchError::Stage` naming the failing stage, or
    /// `SketchError::Config` if the configuration is invalid.
    pub fn convert_with(
        &self,
        image: &ImagePayload,
        vision: Arc<dyn ImageToText>,
        repair: Arc<dyn TextRepair>,
    ) -> Result<Value, SketchError> {
        self.config.validate().map_err(SketchError::Config)?;

        info!(image_bytes = image.bytes().len(); "Converting image");
        let pipeline =
            Pipeline::new(vision, repair).with_max_attempts(self.config.repair().max_attempts());

        match pipeline.run(image) {
            RunOutcome::Done(document) => {
                trace!(document:?; "Converted document");
                Ok(document)
            }
            RunOutcome::Failed { stage, error } => Err(SketchError::Stage { stage, error }),
            RunOutcome::Suspended => Err(SketchError::Suspended),
        }
    }

    /// Run the full pipeline against the configured chat-completions models.
    ///
    /// # Errors
    ///
    /// Returns `SketchError::Transform` if a client cannot be created (for
    /// example, the API key variable is unset), otherwise as
    /// [`SceneBuilder::convert_with`].
    pub fn convert(&self, image: &ImagePayload) -> Result<Value, SketchError> {
        let model = self.config.model();
        let vision = Arc::new(ChatClient::vision(model)?);
        let repair = Arc::new(ChatClient::repair(model)?);
        debug!(
            vision_model = vision.model(),
            repair_model = repair.model();
            "Chat clients ready"
        );

        self.convert_with(image, vision, repair)
    }
}
