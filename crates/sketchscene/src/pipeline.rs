//! Pipeline controller.
//!
//! Runs the four stages strictly in order:
//!
//! ```text
//! ImageToText -> TextSelfReview -> Assemble -> ValidateRepair -> Done
//! ```
//!
//! Each stage's output feeds the next. The first failure ends the run in
//! [`RunOutcome::Failed`] with the failing [`Stage`]; only the repair stage
//! retries internally.

use std::{fmt, sync::Arc};

use log::{debug, info, log, warn};
use serde_json::Value;
use thiserror::Error;

use sketchscene_parser::{ParseError, RowParser, assemble_with, strip_code_fence};

pub use crate::cancel::CancelFlag;

use crate::{
    cancel::call_cancellable,
    prompts,
    repair::{DEFAULT_MAX_ATTEMPTS, RepairError, RepairLoop},
    transform::{Conversation, ImagePayload, ImageToText, TextRepair, TransformError},
};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ImageToText,
    TextSelfReview,
    Assemble,
    ValidateRepair,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ImageToText => "image-to-text",
            Stage::TextSelfReview => "text-self-review",
            Stage::Assemble => "assemble",
            Stage::ValidateRepair => "validate-repair",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a stage failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing input: {0}")]
    MissingInput(&'static str),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("validation exhausted after {attempts} attempt(s): {last_error}")]
    ValidationExhausted { attempts: usize, last_error: String },

    #[error("run cancelled")]
    Cancelled,
}

impl From<RepairError> for PipelineError {
    fn from(err: RepairError) -> Self {
        match err {
            RepairError::Exhausted {
                attempts,
                last_error,
            } => PipelineError::ValidationExhausted {
                attempts,
                last_error,
            },
            RepairError::Transform(err) => PipelineError::Transform(err),
            RepairError::Cancelled => PipelineError::Cancelled,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The repaired document.
    Done(Value),
    /// A stage failed; no document was produced.
    Failed { stage: Stage, error: PipelineError },
    /// Reserved for human-in-the-loop review; never produced by [`Pipeline::run`].
    Suspended,
}

impl RunOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, RunOutcome::Done(_))
    }

    /// The failing stage, if the run failed.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            RunOutcome::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&Value> {
        match self {
            RunOutcome::Done(document) => Some(document),
            _ => None,
        }
    }
}

/// Sequences the four stages over two transformation collaborators.
///
/// Collaborators are shared so an in-flight call can be abandoned on
/// cancellation while its worker thread runs to completion.
pub struct Pipeline {
    vision: Arc<dyn ImageToText>,
    repair: Arc<dyn TextRepair>,
    max_attempts: usize,
    row_parser: Option<RowParser>,
    cancel: CancelFlag,
}

impl Pipeline {
    pub fn new(vision: Arc<dyn ImageToText>, repair: Arc<dyn TextRepair>) -> Self {
        Self {
            vision,
            repair,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            row_parser: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Set the repair attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Use a fixed row parser instead of stamping the time at assembly.
    pub fn with_row_parser(mut self, row_parser: RowParser) -> Self {
        self.row_parser = Some(row_parser);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that cancels this pipeline's runs.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run all stages on one image.
    pub fn run(&self, image: &ImagePayload) -> RunOutcome {
        match self.run_stages(image) {
            Ok(document) => {
                info!("Pipeline completed");
                RunOutcome::Done(document)
            }
            Err((stage, error)) => {
                warn!(stage = stage.as_str(), error = error.to_string(); "Pipeline failed");
                RunOutcome::Failed { stage, error }
            }
        }
    }

    fn run_stages(&self, image: &ImagePayload) -> Result<Value, (Stage, PipelineError)> {
        let at = |stage: Stage| move |error: PipelineError| (stage, error);

        let mut conversation = Conversation::starting_with(prompts::IMAGE_TO_TEXT);
        let draft = self
            .describe(image, &conversation)
            .map_err(at(Stage::ImageToText))?;

        conversation.push_assistant(draft);
        conversation.push_user(prompts::SELF_REVIEW);
        let revised = self
            .describe(image, &conversation)
            .map_err(at(Stage::TextSelfReview))?;

        let candidate = self.assemble(&revised).map_err(at(Stage::Assemble))?;

        self.validate(&candidate).map_err(at(Stage::ValidateRepair))
    }

    fn describe(
        &self,
        image: &ImagePayload,
        conversation: &Conversation,
    ) -> Result<String, PipelineError> {
        if image.is_empty() {
            return Err(PipelineError::MissingInput("image payload is empty"));
        }
        debug!(
            turns = conversation.len(),
            image_bytes = image.bytes().len();
            "Calling image-to-text"
        );
        let vision = Arc::clone(&self.vision);
        let image = image.clone();
        let conversation = conversation.clone();
        let text = call_cancellable(&self.cancel, move || {
            vision.complete(&image, &conversation)
        })
        .map_err(|_| PipelineError::Cancelled)??;
        if text.trim().is_empty() {
            return Err(PipelineError::MissingInput("transformation returned no text"));
        }

        debug!(chars = text.len(); "Image-to-text responded");
        Ok(text)
    }

    fn assemble(&self, text: &str) -> Result<Value, PipelineError> {
        let source = strip_code_fence(text);
        let parser = self.row_parser.unwrap_or_default();

        let assembly = assemble_with(source, parser).map_err(|err| PipelineError::Parse {
            err,
            src: source.to_string(),
        })?;

        for diagnostic in assembly.diagnostics() {
            log!(
                diagnostic.severity().log_level(),
                code = diagnostic.code().map(|code| code.as_str());
                "{diagnostic}"
            );
        }

        Ok(assembly.document().to_json_value())
    }

    fn validate(&self, candidate: &Value) -> Result<Value, PipelineError> {
        let repaired = RepairLoop::new(Arc::clone(&self.repair))
            .with_max_attempts(self.max_attempts)
            .with_cancel_flag(self.cancel.clone())
            .run(candidate)?;

        info!(attempts = repaired.attempts(); "Document validated");
        Ok(repaired.into_document())
    }
}
