//! Bounded validate-repair loop.
//!
//! The candidate document is sent to a [`TextRepair`] transformation, and the
//! response is cleaned up and parsed as JSON. A response that does not parse
//! is fed back as an assistant turn together with a corrective user turn
//! quoting the parse error, and the transformation is asked again. The loop
//! makes at most `max_attempts` calls.

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;
use thiserror::Error;

use sketchscene_parser::strip_code_fence;

use crate::{
    cancel::{CancelFlag, call_cancellable},
    prompts,
    transform::{Conversation, TextRepair, TransformError},
};

/// Default number of repair attempts.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Failure of the repair loop.
#[derive(Debug, Error)]
pub enum RepairError {
    #[error("document still invalid after {attempts} repair attempt(s): {last_error}")]
    Exhausted { attempts: usize, last_error: String },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("repair cancelled")]
    Cancelled,
}

/// A document that parsed as JSON, with the attempt that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    document: Value,
    attempts: usize,
}

impl Repaired {
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The 1-based attempt that succeeded.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn into_document(self) -> Value {
        self.document
    }
}

/// Per-run state: attempt counter, accumulated turns and the last error.
#[derive(Debug)]
struct RetryState {
    attempt: usize,
    conversation: Conversation,
    last_error: String,
}

impl RetryState {
    fn new(candidate: &str) -> Self {
        Self {
            attempt: 1,
            conversation: Conversation::starting_with(prompts::repair_request(candidate)),
            last_error: String::new(),
        }
    }

    fn record_failure(&mut self, error: String) {
        self.last_error = error;
    }

    /// Feed the rejected response and its error back for the next attempt.
    fn retry_with(&mut self, response: String) {
        self.conversation.push_assistant(response);
        self.conversation.push_user(prompts::repair_correction(&self.last_error));
        self.attempt += 1;
    }

    fn exhausted(self) -> RepairError {
        RepairError::Exhausted {
            attempts: self.attempt,
            last_error: self.last_error,
        }
    }
}

/// Drives a [`TextRepair`] transformation until its output parses.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use serde_json::json;
/// use sketchscene::{
///     repair::RepairLoop,
///     transform::{Conversation, TextRepair, TransformError},
/// };
///
/// struct Echo;
///
/// impl TextRepair for Echo {
///     fn complete(&self, _: &Conversation) -> Result<String, TransformError> {
///         Ok(r#""{\"type\": \"excalidraw\"}""#.to_string())
///     }
/// }
///
/// let repaired = RepairLoop::new(Arc::new(Echo))
///     .run(&json!({"type": "excalidraw"}))
///     .unwrap();
/// assert_eq!(repaired.attempts(), 1);
/// ```
pub struct RepairLoop {
    transform: Arc<dyn TextRepair>,
    max_attempts: usize,
    cancel: CancelFlag,
}

impl RepairLoop {
    /// Create a loop with [`DEFAULT_MAX_ATTEMPTS`].
    pub fn new(transform: Arc<dyn TextRepair>) -> Self {
        Self {
            transform,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cancel: CancelFlag::new(),
        }
    }

    /// Set the attempt budget. Values below 1 are raised to 1.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Share a cancellation flag. Raising it abandons the call in flight.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Repair `candidate` into a document that parses as a JSON object.
    ///
    /// # Errors
    ///
    /// - [`RepairError::Exhausted`] after `max_attempts` unparsable responses
    /// - [`RepairError::Transform`] as soon as a call fails
    /// - [`RepairError::Cancelled`] as soon as the flag is raised
    pub fn run(&self, candidate: &Value) -> Result<Repaired, RepairError> {
        let serialized = candidate.to_string();
        let mut state = RetryState::new(&serialized);

        loop {
            debug!(
                attempt = state.attempt,
                max_attempts = self.max_attempts,
                turns = state.conversation.len();
                "Requesting repair"
            );
            let transform = Arc::clone(&self.transform);
            let conversation = state.conversation.clone();
            let response = call_cancellable(&self.cancel, move || {
                transform.complete(&conversation)
            })
            .map_err(|_| RepairError::Cancelled)??;

            match parse_response(&response) {
                Ok(document) => {
                    info!(attempts = state.attempt; "Repair response parsed");
                    return Ok(Repaired {
                        document,
                        attempts: state.attempt,
                    });
                }
                Err(error) => {
                    warn!(
                        attempt = state.attempt,
                        error = error.as_str();
                        "Repair response is not valid JSON"
                    );
                    state.record_failure(error);
                    if state.attempt >= self.max_attempts {
                        return Err(state.exhausted());
                    }
                    state.retry_with(response);
                }
            }
        }
    }
}

/// Clean up a raw response and parse it as a JSON object.
///
/// Cleanup order: remove a Markdown code fence, strip one pair of matching
/// outer quotes, parse; on failure unescape `\"` and `\n` and parse again.
/// The returned error is the one from the last parse.
pub fn parse_response(raw: &str) -> Result<Value, String> {
    let text = strip_outer_quotes(strip_code_fence(raw));

    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(_) => {
            serde_json::from_str::<Value>(&unescape(text)).map_err(|err| err.to_string())?
        }
    };

    if value.is_object() {
        Ok(value)
    } else {
        Err(format!("expected a JSON object, found {}", json_kind(&value)))
    }
}

fn strip_outer_quotes(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'')), Some(close)) if open == close => chars.as_str(),
        _ => text,
    }
}

fn unescape(text: &str) -> String {
    text.replace("\\\"", "\"").replace("\\n", "\n")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
