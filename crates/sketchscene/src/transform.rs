//! Contracts for the external generative transformations.
//!
//! The pipeline never talks to a model directly. It sees two blocking
//! collaborators: [`ImageToText`] for the first two stages and
//! [`TextRepair`] for the validate-repair loop. Both exchange plain text
//! over a [`Conversation`] of role-tagged turns.

use std::{fmt, time::Duration};

use serde::Serialize;
use thiserror::Error;

/// Failure of an external transformation call.
///
/// Timeouts are reported like any other failure and end the current stage.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response contained no message")]
    EmptyResponse,

    #[error("API key environment variable `{0}` is not set")]
    MissingApiKey(String),
}

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An ordered sequence of turns sent to a transformation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation opened by a single user turn.
    pub fn starting_with(content: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(content)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Raw image bytes handed to the image-to-text transformation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type sniffed from the leading magic bytes.
    ///
    /// Recognises PNG, JPEG, GIF and WebP; anything else is reported as PNG.
    pub fn mime_type(&self) -> &'static str {
        match self.bytes.as_slice() {
            [0x89, b'P', b'N', b'G', ..] => "image/png",
            [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
            [b'G', b'I', b'F', b'8', ..] => "image/gif",
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
            _ => "image/png",
        }
    }
}

impl From<Vec<u8>> for ImagePayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Turns an image plus instructions into free-form text.
///
/// Called twice per run: once for the initial description and once, with the
/// accumulated conversation, for the self-review. Calls run on a worker
/// thread so a run can be cancelled while one is in flight.
pub trait ImageToText: Send + Sync {
    fn complete(
        &self,
        image: &ImagePayload,
        conversation: &Conversation,
    ) -> Result<String, TransformError>;
}

/// Turns a conversation into free-form text. Used by the repair loop.
pub trait TextRepair: Send + Sync {
    fn complete(&self, conversation: &Conversation) -> Result<String, TransformError>;
}
