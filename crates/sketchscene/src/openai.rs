//! OpenAI-compatible chat-completions client.
//!
//! [`ChatClient`] implements both transformation contracts over a blocking
//! HTTP client. Images travel as base64 `data:` URLs attached to the first
//! user turn; every request uses temperature 0.

use std::{env, time::Duration};

use base64::Engine;
use log::{debug, trace};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::ModelConfig,
    transform::{Conversation, ImagePayload, ImageToText, Role, TextRepair, TransformError},
};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: Role,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Content<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for one model on a chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl ChatClient {
    /// Create a client with an explicit key.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Request`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        max_tokens: u32,
    ) -> Result<Self, TransformError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransformError::Request(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            timeout,
        })
    }

    /// Client for the configured vision model.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::MissingApiKey`] if the key variable is unset.
    pub fn vision(config: &ModelConfig) -> Result<Self, TransformError> {
        Self::from_config(config, config.vision_model())
    }

    /// Client for the configured repair model.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::MissingApiKey`] if the key variable is unset.
    pub fn repair(config: &ModelConfig) -> Result<Self, TransformError> {
        Self::from_config(config, config.repair_model())
    }

    fn from_config(config: &ModelConfig, model: &str) -> Result<Self, TransformError> {
        let api_key = env::var(config.api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TransformError::MissingApiKey(config.api_key_env().to_string()))?;

        Self::new(
            config.endpoint(),
            api_key,
            model,
            config.timeout(),
            config.max_tokens(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn send(
        &self,
        conversation: &Conversation,
        image: Option<&ImagePayload>,
    ) -> Result<String, TransformError> {
        let image_url = image.map(data_url);
        let request = ChatRequest {
            model: &self.model,
            messages: build_messages(conversation, image_url),
            max_tokens: self.max_tokens,
            temperature: 0.0,
        };

        debug!(model = self.model, turns = conversation.len(); "Sending chat request");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransformError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response.json().map_err(|err| self.transport_error(err))?;
        let content = first_message(body)?;
        trace!(chars = content.len(); "Chat response received");
        Ok(content)
    }

    fn transport_error(&self, err: reqwest::Error) -> TransformError {
        if err.is_timeout() {
            TransformError::Timeout(self.timeout)
        } else {
            TransformError::Request(err.to_string())
        }
    }
}

impl ImageToText for ChatClient {
    fn complete(
        &self,
        image: &ImagePayload,
        conversation: &Conversation,
    ) -> Result<String, TransformError> {
        self.send(conversation, Some(image))
    }
}

impl TextRepair for ChatClient {
    fn complete(&self, conversation: &Conversation) -> Result<String, TransformError> {
        self.send(conversation, None)
    }
}

fn data_url(image: &ImagePayload) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(image.bytes());
    format!("data:{};base64,{encoded}", image.mime_type())
}

/// Map turns to messages, attaching the image to the first user turn.
fn build_messages(conversation: &Conversation, mut image_url: Option<String>) -> Vec<Message<'_>> {
    conversation
        .turns()
        .iter()
        .map(|turn| {
            let mut content = vec![Content::Text {
                text: turn.content(),
            }];
            if turn.role() == Role::User {
                if let Some(url) = image_url.take() {
                    content.push(Content::ImageUrl {
                        image_url: ImageUrl {
                            url,
                            detail: "high",
                        },
                    });
                }
            }
            Message {
                role: turn.role(),
                content,
            }
        })
        .collect()
}

fn first_message(response: ChatResponse) -> Result<String, TransformError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(TransformError::EmptyResponse)
}
