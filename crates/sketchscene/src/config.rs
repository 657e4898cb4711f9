//! Configuration types for SketchScene conversions.
//!
//! All types implement [`serde::Deserialize`]; every key is optional and
//! falls back to the defaults below.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining model and repair settings.
//! - [`ModelConfig`] - Chat-completions endpoint, model names and limits.
//! - [`RepairConfig`] - Attempt budget of the validate-repair loop.
//!
//! # Example
//!
//! ```
//! # use sketchscene::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.repair().max_attempts(), 3);
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::repair::DEFAULT_MAX_ATTEMPTS;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Model section.
    #[serde(default)]
    model: ModelConfig,

    /// Repair loop section.
    #[serde(default)]
    repair: RepairConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(model: ModelConfig, repair: RepairConfig) -> Self {
        Self { model, repair }
    }

    /// Returns the model configuration.
    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Returns the repair configuration.
    pub fn repair(&self) -> &RepairConfig {
        &self.repair
    }

    /// Check values that deserialize but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending key.
    pub fn validate(&self) -> Result<(), String> {
        if self.repair.max_attempts == 0 {
            return Err("repair.max_attempts must be at least 1".to_string());
        }
        if self.model.timeout_secs == 0 {
            return Err("model.timeout_secs must be at least 1".to_string());
        }
        if self.model.endpoint.trim().is_empty() {
            return Err("model.endpoint must not be empty".to_string());
        }
        Ok(())
    }
}

/// Chat-completions model settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    endpoint: String,
    vision_model: String,
    repair_model: String,
    api_key_env: String,
    timeout_secs: u64,
    max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            vision_model: "gpt-4o".to_string(),
            repair_model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
            max_tokens: 4096,
        }
    }
}

impl ModelConfig {
    /// Chat-completions URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Model used for the image-to-text and self-review stages.
    pub fn vision_model(&self) -> &str {
        &self.vision_model
    }

    /// Model used by the repair loop.
    pub fn repair_model(&self) -> &str {
        &self.repair_model
    }

    /// Name of the environment variable holding the API key.
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Validate-repair loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    max_attempts: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RepairConfig {
    /// Creates a new [`RepairConfig`].
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    /// Maximum number of repair calls per run.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
