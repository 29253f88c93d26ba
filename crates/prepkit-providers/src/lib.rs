//! Text-generation provider abstraction.
//!
//! A provider implements [`LlmProvider`] to turn a single prompt into raw
//! text. Interpreting that text (e.g. as a JSON list of questions) is the
//! caller's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod gemini;

pub use gemini::GeminiProvider;

/// Credentials for authenticating with a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Credentials {
    #[serde(rename = "api_key")]
    ApiKey { api_key: String },
}

/// A single-prompt generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

/// Raw model output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub usage: Option<Usage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// The core text-generation trait.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider identifier (e.g., "google").
    fn id(&self) -> &str;

    /// Generate text for a prompt. No retries are attempted.
    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &Credentials,
    ) -> anyhow::Result<Generation>;
}
