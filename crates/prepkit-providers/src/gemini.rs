//! Google Generative AI (Gemini) provider.
//!
//! Uses the non-streaming `generateContent` endpoint. Auth is via API key in
//! query parameter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, trace};

use crate::{Credentials, Generation, GenerationRequest, LlmProvider, Usage};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiProvider {
    pub base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        // Accept both "gemini-1.5-flash" and "models/gemini-1.5-flash".
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }
}

// --- Gemini request/response types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

fn build_request(request: &GenerationRequest) -> GeminiRequest {
    let generation_config = if request.temperature.is_some() || request.max_output_tokens.is_some()
    {
        Some(GenerationConfig {
            max_output_tokens: request.max_output_tokens,
            temperature: request.temperature,
        })
    } else {
        None
    };

    GeminiRequest {
        contents: vec![json!({
            "role": "user",
            "parts": [{ "text": request.prompt }],
        })],
        generation_config,
    }
}

/// Concatenate the text parts of the first candidate.
fn into_generation(response: GeminiResponse) -> Generation {
    let usage = response.usage_metadata.map(|u| Usage {
        input_tokens: u.prompt_token_count,
        output_tokens: u.candidates_token_count,
    });

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Generation {
            text: String::new(),
            usage,
            finish_reason: None,
        };
    };

    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    Generation {
        text,
        usage,
        finish_reason: candidate.finish_reason,
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn id(&self) -> &str {
        "google"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &Credentials,
    ) -> anyhow::Result<Generation> {
        let Credentials::ApiKey { api_key } = credentials;

        let body = build_request(request);

        debug!(model = %request.model, "Calling Gemini generateContent");

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .query(&[("key", api_key.as_str())])
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {status}: {body}");
        }

        let parsed: GeminiResponse = response.json().await?;
        let generation = into_generation(parsed);
        trace!(
            chars = generation.text.len(),
            finish_reason = ?generation.finish_reason,
            "Gemini generation complete"
        );
        Ok(generation)
    }
}
