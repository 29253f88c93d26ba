//! `/api/vapi/generate`: generate interview questions and persist the record.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::{error, info};

use prepkit_core::covers::random_interview_cover;
use prepkit_core::error::{PrepKitError, Result};
use prepkit_core::prompt::build_question_prompt;
use prepkit_core::types::{Interview, InterviewParams, StoredInterview};
use prepkit_providers::GenerationRequest;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Parse raw model output as a JSON array of strings.
///
/// One attempt, no repair: anything else is an invalid response.
pub fn parse_questions(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
        error!(raw, %e, "Failed to parse model response");
        PrepKitError::InvalidModelResponse
    })
}

/// Generate questions for `params` and append the resulting record.
///
/// Nothing is written unless the model output parses.
pub async fn generate_interview(
    state: &GatewayState,
    params: &InterviewParams,
) -> Result<StoredInterview> {
    let credentials = state.credentials.as_ref().ok_or_else(|| {
        PrepKitError::Config("no generative AI API key configured".to_string())
    })?;

    let generation_config = state.config.generation();
    let request = GenerationRequest {
        model: state.config.model(),
        prompt: build_question_prompt(params),
        temperature: generation_config.temperature,
        max_output_tokens: generation_config.max_output_tokens,
    };

    let generation = state
        .provider
        .generate(&request, credentials)
        .await
        .map_err(|e| PrepKitError::Provider(e.to_string()))?;

    let questions = parse_questions(&generation.text)?;

    let interview = Interview::from_params(params, questions, random_interview_cover());
    let id = state.store.add(&interview).await?;

    info!(
        %id,
        role = %interview.role,
        user_id = %interview.user_id,
        questions = interview.questions.len(),
        "Interview stored"
    );

    Ok(StoredInterview { id, interview })
}

/// `POST /api/vapi/generate`
pub async fn generate_handler(
    State(state): State<Arc<GatewayState>>,
    payload: std::result::Result<Json<InterviewParams>, JsonRejection>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let started = Instant::now();

    let Json(params) = payload.map_err(|rejection| {
        error!(%rejection, "Rejected generate request body");
        ApiError::BadRequest(rejection.body_text())
    })?;

    info!(
        role = %params.role,
        interview_type = %params.interview_type,
        amount = params.amount,
        "Generating interview questions"
    );

    let result = generate_interview(&state, &params).await;

    #[cfg(feature = "metrics")]
    crate::metrics::record_generation(&result, started.elapsed().as_secs_f64());

    match result {
        Ok(_) => Ok(Json(json!({ "success": true }))),
        Err(e) => {
            error!(error = %e, elapsed_ms = started.elapsed().as_millis() as u64, "Generation failed");
            Err(ApiError::from(e))
        }
    }
}

/// `GET /api/vapi/generate`: static acknowledgement.
pub async fn acknowledge_handler() -> impl IntoResponse {
    Json(json!({ "success": true, "data": "Thank you!" }))
}
