//! Gateway integration tests: start a real gateway and drive it over HTTP.
//!
//! Run with: `cargo test -p prepkit-gateway --test integration`

use std::sync::Arc;

use async_trait::async_trait;
use prepkit_core::config::Config;
use prepkit_core::error::PrepKitError;
use prepkit_core::interview_store::{InterviewStore, JsonlInterviewStore, MemoryInterviewStore};
use prepkit_core::types::{Interview, StoredInterview};
use prepkit_gateway::GatewayState;
use prepkit_providers::{Credentials, Generation, GenerationRequest, LlmProvider};
use serde_json::{Value, json};

/// Provider that always replies with the same text.
struct FixedReply(&'static str);

#[async_trait]
impl LlmProvider for FixedReply {
    fn id(&self) -> &str {
        "fixed"
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
        _credentials: &Credentials,
    ) -> anyhow::Result<Generation> {
        Ok(Generation {
            text: self.0.to_string(),
            ..Generation::default()
        })
    }
}

/// Store whose writes always fail.
struct UnwritableStore;

#[async_trait]
impl InterviewStore for UnwritableStore {
    async fn add(&self, _interview: &Interview) -> prepkit_core::error::Result<String> {
        Err(PrepKitError::Storage("disk full".into()))
    }

    async fn list(&self) -> prepkit_core::error::Result<Vec<StoredInterview>> {
        Ok(Vec::new())
    }
}

/// Find an available port.
fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Start a gateway with the given reply and store, returning its base URL.
async fn start_test_gateway(reply: &'static str, store: Arc<dyn InterviewStore>) -> String {
    let port = find_free_port();
    let config = Config::parse(r#"{ gateway: { bind: "127.0.0.1" } }"#).unwrap();

    let state = Arc::new(GatewayState::new(
        Arc::new(config),
        Arc::new(FixedReply(reply)),
        Some(Credentials::ApiKey {
            api_key: "test".into(),
        }),
        store,
    ));

    tokio::spawn(async move {
        let _ = prepkit_gateway::start_gateway(state, port).await;
    });

    let base = format!("http://127.0.0.1:{port}");
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        if reqwest::get(format!("{base}/health")).await.is_ok() {
            break;
        }
    }
    base
}

fn example_body() -> Value {
    json!({
        "type": "technical",
        "role": "Backend Engineer",
        "level": "Senior",
        "techstack": "Go,Postgres",
        "amount": 3,
        "userid": "u1",
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let base = start_test_gateway("[]", Arc::new(MemoryInterviewStore::new())).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "fixed");
}

#[tokio::test]
async fn test_get_acknowledgement() {
    let base = start_test_gateway("[]", Arc::new(MemoryInterviewStore::new())).await;

    let resp = reqwest::get(format!("{base}/api/vapi/generate")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "data": "Thank you!" }));
}

#[tokio::test]
async fn test_generate_stores_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonlInterviewStore::new(dir.path().to_path_buf(), "interviews"));
    let base = start_test_gateway(r#"["Q1","Q2","Q3"]"#, store.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/vapi/generate"))
        .json(&example_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));

    let docs = store.list().await.unwrap();
    assert_eq!(docs.len(), 1);
    let interview = &docs[0].interview;
    assert_eq!(interview.techstack, vec!["Go", "Postgres"]);
    assert_eq!(interview.questions, vec!["Q1", "Q2", "Q3"]);
    assert_eq!(interview.role, "Backend Engineer");
    assert_eq!(interview.interview_type, "technical");
    assert_eq!(interview.user_id, "u1");
    assert!(interview.finalized);
}

#[tokio::test]
async fn test_unparseable_reply_returns_500_and_writes_nothing() {
    let store = Arc::new(MemoryInterviewStore::new());
    let base = start_test_gateway("Sure, here are your questions: ...", store.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/vapi/generate"))
        .json(&example_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid response from AI model");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let store = Arc::new(MemoryInterviewStore::new());
    let base = start_test_gateway(r#"["Q1"]"#, store.clone()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/vapi/generate"))
        .json(&json!({ "role": "Backend Engineer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_store_failure_returns_500_with_error() {
    let base = start_test_gateway(r#"["Q1","Q2","Q3"]"#, Arc::new(UnwritableStore)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/vapi/generate"))
        .json(&example_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    let error = body["error"].as_str().expect("error should be a string");
    assert!(error.contains("disk full"), "unexpected error body: {error}");
}
