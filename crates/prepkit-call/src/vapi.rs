//! Vapi web-call client.
//!
//! Starting a call creates a web call through the Vapi REST API using the
//! public key. The audio transport that carries the call is external: it
//! reports transcripts, speech boundaries, and errors through
//! [`VapiClient::event_sender`]. Hang-up goes through the call's control
//! URL with an `end-call` message, which closes the call for every
//! participant, including a transport that is still attached.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::client::{VoiceClient, DEFAULT_EVENT_CAPACITY};
use crate::events::VoiceEvent;

const DEFAULT_BASE_URL: &str = "https://api.vapi.ai";

/// A web call created by Vapi.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebCall {
    pub id: String,
    #[serde(default)]
    pub web_call_url: Option<String>,
    #[serde(default)]
    pub monitor: Option<CallMonitor>,
}

impl WebCall {
    fn control_url(&self) -> Option<&str> {
        self.monitor.as_ref()?.control_url.as_deref()
    }
}

/// Live-call URLs returned with a web call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMonitor {
    #[serde(default)]
    pub listen_url: Option<String>,
    #[serde(default)]
    pub control_url: Option<String>,
}

/// The call slot. `generation` is bumped by every `stop`, so a `start`
/// whose request resolves after a `stop` can tell it was cancelled.
#[derive(Default)]
struct Session {
    call: Option<WebCall>,
    generation: u64,
}

pub struct VapiClient {
    pub base_url: String,
    public_key: String,
    client: reqwest::Client,
    events: broadcast::Sender<VoiceEvent>,
    session: Mutex<Session>,
}

impl VapiClient {
    pub fn new(public_key: impl Into<String>, base_url: Option<&str>) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            public_key: public_key.into(),
            client: reqwest::Client::new(),
            events,
            session: Mutex::new(Session::default()),
        }
    }

    /// Sender the media transport uses to publish call events.
    pub fn event_sender(&self) -> broadcast::Sender<VoiceEvent> {
        self.events.clone()
    }

    /// The web call currently in progress, if any.
    pub async fn current_call(&self) -> Option<WebCall> {
        self.session.lock().await.call.clone()
    }

    fn emit(&self, event: VoiceEvent) {
        // No subscribers is fine; the event is simply dropped.
        let _ = self.events.send(event);
    }

    async fn create_web_call(&self, assistant_id: &str) -> anyhow::Result<WebCall> {
        let url = format!("{}/call/web", self.base_url);
        debug!(%assistant_id, "Creating Vapi web call");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.public_key)
            .json(&json!({ "assistantId": assistant_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Vapi API error {status}: {body}");
        }

        Ok(response.json().await?)
    }

    /// Ask Vapi to end `call`.
    async fn end_call(&self, call: &WebCall) -> anyhow::Result<()> {
        let Some(control_url) = call.control_url() else {
            warn!(call_id = %call.id, "Web call has no control URL, cannot end it remotely");
            return Ok(());
        };

        let response = self
            .client
            .post(control_url)
            .json(&json!({ "type": "end-call" }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Vapi end-call error {status}: {body}");
        }
        Ok(())
    }
}

#[async_trait]
impl VoiceClient for VapiClient {
    async fn start(&self, assistant_id: &str) -> anyhow::Result<()> {
        let generation = self.session.lock().await.generation;

        let call = match self.create_web_call(assistant_id).await {
            Ok(call) => call,
            Err(e) => {
                self.emit(VoiceEvent::Error(e.to_string()));
                return Err(e);
            }
        };

        {
            let mut session = self.session.lock().await;
            if session.generation == generation {
                info!(call_id = %call.id, "Vapi call started");
                session.call = Some(call);
                drop(session);
                self.emit(VoiceEvent::CallStart);
                return Ok(());
            }
        }

        info!(call_id = %call.id, "Call stopped while starting, ending it");
        self.end_call(&call).await
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let call = {
            let mut session = self.session.lock().await;
            session.generation += 1;
            session.call.take()
        };

        let Some(call) = call else {
            return Ok(());
        };

        info!(call_id = %call.id, "Vapi call stopped");
        let ended = self.end_call(&call).await;
        self.emit(VoiceEvent::CallEnd);
        ended
    }

    fn subscribe(&self) -> broadcast::Receiver<VoiceEvent> {
        self.events.subscribe()
    }

    async fn in_call(&self) -> Option<bool> {
        Some(self.session.lock().await.call.is_some())
    }
}
