//! Voice SDK client abstraction.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::events::VoiceEvent;

/// Default capacity for a client's event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A real-time voice session client.
///
/// Lifecycle, transcript, speech, and error events are delivered to every
/// receiver returned by [`subscribe`](VoiceClient::subscribe). Dropping a
/// receiver removes that listener.
#[async_trait]
pub trait VoiceClient: Send + Sync {
    /// Start a session with the given assistant.
    async fn start(&self, assistant_id: &str) -> anyhow::Result<()>;

    /// Stop the current session.
    async fn stop(&self) -> anyhow::Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<VoiceEvent>;

    /// Whether the client currently holds a live call, when it knows.
    ///
    /// Used to resynchronise after a listener lagged and lost events.
    async fn in_call(&self) -> Option<bool> {
        None
    }
}
