//! Call agent: drives a [`VoiceClient`] and tracks the call lifecycle.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::VoiceClient;
use crate::events::VoiceEvent;
use crate::state::{CallState, CallStatus};
use crate::view::CallView;

/// Route navigated to once the call finishes.
pub const LANDING_ROUTE: &str = "/";

/// Client-side navigation, triggered when a call finishes.
pub trait Navigator: Send + Sync {
    fn push(&self, route: &str);
}

/// Navigator that forwards routes over a channel.
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNavigator {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn push(&self, route: &str) {
        if self.tx.send(route.to_string()).is_err() {
            debug!(route, "Navigation receiver dropped");
        }
    }
}

/// State shared between the agent and its event-loop task.
struct Shared {
    state: watch::Sender<CallState>,
    navigator: Arc<dyn Navigator>,
}

impl Shared {
    /// Mutate the call state and run the navigation side effect when the
    /// update entered `Finished`.
    fn update<F>(&self, f: F) -> Option<CallStatus>
    where
        F: FnOnce(&mut CallState) -> Option<CallStatus>,
    {
        let mut changed = None;
        self.state.send_modify(|state| changed = f(state));

        if changed == Some(CallStatus::Finished) {
            info!(route = LANDING_ROUTE, "Call finished, navigating away");
            self.navigator.push(LANDING_ROUTE);
        }
        changed
    }
}

/// A mounted call component.
///
/// Owns its voice client subscription; dropping the agent cancels the event
/// loop and removes the listener.
pub struct CallAgent {
    client: Arc<dyn VoiceClient>,
    assistant_id: Option<String>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CallAgent {
    /// Subscribe to `client` and start consuming its events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(
        client: Arc<dyn VoiceClient>,
        navigator: Arc<dyn Navigator>,
        assistant_id: Option<String>,
    ) -> Self {
        let (state, _) = watch::channel(CallState::new());
        let shared = Arc::new(Shared { state, navigator });
        let cancel = CancellationToken::new();

        let events = client.subscribe();
        let task = tokio::spawn(run_event_loop(
            shared.clone(),
            client.clone(),
            events,
            cancel.clone(),
        ));
        debug!("Call agent mounted");

        Self {
            client,
            assistant_id: assistant_id.filter(|id| !id.is_empty()),
            shared,
            cancel,
            task: Some(task),
        }
    }

    pub fn status(&self) -> CallStatus {
        self.shared.state.borrow().status()
    }

    /// Snapshot of the current call state.
    pub fn snapshot(&self) -> CallState {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state update.
    pub fn watch(&self) -> watch::Receiver<CallState> {
        self.shared.state.subscribe()
    }

    pub fn view(&self, user_name: &str) -> CallView {
        CallView::new(&self.shared.state.borrow(), user_name)
    }

    /// User action: start the call.
    ///
    /// Without an assistant id this logs and leaves the call inactive. A
    /// failed start reverts to `Inactive`; errors are logged, not returned.
    pub async fn start(&self) {
        let Some(assistant_id) = self.assistant_id.as_deref() else {
            error!("Voice assistant id missing, not starting call");
            return;
        };

        if self
            .shared
            .update(|s| s.transition(CallStatus::Connecting))
            .is_none()
        {
            debug!(status = ?self.status(), "Start ignored");
            return;
        }

        match self.client.start(assistant_id).await {
            Ok(()) => {
                // Usually already Active via the SDK's call-start event.
                self.shared.update(|s| s.transition(CallStatus::Active));
            }
            Err(e) => {
                error!(error = %e, "Failed to start voice call");
                self.shared.update(|s| s.transition(CallStatus::Inactive));
            }
        }
    }

    /// User action: end the call.
    pub async fn stop(&self) {
        if self
            .shared
            .update(|s| s.transition(CallStatus::Finished))
            .is_none()
        {
            debug!(status = ?self.status(), "Stop ignored");
            return;
        }

        if let Err(e) = self.client.stop().await {
            error!(error = %e, "Failed to stop voice call");
        }
    }

    /// Tear down the event loop and wait for it to exit.
    pub async fn unmount(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(%e, "Call event loop panicked");
            }
        }
        debug!("Call agent unmounted");
    }
}

impl Drop for CallAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_event_loop(
    shared: Arc<Shared>,
    client: Arc<dyn VoiceClient>,
    mut events: broadcast::Receiver<VoiceEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => {
                    debug!(event = event.name(), "Voice event");
                    shared.update(|s| s.apply(&event));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Voice event listener lagged");
                    resync_after_lag(&shared, client.as_ref()).await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    // `events` drops here, removing the listener.
}

/// Skipped events may have included `call-end`. If the call looks active but
/// the client no longer holds one, finish it now.
async fn resync_after_lag(shared: &Shared, client: &dyn VoiceClient) {
    let active = shared.state.borrow().status() == CallStatus::Active;
    if active && client.in_call().await == Some(false) {
        warn!("Call ended while events were lost, finishing");
        shared.update(|s| s.apply(&VoiceEvent::CallEnd));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted client: `start` optionally emits call-start, then succeeds or fails.
    struct FakeClient {
        events: broadcast::Sender<VoiceEvent>,
        fail_start: bool,
        emit_call_start: bool,
        starts: AtomicUsize,
        stops: AtomicUsize,
        live: AtomicBool,
    }

    impl FakeClient {
        fn new(fail_start: bool, emit_call_start: bool) -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            Arc::new(Self {
                events,
                fail_start,
                emit_call_start,
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                live: AtomicBool::new(false),
            })
        }

        fn emit(&self, event: VoiceEvent) {
            let _ = self.events.send(event);
        }
    }

    #[async_trait]
    impl VoiceClient for FakeClient {
        async fn start(&self, _assistant_id: &str) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                anyhow::bail!("microphone permission denied");
            }
            self.live.store(true, Ordering::SeqCst);
            if self.emit_call_start {
                self.emit(VoiceEvent::CallStart);
            }
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.live.store(false, Ordering::SeqCst);
            self.emit(VoiceEvent::CallEnd);
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<VoiceEvent> {
            self.events.subscribe()
        }

        async fn in_call(&self) -> Option<bool> {
            Some(self.live.load(Ordering::SeqCst))
        }
    }

    /// Wait until the state satisfies `pred`.
    async fn wait_for(agent: &CallAgent, pred: impl Fn(&CallState) -> bool) {
        let mut rx = agent.watch();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| pred(s)))
            .await
            .expect("timed out waiting for call state")
            .expect("state channel closed");
    }

    fn mount(
        client: Arc<FakeClient>,
        assistant_id: Option<&str>,
    ) -> (CallAgent, mpsc::UnboundedReceiver<String>) {
        let (navigator, routes) = ChannelNavigator::channel();
        let agent = CallAgent::mount(client, Arc::new(navigator), assistant_id.map(str::to_string));
        (agent, routes)
    }

    #[tokio::test]
    async fn test_start_then_stop_navigates_once() {
        let client = FakeClient::new(false, true);
        let (agent, mut routes) = mount(client.clone(), Some("asst-1"));

        agent.start().await;
        assert_eq!(agent.status(), CallStatus::Active);

        agent.stop().await;
        assert_eq!(agent.status(), CallStatus::Finished);
        assert_eq!(client.stops.load(Ordering::SeqCst), 1);

        // The SDK's own call-end arrives after stop; it must not navigate again.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(routes.recv().await.as_deref(), Some(LANDING_ROUTE));
        assert!(routes.try_recv().is_err());

        agent.unmount().await;
    }

    #[tokio::test]
    async fn test_missing_assistant_id_stays_inactive() {
        let client = FakeClient::new(false, true);
        let (agent, _routes) = mount(client.clone(), None);

        agent.start().await;
        assert_eq!(agent.status(), CallStatus::Inactive);
        assert_eq!(client.starts.load(Ordering::SeqCst), 0);

        let (agent_blank, _routes) = mount(client.clone(), Some(""));
        agent_blank.start().await;
        assert_eq!(agent_blank.status(), CallStatus::Inactive);
        assert_eq!(client.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_failure_reverts_to_inactive() {
        let client = FakeClient::new(true, false);
        let (agent, mut routes) = mount(client.clone(), Some("asst-1"));

        agent.start().await;
        assert_eq!(agent.status(), CallStatus::Inactive);
        assert!(routes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_optimistic_active_without_sdk_event() {
        let client = FakeClient::new(false, false);
        let (agent, _routes) = mount(client, Some("asst-1"));

        agent.start().await;
        assert_eq!(agent.status(), CallStatus::Active);
    }

    #[tokio::test]
    async fn test_remote_call_end_finishes_and_navigates() {
        let client = FakeClient::new(false, true);
        let (agent, mut routes) = mount(client.clone(), Some("asst-1"));

        agent.start().await;
        client.emit(VoiceEvent::CallEnd);
        wait_for(&agent, |s| s.status() == CallStatus::Finished).await;
        assert_eq!(routes.recv().await.as_deref(), Some(LANDING_ROUTE));

        // Stop after the remote end does nothing.
        agent.stop().await;
        assert_eq!(client.stops.load(Ordering::SeqCst), 0);
        assert!(routes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_transcript_and_speaking_from_events() {
        let client = FakeClient::new(false, true);
        let (agent, _routes) = mount(client.clone(), Some("asst-1"));
        agent.start().await;

        client.emit(VoiceEvent::SpeechStart);
        client.emit(VoiceEvent::Message(json!({
            "type": "transcript", "transcriptType": "partial", "role": "assistant", "transcript": "Hi"
        })));
        client.emit(VoiceEvent::Message(json!({
            "type": "transcript", "transcriptType": "final", "role": "assistant", "transcript": "Hi, ready?"
        })));
        client.emit(VoiceEvent::Message(json!({
            "type": "transcript", "transcriptType": "final", "role": "user", "transcript": "Yes."
        })));
        client.emit(VoiceEvent::Error("network blip".into()));
        client.emit(VoiceEvent::SpeechEnd);

        wait_for(&agent, |s| s.messages().len() == 2 && !s.is_speaking()).await;
        let state = agent.snapshot();
        assert_eq!(state.latest_message(), Some("Yes."));
        assert_eq!(state.messages()[0].content, "Hi, ready?");
        assert_eq!(state.status(), CallStatus::Active);
    }

    #[tokio::test]
    async fn test_unmount_removes_listener() {
        let client = FakeClient::new(false, true);
        let (agent, _routes) = mount(client.clone(), Some("asst-1"));
        assert_eq!(client.events.receiver_count(), 1);

        agent.unmount().await;
        assert_eq!(client.events.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_cancels_event_loop() {
        let client = FakeClient::new(false, true);
        let (agent, _routes) = mount(client.clone(), Some("asst-1"));
        drop(agent);

        tokio::time::timeout(Duration::from_secs(2), async {
            while client.events.receiver_count() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("listener was not removed after drop");
    }

    #[tokio::test]
    async fn test_call_end_lost_to_lag_still_finishes() {
        let client = FakeClient::new(false, false);
        let (agent, mut routes) = mount(client.clone(), Some("asst-1"));
        agent.start().await;
        assert_eq!(agent.status(), CallStatus::Active);

        // Remote hang-up, then enough chatter to push call-end out of the
        // 16-slot channel before the event loop gets to run.
        client.live.store(false, Ordering::SeqCst);
        client.emit(VoiceEvent::CallEnd);
        for _ in 0..20 {
            client.emit(VoiceEvent::SpeechStart);
        }

        wait_for(&agent, |s| s.status() == CallStatus::Finished).await;
        assert_eq!(routes.recv().await.as_deref(), Some(LANDING_ROUTE));
        assert!(routes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lag_during_live_call_keeps_it_active() {
        let client = FakeClient::new(false, false);
        let (agent, _routes) = mount(client.clone(), Some("asst-1"));
        agent.start().await;

        for _ in 0..20 {
            client.emit(VoiceEvent::SpeechStart);
        }
        client.emit(VoiceEvent::Message(json!({
            "type": "transcript", "transcriptType": "final", "role": "user", "transcript": "Still here."
        })));

        wait_for(&agent, |s| s.latest_message() == Some("Still here.")).await;
        assert_eq!(agent.status(), CallStatus::Active);
    }
}
