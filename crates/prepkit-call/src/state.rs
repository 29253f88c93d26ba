//! Call status state machine and transcript accumulator.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::events::{SavedMessage, TranscriptMessage, VoiceEvent};

/// Lifecycle phase of a voice call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    #[default]
    Inactive,
    Connecting,
    Active,
    /// Terminal.
    Finished,
}

impl CallStatus {
    /// Whether `self -> next` is a legal, state-changing transition.
    ///
    /// `Active` is only reachable from `Connecting`, and nothing leaves
    /// `Finished`.
    pub fn can_transition_to(self, next: CallStatus) -> bool {
        use CallStatus::*;
        matches!(
            (self, next),
            (Inactive, Connecting)
                | (Connecting, Active)
                | (Connecting, Inactive)
                | (Connecting, Finished)
                | (Active, Finished)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == CallStatus::Finished
    }
}

/// Everything the call view renders: status, finalized transcript, and the
/// speaking indicator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallState {
    status: CallStatus,
    messages: Vec<SavedMessage>,
    is_speaking: bool,
}

impl CallState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    /// Finalized transcript lines in arrival order.
    pub fn messages(&self) -> &[SavedMessage] {
        &self.messages
    }

    pub fn latest_message(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    /// Move to `next` if legal. Returns the new status when it changed.
    pub fn transition(&mut self, next: CallStatus) -> Option<CallStatus> {
        if !self.status.can_transition_to(next) {
            debug!(from = ?self.status, to = ?next, "Ignoring call status transition");
            return None;
        }
        debug!(from = ?self.status, to = ?next, "Call status changed");
        self.status = next;
        Some(next)
    }

    /// Apply an SDK event. Returns the new status when the event changed it.
    pub fn apply(&mut self, event: &VoiceEvent) -> Option<CallStatus> {
        match event {
            VoiceEvent::CallStart => self.transition(CallStatus::Active),
            VoiceEvent::CallEnd => self.transition(CallStatus::Finished),
            VoiceEvent::Message(raw) => {
                if let Some(line) = TranscriptMessage::from_value(raw)
                    .as_ref()
                    .and_then(TranscriptMessage::finalized_line)
                {
                    debug!(role = ?line.role, "Transcript line");
                    self.messages.push(line);
                }
                None
            }
            VoiceEvent::SpeechStart => {
                self.is_speaking = true;
                None
            }
            VoiceEvent::SpeechEnd => {
                self.is_speaking = false;
                None
            }
            VoiceEvent::Error(e) => {
                error!(error = %e, "Voice SDK error");
                None
            }
        }
    }
}
