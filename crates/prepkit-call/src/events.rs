//! Voice SDK events and transcript messages.

use serde::{Deserialize, Serialize};

/// An event emitted by the voice SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    CallStart,
    CallEnd,
    /// Raw SDK message; only some of these are transcripts.
    Message(serde_json::Value),
    SpeechStart,
    SpeechEnd,
    Error(String),
}

impl VoiceEvent {
    /// SDK event name, e.g. `"call-start"`.
    pub fn name(&self) -> &'static str {
        match self {
            VoiceEvent::CallStart => "call-start",
            VoiceEvent::CallEnd => "call-end",
            VoiceEvent::Message(_) => "message",
            VoiceEvent::SpeechStart => "speech-start",
            VoiceEvent::SpeechEnd => "speech-end",
            VoiceEvent::Error(_) => "error",
        }
    }
}

/// Speaker of a transcript line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
    #[default]
    Assistant,
}

impl Role {
    /// Map an SDK role string; anything unrecognised is the assistant.
    pub fn from_sdk(role: Option<&str>) -> Self {
        match role {
            Some("user") => Role::User,
            Some("system") => Role::System,
            _ => Role::Assistant,
        }
    }
}

/// A finalized transcript line kept by the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMessage {
    pub role: Role,
    pub content: String,
}

/// The subset of an SDK message the call cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptMessage {
    /// `type` on the wire.
    pub kind: String,
    pub transcript_type: Option<String>,
    pub role: Option<String>,
    pub transcript: Option<String>,
}

impl TranscriptMessage {
    /// Interpret a raw SDK message. Returns `None` unless it is an object whose
    /// `type` is `"transcript"` or `"message"`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let kind = value.as_object()?.get("type")?.as_str()?;
        if kind != "transcript" && kind != "message" {
            return None;
        }

        let text_field = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Some(Self {
            kind: kind.to_string(),
            transcript_type: text_field("transcriptType"),
            role: text_field("role"),
            transcript: text_field("transcript"),
        })
    }

    /// The line to keep, if this is a non-empty finalized transcript.
    pub fn finalized_line(&self) -> Option<SavedMessage> {
        if self.kind != "transcript" || self.transcript_type.as_deref() != Some("final") {
            return None;
        }
        let content = self.transcript.as_deref().unwrap_or_default();
        if content.is_empty() {
            return None;
        }
        Some(SavedMessage {
            role: Role::from_sdk(self.role.as_deref()),
            content: content.to_string(),
        })
    }
}
