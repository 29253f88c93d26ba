//! Presentation state for the call screen.

use std::fmt;

use serde::Serialize;

use crate::state::{CallState, CallStatus};

/// The single call control button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum CallButton {
    /// Starts the call. Shows a pinging indicator while connecting.
    Call { connecting: bool },
    End,
}

impl CallButton {
    pub fn for_status(status: CallStatus) -> Self {
        match status {
            CallStatus::Active => CallButton::End,
            CallStatus::Connecting => CallButton::Call { connecting: true },
            CallStatus::Inactive | CallStatus::Finished => CallButton::Call { connecting: false },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CallButton::Call { connecting: false } => "Call",
            CallButton::Call { connecting: true } => ". . .",
            CallButton::End => "End",
        }
    }
}

impl fmt::Display for CallButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the call screen renders for a given state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallView {
    pub status: CallStatus,
    pub button: CallButton,
    /// Latest finalized transcript line; hidden while empty.
    pub transcript: Option<String>,
    /// Speaking indicator on the interviewer card.
    pub is_speaking: bool,
    pub user_name: String,
}

impl CallView {
    pub fn new(state: &CallState, user_name: impl Into<String>) -> Self {
        Self {
            status: state.status(),
            button: CallButton::for_status(state.status()),
            transcript: state.latest_message().map(str::to_string),
            is_speaking: state.is_speaking(),
            user_name: user_name.into(),
        }
    }
}
