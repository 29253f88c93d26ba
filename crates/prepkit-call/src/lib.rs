//! Voice-call lifecycle for mock interviews.
//!
//! A [`CallAgent`] owns a [`VoiceClient`], consumes its events on a
//! background task, and tracks the call status, the finalized transcript,
//! and whether the assistant is speaking.

pub mod agent;
pub mod client;
pub mod events;
pub mod state;
pub mod vapi;
pub mod view;

pub use agent::{CallAgent, ChannelNavigator, Navigator, LANDING_ROUTE};
pub use client::VoiceClient;
pub use events::{Role, SavedMessage, TranscriptMessage, VoiceEvent};
pub use state::{CallState, CallStatus};
pub use vapi::VapiClient;
pub use view::{CallButton, CallView};
