//! HTTP gateway for PrepKit.
//!
//! Hosts the question-generation endpoint: a request is turned into a
//! prompt, sent to the configured text-generation provider, parsed as a list
//! of questions, and appended to the interview store.

pub mod error;
pub mod generate;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{router, start_gateway};
pub use state::GatewayState;
