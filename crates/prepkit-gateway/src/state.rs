//! Gateway shared state.

use std::sync::Arc;

use prepkit_core::config::Config;
use prepkit_core::interview_store::InterviewStore;
use prepkit_providers::{Credentials, LlmProvider};

/// Shared, read-only state handed to every request.
pub struct GatewayState {
    pub config: Arc<Config>,
    pub provider: Arc<dyn LlmProvider>,
    /// `None` when no API key could be resolved; generation then fails per request.
    pub credentials: Option<Credentials>,
    pub store: Arc<dyn InterviewStore>,
    #[cfg(feature = "metrics")]
    pub metrics_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl GatewayState {
    pub fn new(
        config: Arc<Config>,
        provider: Arc<dyn LlmProvider>,
        credentials: Option<Credentials>,
        store: Arc<dyn InterviewStore>,
    ) -> Self {
        Self {
            config,
            provider,
            credentials,
            store,
            #[cfg(feature = "metrics")]
            metrics_handle: None,
        }
    }

    /// Build state from config, resolving the API key from config or env.
    pub fn from_config(
        config: Arc<Config>,
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn InterviewStore>,
    ) -> Self {
        let credentials = config
            .generation()
            .resolve_api_key()
            .map(|api_key| Credentials::ApiKey { api_key });
        Self::new(config, provider, credentials, store)
    }

    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, handle: metrics_exporter_prometheus::PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
