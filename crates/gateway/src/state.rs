//! Shared application state.

use crate::auth::CredentialVerifier;
use crate::limit;
use crate::pipeline::AskPipeline;
use askgate_core::{AppResult, GatewayConfig};
use askgate_llm::AzureOpenAi;
use askgate_retrieval::AzureSearchClient;
use std::sync::Arc;

/// State shared by every request handler: the configuration and the
/// fully wired pipeline. Everything inside is `Arc`'d; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub pipeline: Arc<AskPipeline>,
}

impl AppState {
    /// Wire the real clients from a validated configuration.
    pub async fn new(config: GatewayConfig) -> AppResult<Self> {
        let openai = Arc::new(AzureOpenAi::new(&config.openai));
        let search = Arc::new(AzureSearchClient::new(&config.search, openai.clone()));

        let verifier = CredentialVerifier::new(&config.auth);
        let limiter = limit::create_limiter(&config.limit).await?;

        let pipeline = Arc::new(AskPipeline::new(verifier, limiter, search, openai));

        Ok(Self {
            config: Arc::new(config),
            pipeline,
        })
    }
}
