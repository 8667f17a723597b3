//! Search backend client.
//!
//! The retrieval flow is strictly sequential per request: the question is
//! embedded first, then the combined lexical + vector query goes to the
//! search service. An empty result set is a successful outcome: the
//! caller proceeds with an empty context.

use crate::types::{truncate_chars, RetrievedDoc, SNIPPET_MAX_CHARS, TOP_K};
use askgate_core::config::SearchConfig;
use askgate_core::{AppError, AppResult};
use askgate_llm::EmbeddingClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Pinned search service API version.
const API_VERSION: &str = "2023-11-01";

/// Request timeout, in seconds.
const SEARCH_TIMEOUT_SECS: u64 = 30;

/// Fields selected from the index: passage content plus provenance.
const SELECT_FIELDS: &str = "content,metadata_storage_name,metadata_storage_path";

/// Index field holding the passage vectors.
const VECTOR_FIELD: &str = "contentVector";

/// Trait for retrieval backends.
///
/// Returns ranked passages with provenance, at most `TOP_K`, snippets
/// already truncated to the character budget.
#[async_trait::async_trait]
pub trait SearchClient: Send + Sync {
    async fn retrieve(&self, question: &str) -> AppResult<Vec<RetrievedDoc>>;
}

/// Hybrid query request body.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    search: &'a str,
    top: usize,
    select: &'a str,
    #[serde(rename = "vectorQueries")]
    vector_queries: Vec<VectorQuery<'a>>,
    #[serde(rename = "semanticConfiguration")]
    semantic_configuration: &'a str,
    #[serde(rename = "queryType")]
    query_type: &'a str,
    captions: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct VectorQuery<'a> {
    kind: &'a str,
    vector: &'a [f32],
    fields: &'a str,
    k: usize,
}

/// Search response body; extra fields (scores, captions) are ignored.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    content: String,
    #[serde(default)]
    metadata_storage_name: String,
    #[serde(default)]
    metadata_storage_path: String,
}

/// Azure AI Search implementation of `SearchClient`.
pub struct AzureSearchClient {
    endpoint: String,
    api_key: String,
    index: String,
    filter: Option<String>,
    embedder: Arc<dyn EmbeddingClient>,
    client: reqwest::Client,
}

impl AzureSearchClient {
    /// Create a client from the gateway configuration.
    ///
    /// The filter expression comes from configuration, never from the
    /// caller, which keeps caller input out of the filter language.
    pub fn new(config: &SearchConfig, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            index: config.index.clone(),
            filter: config.filter.clone(),
            embedder,
            client: reqwest::Client::new(),
        }
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, self.index, API_VERSION
        )
    }
}

/// Map raw hits into retrieval results, applying the snippet budget.
/// Backend rank order is preserved.
fn into_docs(hits: Vec<SearchHit>) -> Vec<RetrievedDoc> {
    hits.into_iter()
        .map(|hit| RetrievedDoc {
            name: hit.metadata_storage_name,
            path: hit.metadata_storage_path,
            snippet: truncate_chars(&hit.content, SNIPPET_MAX_CHARS),
        })
        .collect()
}

#[async_trait::async_trait]
impl SearchClient for AzureSearchClient {
    async fn retrieve(&self, question: &str) -> AppResult<Vec<RetrievedDoc>> {
        // Embedding failures propagate unchanged
        let vector = self.embedder.embed(question).await?;

        let request = SearchRequest {
            search: question,
            top: TOP_K,
            select: SELECT_FIELDS,
            vector_queries: vec![VectorQuery {
                kind: "vector",
                vector: &vector,
                fields: VECTOR_FIELD,
                k: TOP_K,
            }],
            semantic_configuration: "default",
            query_type: "semantic",
            captions: "extractive",
            filter: self.filter.as_deref(),
        };

        tracing::debug!(index = %self.index, "Issuing hybrid search query");

        let response = self
            .client
            .post(self.search_url())
            .header("api-key", &self.api_key)
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Upstream(format!(
                "Search error ({}): {}",
                status, error_text
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed search response: {}", e)))?;

        let docs = into_docs(body.value);
        tracing::info!(results = docs.len(), "Retrieval complete");

        Ok(docs)
    }
}
