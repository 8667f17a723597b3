//! The per-request pipeline.
//!
//! Each request moves through a strictly linear sequence: authenticate,
//! admit, validate, retrieve, generate, respond. Any failure terminates
//! the request; nothing is retried and no state survives the request.
//! All collaborators come in as trait objects so the pipeline runs
//! against fakes in tests.

use crate::auth::CredentialVerifier;
use crate::limit::RateLimiter;
use askgate_core::{AppError, AppResult};
use askgate_llm::GenerationClient;
use askgate_retrieval::{Citation, RetrievedDoc, SearchClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Credential material accompanying a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    /// `x-api-key` header value
    pub api_key: Option<&'a str>,

    /// Raw `Authorization` header value
    pub authorization: Option<&'a str>,
}

/// The unit returned to the caller: generated text plus provenance,
/// citations in the retrieval backend's rank order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Build the context bundle handed to the generation backend.
///
/// Snippets arrive already truncated from the retrieval client; here they
/// are labeled with their source name and joined with blank lines.
pub fn build_context(docs: &[RetrievedDoc]) -> String {
    docs.iter()
        .map(|doc| format!("{}: {}", doc.name, doc.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The gateway orchestrator.
pub struct AskPipeline {
    verifier: CredentialVerifier,
    limiter: Arc<dyn RateLimiter>,
    search: Arc<dyn SearchClient>,
    generator: Arc<dyn GenerationClient>,
}

impl AskPipeline {
    pub fn new(
        verifier: CredentialVerifier,
        limiter: Arc<dyn RateLimiter>,
        search: Arc<dyn SearchClient>,
        generator: Arc<dyn GenerationClient>,
    ) -> Self {
        Self {
            verifier,
            limiter,
            search,
            generator,
        }
    }

    /// Whether the pipeline runs without any credential check.
    pub fn auth_is_open(&self) -> bool {
        self.verifier.is_open()
    }

    /// Answer one question.
    ///
    /// `peer` is the network-origin identifier (client address); the
    /// authenticated subject claim takes precedence as the rate-limit
    /// identity when a token was presented. Validation happens before any
    /// remote call is issued.
    pub async fn ask(
        &self,
        question: &str,
        credentials: Credentials<'_>,
        peer: &str,
    ) -> AppResult<AskAnswer> {
        let verified = self
            .verifier
            .verify(credentials.api_key, credentials.authorization)?;

        let identity = verified.subject.as_deref().unwrap_or(peer);
        if !self.limiter.admit(identity).await? {
            tracing::warn!(identity, "Request rejected by rate limiter");
            return Err(AppError::RateLimited);
        }

        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Question is required".to_string()));
        }

        let docs = self.search.retrieve(question).await?;
        let context = build_context(&docs);

        let answer = self.generator.generate(question, &context).await?;

        let citations = docs.iter().map(RetrievedDoc::citation).collect();
        Ok(AskAnswer { answer, citations })
    }
}
