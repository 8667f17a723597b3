//! Embedding client abstraction.

use askgate_core::AppResult;

/// Trait for embedding backends.
///
/// Turns free text into a fixed-length numeric vector via a remote call.
/// A failed call is surfaced once as `AppError::Upstream`; retrying is a
/// caller decision, not built into the client.
#[async_trait::async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate the embedding vector for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}
