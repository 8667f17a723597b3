//! Retrieval client for the askgate gateway.
//!
//! Issues a hybrid (lexical + vector) query against a remote search index
//! and returns ranked passages with provenance. The query vector comes
//! from the embedding client; the backend applies semantic re-ranking and
//! an optional static filter expression.

pub mod client;
pub mod types;

// Re-export commonly used types
pub use client::{AzureSearchClient, SearchClient};
pub use types::{Citation, RetrievedDoc, SNIPPET_MAX_CHARS, TOP_K};
