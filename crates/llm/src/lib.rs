//! Remote model clients for the askgate gateway.
//!
//! This crate provides provider-agnostic abstractions for the two model
//! backends the gateway talks to:
//!
//! - `GenerationClient`: context-augmented chat completion
//! - `EmbeddingClient`: free text to a fixed-length vector
//!
//! Both are implemented for Azure OpenAI in `providers::azure`. Neither
//! client retries: every upstream failure is surfaced once, immediately,
//! and retry policy stays a caller decision.
//!
//! # Example
//! ```no_run
//! use askgate_llm::{GenerationClient, providers::AzureOpenAi};
//!
//! # async fn example(client: AzureOpenAi) -> askgate_core::AppResult<()> {
//! let answer = client
//!     .generate("What is the vacation policy?", "handbook.md: 25 days")
//!     .await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod embeddings;
pub mod providers;

// Re-export main types
pub use client::{ChatMessage, GenerationClient};
pub use embeddings::EmbeddingClient;
pub use providers::AzureOpenAi;
