//! Generation client abstraction and prompt assembly.
//!
//! The gateway sends the generation backend a two-message prompt: a fixed
//! system instruction restricting the assistant to the supplied context,
//! and a user message embedding the context verbatim followed by the
//! question. Sampling leans deterministic (low temperature, fixed output
//! ceiling) so answers are reproducible rather than creative.

use askgate_core::AppResult;
use serde::{Deserialize, Serialize};

/// System instruction sent with every completion request.
pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant. Use the provided context only.";

/// Sampling temperature for answer generation.
pub const TEMPERATURE: f32 = 0.2;

/// Output-length ceiling, in tokens.
pub const MAX_TOKENS: u32 = 600;

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system" or "user"
    pub role: String,

    /// Message text
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Build the two-message prompt for a question and its context bundle.
pub fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_INSTRUCTION),
        ChatMessage::user(format!("Context:\n{}\n\nQuestion: {}", context, question)),
    ]
}

/// Trait for generation backends.
///
/// Implementations send the assembled prompt to a remote completion
/// service and return the generated text. Failures are surfaced unchanged
/// as `AppError::Upstream`; nothing is retried here.
#[async_trait::async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate an answer to `question` grounded in `context`.
    async fn generate(&self, question: &str, context: &str) -> AppResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages_shape() {
        let messages = build_messages("What changed?", "notes.md: release notes");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_INSTRUCTION);
        assert_eq!(messages[1].role, "user");
        assert_eq!(
            messages[1].content,
            "Context:\nnotes.md: release notes\n\nQuestion: What changed?"
        );
    }

    #[test]
    fn test_build_messages_empty_context() {
        let messages = build_messages("Anything?", "");
        assert_eq!(messages[1].content, "Context:\n\n\nQuestion: Anything?");
    }
}
