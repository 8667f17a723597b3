//! Azure OpenAI implementation of the generation and embedding clients.
//!
//! Both operations hit deployment-scoped endpoints on the same resource,
//! authenticated with an `api-key` header and a pinned `api-version`
//! query parameter.

use crate::client::{build_messages, ChatMessage, GenerationClient, MAX_TOKENS, TEMPERATURE};
use crate::embeddings::EmbeddingClient;
use askgate_core::config::OpenAiConfig;
use askgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pinned Azure OpenAI API version.
const API_VERSION: &str = "2024-02-15-preview";

/// Request timeout for embedding calls, in seconds.
const EMBED_TIMEOUT_SECS: u64 = 30;

/// Request timeout for chat completion calls, in seconds.
const CHAT_TIMEOUT_SECS: u64 = 60;

/// Azure OpenAI embeddings request.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a str,
}

/// Azure OpenAI embeddings response.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingSlot>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingSlot {
    embedding: Vec<f32>,
}

/// Azure OpenAI chat completion request.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// Azure OpenAI chat completion response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Client for one Azure OpenAI resource, covering both the chat and the
/// embedding deployment.
pub struct AzureOpenAi {
    endpoint: String,
    api_key: String,
    chat_deployment: String,
    embedding_deployment: String,
    client: reqwest::Client,
}

impl AzureOpenAi {
    /// Create a client from the gateway configuration.
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chat_deployment: config.chat_deployment.clone(),
            embedding_deployment: config.embedding_deployment.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment, operation, API_VERSION
        )
    }

    /// Surface a non-success response as an upstream error with the status
    /// and body attached for diagnostics.
    async fn upstream_error(operation: &str, response: reqwest::Response) -> AppError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        AppError::Upstream(format!(
            "Azure OpenAI {} error ({}): {}",
            operation, status, error_text
        ))
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for AzureOpenAi {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        tracing::debug!(deployment = %self.embedding_deployment, "Requesting embedding");

        let url = self.deployment_url(&self.embedding_deployment, "embeddings");
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
            .json(&EmbeddingsRequest { input: text })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::upstream_error("embeddings", response).await);
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed embedding response: {}", e)))?;

        let vector = body
            .data
            .into_iter()
            .next()
            .map(|slot| slot.embedding)
            .ok_or_else(|| {
                AppError::Upstream("Embedding response contained no result".to_string())
            })?;

        tracing::debug!(dimensions = vector.len(), "Received embedding");
        Ok(vector)
    }
}

#[async_trait::async_trait]
impl GenerationClient for AzureOpenAi {
    async fn generate(&self, question: &str, context: &str) -> AppResult<String> {
        tracing::info!(deployment = %self.chat_deployment, "Requesting completion");

        let request = ChatCompletionRequest {
            messages: build_messages(question, context),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let url = self.deployment_url(&self.chat_deployment, "chat/completions");
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .timeout(Duration::from_secs(CHAT_TIMEOUT_SECS))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Completion request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::upstream_error("chat completion", response).await);
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed completion response: {}", e)))?;

        let answer = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::Upstream("Completion response contained no choices".to_string())
            })?;

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> AzureOpenAi {
        AzureOpenAi::new(&OpenAiConfig {
            endpoint: "https://myresource.openai.azure.com/".to_string(),
            api_key: "k3y".to_string(),
            chat_deployment: "gpt-4o-mini".to_string(),
            embedding_deployment: "text-embedding-3-small".to_string(),
        })
    }

    #[test]
    fn test_deployment_url() {
        let client = test_client();
        assert_eq!(
            client.deployment_url("text-embedding-3-small", "embeddings"),
            "https://myresource.openai.azure.com/openai/deployments/\
             text-embedding-3-small/embeddings?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_embeddings_response_parsing() {
        let body = r#"{"data": [{"embedding": [0.1, -0.2, 0.3], "index": 0}], "model": "text-embedding-3-small"}"#;
        let parsed: EmbeddingsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_chat_response_parsing() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Per document A, ..."}, "finish_reason": "stop"}
            ],
            "usage": {"total_tokens": 42}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Per document A, ...");
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatCompletionRequest {
            messages: build_messages("Q", "C"),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["temperature"], 0.2);
        assert_eq!(json["max_tokens"], 600);
        assert_eq!(json["messages"][0]["role"], "system");
    }
}
