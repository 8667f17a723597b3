//! Ask command handler.
//!
//! Single-shot variant of the gateway flow: retrieve context for one
//! question, generate an answer, print it with numbered citations.
//! There is no server lifecycle, no credential check, and no rate
//! limiting: the caller is the operator at a terminal.

use askgate_core::{AppError, AppResult, GatewayConfig};
use askgate_gateway::build_context;
use askgate_llm::{AzureOpenAi, GenerationClient};
use askgate_retrieval::{AzureSearchClient, SearchClient};
use clap::Args;
use std::sync::Arc;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON instead of plain text
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &GatewayConfig) -> AppResult<()> {
        config.validate()?;

        let question = self.question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Question is required".to_string()));
        }

        let openai = Arc::new(AzureOpenAi::new(&config.openai));
        let search = AzureSearchClient::new(&config.search, openai.clone());

        tracing::info!("Retrieving context");
        let docs = search.retrieve(question).await?;
        let context = build_context(&docs);

        tracing::info!("Generating answer");
        let answer = openai.generate(question, &context).await?;

        if self.json {
            let citations: Vec<_> = docs.iter().map(|doc| doc.citation()).collect();
            let output = serde_json::json!({
                "answer": answer,
                "citations": citations,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer);
            println!("\nCitations:");
            for (index, doc) in docs.iter().enumerate() {
                println!("[{}] {} - {}", index + 1, doc.name, doc.path);
            }
        }

        Ok(())
    }
}
