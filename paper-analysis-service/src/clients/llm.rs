use async_trait::async_trait;
use rig::{agent::Agent, client::CompletionClient, completion::Prompt, providers::openrouter};
use tracing::debug;

use super::LanguageModel;
use crate::error::ServiceError;

const PREAMBLE: &str = "You are a careful research assistant that analyses academic papers. \
Follow the requested output format exactly and never invent content.";

/// Language model served through OpenRouter.
pub struct OpenRouterModel {
    agent: Agent<openrouter::CompletionModel>,
    model: String,
}

impl OpenRouterModel {
    pub fn new(api_key: &str, model: &str) -> Self {
        let client = openrouter::Client::new(api_key);
        let agent = client
            .agent(model)
            .preamble(PREAMBLE)
            .temperature(0.0)
            .build();
        Self {
            agent,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenRouterModel {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending prompt");
        let response = self
            .agent
            .prompt(prompt.to_string())
            .await
            .map_err(|e| ServiceError::Llm(e.to_string()))?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Usage: OPENROUTER_API_KEY=key cargo test openrouter_smoke
    #[tokio::test]
    async fn openrouter_smoke() -> anyhow::Result<()> {
        let api_key = match std::env::var("OPENROUTER_API_KEY") {
            Ok(key) => key,
            Err(_) => {
                println!("Skipping test - set OPENROUTER_API_KEY environment variable");
                return Ok(());
            }
        };

        let model = OpenRouterModel::new(&api_key, "openai/gpt-4o-mini");
        let reply = model.complete("Reply with the single word: ready").await?;
        assert!(!reply.trim().is_empty());
        Ok(())
    }
}
