use async_trait::async_trait;

use crate::clients::openai_client;
use crate::error::BotError;
use crate::models::chat::ChatEntry;

// One model turn: the ordered output items, appended to the log verbatim.
#[derive(Debug, Clone)]
pub struct ModelTurn {
    pub output: Vec<ChatEntry>,
}

impl ModelTurn {
    // Convenience accessor for the turn's plain assistant text.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|entry| entry.assistant_text())
            .collect()
    }
}

#[async_trait]
pub trait OpenAIClient: Send + Sync {
    async fn next_turn(&self, input: &[ChatEntry]) -> Result<ModelTurn, BotError>;
}

pub struct OpenAIService {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl OpenAIService {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl OpenAIClient for OpenAIService {
    async fn next_turn(&self, input: &[ChatEntry]) -> Result<ModelTurn, BotError> {
        let output =
            openai_client::create_response(&self.http, &self.api_key, &self.model, input).await?;
        Ok(ModelTurn { output })
    }
}
