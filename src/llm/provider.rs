use async_trait::async_trait;

use crate::errors::DeskPilotResult;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse};

/// Vision-capable chat model. New providers implement this trait and register in
/// config.toml.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// The provider's identifier (matches the config.toml key).
    fn name(&self) -> &str;

    /// One chat completion over the full ordered history.
    ///
    /// An unknown or retired model id must surface as
    /// [`DeskPilotError::ModelUnavailable`](crate::errors::DeskPilotError::ModelUnavailable)
    /// so the caller can fall back to another model.
    async fn chat(&self, messages: &[ChatMessage], cfg: &CallConfig) -> DeskPilotResult<LlmResponse>;
}
