//! Provider trait — the abstraction over text-generation backends.
//!
//! A Provider takes an ordered list of role-tagged messages and returns the
//! generated text, either complete or as a stream of partial chunks.
//!
//! Implementations: OpenAI-compatible endpoints (OpenAI, OpenRouter, Ollama),
//! scripted mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,
}

/// The core Provider trait.
///
/// The agent loop calls `chat()` or `stream()` without knowing which backend
/// is behind it. A failed call is always an `Err`; an empty string is a
/// legitimate (if unhelpful) generation.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Send the conversation and get the complete generated text.
    async fn chat(&self, messages: &[Message]) -> Result<String, ProviderError>;

    /// Send the conversation and get a stream of response chunks.
    ///
    /// Default implementation calls `chat()` and wraps the result as a single chunk.
    async fn stream(
        &self,
        messages: &[Message],
    ) -> Result<tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError>
    {
        let text = self.chat(messages).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                content: Some(text),
                done: true,
            }))
            .await;
        Ok(rx)
    }

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}
