//! Scripted backend for demos and tests.
//!
//! Replies come from a fixed script in order. Once the script runs out every
//! call returns the same fallback answer, so a loop driven by the mock
//! always terminates.

use async_trait::async_trait;
use clawlet_core::error::ProviderError;
use clawlet_core::message::Message;
use clawlet_core::provider::Provider;
use std::sync::Mutex;
use tracing::debug;

/// Reply returned after the script is exhausted.
pub const FALLBACK_REPLY: &str = r#"{"answer":"No more mock responses."}"#;

pub struct MockProvider {
    replies: Vec<String>,
    call_count: Mutex<usize>,
}

impl MockProvider {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            call_count: Mutex::new(0),
        }
    }

    /// The stock demo script: list a directory, then answer.
    pub fn demo() -> Self {
        Self::new([
            r#"{"tool":"list_dir","args":{"path":"."}}"#,
            r#"{"answer":"I have listed the files."}"#,
        ])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let mut count = self.call_count.lock().unwrap_or_else(|e| e.into_inner());
        let reply = self
            .replies
            .get(*count)
            .cloned()
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());
        *count += 1;
        debug!(call = *count, messages = messages.len(), "Mock reply");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_in_order_then_fallback() {
        let provider = MockProvider::new(["one", "two"]);
        let msgs = [Message::user("hi")];
        assert_eq!(provider.chat(&msgs).await.unwrap(), "one");
        assert_eq!(provider.chat(&msgs).await.unwrap(), "two");
        assert_eq!(provider.chat(&msgs).await.unwrap(), FALLBACK_REPLY);
        assert_eq!(provider.chat(&msgs).await.unwrap(), FALLBACK_REPLY);
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn demo_script_starts_with_tool_call() {
        let provider = MockProvider::demo();
        let first = provider.chat(&[]).await.unwrap();
        assert!(first.contains(r#""tool":"list_dir""#));
    }

    #[tokio::test]
    async fn default_stream_wraps_chat() {
        let provider = MockProvider::new(["streamed"]);
        let mut rx = provider.stream(&[]).await.unwrap();
        let chunk = rx.recv().await.unwrap().unwrap();
        assert_eq!(chunk.content.as_deref(), Some("streamed"));
        assert!(chunk.done);
    }
}
