//! Shared test doubles for agent tests.

use async_trait::async_trait;
use clawlet_core::error::{ProviderError, ToolError};
use clawlet_core::message::Message;
use clawlet_core::provider::{Provider, StreamChunk};
use clawlet_core::tool::{Tool, ToolResult};
use std::sync::Mutex;
use std::time::Duration;

/// A provider that returns a sequence of scripted replies and records the
/// messages it was sent on every call.
///
/// Panics if more calls are made than replies provided.
pub struct SequentialMockProvider {
    replies: Vec<String>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl SequentialMockProvider {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Messages sent on call `n` (zero-based).
    pub fn request(&self, n: usize) -> Vec<Message> {
        self.seen.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn chat(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let mut seen = self.seen.lock().unwrap();
        let n = seen.len();
        assert!(
            n < self.replies.len(),
            "SequentialMockProvider: no more replies (call #{n}, have {})",
            self.replies.len()
        );
        seen.push(messages.to_vec());
        Ok(self.replies[n].clone())
    }
}

/// A provider that always replies with the same text, however often asked.
pub struct RepeatingProvider(pub &'static str);

#[async_trait]
impl Provider for RepeatingProvider {
    fn name(&self) -> &str {
        "repeating"
    }

    async fn chat(&self, _messages: &[Message]) -> Result<String, ProviderError> {
        Ok(self.0.to_string())
    }
}

/// A provider whose every call fails.
pub struct BrokenProvider;

#[async_trait]
impl Provider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    async fn chat(&self, _messages: &[Message]) -> Result<String, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// A provider that sleeps before answering.
pub struct SlowProvider(pub Duration);

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn chat(&self, _messages: &[Message]) -> Result<String, ProviderError> {
        tokio::time::sleep(self.0).await;
        Ok(r#"{"answer": "too late"}"#.into())
    }
}

/// A provider that streams its reply in fixed pieces.
pub struct ChunkedProvider(pub Vec<&'static str>);

#[async_trait]
impl Provider for ChunkedProvider {
    fn name(&self) -> &str {
        "chunked"
    }

    async fn chat(&self, _messages: &[Message]) -> Result<String, ProviderError> {
        Ok(self.0.concat())
    }

    async fn stream(
        &self,
        _messages: &[Message],
    ) -> Result<tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError>
    {
        let (tx, rx) = tokio::sync::mpsc::channel(self.0.len().max(1));
        let last = self.0.len().saturating_sub(1);
        for (i, piece) in self.0.iter().enumerate() {
            let _ = tx
                .send(Ok(StreamChunk {
                    content: Some((*piece).to_string()),
                    done: i == last,
                }))
                .await;
        }
        Ok(rx)
    }
}

/// Echoes its `text` argument.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes back the input"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::ok(arguments["text"].as_str().unwrap_or_default()))
    }
}

/// Always returns an error.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "fail"
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "fail".into(),
            reason: "disk on fire".into(),
        })
    }
}

/// Runs but reports `success: false`.
pub struct RefusingTool;

#[async_trait]
impl Tool for RefusingTool {
    fn name(&self) -> &str {
        "refuse"
    }
    fn description(&self) -> &str {
        "Declines every request"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::failed("not today"))
    }
}
