//! Progress events — what the agent loop reports while it works.
//!
//! Events are fire-and-forget: the loop never waits for an acknowledgment,
//! and a sink with no listeners is fine. Within one run, events arrive in
//! the order the loop produced them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Events emitted by the agent during a run.
///
/// - `thinking`    — a turn started, the backend is being called
/// - `thought`     — reasoning extracted from the reply
/// - `tool_start`  — a tool is about to be invoked
/// - `observation` — a tool invocation produced its observation
/// - `answer`      — a final answer was produced
/// - `error`       — the run ended in a failure
/// - `chunk`       — partial text from a streaming backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A turn started.
    Thinking { turn: usize },

    /// Reasoning text (a think section or an action's `thought` field).
    Thought { content: String },

    /// The agent is calling a tool.
    ToolStart {
        name: String,
        args: serde_json::Value,
    },

    /// Tool invocation completed (or failed) with this observation.
    Observation {
        name: String,
        content: String,
        success: bool,
    },

    /// A final answer.
    Answer { content: String },

    /// The run failed.
    Error { message: String },

    /// Partial streamed text; never parsed on its own.
    Chunk { content: String },
}

impl ProgressEvent {
    /// Wire name for this event kind.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thinking { .. } => "thinking",
            Self::Thought { .. } => "thought",
            Self::ToolStart { .. } => "tool_start",
            Self::Observation { .. } => "observation",
            Self::Answer { .. } => "answer",
            Self::Error { .. } => "error",
            Self::Chunk { .. } => "chunk",
        }
    }
}

/// Anything that accepts progress events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        // Receiver gone = nobody is watching
        let _ = self.send(event);
    }
}

/// A broadcast-based event bus for progress events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub, so several
/// observers (a terminal renderer, a log forwarder) can watch one agent.
pub struct EventBus {
    sender: broadcast::Sender<Arc<ProgressEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: ProgressEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ProgressEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ProgressSink for EventBus {
    fn emit(&self, event: ProgressEvent) {
        self.publish(event);
    }
}
