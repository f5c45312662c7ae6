//! Tool dispatcher: runs one tool action and records its observation.
//!
//! Every invocation leaves exactly two messages behind: the action as the
//! assistant said it, then the observation as a user message. Failures of
//! any kind (unknown tool, bad arguments, a tool that errors) become
//! observation text the backend can react to on the next turn.

use clawlet_core::error::{StorageError, ToolError};
use clawlet_core::message::Message;
use clawlet_core::tool::{Tool, ToolRegistry};
use clawlet_memory::ConversationMemory;
use clawlet_telemetry::MetricsCollector;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// What a tool invocation produced, already phrased for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub tool: String,
    pub text: String,
    pub success: bool,
}

/// Dispatches tool actions against a registry.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            metrics: None,
        }
    }

    /// Record tool timings into a collector.
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Invoke `name` with `args` and record the exchange in `memory`.
    ///
    /// Only a storage failure while appending is returned as an error; tool
    /// problems are part of the observation.
    pub async fn invoke(
        &self,
        memory: &mut ConversationMemory,
        name: &str,
        args: Value,
    ) -> Result<Observation, StorageError> {
        let action = serde_json::json!({ "tool": name, "args": &args });
        let observation = self.execute(name, args).await;

        // Both or neither: a lone action would mislead the next turn
        memory
            .add_messages(vec![
                Message::assistant(action.to_string()),
                Message::user(observation.text.clone()),
            ])
            .await?;
        Ok(observation)
    }

    /// Resolve and run a tool without touching memory.
    pub async fn execute(&self, name: &str, args: Value) -> Observation {
        let Some(tool) = self.registry.get(name) else {
            warn!(tool = name, "Tool not found");
            return Observation {
                tool: name.to_string(),
                text: format!("Error: Tool '{name}' not found."),
                success: false,
            };
        };

        let start = Instant::now();
        let outcome = match validate_args(tool.as_ref(), args) {
            Ok(args) => tool.execute(args).await,
            Err(e) => Err(e),
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_tool_call(name, start.elapsed());
        }

        match outcome {
            Ok(result) if result.success => {
                debug!(tool = name, bytes = result.output.len(), "Tool succeeded");
                Observation {
                    tool: name.to_string(),
                    text: format!("Tool Output: {}", result.output),
                    success: true,
                }
            }
            Ok(result) => {
                warn!(tool = name, "Tool reported failure");
                Observation {
                    tool: name.to_string(),
                    text: format!("Tool Execution Error: {}", result.output),
                    success: false,
                }
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                Observation {
                    tool: name.to_string(),
                    text: format!("Tool Execution Error: {e}"),
                    success: false,
                }
            }
        }
    }
}

/// Normalize and check arguments against the tool's schema.
///
/// Missing or null arguments become `{}`. Anything else that is not an
/// object is rejected, as is an object lacking a key the schema lists in
/// `required`.
fn validate_args(tool: &dyn Tool, args: Value) -> Result<Value, ToolError> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        Value::Object(_) => args,
        other => {
            return Err(ToolError::InvalidArguments(format!(
                "expected an object, got {other}"
            )));
        }
    };

    let schema = tool.parameters_schema();
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        let missing: Vec<&str> = required
            .iter()
            .filter_map(Value::as_str)
            .filter(|key| args.get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ToolError::InvalidArguments(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }
    }

    Ok(args)
}
