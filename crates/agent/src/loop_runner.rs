//! The agent reasoning loop implementation.

use crate::dispatcher::ToolDispatcher;
use crate::parser::{Action, extract_thinking, parse_response};
use crate::prompts;
use clawlet_core::error::ProviderError;
use clawlet_core::event::{ProgressEvent, ProgressSink};
use clawlet_core::message::{Message, Role};
use clawlet_core::profile::{HistoryPolicy, Profile, ProfileTable};
use clawlet_core::provider::Provider;
use clawlet_core::tool::ToolRegistry;
use clawlet_memory::ConversationMemory;
use clawlet_telemetry::MetricsCollector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default bound on reason/act turns per run.
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Default wall-clock bound on one backend call.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The backend produced an answer.
    Answered,
    /// A turn produced neither an answer nor a tool call.
    NoValidAction,
    /// Every allowed turn was used without an answer.
    TurnLimitReached,
    /// The backend call failed or timed out.
    BackendFailed,
    /// Conversation memory could not be loaded or saved.
    StorageFailed,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Answered)
    }
}

/// The result of one [`Agent::run_detailed`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// The answer, or a user-facing description of the failure.
    pub text: String,
    pub status: RunStatus,
    /// Backend calls made.
    pub turns: usize,
    /// Tool invocations dispatched.
    pub tool_calls: usize,
}

/// A conversational agent bound to one memory.
///
/// Runs take `&mut self`, so one agent (and its memory) serves one run at a
/// time. Independent agents can run concurrently.
pub struct Agent {
    provider: Arc<dyn Provider>,

    /// Every tool the agent was given, whatever the profile.
    tools: Arc<ToolRegistry>,

    /// Dispatcher over the tools the current profile may use.
    dispatcher: ToolDispatcher,

    profile: Profile,

    memory: ConversationMemory,

    /// `None` for profiles that send no system prompt.
    system_prompt: Option<String>,

    max_turns: usize,

    backend_timeout: Duration,

    sink: Option<Arc<dyn ProgressSink>>,

    metrics: Option<Arc<MetricsCollector>>,

    /// Consume the backend as a stream and forward chunks to the sink.
    stream: bool,

    /// Keep extracted thinking in memory as assistant messages.
    record_thoughts: bool,
}

impl Agent {
    /// Create an agent with in-process memory sized for `profile`.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        profile: impl Into<Profile>,
    ) -> Self {
        let profile = profile.into();
        let memory = ConversationMemory::new(ProfileTable::default().limits(profile));
        let mut agent = Self {
            provider,
            dispatcher: ToolDispatcher::new(Arc::new(ToolRegistry::new())),
            tools,
            profile,
            memory,
            system_prompt: None,
            max_turns: DEFAULT_MAX_TURNS,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            sink: None,
            metrics: None,
            stream: false,
            record_thoughts: false,
        };
        agent.apply_profile();
        agent
    }

    /// Replace the memory, e.g. one with storage and configured limits.
    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = memory;
        self
    }

    /// Set the maximum number of turns per run (at least one).
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max.max(1);
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Report progress events to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Record backend and tool timings.
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self.apply_profile();
        self
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.stream = enabled;
        self
    }

    pub fn with_recorded_thoughts(mut self, enabled: bool) -> Self {
        self.record_thoughts = enabled;
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Switch profile. Rebuilds the system prompt and the active tool set;
    /// memory and its limits are left as they are.
    pub fn set_profile(&mut self, profile: impl Into<Profile>) {
        let profile = profile.into();
        if profile != self.profile {
            info!(from = %self.profile, to = %profile, "Switching profile");
        }
        self.profile = profile;
        self.apply_profile();
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Tools the current profile may call.
    pub fn active_tools(&self) -> &ToolRegistry {
        self.dispatcher.registry()
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ConversationMemory {
        &mut self.memory
    }

    fn apply_profile(&mut self) {
        let active = if self.profile.tools_enabled() {
            Arc::clone(&self.tools)
        } else {
            Arc::new(ToolRegistry::new())
        };
        self.system_prompt = prompts::system_prompt(self.profile, &active);

        let mut dispatcher = ToolDispatcher::new(active);
        if let Some(metrics) = &self.metrics {
            dispatcher = dispatcher.with_metrics(Arc::clone(metrics));
        }
        self.dispatcher = dispatcher;
    }

    /// Process one user input and return the answer or failure text.
    pub async fn run(&mut self, input: &str) -> String {
        self.run_detailed(input).await.text
    }

    /// Process one user input.
    ///
    /// Never fails: backend errors, storage errors, turn exhaustion and
    /// unusable replies all come back as a [`RunOutcome`] with the matching
    /// [`RunStatus`].
    pub async fn run_detailed(&mut self, input: &str) -> RunOutcome {
        info!(
            profile = %self.profile,
            provider = self.provider.name(),
            input_len = input.len(),
            "Agent run started"
        );

        if self.profile == Profile::Chat {
            return self.run_chat(input).await;
        }

        if let Err(e) = self.memory.init().await {
            return self.fail(RunStatus::StorageFailed, format!("Storage error: {e}"), 0, 0);
        }
        if let Err(e) = self.memory.add_message(Role::User, input).await {
            return self.fail(RunStatus::StorageFailed, format!("Storage error: {e}"), 0, 0);
        }

        // Messages this run has added; bounds LOW_POWER history
        let mut appended = 1usize;
        let mut tool_calls = 0usize;

        for turn in 1..=self.max_turns {
            debug!(turn, max_turns = self.max_turns, "Agent loop turn");
            self.emit(ProgressEvent::Thinking { turn });

            let context = self.build_context(appended);
            let raw = match self.generate(&context).await {
                Ok(raw) => raw,
                Err(e) => {
                    return self.fail(
                        RunStatus::BackendFailed,
                        format!("Backend error: {e}"),
                        turn,
                        tool_calls,
                    );
                }
            };

            let parsed = parse_response(&raw);
            debug!(turn, actions = parsed.actions.len(), "Reply parsed");

            if let Some(thought) = &parsed.thought {
                self.emit(ProgressEvent::Thought {
                    content: thought.clone(),
                });
                if self.record_thoughts {
                    let stored = format!("<think>{thought}</think>");
                    if let Err(e) = self.memory.add_message(Role::Assistant, stored).await {
                        return self.fail(
                            RunStatus::StorageFailed,
                            format!("Storage error: {e}"),
                            turn,
                            tool_calls,
                        );
                    }
                    appended += 1;
                }
            }

            let mut answer: Option<String> = None;
            let mut dispatched = false;
            let mut invalid: Option<String> = None;

            for action in &parsed.actions {
                if let Some(thought) = action.thought() {
                    self.emit(ProgressEvent::Thought {
                        content: thought.to_string(),
                    });
                }

                match action {
                    Action::Answer { text, .. } => {
                        let stored = action.to_value().to_string();
                        if let Err(e) = self.memory.add_message(Role::Assistant, stored).await {
                            return self.fail(
                                RunStatus::StorageFailed,
                                format!("Storage error: {e}"),
                                turn,
                                tool_calls,
                            );
                        }
                        appended += 1;
                        self.emit(ProgressEvent::Answer {
                            content: text.clone(),
                        });
                        answer.get_or_insert_with(|| text.clone());
                    }
                    Action::Tool { name, args, .. } => {
                        self.emit(ProgressEvent::ToolStart {
                            name: name.clone(),
                            args: args.clone(),
                        });
                        let observation = match self
                            .dispatcher
                            .invoke(&mut self.memory, name, args.clone())
                            .await
                        {
                            Ok(observation) => observation,
                            Err(e) => {
                                return self.fail(
                                    RunStatus::StorageFailed,
                                    format!("Storage error: {e}"),
                                    turn,
                                    tool_calls,
                                );
                            }
                        };
                        appended += 2;
                        tool_calls += 1;
                        dispatched = true;
                        self.emit(ProgressEvent::Observation {
                            name: observation.tool,
                            content: observation.text,
                            success: observation.success,
                        });
                    }
                    Action::Invalid(raw_action) => {
                        warn!(turn, action = %raw_action, "Unusable action in reply");
                        let stored = raw_action.to_string();
                        if let Err(e) = self.memory.add_message(Role::Assistant, stored.clone()).await {
                            return self.fail(
                                RunStatus::StorageFailed,
                                format!("Storage error: {e}"),
                                turn,
                                tool_calls,
                            );
                        }
                        appended += 1;
                        invalid.get_or_insert(stored);
                    }
                }
            }

            if let Some(text) = answer {
                info!(turn, tool_calls, "Agent run answered");
                return RunOutcome {
                    text,
                    status: RunStatus::Answered,
                    turns: turn,
                    tool_calls,
                };
            }

            if !dispatched {
                let shown = invalid.unwrap_or(raw);
                return self.fail(
                    RunStatus::NoValidAction,
                    format!("I'm not sure what to do with this response: {shown}"),
                    turn,
                    tool_calls,
                );
            }
        }

        self.fail(
            RunStatus::TurnLimitReached,
            "Agent step limit reached.".into(),
            self.max_turns,
            tool_calls,
        )
    }

    /// Single backend call with the bare input. Memory is never touched.
    async fn run_chat(&mut self, input: &str) -> RunOutcome {
        self.emit(ProgressEvent::Thinking { turn: 1 });

        let raw = match self.generate(&[Message::user(input)]).await {
            Ok(raw) => raw,
            Err(e) => {
                return self.fail(RunStatus::BackendFailed, format!("Backend error: {e}"), 1, 0);
            }
        };

        let (thought, rest) = extract_thinking(&raw);
        if let Some(thought) = thought {
            self.emit(ProgressEvent::Thought { content: thought });
        }
        let text = rest.trim().to_string();
        self.emit(ProgressEvent::Answer {
            content: text.clone(),
        });

        info!("Chat run answered");
        RunOutcome {
            text,
            status: RunStatus::Answered,
            turns: 1,
            tool_calls: 0,
        }
    }

    /// System prompt plus the history the profile allows.
    fn build_context(&self, appended: usize) -> Vec<Message> {
        let history: &[Message] = match self.profile.history_policy() {
            HistoryPolicy::Full => self.memory.messages(),
            HistoryPolicy::CurrentRun => self.memory.recent(appended),
            HistoryPolicy::None => &[],
        };

        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend_from_slice(history);
        messages
    }

    /// Call the backend under the timeout.
    async fn generate(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let start = Instant::now();
        debug!(
            provider = self.provider.name(),
            messages = messages.len(),
            stream = self.stream,
            "Calling backend"
        );

        let result = if self.stream {
            tokio::time::timeout(self.backend_timeout, self.stream_text(messages)).await
        } else {
            tokio::time::timeout(self.backend_timeout, self.provider.chat(messages)).await
        };
        let result = result.unwrap_or_else(|_| Err(ProviderError::Timeout(self.backend_timeout)));

        let elapsed = start.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.record_llm_call(elapsed);
        }
        match &result {
            Ok(text) => debug!(elapsed_ms = elapsed.as_millis() as u64, chars = text.len(), "Backend replied"),
            Err(e) => warn!(elapsed_ms = elapsed.as_millis() as u64, error = %e, "Backend call failed"),
        }
        result
    }

    /// Drain a stream, forwarding chunks, and return the whole text.
    async fn stream_text(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let mut rx = self.provider.stream(messages).await?;
        let mut text = String::new();

        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
                self.emit(ProgressEvent::Chunk {
                    content: content.clone(),
                });
                text.push_str(&content);
            }
            if chunk.done {
                break;
            }
        }

        Ok(text)
    }

    fn fail(&self, status: RunStatus, text: String, turns: usize, tool_calls: usize) -> RunOutcome {
        warn!(?status, turns, tool_calls, "Agent run failed: {text}");
        self.emit(ProgressEvent::Error {
            message: text.clone(),
        });
        RunOutcome {
            text,
            status,
            turns,
            tool_calls,
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(event);
        }
    }
}
