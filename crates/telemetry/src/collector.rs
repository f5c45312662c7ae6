//! Thread-safe metrics collector.

use crate::model::{format_duration, MetricsSnapshot, ToolStats};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Collects backend and tool timings for one process (or one agent).
///
/// Thread-safe via `RwLock`; share it as `Arc<MetricsCollector>`.
pub struct MetricsCollector {
    state: RwLock<State>,
}

#[derive(Debug)]
struct State {
    started: Instant,
    started_at: DateTime<Utc>,
    llm_calls: u64,
    llm_total_ms: u64,
    tools: BTreeMap<String, ToolStats>,
}

impl State {
    fn fresh() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            llm_calls: 0,
            llm_total_ms: 0,
            tools: BTreeMap::new(),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::fresh()),
        }
    }

    /// Record one backend call and how long it took.
    pub fn record_llm_call(&self, elapsed: Duration) {
        let ms = duration_ms(elapsed);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.llm_calls += 1;
        state.llm_total_ms += ms;
        debug!(elapsed_ms = ms, total_calls = state.llm_calls, "Backend call recorded");
    }

    /// Record one tool execution and how long it took.
    pub fn record_tool_call(&self, tool: &str, elapsed: Duration) {
        let ms = duration_ms(elapsed);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let entry = state.tools.entry(tool.to_string()).or_default();
        entry.calls += 1;
        entry.total_ms += ms;
        debug!(tool, elapsed_ms = ms, "Tool call recorded");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let uptime_secs = state.started.elapsed().as_secs();
        let llm_avg_ms = if state.llm_calls == 0 {
            0.0
        } else {
            state.llm_total_ms as f64 / state.llm_calls as f64
        };

        MetricsSnapshot {
            started_at: state.started_at,
            uptime_secs,
            uptime: format_duration(uptime_secs),
            llm_calls: state.llm_calls,
            llm_total_ms: state.llm_total_ms,
            llm_avg_ms,
            tools: state.tools.clone(),
        }
    }

    /// Zero every counter and restart the uptime clock.
    pub fn reset(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = State::fresh();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
