//! Serializable metric values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-tool call statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolStats {
    pub calls: u64,
    pub total_ms: u64,
}

impl ToolStats {
    /// Mean latency in milliseconds, zero when the tool was never called.
    pub fn avg_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_ms as f64 / self.calls as f64
        }
    }
}

/// A point-in-time copy of everything the collector knows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// When collection started (creation or last reset).
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    /// Human form of `uptime_secs`, e.g. `1h 2m`.
    pub uptime: String,
    pub llm_calls: u64,
    pub llm_total_ms: u64,
    pub llm_avg_ms: f64,
    /// Keyed by tool name; ordered for stable output.
    pub tools: BTreeMap<String, ToolStats>,
}

impl MetricsSnapshot {
    /// Total tool executions across every tool.
    pub fn tool_calls(&self) -> u64 {
        self.tools.values().map(|t| t.calls).sum()
    }
}

/// Format a number of seconds as `1h 2m`, `3m 4s` or `5s`.
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
