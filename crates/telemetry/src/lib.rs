//! Runtime metrics for Clawlet agents.
//!
//! A [`MetricsCollector`] is created by whoever builds the agent and handed
//! to it explicitly. It counts backend calls and tool executions, keeps their
//! cumulative latency, and reports uptime. Snapshots are plain serializable
//! values so the CLI can print them or emit them as JSON.

pub mod collector;
pub mod model;

pub use collector::MetricsCollector;
pub use model::{format_duration, MetricsSnapshot, ToolStats};
