//! `clawlet agent` — Interactive or single-message chat mode.

use super::{build_memory, load_config};
use clawlet_agent::Agent;
use clawlet_core::error::ProviderError;
use clawlet_core::event::{ProgressEvent, ProgressSink};
use clawlet_core::profile::Profile;
use clawlet_core::provider::Provider;
use clawlet_core::tool::ToolRegistry;
use clawlet_memory::MemoryStats;
use clawlet_telemetry::MetricsCollector;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    message: Option<String>,
    profile: Option<String>,
    provider: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?;
    if let Some(name) = provider {
        config.default_provider = name;
    }
    let profile = profile
        .as_deref()
        .map(Profile::normalize)
        .unwrap_or(config.agent.profile);

    let router = clawlet_providers::build_from_config(&config);
    let backend = router
        .default()
        .ok_or_else(|| ProviderError::NotConfigured(config.default_provider.clone()))?;

    let metrics = config
        .telemetry
        .enabled
        .then(|| Arc::new(MetricsCollector::new()));
    let streaming = config.agent.stream;
    let sink: Arc<dyn ProgressSink> = Arc::new(move |event: ProgressEvent| {
        if let Some(line) = render_event(&event, streaming) {
            eprint!("{line}");
        }
    });

    // Concrete tools are supplied by embedding applications
    let tools = Arc::new(ToolRegistry::new());

    let mut agent = Agent::new(Arc::clone(&backend), tools, profile)
        .with_memory(build_memory(&config, profile))
        .with_max_turns(config.agent.max_turns)
        .with_backend_timeout(Duration::from_secs(config.agent.backend_timeout_secs))
        .with_streaming(streaming)
        .with_recorded_thoughts(config.agent.record_thoughts)
        .with_sink(sink);
    if let Some(metrics) = &metrics {
        agent = agent.with_metrics(Arc::clone(metrics));
    }

    if let Some(msg) = message {
        // Single message mode
        let outcome = agent.run_detailed(&msg).await;
        println!("{}", outcome.text);
        tracing::debug!(
            status = ?outcome.status,
            turns = outcome.turns,
            tool_calls = outcome.tool_calls,
            "Run finished"
        );
        if !outcome.status.is_success() {
            return Err(format!("Run ended with status {:?}", outcome.status).into());
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Clawlet Agent — Interactive Mode");
    println!();
    println!("  Provider:  {}", router.default_name());
    println!("  Model:     {}", config.default_model);
    println!("  Profile:   {}", agent.profile());
    println!("  Backend:   {}", backend_status(backend.as_ref()).await);
    println!();
    println!("  Commands:  /profile <name>, /stats, /clear, exit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "exit" | "quit" => break,
            "/stats" => {
                for line in stats_lines(agent.memory().stats(), metrics.as_deref()) {
                    println!("{line}");
                }
                continue;
            }
            "/clear" => {
                agent.memory_mut().clear().await?;
                println!("  Memory cleared.");
                continue;
            }
            _ => {}
        }

        if let Some(name) = input.strip_prefix("/profile") {
            agent.set_profile(name.trim());
            println!("  Profile:   {}", agent.profile());
            continue;
        }

        let response = agent.run(input).await;
        println!();
        for line in response.lines() {
            println!("  Assistant > {line}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

/// `/stats` output. Timing lines only appear when telemetry is attached.
fn stats_lines(memory: MemoryStats, metrics: Option<&MetricsCollector>) -> Vec<String> {
    let mut lines = vec![format!(
        "  Memory:    {}/{} messages, {}/{} bytes",
        memory.message_count, memory.max_messages, memory.size_bytes, memory.max_size
    )];

    let Some(metrics) = metrics else {
        lines.push("  Telemetry: disabled".to_string());
        return lines;
    };
    let snap = metrics.snapshot();
    lines.push(format!(
        "  Backend:   {} calls, avg {:.0} ms, uptime {}",
        snap.llm_calls, snap.llm_avg_ms, snap.uptime
    ));
    for (name, tool) in &snap.tools {
        lines.push(format!("  Tool {name}: {} calls, avg {:.0} ms", tool.calls, tool.avg_ms()));
    }
    lines
}

/// One-line reachability summary for the banner.
async fn backend_status(backend: &dyn Provider) -> String {
    match backend.health_check().await {
        Ok(true) => "reachable".to_string(),
        Ok(false) => {
            tracing::warn!(provider = backend.name(), "Backend health check failed");
            "responding with errors".to_string()
        }
        Err(e) => {
            tracing::warn!(provider = backend.name(), error = %e, "Backend unreachable");
            format!("unreachable ({e})")
        }
    }
}

/// Terminal rendering of a progress event, or `None` to stay quiet.
fn render_event(event: &ProgressEvent, streaming: bool) -> Option<String> {
    match event {
        ProgressEvent::Thinking { turn } => Some(format!("  Thinking... (step {turn})\n")),
        ProgressEvent::Thought { content } => Some(format!("  Thought: {content}\n")),
        ProgressEvent::ToolStart { name, args } => Some(format!("  Tool {name} {args}\n")),
        ProgressEvent::Observation { content, success, .. } => {
            let mark = if *success { "ok" } else { "failed" };
            Some(format!("  Observation ({mark}): {content}\n"))
        }
        ProgressEvent::Chunk { content } if streaming => Some(content.clone()),
        ProgressEvent::Chunk { .. } | ProgressEvent::Answer { .. } => None,
        ProgressEvent::Error { message } => Some(format!("  [Error] {message}\n")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawlet_core::message::Message;
    use clawlet_providers::MockProvider;

    struct DownProvider;

    #[async_trait::async_trait]
    impl Provider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }
        async fn chat(&self, _messages: &[Message]) -> Result<String, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }
        async fn health_check(&self) -> Result<bool, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }
    }

    fn memory_stats() -> MemoryStats {
        MemoryStats {
            message_count: 3,
            size_bytes: 120,
            max_messages: 20,
            max_size: 50_000,
        }
    }

    #[test]
    fn stats_without_telemetry_skip_timings() {
        let lines = stats_lines(memory_stats(), None);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("3/20 messages"));
        assert_eq!(lines[1], "  Telemetry: disabled");
    }

    #[test]
    fn stats_with_telemetry_show_timings() {
        let metrics = MetricsCollector::new();
        metrics.record_llm_call(Duration::from_millis(40));
        metrics.record_tool_call("echo", Duration::from_millis(5));

        let lines = stats_lines(memory_stats(), Some(&metrics));
        assert!(lines[1].contains("1 calls"));
        assert!(lines[2].starts_with("  Tool echo: 1 calls"));
    }

    #[tokio::test]
    async fn banner_reports_reachable_backend() {
        let mock = MockProvider::new(Vec::<String>::new());
        assert_eq!(backend_status(&mock).await, "reachable");
    }

    #[tokio::test]
    async fn banner_reports_unreachable_backend() {
        let status = backend_status(&DownProvider).await;
        assert!(status.starts_with("unreachable"));
        assert!(status.contains("connection refused"));
    }

    #[test]
    fn thinking_shows_step() {
        let line = render_event(&ProgressEvent::Thinking { turn: 2 }, false).unwrap();
        assert!(line.contains("step 2"));
    }

    #[test]
    fn answer_is_printed_by_caller() {
        assert!(render_event(&ProgressEvent::Answer { content: "x".into() }, false).is_none());
    }

    #[test]
    fn chunks_only_when_streaming() {
        let chunk = ProgressEvent::Chunk { content: "par".into() };
        assert!(render_event(&chunk, false).is_none());
        assert_eq!(render_event(&chunk, true).as_deref(), Some("par"));
    }

    #[test]
    fn failed_observation_marked() {
        let event = ProgressEvent::Observation {
            name: "t".into(),
            content: "Error: Tool 't' not found.".into(),
            success: false,
        };
        assert!(render_event(&event, false).unwrap().contains("failed"));
    }
}
