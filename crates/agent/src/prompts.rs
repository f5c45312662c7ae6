//! System prompts per profile.
//!
//! The tool list is rendered as JSON definitions sorted by name, so the
//! same registry always produces the same prompt.

use clawlet_core::profile::Profile;
use clawlet_core::tool::ToolRegistry;

const HIGH_POWER_TEMPLATE: &str = r#"You are Clawlet, an AI assistant running in HIGH POWER mode.

Available tools:
{tools}

Work in a loop: reason about the request, call a tool when you need
information or need to act, read its output, and repeat until you can answer.

Always reply with JSON, in one of these two forms:
{"thought": "your reasoning", "tool": "tool_name", "args": {"arg": "value"}}
{"thought": "your reasoning", "answer": "final reply to the user"}

Rules:
1. Only call tools from the list above.
2. Break complex problems into steps.
3. If you can answer directly, use "answer".
4. The full conversation history is available to you."#;

const LOW_POWER_TEMPLATE: &str = r#"You are Clawlet in LOW POWER mode.

Tools: {tools}

Reply with JSON only, nothing else.
Tool call: {"tool": "name", "args": {...}}
Answer: {"answer": "text"}

Be brief. Only this session's messages are visible."#;

/// Serialized tool definitions as embedded in prompts.
pub fn tools_json(registry: &ToolRegistry) -> String {
    serde_json::to_string_pretty(&registry.definitions()).unwrap_or_else(|_| "[]".into())
}

/// The system prompt for `profile`, or `None` when the profile sends none.
pub fn system_prompt(profile: Profile, registry: &ToolRegistry) -> Option<String> {
    let template = match profile {
        Profile::HighPower => HIGH_POWER_TEMPLATE,
        Profile::LowPower => LOW_POWER_TEMPLATE,
        Profile::Chat => return None,
    };
    Some(template.replace("{tools}", &tools_json(registry)))
}
