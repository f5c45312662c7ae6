//! Response parser — turns raw generated text into actions.
//!
//! Backends rarely answer with exactly one clean JSON object. A reply may
//! carry a `<think>…</think>` section, markdown fences, prose around the
//! JSON, or several action objects in a row. The parser recovers as much
//! as it can and never fails: text with no recognizable action becomes a
//! plain answer.
//!
//! ```text
//! <think>plan</think>
//! {"tool": "read_file", "args": {"path": "README.md"}}
//! ```

use regex_lite::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static THINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>(.*?)</think>").expect("think pattern is valid"));

/// One step the backend asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Invoke a tool.
    Tool {
        name: String,
        args: Value,
        thought: Option<String>,
    },

    /// Reply to the user and stop.
    Answer {
        text: String,
        thought: Option<String>,
    },

    /// An object that names `tool` or `answer` but cannot be acted on,
    /// e.g. an empty or non-string tool name.
    Invalid(Value),
}

impl Action {
    /// The `thought` field carried by the action object, if any.
    pub fn thought(&self) -> Option<&str> {
        match self {
            Self::Tool { thought, .. } | Self::Answer { thought, .. } => thought.as_deref(),
            Self::Invalid(_) => None,
        }
    }

    /// The form stored in memory as an assistant message.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Tool { name, args, .. } => serde_json::json!({ "tool": name, "args": args }),
            Self::Answer { text, .. } => serde_json::json!({ "answer": text }),
            Self::Invalid(raw) => raw.clone(),
        }
    }
}

/// Everything recovered from one reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    /// Contents of the first `<think>` section.
    pub thought: Option<String>,
    /// Actions in the order they appeared.
    pub actions: Vec<Action>,
}

/// Split off the first `<think>…</think>` section.
///
/// Returns the trimmed inner text (if non-empty) and the input with the
/// whole section removed.
pub fn extract_thinking(raw: &str) -> (Option<String>, String) {
    let Some(caps) = THINK_RE.captures(raw) else {
        return (None, raw.to_string());
    };

    let thought = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());
    let rest = THINK_RE.replace(raw, "").into_owned();
    (thought, rest)
}

/// Parse a raw reply into actions.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let (thought, without_thinking) = extract_thinking(raw);
    let cleaned = strip_fences(&without_thinking);

    // Whole reply is one action object
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        if let Some(action) = action_from_value(value) {
            return ParsedResponse {
                thought,
                actions: vec![action],
            };
        }
    }

    let actions = scan_actions(&cleaned);
    if !actions.is_empty() {
        return ParsedResponse { thought, actions };
    }

    ParsedResponse {
        thought,
        actions: vec![Action::Answer {
            text: without_thinking.trim().to_string(),
            thought: None,
        }],
    }
}

fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Interpret a JSON value as an action.
///
/// `None` when the value is not an object or names neither `tool` nor
/// `answer`. A present `answer` takes precedence over `tool`.
fn action_from_value(value: Value) -> Option<Action> {
    let obj = value.as_object()?;
    if !obj.contains_key("tool") && !obj.contains_key("answer") {
        return None;
    }

    let thought = obj
        .get("thought")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    match obj.get("answer") {
        Some(Value::String(text)) => {
            return Some(Action::Answer {
                text: text.clone(),
                thought,
            });
        }
        Some(Value::Null) | None => {}
        Some(other) => {
            return Some(Action::Answer {
                text: other.to_string(),
                thought,
            });
        }
    }

    let name = obj
        .get("tool")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .map(String::from);
    let args = obj.get("args").cloned().unwrap_or(Value::Null);

    match name {
        Some(name) => Some(Action::Tool {
            name,
            args,
            thought,
        }),
        None => Some(Action::Invalid(value)),
    }
}

/// Find every balanced `{…}` candidate and keep those that parse as
/// actions, outermost and leftmost first. A recognized candidate is consumed
/// whole; an unrecognized one still lets its nested objects be tried.
fn scan_actions(text: &str) -> Vec<Action> {
    let mut candidates = balanced_spans(text);
    candidates.sort_unstable_by_key(|&(start, _)| start);

    let mut actions = Vec::new();
    let mut consumed = 0;
    for (start, end) in candidates {
        if start < consumed {
            continue;
        }
        if let Some(action) = serde_json::from_str::<Value>(&text[start..end])
            .ok()
            .and_then(action_from_value)
        {
            actions.push(action);
            consumed = end;
        }
    }

    actions
}

/// Byte spans of every balanced `{…}` in one pass, in closing order.
///
/// Quotes only count inside an open brace, so prose apostrophes and quotes
/// around the JSON do not hide it. Braces that never close yield nothing.
fn balanced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i + 1));
                }
            }
            _ => {}
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answer(text: &str) -> Action {
        Action::Answer {
            text: text.into(),
            thought: None,
        }
    }

    #[test]
    fn clean_answer_object() {
        let parsed = parse_response(r#"{"answer":"hi"}"#);
        assert_eq!(parsed.thought, None);
        assert_eq!(parsed.actions, vec![answer("hi")]);
    }

    #[test]
    fn thinking_then_tool() {
        let parsed = parse_response("<think>plan</think>\n{\"tool\":\"x\",\"args\":{}}");
        assert_eq!(parsed.thought.as_deref(), Some("plan"));
        assert_eq!(
            parsed.actions,
            vec![Action::Tool {
                name: "x".into(),
                args: json!({}),
                thought: None,
            }]
        );
    }

    #[test]
    fn plain_text_becomes_answer() {
        let parsed = parse_response("hello world");
        assert_eq!(parsed.actions, vec![answer("hello world")]);
    }

    #[test]
    fn multiple_objects_in_prose() {
        let parsed = parse_response(r#"noise {"tool":"a","args":{}} filler {"answer":"done"}"#);
        assert_eq!(parsed.actions.len(), 2);
        assert!(matches!(&parsed.actions[0], Action::Tool { name, .. } if name == "a"));
        assert_eq!(parsed.actions[1], answer("done"));
    }

    #[test]
    fn fenced_json() {
        let raw = "```json\n{\"tool\": \"read_file\", \"args\": {\"path\": \"a.txt\"}}\n```";
        let parsed = parse_response(raw);
        assert_eq!(
            parsed.actions,
            vec![Action::Tool {
                name: "read_file".into(),
                args: json!({"path": "a.txt"}),
                thought: None,
            }]
        );
    }

    #[test]
    fn action_thought_field() {
        let parsed = parse_response(r#"{"thought": " checking ", "answer": "ok"}"#);
        assert_eq!(parsed.actions[0].thought(), Some("checking"));
    }

    #[test]
    fn answer_wins_over_tool_in_one_object() {
        let parsed = parse_response(r#"{"tool": "x", "answer": "stop"}"#);
        assert_eq!(parsed.actions, vec![answer("stop")]);
    }

    #[test]
    fn non_string_answer_is_stringified() {
        let parsed = parse_response(r#"{"answer": 42}"#);
        assert_eq!(parsed.actions, vec![answer("42")]);
    }

    #[test]
    fn empty_tool_name_is_invalid() {
        let parsed = parse_response(r#"{"tool": ""}"#);
        assert!(matches!(parsed.actions[0], Action::Invalid(_)));

        let parsed = parse_response(r#"{"tool": 7, "args": {}}"#);
        assert!(matches!(parsed.actions[0], Action::Invalid(_)));
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_scanner() {
        let raw = r#"Sure: {"answer": "use {curly} braces \" and quotes"} thanks"#;
        let parsed = parse_response(raw);
        assert_eq!(parsed.actions, vec![answer(r#"use {curly} braces " and quotes"#)]);
    }

    #[test]
    fn malformed_fragment_is_skipped() {
        let raw = r#"{"tool": "broken", } then {"answer": "fine"}"#;
        let parsed = parse_response(raw);
        assert_eq!(parsed.actions, vec![answer("fine")]);
    }

    #[test]
    fn nested_action_inside_unrelated_object() {
        let raw = r#"result: {"meta": {"answer": "inner"}}"#;
        let parsed = parse_response(raw);
        assert_eq!(parsed.actions, vec![answer("inner")]);
    }

    #[test]
    fn unclosed_object_falls_back_to_text() {
        let parsed = parse_response(r#"{"answer": "never closed"#);
        assert_eq!(parsed.actions, vec![answer(r#"{"answer": "never closed"#)]);
    }

    #[test]
    fn unclosed_braces_scan_in_linear_time() {
        let raw = "{".repeat(200_000);
        let start = std::time::Instant::now();
        let parsed = parse_response(&raw);
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(parsed.actions, vec![answer(&raw)]);
    }

    #[test]
    fn action_after_stray_open_braces() {
        let raw = format!(r#"{} {{"answer": "still found"}}"#, "{".repeat(1_000));
        let parsed = parse_response(&raw);
        assert_eq!(parsed.actions, vec![answer("still found")]);
    }

    #[test]
    fn quotes_in_prose_do_not_hide_actions() {
        let raw = r#"I'd say "maybe" then {"answer": "ok"}"#;
        assert_eq!(parse_response(raw).actions, vec![answer("ok")]);
    }

    #[test]
    fn fallback_strips_thinking_only() {
        let parsed = parse_response("<think>hmm</think>  Just a sentence.  ");
        assert_eq!(parsed.thought.as_deref(), Some("hmm"));
        assert_eq!(parsed.actions, vec![answer("Just a sentence.")]);
    }

    #[test]
    fn only_first_think_section_is_extracted() {
        let (thought, rest) = extract_thinking("<think>a</think>x<think>b</think>");
        assert_eq!(thought.as_deref(), Some("a"));
        assert_eq!(rest, "x<think>b</think>");
    }

    #[test]
    fn multiline_think_section() {
        let (thought, rest) = extract_thinking("<think>\nline one\nline two\n</think>\nanswer");
        assert_eq!(thought.as_deref(), Some("line one\nline two"));
        assert_eq!(rest.trim(), "answer");
    }

    #[test]
    fn object_without_action_keys_is_ignored() {
        let parsed = parse_response(r#"{"foo": 1}"#);
        assert_eq!(parsed.actions, vec![answer(r#"{"foo": 1}"#)]);
    }

    #[test]
    fn to_value_forms() {
        let tool = Action::Tool {
            name: "x".into(),
            args: json!({"a": 1}),
            thought: Some("t".into()),
        };
        assert_eq!(tool.to_value(), json!({"tool": "x", "args": {"a": 1}}));
        assert_eq!(answer("hi").to_value(), json!({"answer": "hi"}));
    }
}
