//! Hook protocol types.
//!
//! - `HookEvent`: the three host extension points
//! - `HookPayload`: the JSON document the host writes to stdin
//! - `HookOutcome`: what the engine answers, mapped to an exit code and output

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::errors::HookError;

/// Host extension points the engine is invoked around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookEvent {
    /// Before a file write (write admission)
    PreWrite,
    /// Before a delegation (delegation admission)
    PreTask,
    /// After a delegation completes (completion reduction)
    PostTask,
}

impl HookEvent {
    pub fn all() -> &'static [HookEvent] {
        &[HookEvent::PreWrite, HookEvent::PreTask, HookEvent::PostTask]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreWrite => "pre-write",
            HookEvent::PreTask => "pre-task",
            HookEvent::PostTask => "post-task",
        }
    }

    /// The host's name for the hook point.
    pub fn host_event_name(&self) -> &'static str {
        match self {
            HookEvent::PreWrite | HookEvent::PreTask => "PreToolUse",
            HookEvent::PostTask => "PostToolUse",
        }
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HookEvent {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pre-write" | "pre_write" => Ok(HookEvent::PreWrite),
            "pre-task" | "pre_task" => Ok(HookEvent::PreTask),
            "post-task" | "post_task" => Ok(HookEvent::PostTask),
            _ => Err(HookError::UnknownEvent(s.to_string())),
        }
    }
}

/// The tool invocation the host is asking about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub subagent_type: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// One hook invocation as written to stdin by the host.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HookPayload {
    #[serde(default, deserialize_with = "crate::state::null_as_default")]
    pub tool_input: ToolInput,
    /// Worker output; a string, a list of text blocks, or an object with `content`
    #[serde(default, alias = "tool_response")]
    pub tool_result: Value,
}

impl HookPayload {
    pub fn parse(input: &str) -> Result<Self, HookError> {
        serde_json::from_str(input).map_err(HookError::MalformedPayload)
    }

    pub fn file_path(&self) -> &str {
        self.tool_input.file_path.as_deref().unwrap_or("")
    }

    pub fn subagent_type(&self) -> &str {
        self.tool_input.subagent_type.as_deref().unwrap_or("")
    }

    pub fn prompt(&self) -> &str {
        self.tool_input.prompt.as_deref().unwrap_or("")
    }

    /// The worker output flattened to plain text.
    pub fn result_text(&self) -> String {
        flatten_text(&self.tool_result)
    }
}

fn flatten_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                text.to_string()
            } else if let Some(content) = map.get("content") {
                flatten_text(content)
            } else {
                String::new()
            }
        }
        other => other.to_string(),
    }
}

/// The engine's answer to one hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Allow,
    Block(String),
    /// Guidance to surface to the coordinator
    Context(String),
}

impl HookOutcome {
    /// Process exit code the host interprets.
    pub fn exit_code(&self) -> u8 {
        match self {
            HookOutcome::Allow | HookOutcome::Context(_) => 0,
            HookOutcome::Block(_) => 2,
        }
    }

    /// JSON to write to stdout, if any.
    pub fn stdout_json(&self, event: HookEvent) -> Option<Value> {
        match self {
            HookOutcome::Context(guidance) if !guidance.is_empty() => Some(json!({
                "hookSpecificOutput": {
                    "hookEventName": event.host_event_name(),
                    "additionalContext": guidance,
                }
            })),
            _ => None,
        }
    }

    /// Text to write to stderr, if any.
    pub fn stderr_text(&self) -> Option<&str> {
        match self {
            HookOutcome::Block(reason) => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_event_parse() {
        assert_eq!("pre-write".parse::<HookEvent>().unwrap(), HookEvent::PreWrite);
        assert_eq!("PRE_TASK".parse::<HookEvent>().unwrap(), HookEvent::PreTask);
        assert_eq!("post-task".parse::<HookEvent>().unwrap(), HookEvent::PostTask);
        let err = "on-save".parse::<HookEvent>().unwrap_err();
        assert!(matches!(err, HookError::UnknownEvent(ref e) if e == "on-save"));
    }

    #[test]
    fn test_hook_event_roundtrip_names() {
        for event in HookEvent::all() {
            assert_eq!(event.as_str().parse::<HookEvent>().unwrap(), *event);
        }
        assert_eq!(HookEvent::PostTask.host_event_name(), "PostToolUse");
        assert_eq!(HookEvent::PreWrite.host_event_name(), "PreToolUse");
    }

    #[test]
    fn test_payload_fields_default_to_empty() {
        let payload = HookPayload::parse("{}").unwrap();
        assert_eq!(payload.file_path(), "");
        assert_eq!(payload.subagent_type(), "");
        assert_eq!(payload.prompt(), "");
        assert_eq!(payload.result_text(), "");
    }

    #[test]
    fn test_payload_null_tool_input_is_empty() {
        let payload =
            HookPayload::parse(r#"{"tool_input": null, "tool_result": null}"#).unwrap();
        assert_eq!(payload.tool_input, ToolInput::default());
        assert_eq!(payload.subagent_type(), "");
        assert_eq!(payload.result_text(), "");
    }

    #[test]
    fn test_payload_malformed() {
        let err = HookPayload::parse("{not json").unwrap_err();
        assert!(err.to_string().starts_with("Error parsing input:"));
    }

    #[test]
    fn test_result_text_shapes() {
        let payload = HookPayload::parse(r#"{"tool_result": "Verdict: APPROVED"}"#).unwrap();
        assert_eq!(payload.result_text(), "Verdict: APPROVED");

        let payload = HookPayload::parse(
            r#"{"tool_result": [{"type": "text", "text": "first"}, {"type": "text", "text": "second"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.result_text(), "first\nsecond");

        let payload = HookPayload::parse(
            r#"{"tool_response": {"content": [{"type": "text", "text": "NEEDS_REVISION"}]}}"#,
        )
        .unwrap();
        assert_eq!(payload.result_text(), "NEEDS_REVISION");
    }

    #[test]
    fn test_outcome_exit_codes_and_output() {
        assert_eq!(HookOutcome::Allow.exit_code(), 0);
        assert_eq!(HookOutcome::Block("no".into()).exit_code(), 2);
        assert_eq!(HookOutcome::Block("no".into()).stderr_text(), Some("no"));
        assert_eq!(HookOutcome::Allow.stdout_json(HookEvent::PreTask), None);
        assert_eq!(
            HookOutcome::Context(String::new()).stdout_json(HookEvent::PostTask),
            None
        );

        let out = HookOutcome::Context("next".into())
            .stdout_json(HookEvent::PostTask)
            .unwrap();
        assert_eq!(out["hookSpecificOutput"]["hookEventName"], "PostToolUse");
        assert_eq!(out["hookSpecificOutput"]["additionalContext"], "next");
    }
}
