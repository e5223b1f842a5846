use conduit_models::reasoning::ToolInvocation;
use conduit_models::routing::ChoiceSchema;
use thiserror::Error;

use crate::error::ModelError;

pub const ACTION_MARKER: &str = "Action:";
pub const ACTION_INPUT_MARKER: &str = "Action Input:";
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";
const OBSERVATION_MARKER: &str = "\nObservation:";

/// Extract the first JSON object from a string that may contain surrounding text.
///
/// Handles common Claude response formats:
/// - Clean JSON: `{"key": "value"}`
/// - Markdown-wrapped: ```json\n{"key": "value"}\n```
/// - Prefix text: `Here is the analysis:\n{"key": "value"}`
pub fn extract_json(text: &str) -> Result<String, ModelError> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Ok(trimmed.to_string());
    }

    if let Some(json_str) = extract_from_markdown_block(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    if let Some(json_str) = extract_first_object(trimmed) {
        if serde_json::from_str::<serde_json::Value>(&json_str).is_ok() {
            return Ok(json_str);
        }
    }

    Err(ModelError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

/// Extract JSON from a markdown code block (```json ... ``` or ``` ... ```)
fn extract_from_markdown_block(text: &str) -> Option<String> {
    let start_markers = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for marker in &start_markers {
        if let Some(start) = text.find(marker) {
            let json_start = start + marker.len();
            if let Some(end) = text[json_start..].find("```") {
                let extracted = text[json_start..json_start + end].trim();
                return Some(extracted.to_string());
            }
        }
    }

    None
}

/// Find the first balanced { ... } in the text.
fn extract_first_object(text: &str) -> Option<String> {
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a two-literal structured answer.
///
/// Accepts a JSON object carrying `schema.field`, or a bare literal
/// (`sim`, `"nao".`). Returns the canonical literal.
pub fn parse_choice(raw: &str, schema: &ChoiceSchema) -> Result<String, ModelError> {
    if let Ok(json_str) = extract_json(raw) {
        let value: serde_json::Value = serde_json::from_str(&json_str)?;
        let field = value
            .get(&schema.field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ModelError::Schema(format!("Missing field: {}", schema.field)))?;
        return schema
            .accept(field)
            .map(str::to_string)
            .ok_or_else(|| outside_schema(schema, field));
    }

    let bare = raw
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c| c == '"' || c == '\'' || c == '`');
    schema
        .accept(bare)
        .map(str::to_string)
        .ok_or_else(|| outside_schema(schema, raw.trim()))
}

fn outside_schema(schema: &ChoiceSchema, got: &str) -> ModelError {
    ModelError::Schema(format!(
        "{} must be one of {:?}, got: {got}",
        schema.field, schema.options
    ))
}

/// What one ReAct completion asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactOutput {
    Action {
        thought: String,
        invocation: ToolInvocation,
    },
    Finish {
        thought: String,
        answer: String,
    },
}

/// Why a ReAct completion could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReactFormatError {
    #[error("Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,

    #[error("Missing tool name after 'Action:'")]
    EmptyToolName,

    #[error("Empty text after 'Final Answer:'")]
    EmptyFinalAnswer,

    #[error("Found both a final answer and an action")]
    ActionAndFinalAnswer,
}

/// Parse a ReAct-format completion.
///
/// Anything from a model-written `Observation:` line onwards is ignored;
/// observations come only from tools.
pub fn parse_react_output(raw: &str) -> Result<ReactOutput, ReactFormatError> {
    let text = match raw.find(OBSERVATION_MARKER) {
        Some(idx) => &raw[..idx],
        None => raw,
    };

    let action_at = text.find(ACTION_MARKER);
    let final_at = text.find(FINAL_ANSWER_MARKER);

    match (action_at, final_at) {
        (Some(_), Some(_)) => Err(ReactFormatError::ActionAndFinalAnswer),
        (Some(action_idx), None) => {
            let after_action = &text[action_idx + ACTION_MARKER.len()..];
            let input_idx = after_action
                .find(ACTION_INPUT_MARKER)
                .ok_or(ReactFormatError::MissingActionInput)?;

            let tool = after_action[..input_idx].trim();
            if tool.is_empty() {
                return Err(ReactFormatError::EmptyToolName);
            }
            let argument = after_action[input_idx + ACTION_INPUT_MARKER.len()..]
                .trim()
                .trim_matches('"');

            Ok(ReactOutput::Action {
                thought: strip_thought_prefix(&text[..action_idx]),
                invocation: ToolInvocation {
                    tool: tool.to_string(),
                    argument: argument.to_string(),
                },
            })
        }
        (None, Some(final_idx)) => {
            let answer = text[final_idx + FINAL_ANSWER_MARKER.len()..].trim();
            if answer.is_empty() {
                return Err(ReactFormatError::EmptyFinalAnswer);
            }
            Ok(ReactOutput::Finish {
                thought: strip_thought_prefix(&text[..final_idx]),
                answer: answer.to_string(),
            })
        }
        (None, None) => Err(ReactFormatError::MissingAction),
    }
}

fn strip_thought_prefix(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix("Thought:").unwrap_or(text).trim().to_string()
}
