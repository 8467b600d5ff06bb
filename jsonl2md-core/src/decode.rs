use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Jsonl2mdError, Result};
use crate::model::{
    AssistantPart, DecodedTranscript, Diagnostic, Event, EventBody, SessionMeta, UserEvent,
    UserPayload,
};
use crate::text;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Decodes raw transcript bytes. Fails only when the input is not UTF-8 text.
pub fn decode_bytes(input: &[u8]) -> Result<DecodedTranscript> {
    let text = std::str::from_utf8(input).map_err(|err| Jsonl2mdError::DecodeFailure {
        message: format!("transcript is not valid UTF-8 text ({err})"),
    })?;
    Ok(decode_transcript(text))
}

/// Decodes every non-empty line independently; bad lines become diagnostics.
pub fn decode_transcript(raw_jsonl: &str) -> DecodedTranscript {
    let raw_jsonl = raw_jsonl.strip_prefix(BYTE_ORDER_MARK).unwrap_or(raw_jsonl);

    let mut events = Vec::new();
    let mut diagnostics = Vec::new();
    let mut after_bare_model_command = false;

    for (line_idx, line) in raw_jsonl.lines().enumerate() {
        let line_no = line_idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let value = match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => value,
            Err(source) => {
                warn!(line = line_no, reason = %source, "skipping invalid JSON line");
                diagnostics.push(Diagnostic::InvalidJson {
                    line: line_no,
                    reason: source.to_string(),
                });
                continue;
            }
        };

        let mut event = decode_event(line_no, &value);
        if matches!(event.body, EventBody::Other) {
            let kind = value
                .get("type")
                .and_then(Value::as_str)
                .map(ToString::to_string);
            debug!(line = line_no, kind = ?kind, "dropping event of unknown kind");
            diagnostics.push(Diagnostic::UnknownKind {
                line: line_no,
                kind,
            });
        }

        let is_bare_model_command = is_bare_model_command(&event.body);
        if after_bare_model_command {
            attach_model_output(&mut event.body);
        }
        after_bare_model_command = is_bare_model_command;

        events.push(event);
    }

    DecodedTranscript {
        events,
        diagnostics,
    }
}

pub fn decode_event(index: usize, value: &Value) -> Event {
    let body = match value.get("type").and_then(Value::as_str) {
        Some("summary") => EventBody::Summary(
            value
                .get("summary")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        ),
        Some("user") => EventBody::User(decode_user(value.get("message"))),
        Some("assistant") => EventBody::Assistant(
            value
                .get("message")
                .filter(|message| !message.is_null())
                .map(decode_assistant_parts),
        ),
        _ => EventBody::Other,
    };

    Event {
        index,
        timestamp: value.get("timestamp").and_then(parse_timestamp),
        session: decode_session(value),
        body,
    }
}

fn decode_session(value: &Value) -> Option<SessionMeta> {
    let session_id = non_empty_string(value.get("sessionId"))?;

    Some(SessionMeta {
        session_id,
        git_branch: non_empty_string(value.get("gitBranch")),
        working_directory: non_empty_string(value.get("cwd")),
    })
}

/// Accepts RFC 3339 strings and epoch milliseconds.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|timestamp| timestamp.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

fn decode_user(message: Option<&Value>) -> UserEvent {
    match message.and_then(|message| message.get("content")) {
        Some(Value::String(content)) => decode_user_text(content),
        Some(Value::Array(items)) => UserEvent {
            payload: decode_user_items(items),
            command_stdout: None,
        },
        _ => UserEvent {
            payload: UserPayload::Empty,
            command_stdout: None,
        },
    }
}

fn decode_user_text(content: &str) -> UserEvent {
    let stdout = text::command_stdout(content).map(ToString::to_string);

    let payload = if text::has_command_tag(content) {
        match text::command_name(content) {
            Some(text::MODEL_COMMAND) => {
                return UserEvent {
                    payload: UserPayload::ModelSwitch {
                        result_text: stdout,
                    },
                    command_stdout: None,
                };
            }
            Some(name) => UserPayload::SlashCommand {
                name: name.to_string(),
                message: text::command_message(content).map(ToString::to_string),
            },
            None => UserPayload::Empty,
        }
    } else if content.is_empty() {
        UserPayload::Empty
    } else {
        UserPayload::PlainText(content.to_string())
    };

    UserEvent {
        payload,
        command_stdout: stdout,
    }
}

fn decode_user_items(items: &[Value]) -> UserPayload {
    if let Some(first) = items.first()
        && let Some(tool_use_id) = non_empty_string(first.get("tool_use_id"))
    {
        return UserPayload::ToolResult {
            tool_use_id,
            text: tool_result_text(first),
        };
    }

    let chunks = items
        .iter()
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();

    if chunks.is_empty() {
        UserPayload::Empty
    } else {
        UserPayload::PlainText(chunks.join("\n\n"))
    }
}

fn tool_result_text(result: &Value) -> Option<String> {
    match result.get("content") {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        Some(Value::Array(items)) => non_empty_string(items.first().and_then(|item| item.get("text"))),
        _ => None,
    }
}

fn decode_assistant_parts(message: &Value) -> Vec<AssistantPart> {
    match message.get("content") {
        Some(Value::String(text)) if !text.is_empty() => vec![AssistantPart::Text(text.clone())],
        Some(Value::Array(items)) => items.iter().filter_map(decode_assistant_part).collect(),
        _ => Vec::new(),
    }
}

fn decode_assistant_part(item: &Value) -> Option<AssistantPart> {
    match item.get("type").and_then(Value::as_str)? {
        "text" => item
            .get("text")
            .and_then(Value::as_str)
            .map(|text| AssistantPart::Text(text.to_string())),
        "tool_use" => Some(AssistantPart::ToolUse {
            name: string_or_default(item.get("name")),
            id: string_or_default(item.get("id")),
            input: item.get("input").filter(|input| !input.is_null()).cloned(),
        }),
        _ => None,
    }
}

fn is_bare_model_command(body: &EventBody) -> bool {
    matches!(
        body,
        EventBody::User(UserEvent {
            payload: UserPayload::ModelSwitch { result_text: None },
            ..
        })
    )
}

/// Recorded sessions store `/model` and its stdout as two user lines; the
/// stdout-only line takes over the model switch.
fn attach_model_output(body: &mut EventBody) {
    let EventBody::User(user) = body else {
        return;
    };
    let UserPayload::PlainText(content) = &user.payload else {
        return;
    };
    if !text::is_stdout_only(content) {
        return;
    }

    user.payload = UserPayload::ModelSwitch {
        result_text: user.command_stdout.take(),
    };
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

fn string_or_default(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_default()
}
