use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::{
    AssistantPart, DecodedTranscript, Event, EventBody, SessionMeta, UserEvent, UserPayload,
};
use crate::text;

pub const TITLE: &str = "# Chat Conversation Log\n\n";
pub const SEPARATOR: &str = "---\n\n";
const USER_HEADING: &str = "### 👤 User";
const ASSISTANT_HEADING: &str = "### 🤖 Assistant";
const MODEL_CHANGED_HEADING: &str = "### 🔄 Model Changed";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn render_markdown(transcript: &DecodedTranscript) -> String {
    transcript
        .events
        .iter()
        .fold(render_header(transcript.session()), |mut output, event| {
            output.push_str(&render_event(event));
            output
        })
}

/// Title line plus the session block, when the transcript has one.
pub fn render_header(session: Option<&SessionMeta>) -> String {
    let mut output = String::from(TITLE);

    if let Some(session) = session {
        output.push_str(&format!("**Session ID:** {}\n", session.session_id));
        output.push_str(&format!("**Branch:** {}\n", session.branch_or_placeholder()));
        output.push_str(&format!(
            "**Working Directory:** {}\n\n",
            session.working_directory_or_placeholder()
        ));
        output.push_str(SEPARATOR);
    }

    output
}

/// One event block, always closed by the separator, even when the block
/// itself is empty.
pub fn render_event(event: &Event) -> String {
    let mut output = String::new();
    let timestamp = event.timestamp.as_ref().map(format_timestamp);

    match &event.body {
        EventBody::Summary(Some(summary)) => output.push_str(&format!("## {summary}\n\n")),
        EventBody::User(user) => render_user(&mut output, user, timestamp.as_deref()),
        EventBody::Assistant(Some(parts)) => {
            render_assistant(&mut output, parts, timestamp.as_deref());
        }
        EventBody::Summary(None) | EventBody::Assistant(None) | EventBody::Other => {}
    }

    output.push_str(SEPARATOR);
    output
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn push_heading(output: &mut String, heading: &str, timestamp: Option<&str>) {
    output.push_str(heading);
    if let Some(timestamp) = timestamp {
        output.push_str(&format!(" - {timestamp}"));
    }
    output.push_str("\n\n");
}

fn render_user(output: &mut String, user: &UserEvent, timestamp: Option<&str>) {
    if let UserPayload::ModelSwitch { result_text } = &user.payload {
        render_model_switch(output, result_text.as_deref());
        return;
    }

    push_heading(output, USER_HEADING, timestamp);

    match &user.payload {
        UserPayload::PlainText(content) => output.push_str(&format!("{content}\n\n")),
        UserPayload::SlashCommand { name, message } => {
            output.push_str(&format!("**Command:** `{name}`\n\n"));
            if let Some(message) = message {
                output.push_str(&format!("{message}\n\n"));
            }
        }
        UserPayload::ToolResult { tool_use_id, text } => {
            output.push_str(&format!("**Tool Result** ({tool_use_id})\n\n"));
            if let Some(text) = text {
                output.push_str(&format!("```\n{text}\n```\n\n"));
            }
        }
        UserPayload::Empty | UserPayload::ModelSwitch { .. } => {}
    }

    if let Some(stdout) = &user.command_stdout {
        output.push_str(&format!("**Output:**\n```\n{stdout}\n```\n\n"));
    }
}

fn render_model_switch(output: &mut String, result_text: Option<&str>) {
    let Some(notice) = result_text.and_then(text::model_change_notice) else {
        return;
    };

    output.push_str(&format!("{MODEL_CHANGED_HEADING}\n\n"));
    output.push_str(&format!("_{notice}_\n\n"));
}

fn render_assistant(output: &mut String, parts: &[AssistantPart], timestamp: Option<&str>) {
    push_heading(output, ASSISTANT_HEADING, timestamp);

    for part in parts {
        match part {
            AssistantPart::Text(text) => output.push_str(&format!("{text}\n\n")),
            AssistantPart::ToolUse { name, id, input } => {
                output.push_str(&format!("**Tool Use:** {name}\n"));
                output.push_str(&format!("*Tool ID: {id}*\n\n"));
                if let Some(json) = input.as_ref().and_then(pretty_json) {
                    output.push_str(&format!("```json\n{json}\n```\n\n"));
                }
            }
        }
    }
}

fn pretty_json(value: &Value) -> Option<String> {
    serde_json::to_string_pretty(value).ok()
}
