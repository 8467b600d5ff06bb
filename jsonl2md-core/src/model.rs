use chrono::{DateTime, Utc};
use serde_json::Value;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Summary,
    User,
    Assistant,
    Other,
}

/// Identifying context of a recorded session, taken from the first event
/// that carries a `sessionId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMeta {
    pub session_id: String,
    pub git_branch: Option<String>,
    pub working_directory: Option<String>,
}

impl SessionMeta {
    pub fn branch_or_placeholder(&self) -> &str {
        self.git_branch.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn working_directory_or_placeholder(&self) -> &str {
        self.working_directory.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserPayload {
    /// No `message.content` at all.
    Empty,
    PlainText(String),
    SlashCommand {
        name: String,
        message: Option<String>,
    },
    /// `/model` command; `result_text` is the raw command stdout, if any.
    ModelSwitch {
        result_text: Option<String>,
    },
    ToolResult {
        tool_use_id: String,
        text: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserEvent {
    pub payload: UserPayload,
    /// Never set for [`UserPayload::ModelSwitch`]; that payload owns its stdout.
    pub command_stdout: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssistantPart {
    Text(String),
    ToolUse {
        name: String,
        id: String,
        input: Option<Value>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    Summary(Option<String>),
    User(UserEvent),
    /// `None` when the record has no `message` envelope.
    Assistant(Option<Vec<AssistantPart>>),
    Other,
}

impl EventBody {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Summary(_) => EventKind::Summary,
            Self::User(_) => EventKind::User,
            Self::Assistant(_) => EventKind::Assistant,
            Self::Other => EventKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub index: usize,
    pub timestamp: Option<DateTime<Utc>>,
    pub session: Option<SessionMeta>,
    pub body: EventBody,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.body.kind()
    }
}

/// Non-fatal findings from decoding, keyed by 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    InvalidJson { line: usize, reason: String },
    UnknownKind { line: usize, kind: Option<String> },
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Self::InvalidJson { line, .. } | Self::UnknownKind { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTranscript {
    pub events: Vec<Event>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DecodedTranscript {
    pub fn session(&self) -> Option<&SessionMeta> {
        self.events.iter().find_map(|event| event.session.as_ref())
    }
}

/// Result of converting one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub markdown: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    pub fn invalid_line_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| matches!(diagnostic, Diagnostic::InvalidJson { .. }))
            .count()
    }

    pub fn unknown_kind_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| matches!(diagnostic, Diagnostic::UnknownKind { .. }))
            .count()
    }
}
