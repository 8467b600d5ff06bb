//! Tag extraction and escape stripping for command records embedded in user
//! message content.

use once_cell::sync::Lazy;
use regex::Regex;

pub const NO_CONTENT_PLACEHOLDER: &str = "(no content)";
pub const MODEL_COMMAND: &str = "/model";

const COMMAND_NAME_OPEN: &str = "<command-name>";
const SET_MODEL_PHRASE: &str = "Set model to";

static COMMAND_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<command-name>(.*?)</command-name>").expect("valid regex"));
static COMMAND_MESSAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<command-message>(.*?)</command-message>").expect("valid regex"));
static STDOUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<local-command-stdout>(.*?)</local-command-stdout>").expect("valid regex")
});
static ANSI_SGR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b?\[[0-9;]+m").expect("valid regex"));
static SET_MODEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Set model to (.+)").expect("valid regex"));

pub fn has_command_tag(content: &str) -> bool {
    content.contains(COMMAND_NAME_OPEN)
}

/// Returns `None` when the opening tag has no matching close on the same line.
pub fn command_name(content: &str) -> Option<&str> {
    first_capture(&COMMAND_NAME_RE, content)
}

/// Empty messages count as absent.
pub fn command_message(content: &str) -> Option<&str> {
    first_capture(&COMMAND_MESSAGE_RE, content).filter(|message| !message.is_empty())
}

/// Stdout of a local command, or `None` when missing, empty, or the
/// `(no content)` placeholder.
pub fn command_stdout(content: &str) -> Option<&str> {
    first_capture(&STDOUT_RE, content)
        .filter(|stdout| !stdout.is_empty() && *stdout != NO_CONTENT_PLACEHOLDER)
}

/// True when `content` is a single stdout block and nothing else.
pub fn is_stdout_only(content: &str) -> bool {
    let Some(found) = STDOUT_RE.find(content) else {
        return false;
    };
    content[..found.start()].trim().is_empty() && content[found.end()..].trim().is_empty()
}

pub fn strip_ansi(text: &str) -> String {
    ANSI_SGR_RE.replace_all(text, "").into_owned()
}

/// Cleans `/model` stdout into the line shown under "Model Changed".
///
/// Only the first `Set model to ...` line is rewritten; text that never
/// mentions the phrase yields `None`.
pub fn model_change_notice(stdout: &str) -> Option<String> {
    let cleaned = strip_ansi(stdout);
    if !cleaned.contains(SET_MODEL_PHRASE) {
        return None;
    }

    let rewritten = SET_MODEL_RE.replacen(&cleaned, 1, "Set model to ${1} per user request");
    Some(rewritten.into_owned())
}

fn first_capture<'a>(re: &Regex, content: &'a str) -> Option<&'a str> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|capture| capture.as_str())
}
