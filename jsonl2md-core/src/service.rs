use crate::decode;
use crate::error::Result;
use crate::model::Conversion;
use crate::render;

/// Converts one transcript to Markdown.
///
/// Malformed lines are skipped; only input that is not UTF-8 text fails.
pub fn convert(transcript: impl AsRef<[u8]>) -> Result<String> {
    convert_with_diagnostics(transcript).map(|conversion| conversion.markdown)
}

pub fn convert_with_diagnostics(transcript: impl AsRef<[u8]>) -> Result<Conversion> {
    let decoded = decode::decode_bytes(transcript.as_ref())?;
    let markdown = render::render_markdown(&decoded);

    Ok(Conversion {
        markdown,
        diagnostics: decoded.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Jsonl2mdError;

    #[test]
    fn summary_scenario() {
        let markdown = convert(r#"{"type":"summary","summary":"Setup"}"#).expect("convert");

        assert_eq!(markdown, "# Chat Conversation Log\n\n## Setup\n\n---\n\n");
        assert!(!markdown.contains("###"));
    }

    #[test]
    fn model_switch_scenario_across_two_lines() {
        let raw = r#"{"type":"user","message":{"content":"<command-name>/model</command-name>"},"timestamp":1700000000000}
{"type":"user","message":{"content":"<local-command-stdout>Set model to gpt-5</local-command-stdout>"},"timestamp":1700000000001}"#;

        let markdown = convert(raw).expect("convert");
        assert!(markdown.contains("### 🔄 Model Changed\n\n_Set model to gpt-5 per user request_"));
        assert!(!markdown.contains("### 👤 User"));
    }

    #[test]
    fn model_switch_scenario_in_one_content() {
        let raw = r#"{"type":"user","message":{"content":"<command-name>/model</command-name>\n<local-command-stdout>Set model to gpt-5</local-command-stdout>"},"timestamp":1700000000000}"#;

        let markdown = convert(raw).expect("convert");
        assert!(markdown.contains("### 🔄 Model Changed\n\n_Set model to gpt-5 per user request_"));
        assert!(!markdown.contains("### 👤 User"));
    }

    #[test]
    fn assistant_scenario() {
        let raw = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Hello"},{"type":"tool_use","name":"search","id":"t1","input":{"q":"foo"}}]}}"#;

        let markdown = convert(raw).expect("convert");
        assert!(markdown.contains("### 🤖 Assistant"));
        assert!(markdown.contains("\nHello\n"));
        assert!(markdown.contains("**Tool Use:** search\n"));
        assert!(markdown.contains("*Tool ID: t1*"));
        assert!(markdown.contains("```json\n{\n  \"q\": \"foo\"\n}\n```"));
    }

    #[test]
    fn invalid_line_scenario() {
        let conversion = convert_with_diagnostics(
            "{\"type\":\"user\",\"message\":{\"content\":\"hi\"}}\nnot json\n",
        )
        .expect("convert");

        assert_eq!(
            conversion.markdown,
            "# Chat Conversation Log\n\n### 👤 User\n\nhi\n\n---\n\n"
        );
        assert_eq!(conversion.invalid_line_count(), 1);
        assert_eq!(conversion.unknown_kind_count(), 0);
    }

    #[test]
    fn empty_transcript_scenario() {
        assert_eq!(convert("").expect("convert"), "# Chat Conversation Log\n\n");
    }

    #[test]
    fn conversion_is_idempotent() {
        let raw = r#"{"type":"user","sessionId":"s","timestamp":"2026-02-23T00:00:00Z","message":{"content":"a"}}
{"type":"assistant","message":{"content":[{"type":"tool_use","name":"n","id":"i","input":{"b":1,"a":2}}]}}
{"type":"progress"}"#;

        assert_eq!(convert(raw).expect("first"), convert(raw).expect("second"));
    }

    #[test]
    fn unknown_kinds_are_counted() {
        let conversion =
            convert_with_diagnostics("{\"type\":\"progress\"}\n{\"no_type\":true}\n").expect("convert");

        assert_eq!(conversion.unknown_kind_count(), 2);
        assert_eq!(conversion.markdown, "# Chat Conversation Log\n\n---\n\n---\n\n");
    }

    #[test]
    fn non_text_input_fails_without_partial_output() {
        let err = convert(b"{\"type\":\"summary\"}\n\xff\xfe".as_slice()).expect_err("must fail");

        assert!(matches!(err, Jsonl2mdError::DecodeFailure { .. }));
    }
}
