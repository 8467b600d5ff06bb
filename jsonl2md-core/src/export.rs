use chrono::NaiveDate;

use crate::batch::BatchEntry;

pub const ACCEPTED_EXTENSIONS: &[&str] = &[".jsonl", ".json"];
const COMBINED_TITLE: &str = "# Combined JSONL Exports\n\n";

pub fn is_accepted_transcript_name(name: &str) -> bool {
    ACCEPTED_EXTENSIONS
        .iter()
        .any(|extension| name.ends_with(extension))
}

/// `session.jsonl` becomes `session-converted.md`.
pub fn converted_file_name(name: &str) -> String {
    let stem = match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    };
    format!("{stem}-converted.md")
}

pub fn combined_export_file_name(date: NaiveDate) -> String {
    format!("combined-export-{}.md", date.format("%Y-%m-%d"))
}

/// Joins every converted entry under a `## File:` heading; failed entries
/// are left out.
pub fn combine_markdown(entries: &[BatchEntry]) -> String {
    let mut output = String::from(COMBINED_TITLE);

    for entry in entries {
        let Some(markdown) = entry.markdown.as_deref() else {
            continue;
        };
        output.push_str(&format!("## File: {}\n\n", entry.name));
        output.push_str(markdown);
        output.push_str("\n\n---\n\n");
    }

    output
}
