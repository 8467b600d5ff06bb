pub mod batch;
pub mod config;
pub mod decode;
pub mod error;
pub mod export;
pub mod files;
pub mod model;
pub mod render;
pub mod service;
pub mod text;

pub use batch::{
    BatchDriver, BatchEntry, BatchItem, BatchReport, ProgressSink, batch_report_to_json,
    progress_percent,
};
pub use config::ExportConfig;
pub use error::{Jsonl2mdError, Result};
pub use export::{
    combine_markdown, combined_export_file_name, converted_file_name, is_accepted_transcript_name,
};
pub use files::{collect_transcripts, load_batch, read_transcript};
pub use model::{
    AssistantPart, Conversion, DecodedTranscript, Diagnostic, Event, EventBody, EventKind,
    SessionMeta, UserEvent, UserPayload,
};
pub use service::{convert, convert_with_diagnostics};
