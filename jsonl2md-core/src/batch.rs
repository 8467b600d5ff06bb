use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Jsonl2mdError, Result};
use crate::service::convert_with_diagnostics;

/// Receives batch progress as a whole percentage after each transcript.
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub name: String,
    /// `Err` holds why the transcript never reached the converter.
    pub content: std::result::Result<Vec<u8>, String>,
}

impl BatchItem {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: Ok(content.into()),
        }
    }

    /// An item that fails in the report without being converted.
    pub fn rejected(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Err(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub name: String,
    pub converted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub total: usize,
    pub completed: usize,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|entry| !entry.converted)
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

/// Runs transcripts through the converter strictly in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchDriver {
    cancel: Option<Arc<AtomicBool>>,
}

impl BatchDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flag is checked before each transcript starts.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn run(&self, items: Vec<BatchItem>, progress: &mut dyn ProgressSink) -> BatchReport {
        let total = items.len();
        let mut report = BatchReport {
            entries: Vec::with_capacity(total),
            total,
            completed: 0,
            cancelled: false,
        };

        if total == 0 {
            progress.report(progress_percent(0, 0));
            return report;
        }

        for item in items {
            if self.is_cancelled() {
                debug!(
                    completed = report.completed,
                    total, "batch cancelled before completion"
                );
                report.cancelled = true;
                return report;
            }

            report.entries.push(convert_item(item));
            report.completed += 1;
            progress.report(progress_percent(report.completed, total));
        }

        report
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|cancel| cancel.load(Ordering::SeqCst))
    }
}

fn convert_item(item: BatchItem) -> BatchEntry {
    let content = match item.content {
        Ok(content) => content,
        Err(error) => {
            warn!(name = %item.name, error = %error, "transcript rejected before conversion");
            return BatchEntry {
                name: item.name,
                converted: false,
                markdown: None,
                error: Some(error),
            };
        }
    };

    match convert_with_diagnostics(&content) {
        Ok(conversion) => {
            debug!(
                name = %item.name,
                invalid_lines = conversion.invalid_line_count(),
                unknown_kinds = conversion.unknown_kind_count(),
                "converted transcript"
            );
            BatchEntry {
                name: item.name,
                converted: true,
                markdown: Some(conversion.markdown),
                error: None,
            }
        }
        Err(err) => {
            warn!(name = %item.name, error = %err, "transcript failed to convert");
            BatchEntry {
                name: item.name,
                converted: false,
                markdown: None,
                error: Some(err.to_string()),
            }
        }
    }
}

pub fn batch_report_to_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report)
        .map_err(|err| Jsonl2mdError::Serialization(err.to_string()))
}

/// `round(completed / total * 100)`; an empty batch is complete.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }

    let percent = (completed * 200 + total) / (2 * total);
    u8::try_from(percent.min(100)).unwrap_or(100)
}
