use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{Jsonl2mdError, Result};
use crate::export::{combined_export_file_name, converted_file_name};

pub const OUTPUT_DIR_ENV: &str = "JSONL2MD_OUTPUT_DIR";
pub const LOG_ENV: &str = "JSONL2MD_LOG";
pub const RUST_LOG_ENV: &str = "RUST_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const VERBOSE_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// `None` writes each output next to its source.
    pub output_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl ExportConfig {
    pub fn from_env(verbose: bool) -> Self {
        Self::from_lookup(verbose, |key| env::var_os(key))
    }

    pub fn from_lookup(verbose: bool, lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        // Precedence:
        // 1) --output-dir (applied by `with_output_dir`)
        // 2) JSONL2MD_OUTPUT_DIR
        let output_dir = lookup(OUTPUT_DIR_ENV).map(PathBuf::from);

        // Precedence:
        // 1) JSONL2MD_LOG
        // 2) RUST_LOG
        // 3) info with --verbose, warn otherwise
        let log_filter = lookup(LOG_ENV)
            .or_else(|| lookup(RUST_LOG_ENV))
            .map(|value| value.to_string_lossy().into_owned())
            .unwrap_or_else(|| {
                if verbose {
                    VERBOSE_LOG_FILTER.to_string()
                } else {
                    DEFAULT_LOG_FILTER.to_string()
                }
            });

        Self {
            output_dir,
            log_filter,
        }
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        if output_dir.is_some() {
            self.output_dir = output_dir;
        }
        self
    }

    /// Creates the output directory when it is missing.
    pub fn prepare_output_dir(&self) -> Result<()> {
        let Some(dir) = &self.output_dir else {
            return Ok(());
        };

        if dir.exists() && !dir.is_dir() {
            return Err(Jsonl2mdError::InvalidConfig(format!(
                "output path is not a directory: {}",
                dir.display()
            )));
        }

        fs::create_dir_all(dir).map_err(|source| Jsonl2mdError::Io {
            path: dir.clone(),
            source,
        })
    }

    pub fn converted_output_path(&self, source: &Path) -> PathBuf {
        let dir = self
            .output_dir
            .clone()
            .or_else(|| source.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let name = source
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        dir.join(converted_file_name(&name))
    }

    /// Output path for each source, in order. A source whose output path was
    /// already claimed by an earlier source gets `OutputCollision`.
    pub fn converted_output_plan(&self, sources: &[PathBuf]) -> Vec<Result<PathBuf>> {
        let mut claimed = HashMap::<PathBuf, &Path>::new();

        sources
            .iter()
            .map(|source| {
                let path = self.converted_output_path(source);
                if let Some(earlier) = claimed.get(&path) {
                    return Err(Jsonl2mdError::OutputCollision {
                        path,
                        earlier: earlier.to_path_buf(),
                    });
                }
                claimed.insert(path.clone(), source);
                Ok(path)
            })
            .collect()
    }

    pub fn combined_output_path(&self, date: NaiveDate) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_default()
            .join(combined_export_file_name(date))
    }
}
