use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Jsonl2mdError {
    #[error("error parsing JSONL: {message}")]
    DecodeFailure { message: String },

    #[error("unsupported file type (expected .jsonl or .json): {path}")]
    UnsupportedFileType { path: PathBuf },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("output {path} is already claimed by {earlier}")]
    OutputCollision { path: PathBuf, earlier: PathBuf },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Jsonl2mdError>;
