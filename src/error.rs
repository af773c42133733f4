//! Library error taxonomy.
//!
//! Degenerate-but-valid inputs (empty histories, windows with too few real
//! plays) never surface here: they collapse to zero/absent results. Errors are
//! reserved for malformed events and for ingestion failures.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FixationError {
    /// A play event that cannot be counted without miscounting.
    #[error("invalid play event: {0}")]
    InvalidEvent(String),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("decode error in {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin} is larger than {limit} bytes")]
    TooLarge { origin: String, limit: u64 },

    /// A blocking decode/normalize task died before returning.
    #[error("background task failed: {0}")]
    Task(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T, E = FixationError> = std::result::Result<T, E>;

impl FixationError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            origin: origin.into(),
            source,
        }
    }
}
