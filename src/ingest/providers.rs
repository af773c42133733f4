// src/ingest/providers.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{FixationError, Result};
use crate::ingest::archive::decode_upload;
use crate::ingest::types::{HistorySource, RawStreamRecord};

/// Decoding a large archive is CPU-bound; keep it off the async workers.
async fn decode_blocking(bytes: Arc<[u8]>, origin: String) -> Result<Vec<RawStreamRecord>> {
    tokio::task::spawn_blocking(move || decode_upload(&bytes, &origin))
        .await
        .map_err(|e| FixationError::Task(e.to_string()))?
}

/// A streaming-history file on disk (`.json` array or `.zip` archive).
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl HistorySource for FileSource {
    async fn fetch_records(&self) -> Result<Vec<RawStreamRecord>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| FixationError::io(&self.path, e))?;
        decode_blocking(bytes.into(), self.name.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An in-memory upload (HTTP body).
#[derive(Debug, Clone)]
pub struct UploadSource {
    name: String,
    bytes: Arc<[u8]>,
}

impl UploadSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait::async_trait]
impl HistorySource for UploadSource {
    async fn fetch_records(&self) -> Result<Vec<RawStreamRecord>> {
        decode_blocking(self.bytes.clone(), self.name.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
