// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One record of an extended streaming-history export. Fields the engine does
/// not use (platform, ip, uri, shuffle, ...) are ignored on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStreamRecord {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub ms_played: Option<i64>,
    #[serde(default)]
    pub reason_start: Option<String>,
    #[serde(default)]
    pub master_metadata_track_name: Option<String>,
    #[serde(default)]
    pub master_metadata_album_artist_name: Option<String>,
}

#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<RawStreamRecord>>;
    fn name(&self) -> &str;
}
