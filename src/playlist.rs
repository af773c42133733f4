//! Playlist metadata as exported by the streaming service.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::event::TrackKey;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistExport {
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(default = "unnamed")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
}

fn unnamed() -> String {
    "Unnamed".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<PlaylistTrack>,
    #[serde(default)]
    pub added_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrack {
    #[serde(default)]
    pub track_name: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub album_name: Option<String>,
}

impl PlaylistTrack {
    pub fn key(&self) -> TrackKey {
        TrackKey::new(
            self.artist_name.as_deref().unwrap_or(UNKNOWN),
            self.track_name.as_deref().unwrap_or(UNKNOWN),
        )
    }
}

impl PlaylistItem {
    /// `addedDate` as a calendar day; ISO 8601 with a trailing `Z` or an offset.
    pub fn added_on(&self) -> Option<NaiveDate> {
        let raw = self.added_date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.date_naive())
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .ok()
    }
}

impl Playlist {
    /// Earliest parseable `addedDate` among the items.
    pub fn date_started(&self) -> Option<NaiveDate> {
        self.items.iter().filter_map(PlaylistItem::added_on).min()
    }

    /// Identities of every track item (items without a track are skipped).
    pub fn track_keys(&self) -> Vec<TrackKey> {
        self.items
            .iter()
            .filter_map(|it| it.track.as_ref().map(PlaylistTrack::key))
            .collect()
    }
}
