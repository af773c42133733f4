//! # Library
//! In-memory event store: every play event plus the playlist export, grouped
//! per track once at construction. A `Library` is never mutated; a re-import
//! builds a new one and swaps it in.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::event::{PlayEvent, TrackKey, YearMonth};
use crate::history::{group_by_track, TrackHistory};
use crate::playlist::Playlist;

#[derive(Debug, Clone, Default)]
pub struct Library {
    events: Vec<PlayEvent>,
    tracks: BTreeMap<TrackKey, TrackHistory>,
    playlists: Option<Vec<Playlist>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistCount {
    pub artist: String,
    pub real_plays: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongCount {
    pub track: String,
    pub artist: String,
    pub real_plays: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCount {
    pub month: YearMonth,
    pub plays: u32,
}

/// Dashboard numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub real_plays: u64,
    pub unique_tracks: usize,
    pub unique_artists: usize,
    pub hours: f64,
    pub top_artists: Vec<ArtistCount>,
    pub top_songs: Vec<SongCount>,
    pub monthly_activity: Vec<MonthCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub history_loaded: bool,
    pub records: usize,
    pub tracks: usize,
    pub playlists_loaded: bool,
    pub playlists: usize,
}

impl Library {
    pub fn new(events: Vec<PlayEvent>) -> Self {
        let tracks = group_by_track(&events);
        Self {
            events,
            tracks,
            playlists: None,
        }
    }

    pub fn with_playlists(mut self, playlists: Option<Vec<Playlist>>) -> Self {
        self.playlists = playlists;
        self
    }

    pub fn events(&self) -> &[PlayEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &TrackHistory> {
        self.tracks.values()
    }

    pub fn track(&self, key: &TrackKey) -> Option<&TrackHistory> {
        self.tracks.get(key)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn playlists(&self) -> Option<&[Playlist]> {
        self.playlists.as_deref()
    }

    pub fn playlist(&self, name: &str) -> Option<&Playlist> {
        self.playlists()?.iter().find(|p| p.name == name)
    }

    /// Latest play date across the whole library.
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.events.iter().map(PlayEvent::date).max()
    }

    pub fn status(&self) -> Status {
        Status {
            history_loaded: !self.events.is_empty(),
            records: self.events.len(),
            tracks: self.tracks.len(),
            playlists_loaded: self.playlists.is_some(),
            playlists: self.playlists.as_ref().map_or(0, Vec::len),
        }
    }

    pub fn overview(&self, top: usize) -> Overview {
        let mut real_plays = 0u64;
        let mut ms_total = 0u64;
        let mut titles: HashSet<&str> = HashSet::new();
        let mut artists: HashSet<&str> = HashSet::new();
        let mut by_artist: HashMap<&str, u32> = HashMap::new();
        let mut monthly: BTreeMap<YearMonth, u32> = BTreeMap::new();

        for e in &self.events {
            ms_total += e.ms_played;
            titles.insert(e.track.track.as_str());
            artists.insert(e.track.artist.as_str());
            *monthly.entry(e.month()).or_insert(0) += 1;
            if e.is_real_play() {
                real_plays += 1;
                *by_artist.entry(e.track.artist.as_str()).or_insert(0) += 1;
            }
        }

        let mut top_artists: Vec<ArtistCount> = by_artist
            .into_iter()
            .map(|(a, n)| ArtistCount {
                artist: a.to_string(),
                real_plays: n,
            })
            .collect();
        top_artists.sort_by(|a, b| b.real_plays.cmp(&a.real_plays).then(a.artist.cmp(&b.artist)));
        top_artists.truncate(top);

        let mut top_songs: Vec<SongCount> = self
            .tracks
            .values()
            .map(|h| (h, h.totals().real_plays))
            .filter(|(_, n)| *n > 0)
            .map(|(h, n)| SongCount {
                track: h.key.track.clone(),
                artist: h.key.artist.clone(),
                real_plays: n,
            })
            .collect();
        // BTreeMap order makes ties resolve by (artist, track).
        top_songs.sort_by(|a, b| b.real_plays.cmp(&a.real_plays));
        top_songs.truncate(top);

        Overview {
            real_plays,
            unique_tracks: titles.len(),
            unique_artists: artists.len(),
            hours: ms_total as f64 / 3_600_000.0,
            top_artists,
            top_songs,
            monthly_activity: monthly
                .into_iter()
                .map(|(month, plays)| MonthCount { month, plays })
                .collect(),
        }
    }
}
