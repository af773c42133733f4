//! # Play events
//! Normalized, immutable play records as produced by ingestion.
//!
//! A `PlayEvent` carries the full UTC timestamp; the calendar `date()` and the
//! `month()` are both derived from it. Month assignment is taken from the
//! timestamp itself, never from a truncated date.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FixationError, Result};

/// Plays at or above this many milliseconds are real plays; below are skips.
pub const REAL_PLAY_MS: u64 = 25_000;

/// Length of the trailing window: `[end - 30 days, end]`, both ends inclusive.
pub const WINDOW_DAYS: i64 = 30;

/// Wire value of the start reason meaning "picked from a list by the user".
pub const SELECTION_REASON: &str = "clickrow";

pub fn window_span() -> Duration {
    Duration::days(WINDOW_DAYS)
}

/// Track identity: artist + title.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackKey {
    pub artist: String,
    pub track: String,
}

impl TrackKey {
    pub fn new(artist: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            track: track.into(),
        }
    }

    /// `"<track> - <artist>"`, the line format used by playlist exports.
    pub fn export_line(&self) -> String {
        format!("{} - {}", self.track, self.artist)
    }
}

/// `"<artist> - <track>"`
impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.track)
    }
}

/// Why playback of a track started.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StartReason {
    /// User explicitly selected the track from a list.
    ClickRow,
    /// Autoplay, shuffle continuation, forward button, ...
    Other(String),
}

impl StartReason {
    pub fn parse(raw: &str) -> Self {
        if raw == SELECTION_REASON {
            Self::ClickRow
        } else {
            Self::Other(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ClickRow => SELECTION_REASON,
            Self::Other(s) => s.as_str(),
        }
    }

    pub fn is_selection(&self) -> bool {
        matches!(self, Self::ClickRow)
    }
}

impl Serialize for StartReason {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StartReason {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub timestamp: DateTime<Utc>,
    pub track: TrackKey,
    pub ms_played: u64,
    pub reason_start: StartReason,
}

impl PlayEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        track: TrackKey,
        ms_played: u64,
        reason_start: StartReason,
    ) -> Self {
        Self {
            timestamp,
            track,
            ms_played,
            reason_start,
        }
    }

    /// UTC calendar day of the play.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::of(&self.timestamp)
    }

    pub fn is_real_play(&self) -> bool {
        self.ms_played >= REAL_PLAY_MS
    }

    pub fn is_skip(&self) -> bool {
        !self.is_real_play()
    }

    pub fn is_selection(&self) -> bool {
        self.reason_start.is_selection()
    }

    /// Reject events whose identity is blank; such events would be grouped
    /// under a bogus track and skew that track's counts.
    pub fn validate(&self) -> Result<()> {
        if self.track.track.trim().is_empty() {
            return Err(FixationError::InvalidEvent(format!(
                "empty track name at {}",
                self.timestamp.to_rfc3339()
            )));
        }
        if self.track.artist.trim().is_empty() {
            return Err(FixationError::InvalidEvent(format!(
                "empty artist name for '{}' at {}",
                self.track.track,
                self.timestamp.to_rfc3339()
            )));
        }
        Ok(())
    }
}

/// A calendar month (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(ts: &DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    pub fn from_date(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        d.year() == self.year && d.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}
