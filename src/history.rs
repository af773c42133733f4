//! Per-track view over the event store.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::event::{PlayEvent, TrackKey, YearMonth};
use crate::rolling::WindowStats;

/// All plays of one track, sorted by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackHistory {
    pub key: TrackKey,
    events: Vec<PlayEvent>,
}

impl TrackHistory {
    pub fn new(key: TrackKey, mut events: Vec<PlayEvent>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        Self { key, events }
    }

    pub fn empty(key: TrackKey) -> Self {
        Self {
            key,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[PlayEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct play dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut out: Vec<NaiveDate> = self.events.iter().map(PlayEvent::date).collect();
        out.dedup();
        out
    }

    /// Events whose date falls inside `[start, end]`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = &PlayEvent> {
        self.events.iter().filter(move |e| {
            let d = e.date();
            d >= start && d <= end
        })
    }

    /// Restrict to plays on or after `cutoff`.
    pub fn since(&self, cutoff: NaiveDate) -> TrackHistory {
        Self {
            key: self.key.clone(),
            events: self
                .events
                .iter()
                .filter(|e| e.date() >= cutoff)
                .cloned()
                .collect(),
        }
    }

    pub fn first_played(&self) -> Option<NaiveDate> {
        self.events.first().map(PlayEvent::date)
    }

    pub fn last_played(&self) -> Option<NaiveDate> {
        self.events.last().map(PlayEvent::date)
    }

    pub fn totals(&self) -> WindowStats {
        WindowStats::from_events(&self.events)
    }

    /// Months (by timestamp) that contain at least one play, ascending.
    pub fn months(&self) -> Vec<YearMonth> {
        let mut out: Vec<YearMonth> = self.events.iter().map(PlayEvent::month).collect();
        out.dedup();
        out
    }

    /// Play counts per month.
    pub fn plays_by_month(&self) -> BTreeMap<YearMonth, u32> {
        let mut out = BTreeMap::new();
        for e in &self.events {
            *out.entry(e.month()).or_insert(0) += 1;
        }
        out
    }

    /// Play counts per calendar day.
    pub fn plays_by_day(&self) -> BTreeMap<NaiveDate, u32> {
        let mut out = BTreeMap::new();
        for e in &self.events {
            *out.entry(e.date()).or_insert(0) += 1;
        }
        out
    }
}

/// Group a flat event collection into one history per track.
pub fn group_by_track<'a>(
    events: impl IntoIterator<Item = &'a PlayEvent>,
) -> BTreeMap<TrackKey, TrackHistory> {
    let mut buckets: BTreeMap<TrackKey, Vec<PlayEvent>> = BTreeMap::new();
    for e in events {
        buckets.entry(e.track.clone()).or_default().push(e.clone());
    }
    buckets
        .into_iter()
        .map(|(k, v)| (k.clone(), TrackHistory::new(k, v)))
        .collect()
}
