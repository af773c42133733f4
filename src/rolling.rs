//! # Rolling Window
//! Trailing 30-day window over one track's plays.
//!
//! `WindowStats` holds the four counts a window needs; `SlidingWindow` keeps
//! them up to date while the right edge moves forward through the track's
//! play dates. Each event is pushed once and evicted at most once, so a full
//! scan is linear in the number of events plus the number of distinct dates.

use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::Serialize;

use crate::event::{window_span, PlayEvent};

/// Minimum number of real plays for a window to be scored.
pub const MIN_REAL_PLAYS: u32 = 2;

/// Counts over the events inside one window.
///
/// `total_plays == real_plays + skips` always holds: every event is exactly one
/// of the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowStats {
    pub total_plays: u32,
    pub real_plays: u32,
    pub selections: u32,
    pub skips: u32,
}

impl WindowStats {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a PlayEvent>) -> Self {
        let mut s = Self::default();
        for e in events {
            s.push(e);
        }
        s
    }

    pub fn push(&mut self, e: &PlayEvent) {
        self.total_plays += 1;
        if e.is_real_play() {
            self.real_plays += 1;
        } else {
            self.skips += 1;
        }
        if e.is_selection() {
            self.selections += 1;
        }
    }

    pub fn pop(&mut self, e: &PlayEvent) {
        self.total_plays = self.total_plays.saturating_sub(1);
        if e.is_real_play() {
            self.real_plays = self.real_plays.saturating_sub(1);
        } else {
            self.skips = self.skips.saturating_sub(1);
        }
        if e.is_selection() {
            self.selections = self.selections.saturating_sub(1);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_plays == 0
    }

    /// A window is scored only with at least two real plays.
    pub fn is_eligible(&self) -> bool {
        self.real_plays >= MIN_REAL_PLAYS
    }

    /// `real_plays + selections / total_plays`, or `None` when ineligible.
    pub fn fixation(&self) -> Option<f64> {
        if self.is_empty() || !self.is_eligible() {
            return None;
        }
        Some(f64::from(self.real_plays) + f64::from(self.selections) / f64::from(self.total_plays))
    }
}

/// Forward-only trailing window over date-sorted events.
#[derive(Debug)]
pub struct SlidingWindow<'a> {
    events: &'a [PlayEvent],
    /// Index of the next event not yet admitted.
    next: usize,
    buf: VecDeque<&'a PlayEvent>,
    stats: WindowStats,
    end: Option<NaiveDate>,
}

impl<'a> SlidingWindow<'a> {
    /// `events` must be sorted by timestamp (and therefore by date).
    pub fn new(events: &'a [PlayEvent]) -> Self {
        Self {
            events,
            next: 0,
            buf: VecDeque::new(),
            stats: WindowStats::default(),
            end: None,
        }
    }

    /// Move the right edge to `end` and return the counts over
    /// `[end - 30 days, end]`.
    ///
    /// `end` must not move backwards; an earlier `end` is ignored and the
    /// current counts are returned unchanged.
    pub fn advance_to(&mut self, end: NaiveDate) -> WindowStats {
        if matches!(self.end, Some(cur) if end < cur) {
            return self.stats;
        }
        self.end = Some(end);

        while let Some(e) = self.events.get(self.next) {
            if e.date() > end {
                break;
            }
            self.stats.push(e);
            self.buf.push_back(e);
            self.next += 1;
        }

        let start = end - window_span();
        while let Some(&e) = self.buf.front() {
            if e.date() < start {
                self.stats.pop(e);
                self.buf.pop_front();
            } else {
                break;
            }
        }

        self.stats
    }

    pub fn stats(&self) -> WindowStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
