//! Peak fixation scanner.
//!
//! Candidate end dates are the distinct play dates of the track, ascending.
//! A window replaces the running best only when its score is strictly
//! greater, so among equal maxima the earliest end date wins.

use chrono::NaiveDate;
use serde::Serialize;

use crate::event::window_span;
use crate::fixation::window::evaluate;
use crate::history::TrackHistory;
use crate::rolling::{SlidingWindow, WindowStats};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixationResult {
    /// `0.0` when no window was ever eligible.
    pub score: f64,
    pub peak_date: Option<NaiveDate>,
    /// Counts at the peak window; `None` together with `peak_date`.
    pub stats: Option<WindowStats>,
}

impl FixationResult {
    pub fn none() -> Self {
        Self {
            score: 0.0,
            peak_date: None,
            stats: None,
        }
    }

    fn offer(&mut self, end: NaiveDate, stats: WindowStats) {
        let Some(score) = stats.fixation() else {
            return;
        };
        if score > self.score {
            tracing::trace!(target: "fixation", %end, score, "new peak");
            self.score = score;
            self.peak_date = Some(end);
            self.stats = Some(stats);
        }
    }
}

impl Default for FixationResult {
    fn default() -> Self {
        Self::none()
    }
}

/// All-time peak over trailing 30-day windows, in one forward pass.
pub fn scan_peak(history: &TrackHistory) -> FixationResult {
    let mut best = FixationResult::none();
    let mut window = SlidingWindow::new(history.events());
    for end in history.dates() {
        let stats = window.advance_to(end);
        best.offer(end, stats);
    }
    best
}

/// Same result as [`scan_peak`], re-evaluating every window from scratch.
/// O(dates × events); kept as the reference the sliding scan is checked against.
pub fn scan_peak_naive(history: &TrackHistory) -> FixationResult {
    let mut best = FixationResult::none();
    for end in history.dates() {
        let w = evaluate(history, end - window_span(), end);
        best.offer(end, w.stats);
    }
    best
}
