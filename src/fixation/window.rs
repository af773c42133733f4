//! Window evaluator: counts and score for one closed date interval.

use chrono::NaiveDate;
use serde::Serialize;

use crate::history::TrackHistory;
use crate::rolling::WindowStats;

/// Outcome of evaluating one window.
///
/// `score` is `None` for an ineligible window (no events, or fewer than two
/// real plays). Callers must never let an ineligible window replace a peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowEvaluation {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub stats: WindowStats,
    pub score: Option<f64>,
}

impl WindowEvaluation {
    pub fn is_eligible(&self) -> bool {
        self.score.is_some()
    }

    /// Score with the ineligible case collapsed to `0.0`.
    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// Evaluate `[start, end]` (inclusive) over `history`.
///
/// An inverted range selects nothing and is reported ineligible.
pub fn evaluate(history: &TrackHistory, start: NaiveDate, end: NaiveDate) -> WindowEvaluation {
    let stats = if start > end {
        WindowStats::default()
    } else {
        WindowStats::from_events(history.between(start, end))
    };
    WindowEvaluation {
        start,
        end,
        stats,
        score: stats.fixation(),
    }
}
