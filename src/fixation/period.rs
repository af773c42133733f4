//! Fixation over an arbitrary closed date range.

use chrono::NaiveDate;

use crate::event::window_span;
use crate::fixation::window::evaluate;
use crate::history::TrackHistory;

/// Single evaluation over `[start, end]`; `0.0` when ineligible or inverted.
pub fn fixation_for_period(history: &TrackHistory, start: NaiveDate, end: NaiveDate) -> f64 {
    evaluate(history, start, end).score_or_zero()
}

/// Best trailing window whose start is clipped to `cutoff`.
///
/// For every play date `d >= cutoff` the range `[max(d - 30, cutoff), d]` is
/// evaluated against the full history; the maximum is returned, `0.0` if there
/// is none.
pub fn best_window_since(history: &TrackHistory, cutoff: NaiveDate) -> f64 {
    history
        .dates()
        .into_iter()
        .filter(|&d| d >= cutoff)
        .map(|end| {
            let start = (end - window_span()).max(cutoff);
            fixation_for_period(history, start, end)
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{PlayEvent, StartReason, TrackKey};
    use chrono::{TimeZone, Utc};

    fn at(m: u32, d: u32, ms: u64, reason: &str) -> PlayEvent {
        PlayEvent::new(
            Utc.with_ymd_and_hms(2024, m, d, 8, 0, 0).unwrap(),
            TrackKey::new("A", "T"),
            ms,
            StartReason::parse(reason),
        )
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn h() -> TrackHistory {
        TrackHistory::new(
            TrackKey::new("A", "T"),
            vec![
                at(1, 10, 30_000, "clickrow"),
                at(1, 20, 30_000, "clickrow"),
                at(1, 25, 30_000, "trackdone"),
                at(1, 26, 1_000, "clickrow"),
            ],
        )
    }

    #[test]
    fn period_score() {
        // 3 real, 3 selections, 4 total.
        assert_eq!(fixation_for_period(&h(), date(1, 1), date(1, 31)), 3.75);
    }

    #[test]
    fn inverted_or_empty_period_is_zero() {
        assert_eq!(fixation_for_period(&h(), date(1, 31), date(1, 1)), 0.0);
        assert_eq!(fixation_for_period(&h(), date(3, 1), date(3, 31)), 0.0);
    }

    #[test]
    fn cutoff_clips_window_start() {
        // Without the clip the Jan 25 window would include Jan 10.
        assert_eq!(best_window_since(&h(), date(1, 15)), 2.0 + 2.0 / 3.0);
        assert_eq!(best_window_since(&h(), date(2, 1)), 0.0);
    }
}
