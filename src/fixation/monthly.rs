//! Per-month fixation.
//!
//! Each trailing window is owned by the month of its end date: a month's peak
//! is drawn only from windows ending on that month's play dates, but every
//! window is evaluated against the full history, so plays from the preceding
//! month count towards it. A window ending in one month and overlapping the
//! next is never a candidate for the later month.

use std::collections::BTreeMap;

use crate::event::{window_span, YearMonth};
use crate::fixation::period::fixation_for_period;
use crate::fixation::window::evaluate;
use crate::history::TrackHistory;

/// Best eligible trailing-window score per month (0 where none is eligible).
///
/// Months with no plays are absent from the result.
pub fn peak_by_month(history: &TrackHistory) -> BTreeMap<YearMonth, f64> {
    let mut out = BTreeMap::new();
    for month in history.months() {
        let month_start = month.first_day();
        let month_end = month.last_day();

        let mut candidates: Vec<_> = history
            .events()
            .iter()
            .filter(|e| e.month() == month)
            .map(|e| e.date())
            .collect();
        candidates.dedup();

        let mut best = 0.0f64;
        for end in candidates {
            let start = end - window_span();
            if start <= month_end && end >= month_start {
                if let Some(score) = evaluate(history, start, end).score {
                    best = best.max(score);
                }
            }
        }
        out.insert(month, best);
    }
    out
}

/// Non-rolling fixation over each month with plays, i.e. one evaluation over
/// `[first day, last day]` of the month.
pub fn period_by_month(history: &TrackHistory) -> BTreeMap<YearMonth, f64> {
    history
        .months()
        .into_iter()
        .map(|m| (m, fixation_for_period(history, m.first_day(), m.last_day())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{PlayEvent, StartReason, TrackKey};
    use chrono::{TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, ms: u64, reason: &str) -> PlayEvent {
        PlayEvent::new(
            Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
            TrackKey::new("A", "T"),
            ms,
            StartReason::parse(reason),
        )
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth { year, month }
    }

    #[test]
    fn window_ending_in_march_counts_february_plays() {
        let h = TrackHistory::new(
            TrackKey::new("A", "T"),
            vec![
                at(2024, 2, 20, 10, 30_000, "clickrow"),
                at(2024, 3, 2, 10, 30_000, "trackdone"),
            ],
        );
        let m = peak_by_month(&h);
        assert_eq!(m.len(), 2);
        // February alone has one real play.
        assert_eq!(m[&ym(2024, 2)], 0.0);
        // The March 2 window reaches back to Feb 1.
        assert_eq!(m[&ym(2024, 3)], 2.5);
    }

    #[test]
    fn months_without_plays_are_absent() {
        let h = TrackHistory::new(
            TrackKey::new("A", "T"),
            vec![
                at(2024, 1, 5, 10, 30_000, "trackdone"),
                at(2024, 4, 5, 10, 30_000, "trackdone"),
            ],
        );
        let m = peak_by_month(&h);
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![ym(2024, 1), ym(2024, 4)]);
        assert!(m.values().all(|&v| v == 0.0));
    }

    #[test]
    fn windows_are_owned_by_their_end_month() {
        // Plays on Jan 30 and Jan 31 only: February gets nothing even though
        // the Jan 31 window would be "near" it.
        let h = TrackHistory::new(
            TrackKey::new("A", "T"),
            vec![
                at(2024, 1, 30, 10, 30_000, "trackdone"),
                at(2024, 1, 31, 10, 30_000, "trackdone"),
            ],
        );
        let m = peak_by_month(&h);
        assert_eq!(m.len(), 1);
        assert_eq!(m[&ym(2024, 1)], 2.0);
    }

    #[test]
    fn period_by_month_does_not_look_back() {
        let h = TrackHistory::new(
            TrackKey::new("A", "T"),
            vec![
                at(2024, 2, 20, 10, 30_000, "clickrow"),
                at(2024, 3, 2, 10, 30_000, "trackdone"),
                at(2024, 3, 3, 10, 30_000, "clickrow"),
            ],
        );
        let m = period_by_month(&h);
        assert_eq!(m[&ym(2024, 2)], 0.0);
        assert_eq!(m[&ym(2024, 3)], 2.5);
    }
}
