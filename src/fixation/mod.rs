//! Fixation scoring engine.
//!
//! Fixation over a window is `real_plays + selections / total_plays`, scored
//! only when the window holds at least two real plays. On top of the single
//! window evaluator sit three drivers:
//! - `peak::scan_peak`: best trailing 30-day window over a track's whole history
//! - `monthly::peak_by_month`: best window per calendar month
//! - `period::fixation_for_period`: one non-rolling evaluation over a date range
//!
//! All of them are pure functions over a `TrackHistory`; tracks are independent
//! of each other and can be evaluated in any order or concurrently.

pub mod monthly;
pub mod peak;
pub mod period;
pub mod window;

pub use monthly::{peak_by_month, period_by_month};
pub use peak::{scan_peak, scan_peak_naive, FixationResult};
pub use period::{best_window_since, fixation_for_period};
pub use window::{evaluate, WindowEvaluation};
