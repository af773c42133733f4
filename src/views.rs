//! # Listening views
//! Table and list shapes built on top of the fixation engine: all-time,
//! recent and last-year tables, top-N lists, per-track detail, exports, and
//! pagination.
//!
//! Exclusions are an explicit `Exclusions` value owned by the caller. Tables
//! move excluded rows after the others (keeping relative order); top-N lists
//! and exports leave them out.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use chrono::{Duration, NaiveDate};
use metrics::histogram;
use serde::{Deserialize, Serialize};

use crate::event::{TrackKey, YearMonth};
use crate::fixation::{best_window_since, peak_by_month, period_by_month, scan_peak, FixationResult};
use crate::history::TrackHistory;
use crate::library::Library;
use crate::rolling::WindowStats;

/// Tracks and playlists the user has filtered out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exclusions {
    #[serde(default)]
    pub tracks: HashSet<TrackKey>,
    #[serde(default)]
    pub playlists: BTreeSet<String>,
}

impl Exclusions {
    pub fn contains(&self, key: &TrackKey) -> bool {
        self.tracks.contains(key)
    }

    pub fn set_track(&mut self, key: TrackKey, excluded: bool) {
        if excluded {
            self.tracks.insert(key);
        } else {
            self.tracks.remove(&key);
        }
    }

    /// Excluding a playlist excludes every track on it. Re-including the
    /// playlist only clears the playlist flag; its tracks stay excluded until
    /// cleared one by one.
    pub fn set_playlist(&mut self, library: &Library, name: &str, excluded: bool) -> bool {
        let Some(playlist) = library.playlist(name) else {
            return false;
        };
        if excluded {
            self.playlists.insert(name.to_string());
            self.tracks.extend(playlist.track_keys());
        } else {
            self.playlists.remove(name);
        }
        true
    }
}

/// One row of a listening-history table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRow {
    pub artist: String,
    pub track: String,
    #[serde(flatten)]
    pub stats: WindowStats,
    pub first_played: Option<NaiveDate>,
    pub last_played: Option<NaiveDate>,
    pub peak_fixation: f64,
    pub peak_date: Option<NaiveDate>,
    /// Recent table only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_fixation: Option<f64>,
    /// Last-year table only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_fixation: Option<f64>,
    pub excluded: bool,
}

impl TrackRow {
    fn new(key: &TrackKey, stats: WindowStats, full: &TrackHistory, peak: FixationResult) -> Self {
        Self {
            artist: key.artist.clone(),
            track: key.track.clone(),
            stats,
            first_played: full.first_played(),
            last_played: full.last_played(),
            peak_fixation: peak.score,
            peak_date: peak.peak_date,
            current_fixation: None,
            year_fixation: None,
            excluded: false,
        }
    }

    pub fn key(&self) -> TrackKey {
        TrackKey::new(self.artist.clone(), self.track.clone())
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn record_view_time(view: &'static str, started: Instant) {
    histogram!("fixation_view_ms", "view" => view).record(started.elapsed().as_secs_f64() * 1000.0);
}

/// Mark excluded rows and move them after the rest.
fn partition_excluded(rows: Vec<TrackRow>, excluded: &Exclusions) -> Vec<TrackRow> {
    let (mut keep, mut out): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .map(|mut r| {
            r.excluded = excluded.contains(&r.key());
            r
        })
        .partition(|r| !r.excluded);
    keep.append(&mut out);
    keep
}

/// Tracks with at least `min_total_plays` plays, in (artist, track) order, with
/// their all-time peak.
pub fn all_time(lib: &Library, min_total_plays: u32, excluded: &Exclusions) -> Vec<TrackRow> {
    let started = Instant::now();
    let rows = lib
        .tracks()
        .filter_map(|h| {
            let totals = h.totals();
            (totals.total_plays >= min_total_plays)
                .then(|| TrackRow::new(&h.key, totals, h, scan_peak(h)))
        })
        .collect();
    let rows = partition_excluded(rows, excluded);
    record_view_time("all_time", started);
    rows
}

/// Start of the trailing `days` range ending at the library's last play date.
fn cutoff(lib: &Library, days: i64) -> Option<NaiveDate> {
    lib.max_date().map(|d| d - Duration::days(days))
}

/// Tracks played within `days` of the last play in the library, ranked by
/// current fixation (counts over that range, no eligibility rule).
pub fn recent(lib: &Library, days: i64, excluded: &Exclusions) -> Vec<TrackRow> {
    let started = Instant::now();
    let Some(cutoff) = cutoff(lib, days) else {
        return Vec::new();
    };
    let mut rows: Vec<TrackRow> = lib
        .tracks()
        .filter_map(|h| {
            let recent = h.since(cutoff);
            if recent.is_empty() {
                return None;
            }
            let stats = recent.totals();
            let mut row = TrackRow::new(&h.key, stats, h, scan_peak(h));
            let current = f64::from(stats.real_plays)
                + f64::from(stats.selections) / f64::from(stats.total_plays.max(1));
            row.current_fixation = Some(round4(current));
            Some(row)
        })
        .collect();
    rows.sort_by(|a, b| {
        b.current_fixation
            .unwrap_or(0.0)
            .total_cmp(&a.current_fixation.unwrap_or(0.0))
    });
    let rows = partition_excluded(rows, excluded);
    record_view_time("recent", started);
    rows
}

/// Tracks played within `days` of the last play, ranked by the best 30-day
/// window whose start is clipped to the range start.
pub fn last_year(lib: &Library, days: i64, excluded: &Exclusions) -> Vec<TrackRow> {
    let started = Instant::now();
    let Some(cutoff) = cutoff(lib, days) else {
        return Vec::new();
    };
    let mut rows: Vec<TrackRow> = lib
        .tracks()
        .filter_map(|h| {
            let year = h.since(cutoff);
            if year.is_empty() {
                return None;
            }
            let mut row = TrackRow::new(&h.key, year.totals(), h, scan_peak(h));
            row.year_fixation = Some(best_window_since(h, cutoff));
            Some(row)
        })
        .collect();
    rows.sort_by(|a, b| {
        b.year_fixation
            .unwrap_or(0.0)
            .total_cmp(&a.year_fixation.unwrap_or(0.0))
    });
    let rows = partition_excluded(rows, excluded);
    record_view_time("last_year", started);
    rows
}

/// Playlist text: one `"<track> - <artist>"` line per non-excluded row.
pub fn export_lines(rows: &[TrackRow], excluded: &Exclusions) -> String {
    rows.iter()
        .map(TrackRow::key)
        .filter(|k| !excluded.contains(k))
        .map(|k| k.export_line())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Entry of a visualization song list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongListEntry {
    pub artist: String,
    pub track: String,
    /// First play, or the date added for playlist lists.
    pub first_played: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_plays: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_fixation: Option<f64>,
}

fn by_first_played(list: &mut [SongListEntry]) {
    // Undated entries go last.
    list.sort_by_key(|e| (e.first_played.is_none(), e.first_played));
}

/// Top `n` tracks by real plays, displayed in first-played order.
pub fn top_songs(lib: &Library, n: usize, excluded: &Exclusions) -> Vec<SongListEntry> {
    let mut list: Vec<SongListEntry> = lib
        .tracks()
        .filter(|h| !excluded.contains(&h.key))
        .filter_map(|h| {
            let real = h.totals().real_plays;
            (real > 0).then(|| SongListEntry {
                artist: h.key.artist.clone(),
                track: h.key.track.clone(),
                first_played: h.first_played(),
                real_plays: Some(real),
                peak_fixation: None,
            })
        })
        .collect();
    list.sort_by(|a, b| b.real_plays.cmp(&a.real_plays));
    list.truncate(n);
    by_first_played(&mut list);
    list
}

/// Top `n` tracks by all-time peak fixation, displayed in first-played order.
pub fn top_fixations(lib: &Library, n: usize, excluded: &Exclusions) -> Vec<SongListEntry> {
    let started = Instant::now();
    let mut list: Vec<SongListEntry> = lib
        .tracks()
        .filter(|h| !excluded.contains(&h.key))
        .map(|h| SongListEntry {
            artist: h.key.artist.clone(),
            track: h.key.track.clone(),
            first_played: h.first_played(),
            real_plays: None,
            peak_fixation: Some(scan_peak(h).score),
        })
        .collect();
    list.sort_by(|a, b| {
        b.peak_fixation
            .unwrap_or(0.0)
            .total_cmp(&a.peak_fixation.unwrap_or(0.0))
    });
    list.truncate(n);
    by_first_played(&mut list);
    record_view_time("top_fixations", started);
    list
}

/// Tracks of a playlist, dated by when they were added.
pub fn playlist_songs(lib: &Library, name: &str) -> Option<Vec<SongListEntry>> {
    let playlist = lib.playlist(name)?;
    let mut list: Vec<SongListEntry> = playlist
        .items
        .iter()
        .filter_map(|it| {
            let key = it.track.as_ref()?.key();
            Some(SongListEntry {
                artist: key.artist,
                track: key.track,
                first_played: it.added_on(),
                real_plays: None,
                peak_fixation: None,
            })
        })
        .collect();
    by_first_played(&mut list);
    Some(list)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthValue {
    pub month: YearMonth,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCount {
    pub day: NaiveDate,
    pub plays: u32,
}

/// Everything the per-track detail panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackDetail {
    pub artist: String,
    pub track: String,
    pub totals: WindowStats,
    pub peak: FixationResult,
    /// Best trailing window per month.
    pub monthly_peaks: Vec<MonthValue>,
    /// Non-rolling fixation over each calendar month.
    pub monthly_fixation: Vec<MonthValue>,
    pub monthly_plays: Vec<MonthValue>,
    pub daily_plays: Vec<DayCount>,
}

pub fn track_detail(lib: &Library, key: &TrackKey) -> Option<TrackDetail> {
    let h = lib.track(key)?;
    let to_rows = |m: std::collections::BTreeMap<YearMonth, f64>| {
        m.into_iter()
            .map(|(month, value)| MonthValue { month, value })
            .collect::<Vec<_>>()
    };
    Some(TrackDetail {
        artist: key.artist.clone(),
        track: key.track.clone(),
        totals: h.totals(),
        peak: scan_peak(h),
        monthly_peaks: to_rows(peak_by_month(h)),
        monthly_fixation: to_rows(period_by_month(h)),
        monthly_plays: h
            .plays_by_month()
            .into_iter()
            .map(|(month, n)| MonthValue {
                month,
                value: f64::from(n),
            })
            .collect(),
        daily_plays: h
            .plays_by_day()
            .into_iter()
            .map(|(day, plays)| DayCount { day, plays })
            .collect(),
    })
}

/// Requested page (0-based) and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice `items` into one page; out-of-range pages clamp to the last page.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = if total_items == 0 {
        1
    } else {
        (total_items - 1) / per_page + 1
    };
    let page = page.min(total_pages - 1);
    let items = items
        .into_iter()
        .skip(page * per_page)
        .take(per_page)
        .collect();
    Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}
