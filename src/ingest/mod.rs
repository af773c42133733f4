// src/ingest/mod.rs
//! Turns upload payloads into validated `PlayEvent`s.
//!
//! Records without a track name (podcast episodes, audiobooks) are dropped
//! silently. Records that name a track but cannot be counted correctly (bad
//! timestamp, missing or negative `ms_played`, blank artist) are rejected and
//! reported rather than miscounted.

pub mod archive;
pub mod providers;
pub mod types;

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::error::{FixationError, Result};
use crate::event::{PlayEvent, StartReason, TrackKey};
use crate::ingest::types::{HistorySource, RawStreamRecord};
use crate::playlist::PlaylistExport;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_records_total", "Raw records decoded from sources.");
        describe_counter!(
            "ingest_kept_total",
            "Records turned into play events."
        );
        describe_counter!(
            "ingest_untitled_total",
            "Records dropped for lacking a track name."
        );
        describe_counter!(
            "ingest_rejected_total",
            "Records rejected as invalid play events."
        );
        describe_counter!("ingest_source_errors_total", "Source read/decode errors.");
        describe_histogram!("ingest_decode_ms", "Source decode time in milliseconds.");
        describe_gauge!(
            "ingest_last_run_ts",
            "Unix ts when ingest last ran."
        );
    });
}

/// Outcome of normalizing a batch of raw records.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub events: Vec<PlayEvent>,
    pub records: usize,
    pub untitled: usize,
    pub rejected: Vec<FixationError>,
    pub source_errors: Vec<(String, FixationError)>,
}

impl IngestReport {
    pub fn kept(&self) -> usize {
        self.events.len()
    }
}

fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive forms are taken as UTC.
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|n| n.and_utc())
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Convert one record. `Ok(None)` means "not a track play", dropped silently.
pub fn to_event(rec: RawStreamRecord) -> Result<Option<PlayEvent>> {
    let Some(track) = non_blank(rec.master_metadata_track_name) else {
        return Ok(None);
    };
    let artist = rec.master_metadata_album_artist_name.unwrap_or_default();

    let ts_raw = rec.ts.unwrap_or_default();
    let timestamp = parse_ts(&ts_raw).ok_or_else(|| {
        FixationError::InvalidEvent(format!("unparseable ts '{ts_raw}' for '{track}'"))
    })?;

    let ms_played = match rec.ms_played {
        Some(ms) if ms >= 0 => ms as u64,
        Some(ms) => {
            return Err(FixationError::InvalidEvent(format!(
                "negative ms_played {ms} for '{track}'"
            )))
        }
        None => {
            return Err(FixationError::InvalidEvent(format!(
                "missing ms_played for '{track}'"
            )))
        }
    };

    let reason = StartReason::parse(rec.reason_start.as_deref().unwrap_or("unknown"));
    let ev = PlayEvent::new(timestamp, TrackKey::new(artist.trim(), track), ms_played, reason);
    ev.validate()?;
    Ok(Some(ev))
}

/// Normalize a batch: drop untitled records, collect rejections.
pub fn normalize_records(records: Vec<RawStreamRecord>) -> IngestReport {
    let mut report = IngestReport {
        records: records.len(),
        events: Vec::with_capacity(records.len()),
        ..Default::default()
    };
    for rec in records {
        match to_event(rec) {
            Ok(Some(ev)) => report.events.push(ev),
            Ok(None) => report.untitled += 1,
            Err(e) => report.rejected.push(e),
        }
    }
    report
}

/// Read every source once and normalize the union of their records.
/// A failing source is logged and skipped; the others still contribute.
pub async fn run_once(sources: &[Box<dyn HistorySource>]) -> IngestReport {
    ensure_metrics_described();

    let mut raw = Vec::new();
    let mut source_errors = Vec::new();
    for s in sources {
        let started = std::time::Instant::now();
        match s.fetch_records().await {
            Ok(mut v) => {
                histogram!("ingest_decode_ms").record(started.elapsed().as_secs_f64() * 1000.0);
                tracing::info!(target: "ingest", source = s.name(), records = v.len(), "source decoded");
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, source = s.name(), "source error");
                counter!("ingest_source_errors_total").increment(1);
                source_errors.push((s.name().to_string(), e));
            }
        }
    }

    let mut report = match tokio::task::spawn_blocking(move || normalize_records(raw)).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(target: "ingest", error = %e, "normalize task failed");
            let mut failed = IngestReport::default();
            failed
                .source_errors
                .push(("normalize".to_string(), FixationError::Task(e.to_string())));
            failed
        }
    };
    report.source_errors.extend(source_errors);

    for e in report.rejected.iter().take(5) {
        tracing::warn!(target: "ingest", error = %e, "rejected record");
    }

    counter!("ingest_records_total").increment(report.records as u64);
    counter!("ingest_kept_total").increment(report.kept() as u64);
    counter!("ingest_untitled_total").increment(report.untitled as u64);
    counter!("ingest_rejected_total").increment(report.rejected.len() as u64);
    gauge!("ingest_last_run_ts").set(Utc::now().timestamp() as f64);

    tracing::info!(
        target: "ingest",
        records = report.records,
        kept = report.kept(),
        untitled = report.untitled,
        rejected = report.rejected.len(),
        "ingest finished"
    );
    report
}

pub fn load_playlists_from(path: &Path) -> Result<PlaylistExport> {
    let bytes = std::fs::read(path).map_err(|e| FixationError::io(path, e))?;
    let origin = path.display().to_string();
    archive::decode_playlists(&bytes, &origin)
}
