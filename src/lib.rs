// src/lib.rs
// Public library surface: the fixation engine, ingestion, views and the HTTP layer.

pub mod error;
pub mod event;
pub mod fixation;
pub mod history;
pub mod library;
pub mod playlist;
pub mod rolling;
pub mod views;

pub mod config;
pub mod ingest;

pub mod api;
pub mod metrics;

pub use crate::api::{router, AppState};
pub use crate::error::{FixationError, Result};
pub use crate::event::{PlayEvent, StartReason, TrackKey, YearMonth};
pub use crate::fixation::{fixation_for_period, peak_by_month, scan_peak, FixationResult};
pub use crate::history::TrackHistory;
pub use crate::library::Library;

use axum::Router;
use tracing::{info, warn};

use crate::config::{AppConfig, DataConfig};
use crate::ingest::{providers::FileSource, types::HistorySource};

/// Build the library from the configured files. Missing files leave the
/// corresponding part empty; the service then waits for uploads.
pub async fn load_library(data: &DataConfig) -> Library {
    let events = if data.history_path.exists() {
        let sources: Vec<Box<dyn HistorySource>> =
            vec![Box::new(FileSource::new(&data.history_path))];
        ingest::run_once(&sources).await.events
    } else {
        info!(path = %data.history_path.display(), "no listening history on disk");
        Vec::new()
    };

    let playlists = if data.playlists_path.exists() {
        match ingest::load_playlists_from(&data.playlists_path) {
            Ok(export) => Some(export.playlists),
            Err(e) => {
                warn!(error = %e, "playlists not loaded");
                None
            }
        }
    } else {
        None
    };

    Library::new(events).with_playlists(playlists)
}

/// Full application router: API plus `/metrics`.
pub async fn app() -> anyhow::Result<Router> {
    let config = AppConfig::load()?;
    let metrics = metrics::Metrics::init()?;
    let library = load_library(&config.data).await;
    info!(
        records = library.events().len(),
        tracks = library.track_count(),
        "library ready"
    );
    let state = AppState::new(library, config);
    Ok(router(state).merge(metrics.router()))
}
