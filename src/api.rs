use std::sync::{Arc, RwLock};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::error::FixationError;
use crate::event::TrackKey;
use crate::fixation::{fixation_for_period, scan_peak, FixationResult};
use crate::ingest::{self, archive::decode_playlists, providers::UploadSource, types::HistorySource};
use crate::library::{Library, Overview, Status};
use crate::views::{self, Exclusions, Page, PageRequest, SongListEntry, TrackDetail, TrackRow};

/// Uploads are whole export archives; axum's 2MB default is far too small.
const UPLOAD_LIMIT: usize = 512 * 1024 * 1024;

const EXPORT_FILE_NAME: &str = "spotify_playlist.txt";

#[derive(Clone)]
pub struct AppState {
    library: Arc<RwLock<Arc<Library>>>,
    exclusions: Arc<RwLock<Exclusions>>,
    config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(library: Library, config: AppConfig) -> Self {
        Self {
            library: Arc::new(RwLock::new(Arc::new(library))),
            exclusions: Arc::new(RwLock::new(Exclusions::default())),
            config: Arc::new(config),
        }
    }

    /// Snapshot of the current library; cheap, and unaffected by later imports.
    pub fn library(&self) -> Arc<Library> {
        self.library.read().expect("rwlock poisoned").clone()
    }

    /// Build the next library from the current one and swap it in under a
    /// single write lock, so concurrent imports cannot drop each other's data.
    pub fn update_library<F>(&self, f: F)
    where
        F: FnOnce(&Library) -> Library,
    {
        let mut guard = self.library.write().expect("rwlock poisoned");
        let next = f(&**guard);
        *guard = Arc::new(next);
    }

    pub fn exclusions(&self) -> Exclusions {
        self.exclusions.read().expect("rwlock poisoned").clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Fixation(#[from] FixationError),

    #[error("no listening history loaded")]
    NoHistory,

    #[error("no playlists loaded")]
    NoPlaylists,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Fixation(FixationError::NotFound(_)) | ApiError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ApiError::Fixation(FixationError::Io { .. }) => {
                tracing::error!(target: "api", error = %self, "io error");
                (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR")
            }
            ApiError::Fixation(FixationError::Task(_)) | ApiError::Internal(_) => {
                tracing::error!(target: "api", error = %self, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            ApiError::Fixation(_) | ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::NoHistory => (StatusCode::NOT_FOUND, "NO_HISTORY"),
            ApiError::NoPlaylists => (StatusCode::NOT_FOUND, "NO_PLAYLISTS"),
        };
        let body = json!({
            "error": self.to_string(),
            "code": code,
        });
        (status, Json(body)).into_response()
    }
}

/// Run a view off the async workers; scans over a large library take a while.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

fn require_history(lib: &Library) -> ApiResult<()> {
    if lib.is_empty() {
        Err(ApiError::NoHistory)
    } else {
        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .route("/overview", get(overview))
        .route("/history/all-time", get(history_all_time))
        .route("/history/recent", get(history_recent))
        .route("/history/year", get(history_year))
        .route("/tracks/detail", get(track_detail))
        .route("/tracks/peak", get(track_peak))
        .route("/tracks/period", get(track_period))
        .route("/visualize/top-songs", get(visualize_top_songs))
        .route("/visualize/top-fixations", get(visualize_top_fixations))
        .route("/visualize/playlist", get(visualize_playlist))
        .route("/playlists", get(playlists))
        .route("/playlists/detail", get(playlist_detail))
        .route("/export", get(export))
        .route("/filters", get(filters))
        .route("/filters/tracks", post(filter_track))
        .route("/filters/playlists", post(filter_playlist))
        .route(
            "/import/history",
            post(import_history).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route(
            "/import/playlists",
            post(import_playlists).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<Status> {
    Json(state.library().status())
}

async fn overview(State(state): State<AppState>) -> ApiResult<Json<Overview>> {
    let lib = state.library();
    require_history(&lib)?;
    let top = state.config().views.top_overview;
    Ok(Json(blocking(move || lib.overview(top)).await?))
}

async fn history_all_time(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<Page<TrackRow>>> {
    let lib = state.library();
    require_history(&lib)?;
    let excluded = state.exclusions();
    let cfg = state.config().views.clone();
    let per_page = page.per_page.unwrap_or(cfg.per_page);
    if !crate::config::app::PAGE_SIZES.contains(&per_page) {
        return Err(ApiError::BadRequest(format!("unsupported per_page {per_page}")));
    }
    let rows = blocking(move || views::all_time(&lib, cfg.min_total_plays, &excluded)).await?;
    Ok(Json(views::paginate(rows, page.page, per_page)))
}

async fn history_recent(State(state): State<AppState>) -> ApiResult<Json<Vec<TrackRow>>> {
    let lib = state.library();
    require_history(&lib)?;
    let excluded = state.exclusions();
    let days = state.config().views.recent_days;
    Ok(Json(blocking(move || views::recent(&lib, days, &excluded)).await?))
}

async fn history_year(State(state): State<AppState>) -> ApiResult<Json<Vec<TrackRow>>> {
    let lib = state.library();
    require_history(&lib)?;
    let excluded = state.exclusions();
    let days = state.config().views.year_days;
    Ok(Json(blocking(move || views::last_year(&lib, days, &excluded)).await?))
}

#[derive(Debug, Deserialize)]
struct TrackQuery {
    artist: String,
    track: String,
}

impl TrackQuery {
    fn key(self) -> TrackKey {
        TrackKey::new(self.artist, self.track)
    }
}

async fn track_detail(
    State(state): State<AppState>,
    Query(q): Query<TrackQuery>,
) -> ApiResult<Json<TrackDetail>> {
    let lib = state.library();
    let key = q.key();
    let detail = blocking(move || views::track_detail(&lib, &key).ok_or(key)).await?;
    detail
        .map(Json)
        .map_err(|key| ApiError::NotFound(format!("track '{key}'")))
}

async fn track_peak(
    State(state): State<AppState>,
    Query(q): Query<TrackQuery>,
) -> ApiResult<Json<FixationResult>> {
    let lib = state.library();
    let key = q.key();
    let peak = blocking(move || lib.track(&key).map(scan_peak).ok_or(key)).await?;
    peak.map(Json)
        .map_err(|key| ApiError::NotFound(format!("track '{key}'")))
}

#[derive(Debug, Deserialize)]
struct PeriodQuery {
    artist: String,
    track: String,
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Serialize)]
struct PeriodOut {
    start: NaiveDate,
    end: NaiveDate,
    score: f64,
}

async fn track_period(
    State(state): State<AppState>,
    Query(q): Query<PeriodQuery>,
) -> ApiResult<Json<PeriodOut>> {
    let lib = state.library();
    let key = TrackKey::new(q.artist, q.track);
    let h = lib
        .track(&key)
        .ok_or_else(|| ApiError::NotFound(format!("track '{key}'")))?;
    Ok(Json(PeriodOut {
        start: q.start,
        end: q.end,
        score: fixation_for_period(h, q.start, q.end),
    }))
}

async fn visualize_top_songs(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SongListEntry>>> {
    let lib = state.library();
    require_history(&lib)?;
    let excluded = state.exclusions();
    let n = state.config().views.top_n;
    Ok(Json(blocking(move || views::top_songs(&lib, n, &excluded)).await?))
}

async fn visualize_top_fixations(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SongListEntry>>> {
    let lib = state.library();
    require_history(&lib)?;
    let excluded = state.exclusions();
    let n = state.config().views.top_n;
    Ok(Json(blocking(move || views::top_fixations(&lib, n, &excluded)).await?))
}

#[derive(Debug, Deserialize)]
struct PlaylistQuery {
    name: String,
}

async fn visualize_playlist(
    State(state): State<AppState>,
    Query(q): Query<PlaylistQuery>,
) -> ApiResult<Json<Vec<SongListEntry>>> {
    let lib = state.library();
    if lib.playlists().is_none() {
        return Err(ApiError::NoPlaylists);
    }
    views::playlist_songs(&lib, &q.name)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("playlist '{}'", q.name)))
}

#[derive(Debug, Serialize)]
struct PlaylistSummary {
    name: String,
    date_started: Option<NaiveDate>,
    songs: usize,
    excluded: bool,
}

async fn playlists(State(state): State<AppState>) -> ApiResult<Json<Vec<PlaylistSummary>>> {
    let lib = state.library();
    let list = lib.playlists().ok_or(ApiError::NoPlaylists)?;
    let excluded = state.exclusions();
    Ok(Json(
        list.iter()
            .map(|p| PlaylistSummary {
                name: p.name.clone(),
                date_started: p.date_started(),
                songs: p.items.len(),
                excluded: excluded.playlists.contains(&p.name),
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
struct PlaylistTrackOut {
    track: String,
    artist: String,
    album: String,
    date_added: String,
}

#[derive(Debug, Serialize)]
struct PlaylistDetailOut {
    name: String,
    description: String,
    tracks: Vec<PlaylistTrackOut>,
}

async fn playlist_detail(
    State(state): State<AppState>,
    Query(q): Query<PlaylistQuery>,
) -> ApiResult<Json<PlaylistDetailOut>> {
    let lib = state.library();
    if lib.playlists().is_none() {
        return Err(ApiError::NoPlaylists);
    }
    let p = lib
        .playlist(&q.name)
        .ok_or_else(|| ApiError::NotFound(format!("playlist '{}'", q.name)))?;
    let unknown = || "Unknown".to_string();
    let tracks = p
        .items
        .iter()
        .filter_map(|it| {
            let t = it.track.as_ref()?;
            Some(PlaylistTrackOut {
                track: t.track_name.clone().unwrap_or_else(unknown),
                artist: t.artist_name.clone().unwrap_or_else(unknown),
                album: t.album_name.clone().unwrap_or_else(unknown),
                date_added: it.added_date.clone().unwrap_or_else(unknown),
            })
        })
        .collect();
    Ok(Json(PlaylistDetailOut {
        name: p.name.clone(),
        description: p
            .description
            .clone()
            .unwrap_or_else(|| "No description".to_string()),
        tracks,
    }))
}

/// All-time table as a plain-text song list, excluded tracks left out.
async fn export(State(state): State<AppState>) -> ApiResult<Response> {
    let lib = state.library();
    require_history(&lib)?;
    let excluded = state.exclusions();
    let min_plays = state.config().views.min_total_plays;
    let text = blocking(move || {
        let rows = views::all_time(&lib, min_plays, &excluded);
        views::export_lines(&rows, &excluded)
    })
    .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        text,
    )
        .into_response())
}

async fn filters(State(state): State<AppState>) -> Json<Exclusions> {
    Json(state.exclusions())
}

#[derive(Debug, Deserialize)]
struct TrackFilterReq {
    artist: String,
    track: String,
    excluded: bool,
}

async fn filter_track(
    State(state): State<AppState>,
    Json(body): Json<TrackFilterReq>,
) -> Json<Exclusions> {
    let mut ex = state.exclusions.write().expect("rwlock poisoned");
    ex.set_track(TrackKey::new(body.artist, body.track), body.excluded);
    Json(ex.clone())
}

#[derive(Debug, Deserialize)]
struct PlaylistFilterReq {
    name: String,
    excluded: bool,
}

async fn filter_playlist(
    State(state): State<AppState>,
    Json(body): Json<PlaylistFilterReq>,
) -> ApiResult<Json<Exclusions>> {
    let lib = state.library();
    let mut ex = state.exclusions.write().expect("rwlock poisoned");
    if !ex.set_playlist(&lib, &body.name, body.excluded) {
        return Err(ApiError::NotFound(format!("playlist '{}'", body.name)));
    }
    Ok(Json(ex.clone()))
}

#[derive(Debug, Serialize)]
struct ImportOut {
    records: usize,
    kept: usize,
    untitled: usize,
    rejected: usize,
    errors: Vec<String>,
}

/// Replace the listening history with the uploaded JSON array or ZIP archive.
/// Playlists already loaded are kept.
async fn import_history(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<ImportOut>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty upload".into()));
    }
    let sources: Vec<Box<dyn HistorySource>> =
        vec![Box::new(UploadSource::new("upload", &body[..]))];
    // Decoding and normalizing run on blocking threads inside run_once.
    let mut report = ingest::run_once(&sources).await;

    if report.kept() == 0 && !report.source_errors.is_empty() {
        let (_, e) = report.source_errors.swap_remove(0);
        return Err(e.into());
    }

    let out = ImportOut {
        records: report.records,
        kept: report.kept(),
        untitled: report.untitled,
        rejected: report.rejected.len(),
        errors: report
            .rejected
            .iter()
            .take(20)
            .map(ToString::to_string)
            .collect(),
    };

    let events = report.events;
    let swap = state.clone();
    blocking(move || {
        let fresh = Library::new(events);
        swap.update_library(|current| fresh.with_playlists(current.playlists().map(<[_]>::to_vec)))
    })
    .await?;
    tracing::info!(target: "api", kept = out.kept, "listening history replaced");
    Ok(Json(out))
}

#[derive(Debug, Serialize)]
struct PlaylistImportOut {
    playlists: usize,
}

async fn import_playlists(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<PlaylistImportOut>> {
    let swap = state.clone();
    let count = blocking(move || {
        let export = decode_playlists(&body, "upload")?;
        let count = export.playlists.len();
        swap.update_library(|current| current.clone().with_playlists(Some(export.playlists)));
        Ok::<_, FixationError>(count)
    })
    .await??;
    tracing::info!(target: "api", playlists = count, "playlists replaced");
    Ok(Json(PlaylistImportOut { playlists: count }))
}
