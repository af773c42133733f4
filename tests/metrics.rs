// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

const HISTORY: &str = r#"[
  {"ts":"2024-02-01T10:00:00Z","ms_played":120000,"reason_start":"clickrow",
   "master_metadata_track_name":"Hook","master_metadata_album_artist_name":"Band"},
  {"ts":"2024-02-02T10:00:00Z","ms_played":120000,"reason_start":"trackdone",
   "master_metadata_track_name":"Hook","master_metadata_album_artist_name":"Band"},
  {"ts":"2024-02-03T10:00:00Z","ms_played":120000,"reason_start":"trackdone",
   "master_metadata_track_name":"Hook","master_metadata_album_artist_name":"Band"},
  {"ts":"2024-02-03T11:00:00Z","ms_played":-5,"reason_start":"clickrow",
   "master_metadata_track_name":"Hook","master_metadata_album_artist_name":"Band"}
]"#;

// Build full in-process app with history loaded from a temp file.
async fn build_app(dir: &tempfile::TempDir) -> Router {
    let history = dir.path().join("history.json");
    std::fs::write(&history, HISTORY).unwrap();
    std::env::set_var("FIXATION_HISTORY_PATH", history.display().to_string());
    std::env::set_var(
        "FIXATION_PLAYLISTS_PATH",
        dir.path().join("none.json").display().to_string(),
    );
    let app = fixation_analyzer::app()
        .await
        .expect("app() should build Router in tests");
    std::env::remove_var("FIXATION_HISTORY_PATH");
    std::env::remove_var("FIXATION_PLAYLISTS_PATH");
    app
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[serial_test::serial]
#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(&dir).await;

    let (status, _) = get_text(&app, "/history/all-time").await;
    assert_eq!(status, StatusCode::OK);

    let (status, text) = get_text(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    for needle in [
        "ingest_records_total",
        "ingest_rejected_total",
        "ingest_kept_total",
        "fixation_view_ms",
    ] {
        assert!(text.contains(needle), "missing series {needle} in:\n{text}");
    }
}

#[serial_test::serial]
#[tokio::test]
async fn app_can_be_built_twice_in_one_process() {
    // The Prometheus recorder is global; a second build reuses it.
    let dir = tempfile::tempdir().unwrap();
    let _first = build_app(&dir).await;
    let second = build_app(&dir).await;
    let (status, body) = get_text(&second, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
