// tests/views.rs
//
// Table and list views over a small hand-built library.

use chrono::{NaiveDate, TimeZone, Utc};

use fixation_analyzer::playlist::{Playlist, PlaylistItem, PlaylistTrack};
use fixation_analyzer::views::{self, Exclusions};
use fixation_analyzer::{Library, PlayEvent, StartReason, TrackKey};

fn play(artist: &str, track: &str, y: i32, m: u32, d: u32, ms: u64, reason: &str) -> PlayEvent {
    PlayEvent::new(
        Utc.with_ymd_and_hms(y, m, d, 18, 30, 0).unwrap(),
        TrackKey::new(artist, track),
        ms,
        StartReason::parse(reason),
    )
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// "Alpha/Old": heavy in early 2023, silent since.
/// "Beta/Now": a burst at the end of the library.
/// "Gamma/Rare": only two plays, below the all-time threshold.
fn library() -> Library {
    let mut events = Vec::new();
    for d in 1..=5 {
        events.push(play("Alpha", "Old", 2023, 1, d, 200_000, "clickrow"));
    }
    events.push(play("Alpha", "Old", 2023, 6, 1, 1_000, "fwdbtn"));
    for d in 20..=23 {
        events.push(play("Beta", "Now", 2024, 3, d, 180_000, "trackdone"));
    }
    events.push(play("Beta", "Now", 2024, 3, 24, 180_000, "clickrow"));
    events.push(play("Gamma", "Rare", 2024, 3, 1, 180_000, "clickrow"));
    events.push(play("Gamma", "Rare", 2024, 3, 2, 180_000, "trackdone"));

    let item = |track: &str, artist: &str, added: Option<&str>| PlaylistItem {
        track: Some(PlaylistTrack {
            track_name: Some(track.into()),
            artist_name: Some(artist.into()),
            album_name: None,
        }),
        added_date: added.map(str::to_string),
    };
    let playlists = vec![Playlist {
        name: "Winter".into(),
        description: None,
        items: vec![
            item("Now", "Beta", Some("2024-03-19T10:00:00Z")),
            item("Old", "Alpha", Some("2022-12-30")),
            item("Ghost", "Nobody", None),
        ],
    }];
    Library::new(events).with_playlists(Some(playlists))
}

#[test]
fn all_time_lists_tracks_over_threshold_with_peaks() {
    let lib = library();
    let rows = views::all_time(&lib, 3, &Exclusions::default());
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].artist.as_str(), rows[0].track.as_str()), ("Alpha", "Old"));

    let alpha = &rows[0];
    assert_eq!(alpha.stats.total_plays, 6);
    assert_eq!(alpha.stats.skips, 1);
    assert_eq!(alpha.peak_fixation, 6.0);
    assert_eq!(alpha.peak_date, Some(date(2023, 1, 5)));
    assert_eq!(alpha.first_played, Some(date(2023, 1, 1)));
    assert_eq!(alpha.last_played, Some(date(2023, 6, 1)));
}

#[test]
fn excluded_rows_move_to_the_end_and_leave_exports() {
    let lib = library();
    let mut ex = Exclusions::default();
    ex.set_track(TrackKey::new("Alpha", "Old"), true);

    let rows = views::all_time(&lib, 3, &ex);
    assert_eq!(rows[0].artist, "Beta");
    assert!(rows[1].excluded);

    let text = views::export_lines(&rows, &ex);
    assert_eq!(text, "Now - Beta");
}

#[test]
fn recent_ranks_by_current_fixation() {
    let lib = library();
    let rows = views::recent(&lib, 30, &Exclusions::default());
    // Alpha's last play is far outside the trailing 30 days.
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].track, "Now");
    assert_eq!(rows[0].current_fixation, Some(5.2));
    assert_eq!(rows[1].track, "Rare");
    assert_eq!(rows[1].current_fixation, Some(2.5));
    assert!(rows.iter().all(|r| r.year_fixation.is_none()));
}

#[test]
fn last_year_clips_windows_to_the_range() {
    let lib = library();
    let rows = views::last_year(&lib, 365, &Exclusions::default());
    // Cutoff is 2023-03-25: Alpha only has the June skip in range.
    let alpha = rows.iter().find(|r| r.artist == "Alpha").unwrap();
    assert_eq!(alpha.stats.total_plays, 1);
    assert_eq!(alpha.year_fixation, Some(0.0));
    // The all-time peak is still reported alongside.
    assert_eq!(alpha.peak_fixation, 6.0);
    assert_eq!(rows[0].track, "Now");
}

#[test]
fn excluding_a_playlist_excludes_its_tracks() {
    let lib = library();
    let mut ex = Exclusions::default();
    assert!(ex.set_playlist(&lib, "Winter", true));
    assert!(ex.contains(&TrackKey::new("Beta", "Now")));
    assert!(ex.contains(&TrackKey::new("Alpha", "Old")));

    // Re-including clears only the playlist flag.
    assert!(ex.set_playlist(&lib, "Winter", false));
    assert!(ex.playlists.is_empty());
    assert!(ex.contains(&TrackKey::new("Beta", "Now")));

    assert!(!ex.set_playlist(&lib, "Summer", true));

    let top = views::top_songs(&lib, 100, &ex);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].track, "Rare");
}

#[test]
fn top_lists_are_shown_in_first_played_order() {
    let lib = library();
    let top = views::top_songs(&lib, 2, &Exclusions::default());
    // Alpha (5 real) and Beta (5 real) beat Gamma (2 real).
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].track, "Old");
    assert_eq!(top[1].track, "Now");

    let fix = views::top_fixations(&lib, 1, &Exclusions::default());
    assert_eq!(fix.len(), 1);
    assert_eq!(fix[0].track, "Old");
    assert_eq!(fix[0].peak_fixation, Some(6.0));
}

#[test]
fn playlist_songs_sorted_by_date_added() {
    let lib = library();
    let songs = views::playlist_songs(&lib, "Winter").unwrap();
    let names: Vec<_> = songs.iter().map(|s| s.track.as_str()).collect();
    assert_eq!(names, ["Old", "Now", "Ghost"]);
    assert_eq!(songs[2].first_played, None);
    assert!(views::playlist_songs(&lib, "Nope").is_none());
}

#[test]
fn track_detail_has_monthly_series() {
    let lib = library();
    let d = views::track_detail(&lib, &TrackKey::new("Alpha", "Old")).unwrap();
    assert_eq!(d.peak.score, 6.0);
    assert_eq!(d.monthly_peaks.len(), 2);
    assert_eq!(d.monthly_peaks[0].value, 6.0);
    // June only has the skip.
    assert_eq!(d.monthly_peaks[1].value, 0.0);
    assert_eq!(d.monthly_plays[0].value, 5.0);
    assert_eq!(d.daily_plays.len(), 6);
    assert!(views::track_detail(&lib, &TrackKey::new("X", "Y")).is_none());
}
