// tests/config_load.rs
use std::path::PathBuf;
use std::{env, fs};

use fixation_analyzer::config::app::{
    ENV_CONFIG_PATH, ENV_HISTORY_PATH, ENV_PLAYLISTS_PATH,
};
use fixation_analyzer::config::AppConfig;

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_HISTORY_PATH);
    env::remove_var(ENV_PLAYLISTS_PATH);
}

#[serial_test::serial]
#[test]
fn load_uses_env_then_default_file_then_builtins() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing on disk -> built-in defaults
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.views.min_total_plays, 3);
    assert_eq!(cfg.views.per_page, 100);

    // 2) ./config/fixation.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/fixation.toml"),
        "[views]\nmin_total_plays = 4\nper_page = 50\n",
    )
    .unwrap();
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.views.min_total_plays, 4);
    assert_eq!(cfg.views.per_page, 50);

    // 3) env path wins over the default file
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "[views]\ntop_n = 20\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.views.top_n, 20);
    assert_eq!(cfg.views.min_total_plays, 3);

    // 4) data paths can be overridden on their own
    env::set_var(ENV_HISTORY_PATH, "/data/history.zip");
    env::set_var(ENV_PLAYLISTS_PATH, "/data/pl.json");
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.data.history_path, PathBuf::from("/data/history.zip"));
    assert_eq!(cfg.data.playlists_path, PathBuf::from("/data/pl.json"));

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_path_must_exist() {
    clear_env();
    env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    let err = AppConfig::load().unwrap_err();
    assert!(err.to_string().contains(ENV_CONFIG_PATH));
    clear_env();
}

#[test]
fn malformed_toml_is_an_error_with_context() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("bad.toml");
    fs::write(&p, "[views\nmin_total_plays = ").unwrap();
    let err = AppConfig::load_from_file(&p).unwrap_err();
    assert!(format!("{err:#}").contains("bad.toml"));
}
