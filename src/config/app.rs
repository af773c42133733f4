// src/config/app.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/fixation.toml";
pub const ENV_CONFIG_PATH: &str = "FIXATION_CONFIG_PATH";
pub const ENV_HISTORY_PATH: &str = "FIXATION_HISTORY_PATH";
pub const ENV_PLAYLISTS_PATH: &str = "FIXATION_PLAYLISTS_PATH";

/// Page sizes offered by the listening-history tables.
pub const PAGE_SIZES: [usize; 4] = [25, 50, 100, 500];

fn default_history_path() -> PathBuf {
    PathBuf::from("Spotify Extended Streaming History.zip")
}
fn default_playlists_path() -> PathBuf {
    PathBuf::from("Playlist1.json")
}
fn default_min_total_plays() -> u32 {
    3
}
fn default_recent_days() -> i64 {
    30
}
fn default_year_days() -> i64 {
    365
}
fn default_top_n() -> usize {
    100
}
fn default_top_overview() -> usize {
    10
}
fn default_per_page() -> usize {
    100
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub views: ViewConfig,
}

/// Files loaded at startup. Missing files are not an error: the service starts
/// empty and waits for uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default = "default_playlists_path")]
    pub playlists_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            playlists_path: default_playlists_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// All-time table lists tracks with at least this many plays.
    #[serde(default = "default_min_total_plays")]
    pub min_total_plays: u32,
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
    #[serde(default = "default_year_days")]
    pub year_days: i64,
    /// Length of the "Top N" visualization lists.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Length of the overview top-artist/top-song tables.
    #[serde(default = "default_top_overview")]
    pub top_overview: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            min_total_plays: default_min_total_plays(),
            recent_days: default_recent_days(),
            year_days: default_year_days(),
            top_n: default_top_n(),
            top_overview: default_top_overview(),
            per_page: default_per_page(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    /// Resolve config with env + fallbacks:
    /// 1) $FIXATION_CONFIG_PATH (must exist)
    /// 2) config/fixation.toml
    /// 3) built-in defaults
    ///
    /// Data paths can then be overridden individually by
    /// $FIXATION_HISTORY_PATH / $FIXATION_PLAYLISTS_PATH.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    anyhow::bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
                }
                Self::load_from_file(&pb)?
            }
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(p) = env::var(ENV_HISTORY_PATH) {
            cfg.data.history_path = PathBuf::from(p);
        }
        if let Ok(p) = env::var(ENV_PLAYLISTS_PATH) {
            cfg.data.playlists_path = PathBuf::from(p);
        }
        Ok(cfg)
    }

    fn sanitize(&mut self) {
        let v = &mut self.views;
        if !PAGE_SIZES.contains(&v.per_page) {
            tracing::warn!(per_page = v.per_page, "unsupported page size, using default");
            v.per_page = default_per_page();
        }
        if v.recent_days < 0 {
            v.recent_days = default_recent_days();
        }
        if v.year_days < 0 {
            v.year_days = default_year_days();
        }
    }
}
