use crate::selection::UnitMode;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DATASET: &str = "avas_wa.geojson";
pub const DEFAULT_PANEL_STATS: &str = "ava_panel_stats.json";
pub const DEFAULT_SUITABILITY: &str = "ava_climate_suitability.json";
pub const DEFAULT_NESTED_DIR: &str = "vineyards_by_ava";
pub const DEFAULT_LOG_FILE: &str = "ava-map.log";

/// Frame budget for the event loop (~60fps)
pub const FRAME_MILLIS: u64 = 16;

/// Resolved runtime settings
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub dataset: PathBuf,
    pub panel_stats: PathBuf,
    pub suitability: PathBuf,
    pub nested_dir: PathBuf,
    pub units: UnitMode,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(env_string("AVA_MAP_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let in_data = |var: &str, default: &str| {
            let value = env_string(var).unwrap_or_else(|| default.into());
            resolve(&data_dir, Path::new(&value))
        };

        Self {
            dataset: in_data("AVA_MAP_DATASET", DEFAULT_DATASET),
            panel_stats: in_data("AVA_MAP_PANEL_STATS", DEFAULT_PANEL_STATS),
            suitability: in_data("AVA_MAP_SUITABILITY", DEFAULT_SUITABILITY),
            nested_dir: in_data("AVA_MAP_NESTED_DIR", DEFAULT_NESTED_DIR),
            units: units(),
            log_file: PathBuf::from(env_string("AVA_MAP_LOG").unwrap_or_else(|| DEFAULT_LOG_FILE.into())),
            data_dir,
        }
    }
}

pub fn units() -> UnitMode {
    env_string("AVA_MAP_UNITS")
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

fn env_string(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Relative paths live under the data directory
fn resolve(data_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}
