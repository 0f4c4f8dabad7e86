use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_ASSET_DIR: &str = "data/static";
pub const DEFAULT_POI_ASSET_DIR: &str = "data/poi-assets";
pub const DEFAULT_CLIENT_DIST: &str = "client/dist";
pub const DEFAULT_DATASET_REFRESH_SECS: u64 = 3600; // re-read hourly
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;

pub const SEED_DATASET_FILE: &str = "dataset.json";
pub const RENDER_DATASET_FILE: &str = "maps.json";

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

fn dir_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

pub fn data_dir() -> PathBuf {
    dir_var("SEEDMAP_DATA_DIR", DEFAULT_DATA_DIR)
}

pub fn asset_dir() -> PathBuf {
    dir_var("SEEDMAP_ASSET_DIR", DEFAULT_ASSET_DIR)
}

pub fn poi_asset_dir() -> PathBuf {
    dir_var("SEEDMAP_POI_ASSET_DIR", DEFAULT_POI_ASSET_DIR)
}

pub fn client_dist() -> PathBuf {
    dir_var("SEEDMAP_CLIENT_DIST", DEFAULT_CLIENT_DIST)
}

/// When set, datasets are fetched from `<base>/dataset.json` and `<base>/maps.json`.
pub fn data_base_url() -> Option<String> {
    std::env::var("SEEDMAP_DATA_BASE_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_owned())
        .filter(|value| !value.is_empty())
}

pub fn dataset_refresh_interval() -> Duration {
    std::env::var("DATASET_REFRESH_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_DATASET_REFRESH_SECS))
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS)
}
