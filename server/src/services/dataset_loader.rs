use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use seedmap_shared::{CatalogState, RenderDataset, SeedCatalog};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{
    RENDER_DATASET_FILE, SEED_DATASET_FILE, data_base_url, data_dir, dataset_refresh_interval,
};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {source}")]
    Http { url: String, source: reqwest::Error },
    #[error(transparent)]
    Dataset(#[from] seedmap_shared::DatasetError),
}

/// Where the two dataset files come from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    Disk(PathBuf),
    Remote(String),
}

impl DatasetSource {
    pub fn from_env() -> Self {
        match data_base_url() {
            Some(base) => DatasetSource::Remote(base),
            None => DatasetSource::Disk(data_dir()),
        }
    }

    async fn read(&self, client: &reqwest::Client, file: &str) -> Result<Bytes, SourceError> {
        match self {
            DatasetSource::Disk(dir) => read_file(&dir.join(file)).await,
            DatasetSource::Remote(base) => fetch(client, &format!("{base}/{file}")).await,
        }
    }
}

async fn read_file(path: &Path) -> Result<Bytes, SourceError> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|source| SourceError::Io {
            path: path.to_owned(),
            source,
        })
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<Bytes, SourceError> {
    let wrap = |source| SourceError::Http {
        url: url.to_owned(),
        source,
    };
    client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(wrap)?
        .bytes()
        .await
        .map_err(wrap)
}

pub async fn run(state: AppState) {
    let source = DatasetSource::from_env();
    let mut interval = tokio::time::interval(dataset_refresh_interval());

    // First tick fires immediately.
    loop {
        interval.tick().await;
        load_once(&state, &source).await;
    }
}

/// Reload both datasets. A failed reload keeps whatever was loaded before.
pub async fn load_once(state: &AppState, source: &DatasetSource) {
    match load_seed_catalog(state, source).await {
        Ok(catalog) => {
            for warning in catalog.warnings() {
                warn!(%warning, "seed dataset warning");
            }
            info!(
                seeds = catalog.len(),
                groups = catalog.group_sizes().len(),
                warnings = catalog.warnings().len(),
                "loaded seed dataset"
            );
            *state.catalog.write().await = CatalogState::Ready(Arc::new(catalog));
            state.observability.record_dataset_load();
        }
        Err(e) => {
            warn!(error = %e, "failed to load seed dataset");
            state.observability.record_dataset_load_failure();
            let mut catalog = state.catalog.write().await;
            if !catalog.is_ready() {
                *catalog = CatalogState::Unavailable(e.to_string());
            }
        }
    }

    match load_render_dataset(state, source).await {
        Ok(render) => {
            info!(seeds = render.seed_count(), "loaded map render dataset");
            {
                let mut live = state.render_data.write().await;
                *live = Some(Arc::new(render));
                state.plan_cache.clear();
            }
            state.observability.record_dataset_load();
        }
        Err(e) => {
            warn!(error = %e, "failed to load map render dataset");
            state.observability.record_dataset_load_failure();
        }
    }
}

async fn load_seed_catalog(
    state: &AppState,
    source: &DatasetSource,
) -> Result<SeedCatalog, SourceError> {
    let raw = source.read(&state.http_client, SEED_DATASET_FILE).await?;
    let catalog = SeedCatalog::from_slice(&raw)?;
    state.raw_datasets.write().await.seeds = Some(raw);
    Ok(catalog)
}

async fn load_render_dataset(
    state: &AppState,
    source: &DatasetSource,
) -> Result<RenderDataset, SourceError> {
    let raw = source.read(&state.http_client, RENDER_DATASET_FILE).await?;
    let render = RenderDataset::from_slice(&raw)?;
    state.raw_datasets.write().await.maps = Some(raw);
    Ok(render)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_data_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("seedmap-loader-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[tokio::test]
    async fn loads_both_datasets_from_disk() {
        let dir = temp_data_dir("ok");
        std::fs::write(
            dir.join(SEED_DATASET_FILE),
            r#"{"seeds": {"a": {"seedNumber": 4, "nightlord": "Adel", "mapType": "Default", "pois": {}}}}"#,
        )
        .expect("write dataset");
        std::fs::write(
            dir.join(RENDER_DATASET_FILE),
            r#"{"maps": {"4": {"Special": 1}}}"#,
        )
        .expect("write maps");

        let state = AppState::new();
        load_once(&state, &DatasetSource::Disk(dir.clone())).await;

        let catalog = state.catalog.read().await;
        assert_eq!(catalog.catalog().map(SeedCatalog::len), Some(1));
        let render = state.render_data.read().await;
        assert_eq!(render.as_ref().map(|r| r.seed_count()), Some(1));
        assert!(state.raw_datasets.read().await.seeds.is_some());
        assert_eq!(state.observability.snapshot().dataset_loads_total, 2);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_files_leave_catalog_unavailable() {
        let dir = temp_data_dir("missing");
        let state = AppState::new();
        load_once(&state, &DatasetSource::Disk(dir.join("nope"))).await;

        assert!(matches!(
            *state.catalog.read().await,
            CatalogState::Unavailable(_)
        ));
        assert!(state.render_data.read().await.is_none());
        assert_eq!(state.observability.snapshot().dataset_load_failures_total, 2);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn invalid_utf8_dataset_is_rejected() {
        let dir = temp_data_dir("utf8");
        let mut raw = br#"{"seeds": {"a": {"seedNumber": 4, "nightlord": "Adel", "mapType": "Default", "pois": {"#.to_vec();
        raw.extend_from_slice(b"\"1\": {\"type\": \"chur\xffch\"}}}}}");
        std::fs::write(dir.join(SEED_DATASET_FILE), raw).expect("write dataset");

        let state = AppState::new();
        load_once(&state, &DatasetSource::Disk(dir.clone())).await;

        assert!(matches!(
            *state.catalog.read().await,
            CatalogState::Unavailable(_)
        ));
        assert!(state.raw_datasets.read().await.seeds.is_none());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_catalog() {
        let dir = temp_data_dir("reload");
        std::fs::write(
            dir.join(SEED_DATASET_FILE),
            r#"{"seeds": {"a": {"seedNumber": 4, "nightlord": "Adel", "mapType": "Default", "pois": {}}}}"#,
        )
        .expect("write dataset");
        let state = AppState::new();
        let source = DatasetSource::Disk(dir.clone());
        load_once(&state, &source).await;

        std::fs::write(dir.join(SEED_DATASET_FILE), "{broken").expect("overwrite dataset");
        load_once(&state, &source).await;

        assert!(state.catalog.read().await.is_ready());
        let _ = std::fs::remove_dir_all(dir);
    }
}
