use std::sync::Arc;

use leptos::prelude::*;
use seedmap_shared::{CatalogState, RenderDataset, SeedCatalog};

pub const SEED_DATASET_URL: &str = "/dataset.json";
pub const RENDER_DATASET_URL: &str = "/maps.json";

async fn fetch_text(url: &str) -> Result<String, String> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.text().await.map_err(|e| format!("fetch error: {e}"))
}

/// Fetch and index the seed dataset.
pub async fn fetch_seed_catalog() -> Result<SeedCatalog, String> {
    let raw = fetch_text(SEED_DATASET_URL).await?;
    SeedCatalog::from_json(&raw).map_err(|e| format!("parse error: {e}"))
}

/// Fetch the per-seed compositor attributes.
pub async fn fetch_render_dataset() -> Result<RenderDataset, String> {
    let raw = fetch_text(RENDER_DATASET_URL).await?;
    RenderDataset::from_json(&raw).map_err(|e| format!("parse error: {e}"))
}

/// Load both datasets in the background and publish them into the app signals.
pub fn load_datasets(
    catalog: RwSignal<CatalogState>,
    render_data: RwSignal<Option<Arc<RenderDataset>>>,
    render_error: RwSignal<Option<String>>,
) {
    wasm_bindgen_futures::spawn_local(async move {
        let (seeds, maps) = futures::join!(fetch_seed_catalog(), fetch_render_dataset());

        match seeds {
            Ok(parsed) => {
                for warning in parsed.warnings() {
                    web_sys::console::warn_1(&format!("seed dataset: {warning}").into());
                }
                web_sys::console::info_1(
                    &format!("loaded {} seeds from {SEED_DATASET_URL}", parsed.len()).into(),
                );
                catalog.set(CatalogState::Ready(Arc::new(parsed)));
            }
            Err(e) => {
                web_sys::console::warn_1(&format!("{SEED_DATASET_URL}: {e}").into());
                catalog.set(CatalogState::Unavailable(e));
            }
        }

        match maps {
            Ok(parsed) => render_data.set(Some(Arc::new(parsed))),
            Err(e) => {
                web_sys::console::warn_1(&format!("{RENDER_DATASET_URL}: {e}").into());
                render_error.set(Some(e));
            }
        }
    });
}
