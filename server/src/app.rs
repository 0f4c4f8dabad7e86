use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::config;
use crate::routes;
use crate::state::AppState;

const IMMUTABLE: &str = "public, max-age=31536000, immutable";

pub(crate) fn build_app(state: AppState) -> Router {
    let static_assets = Router::new()
        .nest_service("/static", ServeDir::new(config::asset_dir()))
        .nest_service("/poi-assets", ServeDir::new(config::poi_asset_dir()))
        .fallback_service(
            ServeDir::new(config::client_dist())
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let app = Router::new()
        .route("/dataset.json", get(routes::api::get_seed_dataset))
        .route("/maps.json", get(routes::api::get_render_dataset))
        .route("/api/catalog", get(routes::api::get_catalog))
        .route("/api/filter", post(routes::api::post_filter))
        .route("/api/seeds/{id}", get(routes::api::get_seed))
        .route("/api/seeds/{id}/plan", get(routes::api::get_render_plan))
        .route("/api/health", get(routes::api::health))
        .route("/api/metrics", get(routes::api::metrics));

    app.layer(CompressionLayer::new())
        .fallback_service(static_assets)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    // Compositor and marker images are content-addressed by their codes.
    if path.starts_with("/static/") || path.starts_with("/poi-assets/") {
        return Some(IMMUTABLE);
    }

    if is_hashed_bundle_asset(path) {
        return Some(IMMUTABLE);
    }

    None
}

fn is_hashed_bundle_asset(path: &str) -> bool {
    let Some(ext) = Path::new(path).extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    if !matches!(ext, "wasm" | "js" | "css") {
        return false;
    }

    let Some(filename) = Path::new(path).file_name().and_then(|name| name.to_str()) else {
        return false;
    };

    filename
        .split(['-', '_', '.'])
        .any(|segment| segment.len() >= 8 && segment.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immutable_cache_for_map_assets() {
        assert_eq!(
            cache_control_for_path("/static/background_3.png"),
            Some(IMMUTABLE)
        );
        assert_eq!(
            cache_control_for_path("/poi-assets/mage-tower.png"),
            Some(IMMUTABLE)
        );
    }

    #[test]
    fn immutable_cache_for_hashed_bundle_assets() {
        assert_eq!(
            cache_control_for_path("/seedmap-client-71578f6b278221f3_bg.wasm"),
            Some(IMMUTABLE)
        );
        assert_eq!(
            cache_control_for_path("/index-a93762ff3bf6d63a.css"),
            Some(IMMUTABLE)
        );
    }

    #[test]
    fn no_cache_header_override_for_html_or_unhashed_bundles() {
        assert_eq!(cache_control_for_path("/"), None);
        assert_eq!(cache_control_for_path("/index.html"), None);
        assert_eq!(cache_control_for_path("/app.js"), None);
        assert_eq!(cache_control_for_path("/staticfile.png"), None);
    }
}
