use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use seedmap_shared::{
    AssetRemap, CatalogState, CoordinateId, FilterOutcome, LandmarkType, MapType, Nightlord,
    RenderDataset, SeedId, Session, SessionError, plan,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

fn dataset_status(catalog: &CatalogState) -> &'static str {
    match catalog {
        CatalogState::Loading => "loading",
        CatalogState::Ready(_) => "ready",
        CatalogState::Unavailable(_) => "unavailable",
    }
}

fn dataset_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "status": "dataset_unavailable" })),
    )
        .into_response()
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (status, seeds, warnings) = {
        let catalog = state.catalog.read().await;
        (
            dataset_status(&catalog),
            catalog.catalog().map_or(0, |c| c.len()),
            catalog.catalog().map_or(0, |c| c.warnings().len()),
        )
    };
    let render_seeds = state
        .render_data
        .read()
        .await
        .as_ref()
        .map_or(0, |r| r.seed_count());
    let observability = state.observability.snapshot();
    Json(json!({
        "status": "ok",
        "dataset": status,
        "seeds": seeds,
        "dataset_warnings": warnings,
        "render_seeds": render_seeds,
        "plan_cache_size": state.plan_cache.len(),
        "observability": {
            "filter_requests_total": observability.filter_requests_total,
            "filter_resolved_total": observability.filter_resolved_total,
            "filter_contradictions_total": observability.filter_contradictions_total,
            "plan_requests_total": observability.plan_requests_total,
            "plan_cache_hits_total": observability.plan_cache_hits_total,
            "unknown_seed_requests_total": observability.unknown_seed_requests_total,
            "dataset_loads_total": observability.dataset_loads_total,
            "dataset_load_failures_total": observability.dataset_load_failures_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let (dataset_ready, seed_count) = {
        let catalog = state.catalog.read().await;
        (catalog.is_ready(), catalog.catalog().map_or(0, |c| c.len()))
    };
    let body = render_prometheus_metrics(
        seed_count,
        dataset_ready,
        state.plan_cache.len(),
        state.observability.snapshot(),
    );

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn write_metric(body: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    let _ = writeln!(body, "# HELP {name} {help}");
    let _ = writeln!(body, "# TYPE {name} {kind}");
    let _ = writeln!(body, "{name} {value}");
}

fn render_prometheus_metrics(
    seed_count: usize,
    dataset_ready: bool,
    plan_cache_size: usize,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    write_metric(
        &mut body,
        "seedmap_seeds",
        "gauge",
        "Number of seeds in the loaded catalog.",
        seed_count as u64,
    );
    write_metric(
        &mut body,
        "seedmap_dataset_ready",
        "gauge",
        "Whether the seed dataset is loaded (1 or 0).",
        u64::from(dataset_ready),
    );
    write_metric(
        &mut body,
        "seedmap_plan_cache_size",
        "gauge",
        "Number of cached render plans.",
        plan_cache_size as u64,
    );
    write_metric(
        &mut body,
        "seedmap_filter_requests_total",
        "counter",
        "Total /api/filter requests.",
        observability.filter_requests_total,
    );
    write_metric(
        &mut body,
        "seedmap_filter_resolved_total",
        "counter",
        "Filter requests that narrowed to exactly one seed.",
        observability.filter_resolved_total,
    );
    write_metric(
        &mut body,
        "seedmap_filter_contradictions_total",
        "counter",
        "Filter requests where no seed matched the marks.",
        observability.filter_contradictions_total,
    );
    write_metric(
        &mut body,
        "seedmap_plan_requests_total",
        "counter",
        "Total render plan requests.",
        observability.plan_requests_total,
    );
    write_metric(
        &mut body,
        "seedmap_plan_cache_hits_total",
        "counter",
        "Render plans served from cache.",
        observability.plan_cache_hits_total,
    );
    write_metric(
        &mut body,
        "seedmap_unknown_seed_requests_total",
        "counter",
        "Lookups for seed ids missing from the datasets.",
        observability.unknown_seed_requests_total,
    );
    write_metric(
        &mut body,
        "seedmap_dataset_loads_total",
        "counter",
        "Successful dataset loads.",
        observability.dataset_loads_total,
    );
    write_metric(
        &mut body,
        "seedmap_dataset_load_failures_total",
        "counter",
        "Failed dataset loads.",
        observability.dataset_load_failures_total,
    );
    body
}

fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}

/// The seed dataset as loaded, for the browser client.
pub async fn get_seed_dataset(State(state): State<AppState>) -> Response {
    match state.raw_datasets.read().await.seeds.clone() {
        Some(raw) => json_bytes_response(raw, "public, max-age=300"),
        None => dataset_unavailable(),
    }
}

pub async fn get_render_dataset(State(state): State<AppState>) -> Response {
    match state.raw_datasets.read().await.maps.clone() {
        Some(raw) => json_bytes_response(raw, "public, max-age=300"),
        None => dataset_unavailable(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutEntry {
    id: CoordinateId,
    x: f64,
    y: f64,
}

pub async fn get_catalog(State(state): State<AppState>) -> Response {
    let catalog = state.catalog.read().await;
    let Some(catalog) = catalog.catalog() else {
        return dataset_unavailable();
    };
    let layouts: BTreeMap<&str, Vec<LayoutEntry>> = MapType::ALL
        .into_iter()
        .filter_map(|map_type| {
            let layout = catalog.layout(map_type)?;
            let points = layout
                .points
                .iter()
                .map(|p| LayoutEntry {
                    id: p.id,
                    x: p.pos.x,
                    y: p.pos.y,
                })
                .collect();
            Some((map_type.as_str(), points))
        })
        .collect();
    Json(json!({
        "seeds": catalog.len(),
        "nightlords": Nightlord::ALL,
        "mapTypes": MapType::ALL,
        "groups": catalog.group_sizes(),
        "layouts": layouts,
        "warnings": catalog.warnings(),
    }))
    .into_response()
}

pub async fn get_seed(State(state): State<AppState>, Path(seed_id): Path<SeedId>) -> Response {
    let catalog = state.catalog.read().await;
    let Some(catalog) = catalog.catalog() else {
        return dataset_unavailable();
    };
    let Some(seed) = catalog.seed(seed_id) else {
        state.observability.record_unknown_seed_request();
        return StatusCode::NOT_FOUND.into_response();
    };
    let attributes = state
        .render_data
        .read()
        .await
        .as_ref()
        .and_then(|render| render.attributes(seed_id).cloned());
    Json(json!({
        "seed": seed,
        "attributes": attributes,
    }))
    .into_response()
}

pub async fn get_render_plan(
    State(state): State<AppState>,
    Path(seed_id): Path<SeedId>,
) -> Response {
    state.observability.record_plan_request();
    if let Some(cached) = state.plan_cache.get(&seed_id) {
        state.observability.record_plan_cache_hit();
        return json_bytes_response((**cached).clone(), "public, max-age=300");
    }

    let Some(render) = state.render_data.read().await.clone() else {
        return dataset_unavailable();
    };
    let Some(plan) = plan(&render, AssetRemap::builtin(), seed_id) else {
        state.observability.record_unknown_seed_request();
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "unknown_seed", "seedId": seed_id })),
        )
            .into_response();
    };
    match serde_json::to_vec(&plan) {
        Ok(encoded) => {
            let encoded = Arc::new(Bytes::from(encoded));
            if !cache_plan(&state, &render, seed_id, Arc::clone(&encoded)).await {
                tracing::debug!(seed_id, "render dataset reloaded mid-request, plan not cached");
            }
            json_bytes_response((*encoded).clone(), "public, max-age=300")
        }
        Err(e) => {
            tracing::warn!(seed_id, error = %e, "failed to serialize render plan");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Caches a plan only while `render` is still the live dataset. The read guard
/// is held across the insert, so a reload cannot swap and clear in between.
async fn cache_plan(
    state: &AppState,
    render: &Arc<RenderDataset>,
    seed_id: SeedId,
    encoded: Arc<Bytes>,
) -> bool {
    let live = state.render_data.read().await;
    if !live
        .as_ref()
        .is_some_and(|current| Arc::ptr_eq(current, render))
    {
        return false;
    }
    state.plan_cache.insert(seed_id, encoded);
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub nightlord: Nightlord,
    pub map_type: MapType,
    #[serde(default)]
    pub marks: BTreeMap<CoordinateId, LandmarkType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResponse {
    pub status: &'static str,
    pub marked: usize,
    pub candidates: Vec<SeedId>,
    pub resolved: Option<SeedId>,
}

/// Stateless filter: apply the posted marks to a fresh session and report what survives.
pub async fn post_filter(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Response {
    state.observability.record_filter_request();
    let catalog = state.catalog.read().await;
    if !catalog.is_ready() {
        return dataset_unavailable();
    }

    let mut session = Session::new();
    session.select_nightlord(request.nightlord);
    session.select_map_type(request.map_type);
    if let Some(layout) = catalog.layout(request.map_type) {
        for (&coordinate, &mark) in &request.marks {
            if let Err(e @ SessionError::UnknownCoordinate(_)) =
                session.mark(layout, coordinate, mark)
            {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "status": "invalid_mark", "message": e.to_string() })),
                )
                    .into_response();
            }
        }
    }

    let outcome = session.candidates(&catalog);
    let status = match &outcome {
        FilterOutcome::NotReady => "no_candidates",
        FilterOutcome::Narrowing(_) => "narrowing",
        FilterOutcome::Resolved(_) => {
            state.observability.record_filter_resolved();
            "resolved"
        }
        FilterOutcome::Contradiction => {
            state.observability.record_filter_contradiction();
            "contradiction"
        }
    };
    Json(FilterResponse {
        status,
        marked: session.marks().marked_count(),
        candidates: outcome.candidates().iter().map(|s| s.seed_id).collect(),
        resolved: outcome.resolved().map(|s| s.seed_id),
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use seedmap_shared::{CatalogState, RenderDataset, SeedCatalog};

    use bytes::Bytes;

    use super::{ObservabilitySnapshot, cache_plan, render_prometheus_metrics};
    use crate::state::AppState;

    const DATASET: &str = r#"{"poiDatabase": {"seeds": {
        "s101": {"seedNumber": 101, "nightlord": "Gladius", "mapType": "Default", "pois": {
            "5": {"coordinates": {"x": 100, "y": 200}, "type": "church"},
            "9": {"coordinates": {"x": 300, "y": 400}, "type": "village"}
        }},
        "s102": {"seedNumber": 102, "nightlord": "Gladius", "mapType": "Default", "pois": {
            "5": {"coordinates": {"x": 100, "y": 200}, "type": "nothing"},
            "9": {"coordinates": {"x": 300, "y": 400}, "type": "village"}
        }}
    }}}"#;

    const MAPS: &str = r#"{
        "maps": {"101": {"Special": 2, "Treasure_800": 5, "RotRew_500": 0, "Start_190": 1,
            "Day1Boss": 1, "Day2Boss": 2, "Day1Loc": 10, "Day2Loc": 11, "EventFlag": 7000}},
        "coordinates": {"10": [500, 600]},
        "names": {"1": "Gladius, Beast of Night"}
    }"#;

    async fn ready_state() -> AppState {
        let state = AppState::new();
        *state.catalog.write().await = CatalogState::Ready(Arc::new(
            SeedCatalog::from_json(DATASET).expect("parse dataset"),
        ));
        *state.render_data.write().await =
            Some(Arc::new(RenderDataset::from_json(MAPS).expect("parse maps")));
        state
    }

    async fn spawn_test_server(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let app = crate::app::build_app(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });
        (addr, handle)
    }

    async fn post_filter(
        client: &reqwest::Client,
        base_url: &str,
        body: serde_json::Value,
    ) -> reqwest::Response {
        client
            .post(format!("{base_url}/api/filter"))
            .json(&body)
            .send()
            .await
            .expect("filter request")
    }

    #[tokio::test]
    async fn plan_built_from_a_replaced_dataset_is_not_cached() {
        let state = ready_state().await;
        let stale = state
            .render_data
            .read()
            .await
            .clone()
            .expect("render data loaded");
        let fresh = Arc::new(RenderDataset::from_json(MAPS).expect("parse maps"));
        *state.render_data.write().await = Some(Arc::clone(&fresh));
        state.plan_cache.clear();

        let encoded = Arc::new(Bytes::from_static(b"{}"));
        assert!(!cache_plan(&state, &stale, 101, Arc::clone(&encoded)).await);
        assert!(state.plan_cache.is_empty());

        assert!(cache_plan(&state, &fresh, 101, encoded).await);
        assert!(state.plan_cache.contains_key(&101));
    }

    #[test]
    fn metrics_output_contains_prometheus_help_type_and_values() {
        let observability = ObservabilitySnapshot {
            filter_requests_total: 12,
            filter_resolved_total: 3,
            filter_contradictions_total: 2,
            plan_requests_total: 7,
            plan_cache_hits_total: 4,
            unknown_seed_requests_total: 1,
            dataset_loads_total: 2,
            dataset_load_failures_total: 0,
        };

        let metrics = render_prometheus_metrics(240, true, 5, observability);

        assert!(metrics.contains("# HELP seedmap_seeds"));
        assert!(metrics.contains("# TYPE seedmap_filter_requests_total counter"));
        assert!(metrics.contains("# TYPE seedmap_dataset_ready gauge"));
        assert!(metrics.contains("seedmap_seeds 240"));
        assert!(metrics.contains("seedmap_dataset_ready 1"));
        assert!(metrics.contains("seedmap_plan_cache_size 5"));
        assert!(metrics.contains("seedmap_filter_requests_total 12"));
        assert!(metrics.contains("seedmap_filter_resolved_total 3"));
        assert!(metrics.contains("seedmap_filter_contradictions_total 2"));
        assert!(metrics.contains("seedmap_plan_cache_hits_total 4"));
        assert!(metrics.contains("seedmap_dataset_load_failures_total 0"));
    }

    #[tokio::test]
    async fn health_and_metrics_expose_expected_contract() {
        let state = ready_state().await;
        let (addr, server_handle) = spawn_test_server(state).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        post_filter(
            &client,
            &base_url,
            serde_json::json!({"nightlord": "Gladius", "mapType": "Default"}),
        )
        .await
        .error_for_status()
        .expect("filter status");

        let health = client
            .get(format!("{base_url}/api/health"))
            .send()
            .await
            .expect("health request")
            .error_for_status()
            .expect("health status")
            .json::<serde_json::Value>()
            .await
            .expect("parse health");

        assert_eq!(health.get("status").and_then(|v| v.as_str()), Some("ok"));
        assert_eq!(health.get("dataset").and_then(|v| v.as_str()), Some("ready"));
        assert_eq!(health.get("seeds").and_then(|v| v.as_u64()), Some(2));
        assert_eq!(
            health
                .get("observability")
                .and_then(|v| v.get("filter_requests_total"))
                .and_then(|v| v.as_u64()),
            Some(1)
        );

        let metrics = client
            .get(format!("{base_url}/api/metrics"))
            .send()
            .await
            .expect("metrics request")
            .error_for_status()
            .expect("metrics status")
            .text()
            .await
            .expect("parse metrics text");

        assert!(metrics.contains("seedmap_filter_requests_total 1"));
        assert!(metrics.contains("seedmap_dataset_ready 1"));

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn filter_narrows_resolves_and_contradicts() {
        let state = ready_state().await;
        let (addr, server_handle) = spawn_test_server(state).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        let church = post_filter(
            &client,
            &base_url,
            serde_json::json!({"nightlord": "Gladius", "mapType": "Default", "marks": {"5": "church"}}),
        )
        .await
        .json::<serde_json::Value>()
        .await
        .expect("parse filter");
        assert_eq!(church["status"], "resolved");
        assert_eq!(church["resolved"], 101);
        assert_eq!(church["candidates"], serde_json::json!([101]));

        let absent = post_filter(
            &client,
            &base_url,
            serde_json::json!({"nightlord": "Gladius", "mapType": "Default", "marks": {"5": "absent"}}),
        )
        .await
        .json::<serde_json::Value>()
        .await
        .expect("parse filter");
        assert_eq!(absent["resolved"], 102);

        let none = post_filter(
            &client,
            &base_url,
            serde_json::json!({"nightlord": "Gladius", "mapType": "Default", "marks": {"9": "sorcerer_tower"}}),
        )
        .await
        .json::<serde_json::Value>()
        .await
        .expect("parse filter");
        assert_eq!(none["status"], "contradiction");
        assert_eq!(none["marked"], 1);

        let open = post_filter(
            &client,
            &base_url,
            serde_json::json!({"nightlord": "Gladius", "mapType": "Default"}),
        )
        .await
        .json::<serde_json::Value>()
        .await
        .expect("parse filter");
        assert_eq!(open["status"], "narrowing");
        assert_eq!(open["candidates"], serde_json::json!([101, 102]));

        let empty_group = post_filter(
            &client,
            &base_url,
            serde_json::json!({"nightlord": "Caligo", "mapType": "Crater"}),
        )
        .await
        .json::<serde_json::Value>()
        .await
        .expect("parse filter");
        assert_eq!(empty_group["status"], "no_candidates");

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn filter_rejects_unknown_coordinate_and_bad_nightlord() {
        let state = ready_state().await;
        let (addr, server_handle) = spawn_test_server(state).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        let unknown = post_filter(
            &client,
            &base_url,
            serde_json::json!({"nightlord": "Gladius", "mapType": "Default", "marks": {"77": "church"}}),
        )
        .await;
        assert_eq!(unknown.status(), reqwest::StatusCode::BAD_REQUEST);

        let bad = post_filter(
            &client,
            &base_url,
            serde_json::json!({"nightlord": "Nobody", "mapType": "Default"}),
        )
        .await;
        assert!(bad.status().is_client_error());

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn dataset_unavailable_returns_503() {
        let (addr, server_handle) = spawn_test_server(AppState::new()).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        for path in ["/api/catalog", "/api/seeds/101", "/api/seeds/101/plan", "/dataset.json"] {
            let response = client
                .get(format!("{base_url}{path}"))
                .send()
                .await
                .expect("request");
            assert_eq!(
                response.status(),
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
                "{path}"
            );
            let body = response.json::<serde_json::Value>().await.expect("json body");
            assert_eq!(body["status"], "dataset_unavailable");
        }

        let filter = post_filter(
            &client,
            &base_url,
            serde_json::json!({"nightlord": "Gladius", "mapType": "Default"}),
        )
        .await;
        assert_eq!(filter.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn seed_lookup_and_render_plan() {
        let state = ready_state().await;
        let (addr, server_handle) = spawn_test_server(state.clone()).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        let seed = client
            .get(format!("{base_url}/api/seeds/101"))
            .send()
            .await
            .expect("seed request")
            .json::<serde_json::Value>()
            .await
            .expect("parse seed");
        assert_eq!(seed["seed"]["seedId"], 101);
        assert_eq!(seed["seed"]["nightlord"], "Gladius");
        assert_eq!(seed["attributes"]["Special"], 2);

        let missing = client
            .get(format!("{base_url}/api/seeds/999"))
            .send()
            .await
            .expect("seed request");
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        let plan = client
            .get(format!("{base_url}/api/seeds/101/plan"))
            .send()
            .await
            .expect("plan request")
            .json::<serde_json::Value>()
            .await
            .expect("parse plan");
        assert_eq!(plan["backgroundUrl"], "/static/background_2.png");
        assert_eq!(plan["displayScale"], 0.2);
        let ops = plan["ops"].as_array().expect("ops array");
        assert_eq!(ops.last().and_then(|op| op["layer"].as_str()), Some("event"));

        client
            .get(format!("{base_url}/api/seeds/101/plan"))
            .send()
            .await
            .expect("cached plan request")
            .error_for_status()
            .expect("cached plan status");
        assert_eq!(state.observability.snapshot().plan_cache_hits_total, 1);

        let unknown_plan = client
            .get(format!("{base_url}/api/seeds/555/plan"))
            .send()
            .await
            .expect("plan request");
        assert_eq!(unknown_plan.status(), reqwest::StatusCode::NOT_FOUND);

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn catalog_summary_lists_layouts() {
        let state = ready_state().await;
        let (addr, server_handle) = spawn_test_server(state).await;
        let base_url = format!("http://{addr}");

        let summary = reqwest::Client::new()
            .get(format!("{base_url}/api/catalog"))
            .send()
            .await
            .expect("catalog request")
            .json::<serde_json::Value>()
            .await
            .expect("parse catalog");

        assert_eq!(summary["seeds"], 2);
        assert_eq!(summary["groups"][0]["nightlord"], "Gladius");
        assert_eq!(summary["groups"][0]["seeds"], 2);
        let layout = summary["layouts"]["Default"].as_array().expect("layout");
        assert_eq!(layout.len(), 2);
        assert_eq!(layout[0]["id"], 5);
        assert_eq!(summary["mapTypes"][3], "Rotted Woods");

        server_handle.abort();
        let _ = server_handle.await;
    }
}
