use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;
use seedmap_shared::{CatalogState, RenderDataset, SeedId};
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::{upstream_connect_timeout, upstream_http_timeout};

/// Dataset files exactly as loaded, re-served to the browser client without re-serializing.
#[derive(Debug, Clone, Default)]
pub struct RawDatasets {
    pub seeds: Option<Bytes>,
    pub maps: Option<Bytes>,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RwLock<CatalogState>>,
    /// Parsed `maps.json`. None until the first successful load.
    pub render_data: Arc<RwLock<Option<Arc<RenderDataset>>>>,
    pub raw_datasets: Arc<RwLock<RawDatasets>>,
    /// Serialized render plans by seed id. Cleared whenever `maps.json` is reloaded.
    pub plan_cache: Arc<DashMap<SeedId, Arc<Bytes>>>,
    pub http_client: reqwest::Client,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    filter_requests_total: AtomicU64,
    filter_resolved_total: AtomicU64,
    filter_contradictions_total: AtomicU64,
    plan_requests_total: AtomicU64,
    plan_cache_hits_total: AtomicU64,
    unknown_seed_requests_total: AtomicU64,
    dataset_loads_total: AtomicU64,
    dataset_load_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub filter_requests_total: u64,
    pub filter_resolved_total: u64,
    pub filter_contradictions_total: u64,
    pub plan_requests_total: u64,
    pub plan_cache_hits_total: u64,
    pub unknown_seed_requests_total: u64,
    pub dataset_loads_total: u64,
    pub dataset_load_failures_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            filter_requests_total: self.filter_requests_total.load(Ordering::Relaxed),
            filter_resolved_total: self.filter_resolved_total.load(Ordering::Relaxed),
            filter_contradictions_total: self
                .filter_contradictions_total
                .load(Ordering::Relaxed),
            plan_requests_total: self.plan_requests_total.load(Ordering::Relaxed),
            plan_cache_hits_total: self.plan_cache_hits_total.load(Ordering::Relaxed),
            unknown_seed_requests_total: self
                .unknown_seed_requests_total
                .load(Ordering::Relaxed),
            dataset_loads_total: self.dataset_loads_total.load(Ordering::Relaxed),
            dataset_load_failures_total: self
                .dataset_load_failures_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_filter_request(&self) {
        self.filter_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filter_resolved(&self) {
        self.filter_resolved_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filter_contradiction(&self) {
        self.filter_contradictions_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_plan_request(&self) {
        self.plan_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_plan_cache_hit(&self) {
        self.plan_cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_seed_request(&self) {
        self.unknown_seed_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dataset_load(&self) {
        self.dataset_loads_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dataset_load_failure(&self) {
        self.dataset_load_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new() -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("seedmap/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, falling back to defaults"
                );
                reqwest::Client::new()
            });
        Self {
            catalog: Arc::new(RwLock::new(CatalogState::Loading)),
            render_data: Arc::new(RwLock::new(None)),
            raw_datasets: Arc::new(RwLock::new(RawDatasets::default())),
            plan_cache: Arc::new(DashMap::new()),
            http_client,
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
