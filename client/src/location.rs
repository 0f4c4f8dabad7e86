use seedmap_shared::SeedId;

/// Read `#seed=<id>` (possibly among other `&`-separated keys).
pub fn seed_from_hash(hash: &str) -> Option<SeedId> {
    hash.trim_start_matches('#')
        .split('&')
        .find_map(|pair| pair.strip_prefix("seed="))
        .and_then(|id| id.trim().parse().ok())
}

pub fn hash_for_seed(seed_id: SeedId) -> String {
    format!("#seed={seed_id}")
}

/// Accepts `123`, ` 123 ` and `#123`.
pub fn parse_seed_input(raw: &str) -> Option<SeedId> {
    raw.trim().trim_start_matches('#').parse().ok()
}

pub fn current_hash() -> Option<String> {
    web_sys::window()?.location().hash().ok()
}

pub fn publish_seed(seed_id: SeedId) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if window.location().set_hash(&hash_for_seed(seed_id)).is_err() {
        web_sys::console::warn_1(&format!("could not update URL hash for seed {seed_id}").into());
    }
}
