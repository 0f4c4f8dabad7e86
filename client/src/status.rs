use seedmap_shared::{CatalogState, FilterOutcome, MapType, Nightlord, SeedId, Session};

/// Candidate ids are listed once the set is this small.
pub const CANDIDATE_LIST_LIMIT: usize = 10;

/// What the status panel shows for the current session.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusView {
    Loading,
    Unavailable(String),
    SelectPrompt,
    NoSeeds {
        nightlord: Nightlord,
        map_type: MapType,
    },
    Narrowing {
        marked: usize,
        candidates: Vec<SeedId>,
    },
    Resolved {
        seed_id: SeedId,
        nightlord: Nightlord,
        map_type: MapType,
    },
    Contradiction {
        marked: usize,
    },
}

pub fn summarize(session: &Session, catalog: &CatalogState) -> StatusView {
    match catalog {
        CatalogState::Loading => return StatusView::Loading,
        CatalogState::Unavailable(reason) => return StatusView::Unavailable(reason.clone()),
        CatalogState::Ready(_) => {}
    }
    let Ok((nightlord, map_type)) = session.selection() else {
        return StatusView::SelectPrompt;
    };
    let marked = session.marks().marked_count();
    match session.candidates(catalog) {
        FilterOutcome::NotReady => StatusView::NoSeeds {
            nightlord,
            map_type,
        },
        FilterOutcome::Narrowing(seeds) => StatusView::Narrowing {
            marked,
            candidates: seeds.iter().map(|s| s.seed_id).collect(),
        },
        FilterOutcome::Resolved(seed) => StatusView::Resolved {
            seed_id: seed.seed_id,
            nightlord: seed.nightlord,
            map_type: seed.map_type,
        },
        FilterOutcome::Contradiction => StatusView::Contradiction { marked },
    }
}

impl StatusView {
    pub fn headline(&self) -> String {
        match self {
            StatusView::Loading => "Loading seed dataset…".to_owned(),
            StatusView::Unavailable(reason) => format!("Seed dataset unavailable: {reason}"),
            StatusView::SelectPrompt => "Pick a nightlord and a map type to start.".to_owned(),
            StatusView::NoSeeds {
                nightlord,
                map_type,
            } => format!("No known seeds for {nightlord} on {map_type}."),
            StatusView::Narrowing { marked, candidates } => format!(
                "{marked} marked · {} possible seed{}",
                candidates.len(),
                plural(candidates.len())
            ),
            StatusView::Resolved { seed_id, .. } => format!("Seed found: {seed_id}"),
            StatusView::Contradiction { marked } => format!(
                "No seed matches your {marked} mark{}. Check them or reset.",
                plural(*marked)
            ),
        }
    }

    /// Comma-separated candidate ids while the list is short enough to read.
    pub fn candidate_list(&self) -> Option<String> {
        let StatusView::Narrowing { candidates, .. } = self else {
            return None;
        };
        if candidates.len() > CANDIDATE_LIST_LIMIT {
            return None;
        }
        Some(
            candidates
                .iter()
                .map(SeedId::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StatusView::Unavailable(_) | StatusView::Contradiction { .. }
        )
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
