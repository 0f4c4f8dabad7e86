use crate::catalog::{MapLayout, SeedRecord};
use crate::landmark::LandmarkType;
use crate::store::LandmarkStore;

/// Whether a seed's landmark (`None` = nothing there) satisfies one user mark.
///
/// Church, sorcerer tower and township must match exactly. "Other structure"
/// only requires that something stands there, whatever its type. "Absent"
/// rules out the three major types but tolerates minor structures.
pub fn mark_admits(user: LandmarkType, seed_mark: Option<LandmarkType>) -> bool {
    match user {
        LandmarkType::Unmarked => true,
        LandmarkType::Absent => !seed_mark.is_some_and(LandmarkType::is_major),
        LandmarkType::OtherStructure => seed_mark.is_some(),
        major => seed_mark == Some(major),
    }
}

pub fn is_consistent(seed: &SeedRecord, layout: &MapLayout, marks: &LandmarkStore) -> bool {
    layout
        .ids()
        .all(|coordinate| mark_admits(marks.get(coordinate), seed.landmark_at(coordinate)))
}

/// Keep the seeds consistent with every marked coordinate of `layout`, in input order.
pub fn filter_seeds<'a>(
    seeds: &[&'a SeedRecord],
    layout: &MapLayout,
    marks: &LandmarkStore,
) -> Vec<&'a SeedRecord> {
    seeds
        .iter()
        .copied()
        .filter(|seed| is_consistent(seed, layout, marks))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome<'a> {
    /// No selection yet, or the dataset has nothing for it.
    NotReady,
    Narrowing(Vec<&'a SeedRecord>),
    Resolved(&'a SeedRecord),
    Contradiction,
}

impl<'a> FilterOutcome<'a> {
    pub fn classify(base: &[&'a SeedRecord], survivors: Vec<&'a SeedRecord>) -> Self {
        if base.is_empty() {
            return FilterOutcome::NotReady;
        }
        match survivors.len() {
            0 => FilterOutcome::Contradiction,
            1 => FilterOutcome::Resolved(survivors[0]),
            _ => FilterOutcome::Narrowing(survivors),
        }
    }

    pub fn candidates(&self) -> Vec<&'a SeedRecord> {
        match self {
            FilterOutcome::Narrowing(seeds) => seeds.clone(),
            FilterOutcome::Resolved(seed) => vec![*seed],
            FilterOutcome::NotReady | FilterOutcome::Contradiction => Vec::new(),
        }
    }

    pub fn resolved(&self) -> Option<&'a SeedRecord> {
        match self {
            FilterOutcome::Resolved(seed) => Some(*seed),
            _ => None,
        }
    }
}
