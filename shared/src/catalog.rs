//! Seed dataset parsing and the in-memory Seed Catalog.
//!
//! The dataset is a map of seed keys to records of the form
//! `{seedNumber, nightlord, mapType, pois: {"<coord>": {coordinates: {x, y}, type}}}`.
//! It may be wrapped as `{"poiDatabase": {"seeds": …}}` or `{"seeds": …}`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::landmark::{CoordinateId, LandmarkType, MapType, Nightlord, Point, SeedId};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset has no seed table")]
    MissingSeeds,
    #[error("seed `{key}` is malformed: {reason}")]
    MalformedSeed { key: String, reason: String },
    #[error("seed id {0} appears more than once")]
    DuplicateSeed(SeedId),
}

/// Non-fatal problems found while indexing. The offending seed or landmark is skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogWarning {
    UnknownNightlord { seed_key: String, value: String },
    UnknownMapType { seed_key: String, value: String },
    BadCoordinateKey { seed_id: SeedId, key: String },
    ConflictingPosition { map_type: MapType, coordinate: CoordinateId },
}

impl std::fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogWarning::UnknownNightlord { seed_key, value } => {
                write!(f, "seed `{seed_key}` skipped: unknown nightlord `{value}`")
            }
            CatalogWarning::UnknownMapType { seed_key, value } => {
                write!(f, "seed `{seed_key}` skipped: unknown map type `{value}`")
            }
            CatalogWarning::BadCoordinateKey { seed_id, key } => {
                write!(f, "seed {seed_id}: landmark key `{key}` is not a coordinate id")
            }
            CatalogWarning::ConflictingPosition { map_type, coordinate } => {
                write!(f, "{map_type}: coordinate {coordinate} has conflicting positions")
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSeed {
    #[serde(rename = "seedNumber", alias = "seedId", alias = "seed_id")]
    seed_number: SeedId,
    nightlord: String,
    #[serde(rename = "mapType", alias = "map_type", alias = "map")]
    map_type: String,
    #[serde(default, alias = "landmarks")]
    pois: BTreeMap<String, RawLandmark>,
}

#[derive(Debug, Deserialize)]
struct RawLandmark {
    #[serde(default)]
    coordinates: Option<Point>,
    /// Missing or null reads as "nothing".
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// One immutable seed. `landmarks` holds only coordinates where something stands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRecord {
    pub seed_id: SeedId,
    pub nightlord: Nightlord,
    pub map_type: MapType,
    pub landmarks: BTreeMap<CoordinateId, LandmarkType>,
}

impl SeedRecord {
    pub fn landmark_at(&self, coordinate: CoordinateId) -> Option<LandmarkType> {
        self.landmarks.get(&coordinate).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutPoint {
    pub id: CoordinateId,
    pub pos: Point,
}

/// The fixed coordinate set of one map type, sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapLayout {
    pub points: Vec<LayoutPoint>,
}

impl MapLayout {
    pub fn contains(&self, coordinate: CoordinateId) -> bool {
        self.points
            .binary_search_by_key(&coordinate, |p| p.id)
            .is_ok()
    }

    pub fn ids(&self) -> impl Iterator<Item = CoordinateId> + '_ {
        self.points.iter().map(|p| p.id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SeedCatalog {
    seeds: Vec<SeedRecord>,
    by_id: HashMap<SeedId, usize>,
    by_group: HashMap<(Nightlord, MapType), Vec<usize>>,
    layouts: HashMap<MapType, MapLayout>,
    warnings: Vec<CatalogWarning>,
}

impl SeedCatalog {
    pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
        Self::from_slice(raw.as_bytes())
    }

    /// Parses raw bytes. Invalid UTF-8 is a JSON error, not replaced.
    pub fn from_slice(raw: &[u8]) -> Result<Self, DatasetError> {
        let value: Value = serde_json::from_slice(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> Result<Self, DatasetError> {
        let table = match value.pointer_mut("/poiDatabase/seeds").map(Value::take) {
            Some(seeds) => seeds,
            None => match value.get_mut("seeds").map(Value::take) {
                Some(seeds) => seeds,
                None => value,
            },
        };
        let Value::Object(entries) = table else {
            return Err(DatasetError::MissingSeeds);
        };

        let mut catalog = SeedCatalog::default();
        let mut positions: HashMap<MapType, BTreeMap<CoordinateId, Point>> = HashMap::new();

        for (key, entry) in entries {
            let raw: RawSeed =
                serde_json::from_value(entry).map_err(|e| DatasetError::MalformedSeed {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;
            let Some(nightlord) = Nightlord::parse(&raw.nightlord) else {
                catalog.warnings.push(CatalogWarning::UnknownNightlord {
                    seed_key: key,
                    value: raw.nightlord,
                });
                continue;
            };
            let Some(map_type) = MapType::parse(&raw.map_type) else {
                catalog.warnings.push(CatalogWarning::UnknownMapType {
                    seed_key: key,
                    value: raw.map_type,
                });
                continue;
            };
            if catalog.by_id.contains_key(&raw.seed_number) {
                return Err(DatasetError::DuplicateSeed(raw.seed_number));
            }

            let layout = positions.entry(map_type).or_default();
            let mut landmarks = BTreeMap::new();
            for (coord_key, landmark) in raw.pois {
                let Ok(coordinate) = coord_key.trim().parse::<CoordinateId>() else {
                    catalog.warnings.push(CatalogWarning::BadCoordinateKey {
                        seed_id: raw.seed_number,
                        key: coord_key,
                    });
                    continue;
                };
                if let Some(pos) = landmark.coordinates {
                    match layout.get(&coordinate) {
                        Some(existing) if *existing != pos => {
                            let warning = CatalogWarning::ConflictingPosition {
                                map_type,
                                coordinate,
                            };
                            if !catalog.warnings.contains(&warning) {
                                catalog.warnings.push(warning);
                            }
                        }
                        Some(_) => {}
                        None => {
                            layout.insert(coordinate, pos);
                        }
                    }
                }
                if let Some(kind) = landmark
                    .kind
                    .as_deref()
                    .and_then(LandmarkType::from_dataset)
                {
                    landmarks.insert(coordinate, kind);
                }
            }

            let index = catalog.seeds.len();
            catalog.by_id.insert(raw.seed_number, index);
            catalog
                .by_group
                .entry((nightlord, map_type))
                .or_default()
                .push(index);
            catalog.seeds.push(SeedRecord {
                seed_id: raw.seed_number,
                nightlord,
                map_type,
                landmarks,
            });
        }

        catalog.layouts = positions
            .into_iter()
            .map(|(map_type, points)| {
                let points = points
                    .into_iter()
                    .map(|(id, pos)| LayoutPoint { id, pos })
                    .collect();
                (map_type, MapLayout { points })
            })
            .collect();

        Ok(catalog)
    }

    /// Seeds of one group in dataset order. Empty when the group is unknown.
    pub fn seeds_for(&self, nightlord: Nightlord, map_type: MapType) -> Vec<&SeedRecord> {
        self.by_group
            .get(&(nightlord, map_type))
            .map(|indices| indices.iter().map(|&i| &self.seeds[i]).collect())
            .unwrap_or_default()
    }

    pub fn seed(&self, seed_id: SeedId) -> Option<&SeedRecord> {
        self.by_id.get(&seed_id).map(|&i| &self.seeds[i])
    }

    pub fn layout(&self, map_type: MapType) -> Option<&MapLayout> {
        self.layouts.get(&map_type)
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn warnings(&self) -> &[CatalogWarning] {
        &self.warnings
    }

    /// Seed counts per (nightlord, map type), sorted.
    pub fn group_sizes(&self) -> Vec<GroupSize> {
        let mut sizes: Vec<GroupSize> = self
            .by_group
            .iter()
            .map(|(&(nightlord, map_type), seeds)| GroupSize {
                nightlord,
                map_type,
                seeds: seeds.len(),
            })
            .collect();
        sizes.sort_by_key(|g| (g.nightlord, g.map_type));
        sizes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSize {
    pub nightlord: Nightlord,
    pub map_type: MapType,
    pub seeds: usize,
}

/// Load state of the catalog as seen by callers.
#[derive(Debug, Clone, Default)]
pub enum CatalogState {
    #[default]
    Loading,
    Ready(Arc<SeedCatalog>),
    Unavailable(String),
}

impl CatalogState {
    pub fn catalog(&self) -> Option<&SeedCatalog> {
        match self {
            CatalogState::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }

    /// Empty until the dataset is ready.
    pub fn seeds_for(&self, nightlord: Nightlord, map_type: MapType) -> Vec<&SeedRecord> {
        self.catalog()
            .map(|c| c.seeds_for(nightlord, map_type))
            .unwrap_or_default()
    }

    pub fn layout(&self, map_type: MapType) -> Option<&MapLayout> {
        self.catalog().and_then(|c| c.layout(map_type))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, CatalogState::Ready(_))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::SMALL_DATASET;
    use super::*;

    #[test]
    fn parses_wrapped_dataset_in_dataset_order() {
        let catalog = SeedCatalog::from_json(SMALL_DATASET).expect("parse");
        let ids: Vec<SeedId> = catalog
            .seeds_for(Nightlord::Gladius, MapType::Default)
            .iter()
            .map(|s| s.seed_id)
            .collect();
        assert_eq!(ids, vec![101, 102]);
        assert_eq!(catalog.len(), 3);
        assert!(catalog.warnings().is_empty());
    }

    #[test]
    fn accepts_plain_seeds_wrapper_and_aliases() {
        let raw = r#"{"seeds": {"a": {"seedId": 3, "nightlord": "libra", "mapType": "rotted_woods",
            "landmarks": {"1": {"coordinates": {"x": 1, "y": 2}, "type": "sorcerer"}}}}}"#;
        let catalog = SeedCatalog::from_json(raw).expect("parse");
        let seed = catalog.seed(3).expect("seed 3");
        assert_eq!(seed.nightlord, Nightlord::Libra);
        assert_eq!(seed.map_type, MapType::RottedWoods);
        assert_eq!(seed.landmark_at(1), Some(LandmarkType::SorcererTower));
    }

    #[test]
    fn accepts_bare_seed_map() {
        let raw = r#"{"x": {"seedNumber": 1, "nightlord": "Maris", "mapType": "Noklateo", "pois": {}}}"#;
        let catalog = SeedCatalog::from_json(raw).expect("parse");
        assert_eq!(catalog.seeds_for(Nightlord::Maris, MapType::Noklateo).len(), 1);
    }

    #[test]
    fn nothing_entries_are_excluded_from_landmarks_but_kept_in_layout() {
        let catalog = SeedCatalog::from_json(SMALL_DATASET).expect("parse");
        let seed = catalog.seed(102).expect("seed 102");
        assert_eq!(seed.landmark_at(5), None);
        let layout = catalog.layout(MapType::Default).expect("layout");
        assert_eq!(layout.ids().collect::<Vec<_>>(), vec![5, 9, 12]);
        assert_eq!(layout.points[0].pos, Point::new(100.0, 200.0));
    }

    #[test]
    fn null_or_missing_type_reads_as_nothing() {
        let raw = r#"{"seeds": {
            "a": {"seedNumber": 1, "nightlord": "Adel", "mapType": "Default", "pois": {
                "5": {"coordinates": {"x": 10, "y": 20}, "type": null},
                "6": {"coordinates": {"x": 30, "y": 40}},
                "7": {"coordinates": {"x": 50, "y": 60}, "type": "church"}
            }},
            "b": {"seedNumber": 2, "nightlord": "Adel", "mapType": "Default", "pois": {
                "5": {"coordinates": {"x": 10, "y": 20}, "type": "village"}
            }}
        }}"#;
        let catalog = SeedCatalog::from_json(raw).expect("null type must not fail the load");
        assert_eq!(catalog.len(), 2);
        let seed = catalog.seed(1).expect("seed 1");
        assert_eq!(seed.landmark_at(5), None);
        assert_eq!(seed.landmark_at(6), None);
        assert_eq!(seed.landmark_at(7), Some(LandmarkType::Church));
        let layout = catalog.layout(MapType::Default).expect("layout");
        assert_eq!(layout.ids().collect::<Vec<_>>(), vec![5, 6, 7]);
    }

    #[test]
    fn unknown_group_yields_empty_sequence() {
        let catalog = SeedCatalog::from_json(SMALL_DATASET).expect("parse");
        assert!(catalog.seeds_for(Nightlord::Caligo, MapType::Default).is_empty());
        assert!(catalog.seed(999).is_none());
    }

    #[test]
    fn duplicate_seed_ids_fail_the_load() {
        let raw = r#"{"seeds": {
            "a": {"seedNumber": 1, "nightlord": "Adel", "mapType": "Default", "pois": {}},
            "b": {"seedNumber": 1, "nightlord": "Adel", "mapType": "Crater", "pois": {}}
        }}"#;
        let err = SeedCatalog::from_json(raw).expect_err("duplicate");
        assert!(matches!(err, DatasetError::DuplicateSeed(1)));
    }

    #[test]
    fn unknown_nightlord_is_a_warning_not_an_error() {
        let raw = r#"{"seeds": {
            "a": {"seedNumber": 1, "nightlord": "Nobody", "mapType": "Default", "pois": {}},
            "b": {"seedNumber": 2, "nightlord": "Adel", "mapType": "Default", "pois": {"x": {"type": "church"}}}
        }}"#;
        let catalog = SeedCatalog::from_json(raw).expect("parse");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.warnings().len(), 2);
        assert!(matches!(
            catalog.warnings()[0],
            CatalogWarning::UnknownNightlord { .. }
        ));
        assert!(matches!(
            catalog.warnings()[1],
            CatalogWarning::BadCoordinateKey { seed_id: 2, .. }
        ));
    }

    #[test]
    fn non_object_table_is_rejected() {
        let err = SeedCatalog::from_json(r#"{"seeds": []}"#).expect_err("array");
        assert!(matches!(err, DatasetError::MissingSeeds));
        assert!(matches!(
            SeedCatalog::from_json("not json"),
            Err(DatasetError::Json(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_a_json_error() {
        let raw = b"{\"seeds\": {\"a\": {\"seedNumber\": 1, \"nightlord\": \"Ad\xffel\", \"mapType\": \"Default\"}}}";
        assert!(matches!(
            SeedCatalog::from_slice(raw),
            Err(DatasetError::Json(_))
        ));
    }

    #[test]
    fn catalog_state_is_empty_until_ready() {
        let loading = CatalogState::Loading;
        assert!(loading.seeds_for(Nightlord::Gladius, MapType::Default).is_empty());
        let failed = CatalogState::Unavailable("HTTP 404".into());
        assert!(failed.seeds_for(Nightlord::Gladius, MapType::Default).is_empty());

        let ready = CatalogState::Ready(Arc::new(
            SeedCatalog::from_json(SMALL_DATASET).expect("parse"),
        ));
        assert_eq!(ready.seeds_for(Nightlord::Gladius, MapType::Default).len(), 2);
    }

    #[test]
    fn group_sizes_are_sorted() {
        let catalog = SeedCatalog::from_json(SMALL_DATASET).expect("parse");
        let sizes = catalog.group_sizes();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[0].nightlord, Nightlord::Gladius);
        assert_eq!(sizes[0].seeds, 2);
        assert_eq!(sizes[1].nightlord, Nightlord::Adel);
    }
}
