use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::DatasetError;
use crate::landmark::{Point, SeedId};

/// Per-seed attribute bag from `maps.json`. Codes index into [`RenderDataset::names`]
/// or the coordinate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapAttributes {
    #[serde(rename = "Special", default)]
    pub background: i64,
    #[serde(rename = "NightLord", default)]
    pub nightlord: Option<i64>,
    #[serde(rename = "Treasure_800", default)]
    pub treasure: i64,
    #[serde(rename = "RotRew_500", default)]
    pub reward: i64,
    #[serde(rename = "Start_190", default)]
    pub start: i64,
    #[serde(rename = "Day1Boss", default)]
    pub day1_boss: i64,
    #[serde(rename = "Day2Boss", default)]
    pub day2_boss: i64,
    #[serde(rename = "Day1Loc", default)]
    pub day1_location: i64,
    #[serde(rename = "Day2Loc", default)]
    pub day2_location: i64,
    #[serde(rename = "extra1", default = "no_extra")]
    pub day1_extra: i64,
    #[serde(rename = "extra2", default = "no_extra")]
    pub day2_extra: i64,
    #[serde(rename = "EventFlag", default)]
    pub event_flag: i64,
    #[serde(rename = "Event_30*0", default)]
    pub event_value: i64,
}

/// `-1` marks a missing extra label.
pub const NO_EXTRA: i64 = -1;

fn no_extra() -> i64 {
    NO_EXTRA
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructPlacement {
    #[serde(rename = "type")]
    pub kind: i64,
    #[serde(rename = "coord_index", alias = "coordinateIndex")]
    pub coordinate: i64,
}

/// Parsed `maps.json`: `maps`, `constructs`, `coordinates` and `names`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderDataset {
    #[serde(default)]
    maps: HashMap<SeedId, MapAttributes>,
    #[serde(default)]
    constructs: HashMap<SeedId, Vec<ConstructPlacement>>,
    #[serde(default, deserialize_with = "pair_points")]
    coordinates: HashMap<i64, Point>,
    #[serde(default)]
    names: HashMap<i64, String>,
}

fn pair_points<'de, D>(deserializer: D) -> Result<HashMap<i64, Point>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<i64, (f64, f64)>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(index, (x, y))| (index, Point::new(x, y)))
        .collect())
}

impl RenderDataset {
    pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, DatasetError> {
        Ok(serde_json::from_slice(raw)?)
    }

    pub fn attributes(&self, seed_id: SeedId) -> Option<&MapAttributes> {
        self.maps.get(&seed_id)
    }

    pub fn constructs(&self, seed_id: SeedId) -> &[ConstructPlacement] {
        self.constructs
            .get(&seed_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn coordinate(&self, index: i64) -> Option<Point> {
        self.coordinates.get(&index).copied()
    }

    pub fn name(&self, code: i64) -> Option<&str> {
        self.names.get(&code).map(String::as_str)
    }

    /// Name for `code`, or the code itself as text.
    pub fn name_or_code(&self, code: i64) -> String {
        self.name(code)
            .map(str::to_owned)
            .unwrap_or_else(|| code.to_string())
    }

    pub fn seed_count(&self) -> usize {
        self.maps.len()
    }
}
