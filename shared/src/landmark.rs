use std::fmt;

use serde::{Deserialize, Serialize};

pub type SeedId = u32;
pub type CoordinateId = u32;

/// Top-level map-generation category a seed belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Nightlord {
    Gladius,
    Adel,
    Gnoster,
    Maris,
    Libra,
    Fulghor,
    Caligo,
    Heolstor,
}

impl Nightlord {
    pub const ALL: [Nightlord; 8] = [
        Nightlord::Gladius,
        Nightlord::Adel,
        Nightlord::Gnoster,
        Nightlord::Maris,
        Nightlord::Libra,
        Nightlord::Fulghor,
        Nightlord::Caligo,
        Nightlord::Heolstor,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Nightlord::Gladius => "Gladius",
            Nightlord::Adel => "Adel",
            Nightlord::Gnoster => "Gnoster",
            Nightlord::Maris => "Maris",
            Nightlord::Libra => "Libra",
            Nightlord::Fulghor => "Fulghor",
            Nightlord::Caligo => "Caligo",
            Nightlord::Heolstor => "Heolstor",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = normalize_label(raw);
        Self::ALL
            .into_iter()
            .find(|nightlord| normalize_label(nightlord.as_str()) == wanted)
    }
}

impl fmt::Display for Nightlord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Nightlord {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown nightlord `{value}`"))
    }
}

impl From<Nightlord> for String {
    fn from(value: Nightlord) -> Self {
        value.as_str().to_owned()
    }
}

/// Terrain variant. Each one has its own fixed coordinate layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MapType {
    Default,
    Mountaintop,
    Crater,
    RottedWoods,
    Noklateo,
}

impl MapType {
    pub const ALL: [MapType; 5] = [
        MapType::Default,
        MapType::Mountaintop,
        MapType::Crater,
        MapType::RottedWoods,
        MapType::Noklateo,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            MapType::Default => "Default",
            MapType::Mountaintop => "Mountaintop",
            MapType::Crater => "Crater",
            MapType::RottedWoods => "Rotted Woods",
            MapType::Noklateo => "Noklateo",
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            MapType::Default => "default",
            MapType::Mountaintop => "mountaintop",
            MapType::Crater => "crater",
            MapType::RottedWoods => "rotted-woods",
            MapType::Noklateo => "noklateo",
        }
    }

    /// Accepts display names, slugs and the spaced/underscored spellings found in datasets.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = normalize_label(raw);
        Self::ALL
            .into_iter()
            .find(|map_type| normalize_label(map_type.as_str()) == wanted)
    }

    /// Preview image shown under the marking canvas.
    pub fn preview_asset(self) -> String {
        format!("/static/preview_{}.png", self.slug())
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MapType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown map type `{value}`"))
    }
}

impl From<MapType> for String {
    fn from(value: MapType) -> Self {
        value.as_str().to_owned()
    }
}

fn normalize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Classification of one coordinate.
///
/// User marks use every variant. Seed records only ever hold `Church`,
/// `SorcererTower`, `Township` or `OtherStructure`; a coordinate with nothing
/// on it is simply absent from the seed's landmark map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkType {
    #[default]
    Unmarked,
    Church,
    SorcererTower,
    Township,
    OtherStructure,
    Absent,
}

impl LandmarkType {
    pub const fn is_marked(self) -> bool {
        !matches!(self, LandmarkType::Unmarked)
    }

    /// Church, sorcerer tower and township are matched exactly by the filter.
    pub const fn is_major(self) -> bool {
        matches!(
            self,
            LandmarkType::Church | LandmarkType::SorcererTower | LandmarkType::Township
        )
    }

    /// Map a dataset type string. `None` means nothing stands at the coordinate.
    pub fn from_dataset(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "nothing" | "none" | "empty" => None,
            "church" => Some(LandmarkType::Church),
            "mage" | "sorcerer" | "sorcerer_tower" | "sorcerers_rise" | "tower" => {
                Some(LandmarkType::SorcererTower)
            }
            "village" | "township" => Some(LandmarkType::Township),
            _ => Some(LandmarkType::OtherStructure),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LandmarkType::Unmarked => "Unmarked",
            LandmarkType::Church => "Church",
            LandmarkType::SorcererTower => "Sorcerer's Rise",
            LandmarkType::Township => "Township",
            LandmarkType::OtherStructure => "Other structure",
            LandmarkType::Absent => "Nothing here",
        }
    }
}

/// Pixel position in whatever space the owning dataset uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
