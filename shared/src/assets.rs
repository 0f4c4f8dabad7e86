//! Asset naming and the duplicate-asset remap table.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::landmark::LandmarkType;

pub const STATIC_BASE: &str = "/static";
pub const NIGHT_CIRCLE_FILE: &str = "night_circle.png";

const BUILTIN_DEDUP: &str = include_str!("../data/asset_dedup.json");

pub fn background_file(code: i64) -> String {
    format!("background_{code}.png")
}

pub fn nightlord_file(code: i64) -> String {
    format!("nightlord_{code}.png")
}

/// Treasure images are keyed by treasure code and background variant together.
/// Out-of-range codes saturate; they only ever name a missing file.
pub fn treasure_code(treasure: i64, background: i64) -> i64 {
    treasure.saturating_mul(10).saturating_add(background)
}

pub fn treasure_file(code: i64) -> String {
    format!("treasure_{code}.png")
}

pub fn reward_file(code: i64) -> String {
    format!("RotRew_{code}.png")
}

pub fn start_file(code: i64) -> String {
    format!("Start_{code}.png")
}

pub fn construct_file(kind: i64) -> String {
    format!("Construct_{kind}.png")
}

/// Marker icon for the interactive canvas, when the type has one.
pub fn poi_icon_url(mark: LandmarkType) -> Option<&'static str> {
    match mark {
        LandmarkType::Church => Some("/poi-assets/church.png"),
        LandmarkType::SorcererTower => Some("/poi-assets/mage-tower.png"),
        LandmarkType::Township => Some("/poi-assets/village.png"),
        _ => None,
    }
}

/// Maps every file of a group of byte-identical images to the group's first entry.
#[derive(Debug, Clone, Default)]
pub struct AssetRemap {
    representative: HashMap<String, String>,
}

impl AssetRemap {
    pub fn from_groups(groups: Vec<Vec<String>>) -> Self {
        let mut representative = HashMap::new();
        for group in groups {
            let Some(first) = group.first().cloned() else {
                continue;
            };
            for file in group.into_iter().skip(1) {
                representative.insert(file, first.clone());
            }
        }
        Self { representative }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let groups: Vec<Vec<String>> = serde_json::from_str(raw)?;
        Ok(Self::from_groups(groups))
    }

    /// Table compiled into the crate, parsed on first use.
    pub fn builtin() -> &'static AssetRemap {
        static REMAP: OnceLock<AssetRemap> = OnceLock::new();
        REMAP.get_or_init(|| Self::from_json(BUILTIN_DEDUP).unwrap_or_default())
    }

    pub fn resolve<'a>(&'a self, file: &'a str) -> &'a str {
        self.representative
            .get(file)
            .map(String::as_str)
            .unwrap_or(file)
    }

    pub fn static_url(&self, file: &str) -> String {
        format!("{STATIC_BASE}/{}", self.resolve(file))
    }

}
