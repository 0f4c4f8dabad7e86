//! Map compositing as data: a [`RenderPlan`] lists every draw operation for a
//! resolved seed, back to front. [`crate::draw::execute`] plays it onto a surface.

use serde::Serialize;

use crate::assets::{self, AssetRemap};
use crate::landmark::{Point, SeedId};
use crate::render_data::{NO_EXTRA, RenderDataset};

/// The composed canvas is shown at this fraction of its native size.
pub const DISPLAY_SCALE: f64 = 0.2;
/// Used when the background image cannot be loaded.
pub const FALLBACK_CANVAS_SIZE: (f64, f64) = (4608.0, 4608.0);

pub const NIGHT_LABEL_FONT: &str = "95px Arial";
pub const NIGHT_LABEL_COLOR: &str = "#781EF0";
pub const EXTRA_LABEL_DY: f64 = 100.0;

pub const STRUCTURE_LABEL_FONT: &str = "65px Arial";
pub const STRUCTURE_LABEL_COLOR: &str = "#FFFF00";
pub const STRUCTURE_LABEL_SHADOW: &str = "black";
/// Labels sit below the structure icon.
pub const STRUCTURE_LABEL_DY: f64 = 80.0;

pub const EVENT_FONT: &str = "160px Arial";
pub const EVENT_ORIGIN: Point = Point::new(1200.0, 4300.0);
pub const EVENT_COLOR: &str = "#FFFFFF";
pub const EVENT_SHADOW: &str = "#730FE6";
pub const EVENT_SHADOW_OFFSET: f64 = 15.0;
/// Event flags whose line also names the secondary event value.
pub const EVENT_FLAGS_WITH_VALUE: [i64; 2] = [7705, 7725];

/// Structure labels in the eastern castle cluster overlap each other; shift them left.
pub const LABEL_NUDGE_COORDINATES: [i64; 3] = [131, 132, 133];
pub const LABEL_NUDGE_DX: f64 = -140.0;

const NIGHT_LABEL_OUTLINE: [(f64, &str); 6] = [
    (-3.0, "white"),
    (-1.0, "white"),
    (1.0, "black"),
    (3.0, "black"),
    (5.0, "black"),
    (7.0, "black"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Background,
    Nightlord,
    Treasure,
    Reward,
    Start,
    Structure,
    NightCircle,
    NightLabel,
    StructureLabel,
    Event,
}

impl Layer {
    pub const fn as_str(self) -> &'static str {
        match self {
            Layer::Background => "background",
            Layer::Nightlord => "nightlord",
            Layer::Treasure => "treasure",
            Layer::Reward => "reward",
            Layer::Start => "start",
            Layer::Structure => "structure",
            Layer::NightCircle => "night_circle",
            Layer::NightLabel => "night_label",
            Layer::StructureLabel => "structure_label",
            Layer::Event => "event",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Blend {
    #[default]
    SourceOver,
    Lighter,
}

impl Blend {
    /// Canvas `globalCompositeOperation` value.
    pub const fn composite_operation(self) -> &'static str {
        match self {
            Blend::SourceOver => "source-over",
            Blend::Lighter => "lighter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Full-canvas overlay drawn at (0, 0).
    Origin,
    /// Image centre lands on the point.
    Centered { at: Point },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOp {
    pub layer: Layer,
    pub url: String,
    pub blend: Blend,
    pub placement: Placement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
}

impl TextAlign {
    /// Canvas `textAlign` value.
    pub const fn canvas_value(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBaseline {
    Top,
    Middle,
}

impl TextBaseline {
    pub const fn canvas_value(self) -> &'static str {
        match self {
            TextBaseline::Top => "top",
            TextBaseline::Middle => "middle",
        }
    }
}

/// One fill of the text, offset from the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextPass {
    pub dx: f64,
    pub dy: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextOp {
    pub layer: Layer,
    pub text: String,
    pub at: Point,
    pub font: &'static str,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    /// Drawn in order; the last pass is the main fill.
    pub passes: Vec<TextPass>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Image(ImageOp),
    Text(TextOp),
}

impl DrawOp {
    pub fn layer(&self) -> Layer {
        match self {
            DrawOp::Image(op) => op.layer,
            DrawOp::Text(op) => op.layer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub seed_id: SeedId,
    /// Sets the canvas to the image's native size.
    pub background_url: String,
    pub fallback_size: (f64, f64),
    pub ops: Vec<DrawOp>,
    pub display_scale: f64,
    /// Coordinate indices referenced by the seed but missing from the coordinate table.
    pub unplaced_coordinates: Vec<i64>,
}

impl RenderPlan {
    /// Every distinct image URL, background first, for prefetching.
    pub fn image_urls(&self) -> Vec<&str> {
        let mut urls = vec![self.background_url.as_str()];
        for op in &self.ops {
            if let DrawOp::Image(image) = op
                && !urls.contains(&image.url.as_str())
            {
                urls.push(image.url.as_str());
            }
        }
        urls
    }
}

/// Build the layered plan for one seed. `None` when `maps` has no entry for it.
pub fn plan(data: &RenderDataset, remap: &AssetRemap, seed_id: SeedId) -> Option<RenderPlan> {
    let attrs = data.attributes(seed_id)?;
    let mut ops = Vec::new();
    let mut unplaced = Vec::new();

    let overlay = |layer, file: String, blend| {
        DrawOp::Image(ImageOp {
            layer,
            url: remap.static_url(&file),
            blend,
            placement: Placement::Origin,
        })
    };

    if let Some(nightlord) = attrs.nightlord {
        ops.push(overlay(
            Layer::Nightlord,
            assets::nightlord_file(nightlord),
            Blend::Lighter,
        ));
    }
    ops.push(overlay(
        Layer::Treasure,
        assets::treasure_file(assets::treasure_code(attrs.treasure, attrs.background)),
        Blend::SourceOver,
    ));
    if attrs.reward != 0 {
        ops.push(overlay(
            Layer::Reward,
            assets::reward_file(attrs.reward),
            Blend::SourceOver,
        ));
    }
    ops.push(overlay(
        Layer::Start,
        assets::start_file(attrs.start),
        Blend::SourceOver,
    ));

    let constructs = data.constructs(seed_id);
    for construct in constructs {
        let Some(at) = data.coordinate(construct.coordinate) else {
            unplaced.push(construct.coordinate);
            continue;
        };
        ops.push(DrawOp::Image(ImageOp {
            layer: Layer::Structure,
            url: remap.static_url(&assets::construct_file(construct.kind)),
            blend: Blend::SourceOver,
            placement: Placement::Centered { at },
        }));
    }

    let cycles = [
        ("DAY1", attrs.day1_location, attrs.day1_boss, attrs.day1_extra),
        ("DAY2", attrs.day2_location, attrs.day2_boss, attrs.day2_extra),
    ];
    let placed_cycles: Vec<_> = cycles
        .iter()
        .filter_map(|&(tag, location, boss, extra)| {
            data.coordinate(location).map(|at| (tag, at, boss, extra))
        })
        .collect();

    for &(_, at, _, _) in &placed_cycles {
        ops.push(DrawOp::Image(ImageOp {
            layer: Layer::NightCircle,
            url: remap.static_url(assets::NIGHT_CIRCLE_FILE),
            blend: Blend::SourceOver,
            placement: Placement::Centered { at },
        }));
    }
    for &(tag, at, boss, extra) in &placed_cycles {
        if let Some(name) = data.name(boss) {
            ops.push(DrawOp::Text(night_label(format!("{tag} {name}"), at, true)));
        }
        if extra != NO_EXTRA
            && let Some(name) = data.name(extra)
        {
            let below = Point::new(at.x, at.y + EXTRA_LABEL_DY);
            ops.push(DrawOp::Text(night_label(name.to_owned(), below, false)));
        }
    }

    for construct in constructs {
        let (Some(at), Some(name)) = (data.coordinate(construct.coordinate), data.name(construct.kind))
        else {
            continue;
        };
        ops.push(DrawOp::Text(structure_label(
            name.to_owned(),
            structure_label_anchor(construct.coordinate, at),
        )));
    }

    ops.push(DrawOp::Text(event_line(data, attrs.event_flag, attrs.event_value)));

    Some(RenderPlan {
        seed_id,
        background_url: remap.static_url(&assets::background_file(attrs.background)),
        fallback_size: FALLBACK_CANVAS_SIZE,
        ops,
        display_scale: DISPLAY_SCALE,
        unplaced_coordinates: unplaced,
    })
}

/// Primary labels get a diagonal outline; extra labels repeat the x offsets on one line.
fn night_label(text: String, at: Point, diagonal: bool) -> TextOp {
    let mut passes: Vec<TextPass> = NIGHT_LABEL_OUTLINE
        .iter()
        .map(|&(offset, color)| TextPass {
            dx: offset,
            dy: if diagonal { offset } else { 0.0 },
            color,
        })
        .collect();
    passes.push(TextPass {
        dx: 0.0,
        dy: 0.0,
        color: NIGHT_LABEL_COLOR,
    });
    TextOp {
        layer: Layer::NightLabel,
        text,
        at,
        font: NIGHT_LABEL_FONT,
        align: TextAlign::Center,
        baseline: TextBaseline::Middle,
        passes,
    }
}

pub fn structure_label_anchor(coordinate: i64, at: Point) -> Point {
    let dx = if LABEL_NUDGE_COORDINATES.contains(&coordinate) {
        LABEL_NUDGE_DX
    } else {
        0.0
    };
    Point::new(at.x + dx, at.y + STRUCTURE_LABEL_DY)
}

fn structure_label(text: String, at: Point) -> TextOp {
    let shadow = |d: f64| TextPass {
        dx: d,
        dy: d,
        color: STRUCTURE_LABEL_SHADOW,
    };
    TextOp {
        layer: Layer::StructureLabel,
        text,
        at,
        font: STRUCTURE_LABEL_FONT,
        align: TextAlign::Center,
        baseline: TextBaseline::Middle,
        passes: vec![
            shadow(4.0),
            shadow(-4.0),
            TextPass {
                dx: 0.0,
                dy: 0.0,
                color: STRUCTURE_LABEL_COLOR,
            },
        ],
    }
}

pub fn event_text(data: &RenderDataset, flag: i64, value: i64) -> String {
    let flag_name = data.name_or_code(flag);
    if EVENT_FLAGS_WITH_VALUE.contains(&flag) {
        format!("Special event: {flag_name} {}", data.name_or_code(value))
    } else {
        format!("Special event: {flag_name}")
    }
}

fn event_line(data: &RenderDataset, flag: i64, value: i64) -> TextOp {
    TextOp {
        layer: Layer::Event,
        text: event_text(data, flag, value),
        at: EVENT_ORIGIN,
        font: EVENT_FONT,
        align: TextAlign::Left,
        baseline: TextBaseline::Top,
        passes: vec![
            TextPass {
                dx: EVENT_SHADOW_OFFSET,
                dy: EVENT_SHADOW_OFFSET,
                color: EVENT_SHADOW,
            },
            TextPass {
                dx: 0.0,
                dy: 0.0,
                color: EVENT_COLOR,
            },
        ],
    }
}
