use seedmap_shared::assets::poi_icon_url;
use seedmap_shared::{CoordinateId, ICON_SIZE, LandmarkType, MapLayout, Point};

pub const UNMARKED_DOT_RADIUS: f64 = 7.0;

/// Right-click menu entries, top to bottom. Church stays on left click.
pub const MENU_ENTRIES: [LandmarkType; 5] = [
    LandmarkType::SorcererTower,
    LandmarkType::Township,
    LandmarkType::OtherStructure,
    LandmarkType::Absent,
    LandmarkType::Unmarked,
];

/// Map a pointer offset inside the element (CSS pixels) onto the canvas backing buffer.
pub fn scale_pointer(
    offset_x: f64,
    offset_y: f64,
    css_size: (f64, f64),
    canvas_size: (f64, f64),
) -> Point {
    let (css_w, css_h) = css_size;
    if css_w <= 0.0 || css_h <= 0.0 {
        return Point::new(offset_x, offset_y);
    }
    Point::new(
        offset_x * canvas_size.0 / css_w,
        offset_y * canvas_size.1 / css_h,
    )
}

/// Coordinate whose marker circle contains `p`. Overlapping markers resolve to the nearest centre.
pub fn hit_test(layout: &MapLayout, p: Point) -> Option<CoordinateId> {
    let radius = ICON_SIZE / 2.0;
    let radius_sq = radius * radius;
    layout
        .points
        .iter()
        .map(|point| {
            let dx = point.pos.x - p.x;
            let dy = point.pos.y - p.y;
            (point.id, dx * dx + dy * dy)
        })
        .filter(|&(_, dist_sq)| dist_sq <= radius_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub radius: f64,
    /// Disc colour, also drawn while the icon is still loading.
    pub fill: &'static str,
    pub stroke: &'static str,
    pub icon: Option<&'static str>,
    pub text: Option<&'static str>,
}

pub fn glyph(mark: LandmarkType) -> Glyph {
    let disc = |fill| Glyph {
        radius: ICON_SIZE / 2.0,
        fill,
        stroke: "#1b1b1b",
        icon: poi_icon_url(mark),
        text: None,
    };
    match mark {
        LandmarkType::Unmarked => Glyph {
            radius: UNMARKED_DOT_RADIUS,
            fill: "#ff8c1a",
            stroke: "#3a1f00",
            icon: None,
            text: None,
        },
        LandmarkType::Church => disc("#d9a441"),
        LandmarkType::SorcererTower => disc("#4f7cff"),
        LandmarkType::Township => disc("#3fae5a"),
        LandmarkType::OtherStructure => disc("#8a8a8a"),
        LandmarkType::Absent => Glyph {
            text: Some("?"),
            ..disc("#555555")
        },
    }
}

pub fn menu_label(mark: LandmarkType) -> &'static str {
    match mark {
        LandmarkType::Unmarked => "Unmark",
        other => other.label(),
    }
}
