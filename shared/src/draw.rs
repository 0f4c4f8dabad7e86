use crate::compositor::{Blend, DrawOp, Layer, Placement, RenderPlan, TextOp};

/// Drawing target for a [`RenderPlan`].
pub trait Surface {
    type Image;

    fn resize(&mut self, width: f64, height: f64);
    fn image_size(&self, image: &Self::Image) -> (f64, f64);
    fn draw_image(&mut self, image: &Self::Image, x: f64, y: f64, blend: Blend);
    fn draw_text(&mut self, op: &TextOp);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerOutcome {
    Drawn,
    MissingAsset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerReport {
    pub layer: Layer,
    pub url: Option<String>,
    pub outcome: LayerOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeReport {
    pub width: f64,
    pub height: f64,
    pub layers: Vec<LayerReport>,
}

impl CompositeReport {
    pub fn missing(&self) -> impl Iterator<Item = &LayerReport> {
        self.layers
            .iter()
            .filter(|r| r.outcome == LayerOutcome::MissingAsset)
    }
}

/// Play `plan` onto `surface` in layer order.
///
/// `images` returns the decoded image for a URL, or `None` when it failed to
/// load. Missing images skip their layer; the rest of the plan still runs.
pub fn execute<S, F>(plan: &RenderPlan, mut images: F, surface: &mut S) -> CompositeReport
where
    S: Surface,
    F: FnMut(&str) -> Option<S::Image>,
{
    let mut layers = Vec::with_capacity(plan.ops.len() + 1);

    let background = images(&plan.background_url);
    let (width, height) = match &background {
        Some(image) => surface.image_size(image),
        None => plan.fallback_size,
    };
    surface.resize(width, height);
    layers.push(LayerReport {
        layer: Layer::Background,
        url: Some(plan.background_url.clone()),
        outcome: match background {
            Some(image) => {
                surface.draw_image(&image, 0.0, 0.0, Blend::SourceOver);
                LayerOutcome::Drawn
            }
            None => LayerOutcome::MissingAsset,
        },
    });

    for op in &plan.ops {
        match op {
            DrawOp::Image(op) => {
                let outcome = match images(&op.url) {
                    Some(image) => {
                        let (x, y) = match op.placement {
                            Placement::Origin => (0.0, 0.0),
                            Placement::Centered { at } => {
                                let (w, h) = surface.image_size(&image);
                                (at.x - w / 2.0, at.y - h / 2.0)
                            }
                        };
                        surface.draw_image(&image, x, y, op.blend);
                        LayerOutcome::Drawn
                    }
                    None => LayerOutcome::MissingAsset,
                };
                layers.push(LayerReport {
                    layer: op.layer,
                    url: Some(op.url.clone()),
                    outcome,
                });
            }
            DrawOp::Text(op) => {
                surface.draw_text(op);
                layers.push(LayerReport {
                    layer: op.layer,
                    url: None,
                    outcome: LayerOutcome::Drawn,
                });
            }
        }
    }

    CompositeReport {
        width,
        height,
        layers,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::assets::AssetRemap;
    use crate::compositor::plan;
    use crate::render_data::RenderDataset;
    use crate::render_data::fixtures::SMALL_MAPS;

    #[derive(Debug, PartialEq)]
    enum Call {
        Resize(f64, f64),
        Image(String, f64, f64, Blend),
        Text(String),
    }

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<Call>,
    }

    #[derive(Clone)]
    struct FakeImage {
        url: String,
        size: (f64, f64),
    }

    impl Surface for RecordingSurface {
        type Image = FakeImage;

        fn resize(&mut self, width: f64, height: f64) {
            self.calls.push(Call::Resize(width, height));
        }

        fn image_size(&self, image: &FakeImage) -> (f64, f64) {
            image.size
        }

        fn draw_image(&mut self, image: &FakeImage, x: f64, y: f64, blend: Blend) {
            self.calls.push(Call::Image(image.url.clone(), x, y, blend));
        }

        fn draw_text(&mut self, op: &TextOp) {
            self.calls.push(Call::Text(op.text.clone()));
        }
    }

    fn library(entries: &[(&str, (f64, f64))]) -> HashMap<String, FakeImage> {
        entries
            .iter()
            .map(|&(url, size)| {
                (
                    url.to_owned(),
                    FakeImage {
                        url: url.to_owned(),
                        size,
                    },
                )
            })
            .collect()
    }

    fn seed_101_plan() -> RenderPlan {
        let data = RenderDataset::from_json(SMALL_MAPS).expect("parse");
        plan(&data, &AssetRemap::default(), 101).expect("plan")
    }

    #[test]
    fn background_sets_native_size() {
        let plan = seed_101_plan();
        let images = library(&[("/static/background_3.png", (5000.0, 4800.0))]);
        let mut surface = RecordingSurface::default();
        let report = execute(&plan, |url| images.get(url).cloned(), &mut surface);

        assert_eq!((report.width, report.height), (5000.0, 4800.0));
        assert_eq!(surface.calls[0], Call::Resize(5000.0, 4800.0));
        assert_eq!(
            surface.calls[1],
            Call::Image("/static/background_3.png".into(), 0.0, 0.0, Blend::SourceOver)
        );
    }

    #[test]
    fn missing_assets_are_reported_and_skipped() {
        let plan = seed_101_plan();
        let images = library(&[
            ("/static/background_3.png", (5000.0, 5000.0)),
            ("/static/Construct_32000.png", (100.0, 60.0)),
        ]);
        let mut surface = RecordingSurface::default();
        let report = execute(&plan, |url| images.get(url).cloned(), &mut surface);

        assert!(surface.calls.contains(&Call::Image(
            "/static/Construct_32000.png".into(),
            1950.0,
            1970.0,
            Blend::SourceOver
        )));
        let missing: Vec<Layer> = report.missing().map(|r| r.layer).collect();
        assert_eq!(
            missing,
            vec![
                Layer::Nightlord,
                Layer::Treasure,
                Layer::Start,
                Layer::Structure,
                Layer::NightCircle,
                Layer::NightCircle,
            ]
        );
        assert_eq!(report.layers.len(), plan.ops.len() + 1);
    }

    #[test]
    fn missing_background_falls_back_and_continues() {
        let plan = seed_101_plan();
        let mut surface = RecordingSurface::default();
        let report = execute(&plan, |_| None, &mut surface);

        assert_eq!(surface.calls[0], Call::Resize(4608.0, 4608.0));
        assert_eq!(report.layers[0].outcome, LayerOutcome::MissingAsset);
        let texts = surface
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Text(_)))
            .count();
        assert_eq!(texts, 5);
        assert_eq!(
            surface.calls.last(),
            Some(&Call::Text("Special event: Shifting Earth Crater".into()))
        );
    }

    #[test]
    fn lighter_blend_reaches_the_surface() {
        let plan = seed_101_plan();
        let images = library(&[("/static/nightlord_2.png", (5000.0, 5000.0))]);
        let mut surface = RecordingSurface::default();
        execute(&plan, |url| images.get(url).cloned(), &mut surface);
        assert!(surface.calls.contains(&Call::Image(
            "/static/nightlord_2.png".into(),
            0.0,
            0.0,
            Blend::Lighter
        )));
    }
}
