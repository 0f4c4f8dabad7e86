use std::cell::RefCell;
use std::sync::Arc;

use seedmap_shared::compositor::{Blend, TextOp};
use seedmap_shared::draw::{CompositeReport, Surface, execute};
use seedmap_shared::{AssetRemap, RenderDataset, SeedId};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::images;

/// Full-resolution result of the last composite that reached the screen.
#[derive(Clone)]
pub struct NativeBuffer {
    pub seed_id: SeedId,
    pub canvas: HtmlCanvasElement,
}

thread_local! {
    static NATIVE_BUFFER: RefCell<Option<NativeBuffer>> = const { RefCell::new(None) };
}

pub fn native_buffer() -> Option<NativeBuffer> {
    NATIVE_BUFFER.with(|slot| slot.borrow().clone())
}

pub fn clear_native_buffer() {
    NATIVE_BUFFER.with(|slot| slot.borrow_mut().take());
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

/// Canvas 2D backend for the shared plan executor.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, String> {
        let ctx = context_2d(&canvas).ok_or_else(|| "2d context unavailable".to_owned())?;
        Ok(Self { canvas, ctx })
    }
}

impl Surface for CanvasSurface {
    type Image = HtmlImageElement;

    fn resize(&mut self, width: f64, height: f64) {
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
    }

    fn image_size(&self, image: &HtmlImageElement) -> (f64, f64) {
        (image.natural_width() as f64, image.natural_height() as f64)
    }

    fn draw_image(&mut self, image: &HtmlImageElement, x: f64, y: f64, blend: Blend) {
        self.ctx
            .set_global_composite_operation(blend.composite_operation())
            .ok();
        if let Err(err) = self.ctx.draw_image_with_html_image_element(image, x, y) {
            web_sys::console::warn_1(&format!("drawImage {}: {err:?}", image.src()).into());
        }
        if blend != Blend::SourceOver {
            self.ctx
                .set_global_composite_operation(Blend::SourceOver.composite_operation())
                .ok();
        }
    }

    fn draw_text(&mut self, op: &TextOp) {
        self.ctx.set_font(op.font);
        self.ctx.set_text_align(op.align.canvas_value());
        self.ctx.set_text_baseline(op.baseline.canvas_value());
        for pass in &op.passes {
            self.ctx.set_fill_style_str(pass.color);
            self.ctx
                .fill_text(&op.text, op.at.x + pass.dx, op.at.y + pass.dy)
                .ok();
        }
    }
}

fn create_canvas() -> Result<HtmlCanvasElement, String> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "no document".to_owned())?;
    document
        .create_element("canvas")
        .map_err(|e| format!("create canvas: {e:?}"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| "created element is not a canvas".to_owned())
}

/// Composite `seed_id` off-screen, then copy it onto `target` if `is_current` still holds.
///
/// Returns `Ok(None)` when the request was superseded. Images are fetched
/// concurrently and drawn in layer order; a missing image only skips its layer.
pub async fn render_seed(
    data: Arc<RenderDataset>,
    seed_id: SeedId,
    target: HtmlCanvasElement,
    is_current: impl Fn() -> bool,
) -> Result<Option<CompositeReport>, String> {
    let Some(plan) = seedmap_shared::plan(&data, AssetRemap::builtin(), seed_id) else {
        return Err(format!("unknown seed id {seed_id}"));
    };
    for coordinate in &plan.unplaced_coordinates {
        web_sys::console::warn_1(
            &format!("seed {seed_id}: coordinate {coordinate} has no position, skipped").into(),
        );
    }

    let loaded = images::load_all(&plan.image_urls()).await;
    if !is_current() {
        return Ok(None);
    }

    let offscreen = create_canvas()?;
    let mut surface = CanvasSurface::new(offscreen.clone())?;
    let report = execute(&plan, |url| loaded.get(url).cloned(), &mut surface);
    for layer in report.missing() {
        web_sys::console::warn_1(
            &format!(
                "seed {seed_id}: layer {} skipped, asset {} missing",
                layer.layer.as_str(),
                layer.url.as_deref().unwrap_or("-")
            )
            .into(),
        );
    }

    if !is_current() {
        return Ok(None);
    }
    present(&offscreen, &target, plan.display_scale)?;
    NATIVE_BUFFER.with(|slot| {
        *slot.borrow_mut() = Some(NativeBuffer {
            seed_id,
            canvas: offscreen,
        });
    });
    Ok(Some(report))
}

/// Copy `source` at native resolution into `target` and size its CSS box by `scale`.
pub fn present(source: &HtmlCanvasElement, target: &HtmlCanvasElement, scale: f64) -> Result<(), String> {
    target.set_width(source.width());
    target.set_height(source.height());
    let ctx = context_2d(target).ok_or_else(|| "2d context unavailable".to_owned())?;
    ctx.draw_image_with_html_canvas_element(source, 0.0, 0.0)
        .map_err(|e| format!("copy composite: {e:?}"))?;

    let style = target.style();
    style
        .set_property("width", &format!("{}px", display_px(source.width(), scale)))
        .ok();
    style
        .set_property("height", &format!("{}px", display_px(source.height(), scale)))
        .ok();
    Ok(())
}

pub fn display_px(native: u32, scale: f64) -> f64 {
    (native as f64 * scale).round()
}

/// Largest scale (at most 1) that fits a `native` image inside `viewport`.
pub fn fit_scale(native: (f64, f64), viewport: (f64, f64)) -> f64 {
    if native.0 <= 0.0 || native.1 <= 0.0 {
        return 1.0;
    }
    (viewport.0 / native.0).min(viewport.1 / native.1).clamp(0.01, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_size_follows_scale() {
        assert_eq!(display_px(4608, 0.2), 922.0);
        assert_eq!(display_px(1000, 1.0), 1000.0);
    }

    #[test]
    fn fit_scale_never_enlarges() {
        assert_eq!(fit_scale((4608.0, 4608.0), (1152.0, 2000.0)), 0.25);
        assert_eq!(fit_scale((400.0, 300.0), (1920.0, 1080.0)), 1.0);
        assert_eq!(fit_scale((0.0, 0.0), (800.0, 600.0)), 1.0);
    }
}
