use std::sync::Arc;

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use seedmap_shared::{Generation, RenderDataset, SeedId, Session};

use crate::compositor::{self, fit_scale, native_buffer};
use crate::location;

/// Pause between resolving a seed and starting its composite, so the success panel is readable.
pub const COMPOSITE_DELAY_MS: u32 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Narrowed down by the user's marks.
    Recognized,
    /// Typed into the seed-id box or taken from the URL hash.
    Lookup,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Empty,
    Pending { seed_id: SeedId },
    Rendering { seed_id: SeedId, origin: Origin },
    Done { seed_id: SeedId, origin: Origin, missing_layers: usize },
    Failed { seed_id: SeedId, origin: Origin, message: String },
}

impl ResultView {
    pub fn origin(&self) -> Option<Origin> {
        match self {
            ResultView::Empty => None,
            ResultView::Pending { .. } => Some(Origin::Recognized),
            ResultView::Rendering { origin, .. }
            | ResultView::Done { origin, .. }
            | ResultView::Failed { origin, .. } => Some(*origin),
        }
    }

    pub fn caption(&self) -> Option<String> {
        match self {
            ResultView::Empty => None,
            ResultView::Pending { seed_id } => Some(format!("Preparing map for seed {seed_id}…")),
            ResultView::Rendering { seed_id, .. } => Some(format!("Rendering seed {seed_id}…")),
            ResultView::Done {
                seed_id,
                missing_layers: 0,
                ..
            } => Some(format!("Seed {seed_id}")),
            ResultView::Done {
                seed_id,
                missing_layers,
                ..
            } => Some(format!(
                "Seed {seed_id} ({missing_layers} layer{} missing)",
                if *missing_layers == 1 { "" } else { "s" }
            )),
            ResultView::Failed {
                seed_id, message, ..
            } => Some(format!("Seed {seed_id}: {message}")),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct ResultState(pub RwSignal<ResultView>);
#[derive(Clone, Copy)]
pub(crate) struct ResultCanvas(pub NodeRef<leptos::html::Canvas>);
#[derive(Clone, Copy)]
pub(crate) struct FullscreenOpen(pub RwSignal<bool>);

/// Handle for starting and cancelling composites.
#[derive(Clone, Copy)]
pub(crate) struct Renderer {
    pub session: RwSignal<Session>,
    pub render_data: RwSignal<Option<Arc<RenderDataset>>>,
    pub result: RwSignal<ResultView>,
    /// Bumped by every request; a request only paints while it holds the latest value.
    pub nonce: RwSignal<u64>,
    pub canvas: NodeRef<leptos::html::Canvas>,
}

impl Renderer {
    fn next_request(self) -> u64 {
        let request = self.nonce.get_untracked().wrapping_add(1);
        self.nonce.set(request);
        request
    }

    /// Drop whatever is pending or shown for a recognized seed.
    pub fn cancel_recognized(self) {
        if self.result.with_untracked(ResultView::origin) == Some(Origin::Recognized) {
            self.next_request();
            self.result.set(ResultView::Empty);
            compositor::clear_native_buffer();
        }
    }

    /// Composite a seed the marks resolved to, after the success-panel delay.
    /// Any session mutation in the meantime cancels it.
    pub fn schedule_recognized(self, seed_id: SeedId, token: Generation) {
        let request = self.next_request();
        self.result.set(ResultView::Pending { seed_id });
        let session = self.session;
        let nonce = self.nonce;
        let is_current = move || {
            nonce.get_untracked() == request && session.with_untracked(|s| s.is_current(token))
        };
        wasm_bindgen_futures::spawn_local(async move {
            TimeoutFuture::new(COMPOSITE_DELAY_MS).await;
            if !is_current() {
                return;
            }
            self.run(seed_id, Origin::Recognized, is_current).await;
        });
    }

    /// Composite any seed straight away.
    pub fn lookup(self, seed_id: SeedId) {
        let request = self.next_request();
        let nonce = self.nonce;
        let is_current = move || nonce.get_untracked() == request;
        wasm_bindgen_futures::spawn_local(async move {
            self.run(seed_id, Origin::Lookup, is_current).await;
        });
    }

    async fn run(self, seed_id: SeedId, origin: Origin, is_current: impl Fn() -> bool) {
        let Some(data) = self.render_data.get_untracked() else {
            self.result.set(ResultView::Failed {
                seed_id,
                origin,
                message: "map data not loaded".to_owned(),
            });
            return;
        };
        let Some(target) = self.canvas.get_untracked() else {
            return;
        };

        self.result.set(ResultView::Rendering { seed_id, origin });
        match compositor::render_seed(data, seed_id, target, &is_current).await {
            Ok(Some(report)) => {
                self.result.set(ResultView::Done {
                    seed_id,
                    origin,
                    missing_layers: report.missing().count(),
                });
                if origin == Origin::Lookup {
                    location::publish_seed(seed_id);
                }
            }
            Ok(None) => {}
            Err(message) => {
                if is_current() {
                    web_sys::console::warn_1(&format!("seed {seed_id}: {message}").into());
                    self.result.set(ResultView::Failed {
                        seed_id,
                        origin,
                        message,
                    });
                }
            }
        }
    }
}

/// The composited map, shown downscaled, with a fullscreen toggle.
#[component]
pub fn ResultPanel() -> impl IntoView {
    let ResultState(result) = expect_context();
    let ResultCanvas(canvas_ref) = expect_context();
    let FullscreenOpen(fullscreen) = expect_context();

    let has_image = move || matches!(result.get(), ResultView::Done { .. });

    view! {
        <div style="display: flex; flex-direction: column; gap: 8px; align-items: flex-start;">
            {move || {
                result.get().caption().map(|caption| {
                    let failed = matches!(result.get_untracked(), ResultView::Failed { .. });
                    view! {
                        <div style:color=if failed { "#e06c5a" } else { "#e2e0d8" } style="font-family: 'JetBrains Mono', monospace; font-size: 0.8rem;">
                            {caption}
                        </div>
                    }
                })
            }}
            <canvas
                node_ref=canvas_ref
                style:display=move || if has_image() { "block" } else { "none" }
                style="border: 1px solid #282c3e; border-radius: 6px; cursor: zoom-in;"
                on:click=move |_| fullscreen.set(true)
            />
            <button
                style:display=move || if has_image() { "inline-block" } else { "none" }
                style="padding: 4px 10px; background: #13161f; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 4px; cursor: pointer; font-size: 0.75rem;"
                on:click=move |_| fullscreen.set(true)
            >
                "Fullscreen"
            </button>
        </div>
        <FullscreenView />
    }
}

/// Overlay that redraws the native-resolution buffer, fitted to the window or at 1:1.
#[component]
fn FullscreenView() -> impl IntoView {
    let FullscreenOpen(open) = expect_context();
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let actual_size: RwSignal<bool> = RwSignal::new(false);

    Effect::new(move || {
        if !open.get() {
            actual_size.set(false);
            return;
        }
        let actual = actual_size.get();
        let Some(target) = canvas_ref.get() else {
            return;
        };
        let Some(buffer) = native_buffer() else {
            open.set(false);
            return;
        };
        let native = (buffer.canvas.width() as f64, buffer.canvas.height() as f64);
        let scale = if actual {
            1.0
        } else {
            fit_scale(native, crate::app::viewport_size())
        };
        if let Err(e) = compositor::present(&buffer.canvas, &target, scale) {
            web_sys::console::warn_1(&format!("fullscreen seed {}: {e}", buffer.seed_id).into());
        }
    });

    view! {
        <div
            style:display=move || if open.get() { "flex" } else { "none" }
            style:align-items=move || if actual_size.get() { "flex-start" } else { "center" }
            style="position: fixed; inset: 0; z-index: 50; background: rgba(6,7,12,0.94); justify-content: center; overflow: auto;"
        >
            <canvas
                node_ref=canvas_ref
                style:cursor=move || if actual_size.get() { "zoom-out" } else { "zoom-in" }
                on:click=move |_| actual_size.update(|v| *v = !*v)
            />
            <button
                title="Close"
                style="position: fixed; top: 16px; right: 16px; width: 32px; height: 32px; background: #13161f; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 6px; cursor: pointer; font-size: 1.1rem; line-height: 1;"
                on:click=move |_| open.set(false)
            >
                "\u{00D7}"
            </button>
        </div>
    }
}
