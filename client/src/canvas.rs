use std::f64::consts::TAU;

use leptos::prelude::*;
use seedmap_shared::assets::poi_icon_url;
use seedmap_shared::{CANVAS_SIZE, CatalogState, CoordinateId, LandmarkType, MapLayout, Point, Session};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::app::{Catalog, MenuTarget, Notice, OpenMenu, SessionState};
use crate::compositor::context_2d;
use crate::images;
use crate::markers::{MENU_ENTRIES, glyph, hit_test, menu_label, scale_pointer};

const ICON_MARKS: [LandmarkType; 3] = [
    LandmarkType::Church,
    LandmarkType::SorcererTower,
    LandmarkType::Township,
];

/// Layout of the selected map type, if both the selection and the catalog allow it.
fn current_layout(session: RwSignal<Session>, catalog: RwSignal<CatalogState>) -> Option<MapLayout> {
    let map_type = session.with_untracked(Session::map_type)?;
    catalog.with_untracked(|c| c.layout(map_type).cloned())
}

/// Apply a mark; rejections become the notice instead. Only effective changes notify subscribers.
fn apply_mark(
    session: RwSignal<Session>,
    notice: RwSignal<Option<String>>,
    layout: &MapLayout,
    coordinate: CoordinateId,
    mark: LandmarkType,
) {
    session.maybe_update(|s| match s.mark(layout, coordinate, mark) {
        Ok(changed) => changed,
        Err(e) => {
            notice.set(Some(e.to_string()));
            false
        }
    });
}

/// Interactive 768×768 map the user marks landmarks on.
#[component]
pub fn MarkingCanvas() -> impl IntoView {
    let SessionState(session) = expect_context();
    let Catalog(catalog) = expect_context();
    let OpenMenu(menu) = expect_context();
    let Notice(notice) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let preview: RwSignal<Option<HtmlImageElement>> = RwSignal::new(None);
    let icons_ready: RwSignal<bool> = RwSignal::new(false);

    wasm_bindgen_futures::spawn_local(async move {
        let urls: Vec<&str> = ICON_MARKS.into_iter().filter_map(poi_icon_url).collect();
        images::load_all(&urls).await;
        icons_ready.set(true);
    });

    // Reload the preview whenever the map type changes; stale loads are dropped.
    Effect::new(move || {
        let map_type = session.with(Session::map_type);
        preview.set(None);
        let Some(map_type) = map_type else {
            return;
        };
        wasm_bindgen_futures::spawn_local(async move {
            let image = images::load(&map_type.preview_asset()).await;
            if session.with_untracked(Session::map_type) == Some(map_type) {
                preview.set(image);
            }
        });
    });

    Effect::new(move || {
        let _ = icons_ready.get();
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let Some(ctx) = context_2d(&canvas) else {
            return;
        };
        let layout = session.with(|s| {
            s.map_type()
                .and_then(|map_type| catalog.with(|c| c.layout(map_type).cloned()))
        });
        preview.with(|image| draw_background(&ctx, image.as_ref()));
        if let Some(layout) = layout {
            session.with(|s| {
                for point in &layout.points {
                    draw_marker(&ctx, point.pos, s.marks().get(point.id));
                }
            });
        }
    });

    let locate = move |e: &web_sys::MouseEvent| -> Option<(CoordinateId, MapLayout)> {
        let canvas = canvas_ref.get_untracked()?;
        let rect = canvas.get_bounding_client_rect();
        let p = scale_pointer(
            e.client_x() as f64 - rect.left(),
            e.client_y() as f64 - rect.top(),
            (rect.width(), rect.height()),
            (CANVAS_SIZE, CANVAS_SIZE),
        );
        let layout = current_layout(session, catalog)?;
        let coordinate = hit_test(&layout, p)?;
        Some((coordinate, layout))
    };

    let selection_ready = move || match session.with_untracked(Session::selection) {
        Ok(_) => true,
        Err(e) => {
            notice.set(Some(e.to_string()));
            false
        }
    };

    let on_click = move |e: web_sys::MouseEvent| {
        menu.set(None);
        if !selection_ready() {
            return;
        }
        let Some((coordinate, layout)) = locate(&e) else {
            return;
        };
        notice.set(None);
        session.maybe_update(|s| match s.toggle_church(&layout, coordinate) {
            Ok(_) => true,
            Err(e) => {
                notice.set(Some(e.to_string()));
                false
            }
        });
    };

    let on_context_menu = move |e: web_sys::MouseEvent| {
        e.prevent_default();
        if !selection_ready() {
            menu.set(None);
            return;
        }
        menu.set(locate(&e).map(|(coordinate, _)| MenuTarget {
            coordinate,
            x: e.client_x() as f64,
            y: e.client_y() as f64,
        }));
    };

    view! {
        <div style="position: relative; width: min(768px, 100%); aspect-ratio: 1 / 1;">
            <canvas
                node_ref=canvas_ref
                width={CANVAS_SIZE as u32}
                height={CANVAS_SIZE as u32}
                style="width: 100%; height: 100%; display: block; border: 1px solid #282c3e; border-radius: 6px; background: #0c0e17; cursor: crosshair;"
                on:click=on_click
                on:contextmenu=on_context_menu
            />
        </div>
        <LandmarkMenu />
    }
}

fn draw_background(ctx: &CanvasRenderingContext2d, preview: Option<&HtmlImageElement>) {
    ctx.clear_rect(0.0, 0.0, CANVAS_SIZE, CANVAS_SIZE);
    match preview {
        Some(image) => {
            ctx.draw_image_with_html_image_element_and_dw_and_dh(
                image,
                0.0,
                0.0,
                CANVAS_SIZE,
                CANVAS_SIZE,
            )
            .ok();
        }
        None => {
            ctx.set_fill_style_str("#13161f");
            ctx.fill_rect(0.0, 0.0, CANVAS_SIZE, CANVAS_SIZE);
        }
    }
}

fn draw_marker(ctx: &CanvasRenderingContext2d, at: Point, mark: LandmarkType) {
    let g = glyph(mark);

    ctx.begin_path();
    ctx.arc(at.x, at.y, g.radius, 0.0, TAU).ok();
    ctx.set_fill_style_str(g.fill);
    ctx.fill();
    ctx.set_line_width(2.0);
    ctx.set_stroke_style_str(g.stroke);
    ctx.stroke();

    if let Some(url) = g.icon
        && let Some(icon) = images::cached(url)
    {
        let size = g.radius * 2.0;
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &icon,
            at.x - g.radius,
            at.y - g.radius,
            size,
            size,
        )
        .ok();
    }

    if let Some(text) = g.text {
        ctx.set_font("bold 22px Arial");
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.set_fill_style_str("#f9f9f9");
        ctx.fill_text(text, at.x, at.y).ok();
    }
}

/// Right-click menu for the non-church landmark states.
#[component]
fn LandmarkMenu() -> impl IntoView {
    let SessionState(session) = expect_context();
    let Catalog(catalog) = expect_context();
    let OpenMenu(menu) = expect_context();
    let Notice(notice) = expect_context();

    view! {
        {move || {
            let Some(target) = menu.get() else {
                return ().into_any();
            };
            let current = session.with_untracked(|s| s.marks().get(target.coordinate));
            let entries = MENU_ENTRIES
                .into_iter()
                .map(|mark| {
                    let color = if mark == current { "#f5c542" } else { "#e2e0d8" };
                    let swatch = format!(
                        "display: inline-block; width: 10px; height: 10px; border-radius: 50%; background: {};",
                        glyph(mark).fill
                    );
                    view! {
                        <button
                            style:color=color
                            style="display: flex; align-items: center; gap: 8px; width: 100%; padding: 6px 12px; background: none; border: none; cursor: pointer; text-align: left;"
                            on:click=move |_| {
                                if let Some(layout) = current_layout(session, catalog) {
                                    notice.set(None);
                                    apply_mark(session, notice, &layout, target.coordinate, mark);
                                }
                                menu.set(None);
                            }
                        >
                            <span style=swatch />
                            {menu_label(mark)}
                        </button>
                    }
                })
                .collect_view();
            view! {
                <div
                    style="position: fixed; inset: 0; z-index: 40;"
                    on:click=move |_| menu.set(None)
                    on:contextmenu=move |e| {
                        e.prevent_default();
                        menu.set(None);
                    }
                />
                <div
                    style:left=format!("{}px", target.x)
                    style:top=format!("{}px", target.y)
                    style="position: fixed; z-index: 41; min-width: 170px; background: #161921; border: 1px solid #282c3e; border-radius: 6px; box-shadow: 0 4px 16px rgba(0,0,0,0.5); padding: 4px 0; font-family: 'Inter', system-ui, sans-serif; font-size: 0.8rem;"
                >
                    {entries}
                </div>
            }
            .into_any()
        }}
    }
}
