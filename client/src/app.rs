use std::sync::Arc;

use leptos::prelude::*;
use seedmap_shared::{CatalogState, CoordinateId, MapType, Nightlord, RenderDataset, Session};
use wasm_bindgen::JsCast;

use crate::canvas::MarkingCanvas;
use crate::data;
use crate::location;
use crate::result::{FullscreenOpen, Renderer, ResultCanvas, ResultPanel, ResultState, ResultView};
use crate::status::{StatusView, summarize};

pub(crate) fn viewport_size() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

/// Newtype wrappers so each signal gets its own slot in Leptos context.
#[derive(Clone, Copy)]
pub(crate) struct SessionState(pub RwSignal<Session>);
#[derive(Clone, Copy)]
pub(crate) struct Catalog(pub RwSignal<CatalogState>);
#[derive(Clone, Copy)]
pub(crate) struct RenderDataError(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct Status(pub Memo<StatusView>);
/// Guidance shown after a rejected interaction, e.g. marking before selecting.
#[derive(Clone, Copy)]
pub(crate) struct Notice(pub RwSignal<Option<String>>);

/// Where the landmark menu was opened and for which coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MenuTarget {
    pub coordinate: CoordinateId,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy)]
pub(crate) struct OpenMenu(pub RwSignal<Option<MenuTarget>>);

#[component]
pub fn App() -> impl IntoView {
    let session: RwSignal<Session> = RwSignal::new(Session::new());
    let catalog: RwSignal<CatalogState> = RwSignal::new(CatalogState::Loading);
    let render_data: RwSignal<Option<Arc<RenderDataset>>> = RwSignal::new(None);
    let render_error: RwSignal<Option<String>> = RwSignal::new(None);
    let menu: RwSignal<Option<MenuTarget>> = RwSignal::new(None);
    let notice: RwSignal<Option<String>> = RwSignal::new(None);
    let result: RwSignal<ResultView> = RwSignal::new(ResultView::Empty);
    let render_nonce: RwSignal<u64> = RwSignal::new(0);
    let result_canvas = NodeRef::<leptos::html::Canvas>::new();
    let fullscreen: RwSignal<bool> = RwSignal::new(false);
    let status = Memo::new(move |_| session.with(|s| catalog.with(|c| summarize(s, c))));

    let renderer = Renderer {
        session,
        render_data,
        result,
        nonce: render_nonce,
        canvas: result_canvas,
    };

    provide_context(SessionState(session));
    provide_context(Catalog(catalog));
    provide_context(RenderDataError(render_error));
    provide_context(Status(status));
    provide_context(OpenMenu(menu));
    provide_context(Notice(notice));
    provide_context(ResultState(result));
    provide_context(ResultCanvas(result_canvas));
    provide_context(FullscreenOpen(fullscreen));
    provide_context(renderer);

    data::load_datasets(catalog, render_data, render_error);

    // Re-evaluated on every session mutation. A resolution schedules a composite
    // bound to the current generation; anything else cancels a recognized one.
    Effect::new(move || {
        let token = session.with(Session::generation);
        match status.get() {
            StatusView::Resolved {
                seed_id,
                nightlord,
                map_type,
            } => {
                web_sys::console::info_1(
                    &format!("recognized seed {seed_id} ({nightlord}, {map_type})").into(),
                );
                location::publish_seed(seed_id);
                renderer.schedule_recognized(seed_id, token);
            }
            _ => renderer.cancel_recognized(),
        }
    });

    // `#seed=<id>` renders that seed once the map data is in.
    let hash_seed = location::current_hash()
        .as_deref()
        .and_then(location::seed_from_hash);
    let hash_consumed: RwSignal<bool> = RwSignal::new(hash_seed.is_none());
    Effect::new(move || {
        if hash_consumed.get_untracked() || render_data.with(Option::is_none) {
            return;
        }
        hash_consumed.set(true);
        if let Some(seed_id) = hash_seed {
            renderer.lookup(seed_id);
        }
    });

    view! {
        <div style="min-height: 100%; background: #0c0e17; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; padding: 16px; box-sizing: border-box; display: flex; flex-wrap: wrap; gap: 20px; align-items: flex-start;">
            <div style="display: flex; flex-direction: column; gap: 12px; width: 340px; max-width: 100%;">
                <SelectionPanel />
                <StatusPanel />
                <SeedLookup />
            </div>
            <MarkingCanvas />
            <ResultPanel />
        </div>
    }
}

const PANEL_STYLE: &str = "background: #13161f; border: 1px solid #282c3e; border-radius: 6px; padding: 10px 12px;";

fn choice_style(active: bool) -> &'static str {
    if active {
        "padding: 4px 8px; border-radius: 4px; cursor: pointer; font-size: 0.75rem; background: rgba(245,197,66,0.15); color: #f5c542; border: 1px solid rgba(245,197,66,0.5);"
    } else {
        "padding: 4px 8px; border-radius: 4px; cursor: pointer; font-size: 0.75rem; background: #1a1d2a; color: #9a9590; border: 1px solid #282c3e;"
    }
}

/// Nightlord and map-type pickers. Changing either clears the marks.
#[component]
fn SelectionPanel() -> impl IntoView {
    let SessionState(session) = expect_context();
    let Notice(notice) = expect_context();

    let nightlords = Nightlord::ALL
        .into_iter()
        .map(|nightlord| {
            view! {
                <button
                    style=move || choice_style(session.with(|s| s.nightlord() == Some(nightlord)))
                    on:click=move |_| {
                        notice.set(None);
                        session.maybe_update(|s| s.select_nightlord(nightlord));
                    }
                >
                    {nightlord.as_str()}
                </button>
            }
        })
        .collect_view();

    let map_types = MapType::ALL
        .into_iter()
        .map(|map_type| {
            view! {
                <button
                    style=move || choice_style(session.with(|s| s.map_type() == Some(map_type)))
                    on:click=move |_| {
                        notice.set(None);
                        session.maybe_update(|s| s.select_map_type(map_type));
                    }
                >
                    {map_type.as_str()}
                </button>
            }
        })
        .collect_view();

    view! {
        <div style=PANEL_STYLE>
            <div style="font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.08em; color: #5a5860; margin-bottom: 6px;">"Nightlord"</div>
            <div style="display: flex; flex-wrap: wrap; gap: 4px;">{nightlords}</div>
            <div style="font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.08em; color: #5a5860; margin: 10px 0 6px;">"Map"</div>
            <div style="display: flex; flex-wrap: wrap; gap: 4px;">{map_types}</div>
        </div>
    }
}

/// Candidate count, short candidate list, success and contradiction messages.
#[component]
fn StatusPanel() -> impl IntoView {
    let SessionState(session) = expect_context();
    let Status(status) = expect_context();
    let RenderDataError(render_error) = expect_context();
    let Notice(notice) = expect_context();

    view! {
        <div style=PANEL_STYLE>
            {move || {
                let current = status.get();
                let color = if current.is_error() { "#e06c5a" } else { "#e2e0d8" };
                view! {
                    <div style:color=color style="font-size: 0.85rem; font-weight: 600;">
                        {current.headline()}
                    </div>
                }
            }}
            {move || {
                status.get().candidate_list().map(|ids| view! {
                    <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; color: #9a9590; margin-top: 4px;">
                        {ids}
                    </div>
                })
            }}
            {move || match status.get() {
                StatusView::Resolved { seed_id, nightlord, map_type } => view! {
                    <div style="margin-top: 8px; padding: 8px; border: 1px solid rgba(120,200,120,0.4); border-radius: 4px; background: rgba(60,140,60,0.12); font-size: 0.75rem; line-height: 1.5;">
                        <div>"Seed " <b>{seed_id}</b></div>
                        <div>"Nightlord: " {nightlord.as_str()}</div>
                        <div>"Map: " {map_type.as_str()}</div>
                    </div>
                }
                .into_any(),
                _ => ().into_any(),
            }}
            {move || {
                notice.get().map(|msg| view! {
                    <div style="margin-top: 6px; font-size: 0.72rem; color: #f5c542;">{msg}</div>
                })
            }}
            {move || {
                render_error.get().map(|e| view! {
                    <div style="margin-top: 6px; font-size: 0.7rem; color: #e06c5a;">
                        {format!("Map data unavailable: {e}")}
                    </div>
                })
            }}
            <button
                style="margin-top: 10px; padding: 4px 10px; background: #1a1d2a; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 4px; cursor: pointer; font-size: 0.75rem;"
                disabled=move || session.with(|s| s.marks().is_empty())
                on:click=move |_| session.update(Session::reset)
            >
                "Reset marks"
            </button>
        </div>
    }
}

/// Render any seed by id, bypassing recognition.
#[component]
fn SeedLookup() -> impl IntoView {
    let renderer: Renderer = expect_context();
    let input: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<&'static str>> = RwSignal::new(None);

    let submit = move || match location::parse_seed_input(&input.get_untracked()) {
        Some(seed_id) => {
            error.set(None);
            renderer.lookup(seed_id);
        }
        None => error.set(Some("Enter a numeric seed id.")),
    };

    view! {
        <div style=PANEL_STYLE>
            <div style="font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.08em; color: #5a5860; margin-bottom: 6px;">"Render seed by id"</div>
            <div style="display: flex; gap: 6px;">
                <input
                    type="text"
                    inputmode="numeric"
                    placeholder="e.g. 42"
                    style="flex: 1; min-width: 0; padding: 4px 8px; background: #0c0e17; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 4px; font-family: 'JetBrains Mono', monospace; font-size: 0.8rem;"
                    prop:value=move || input.get()
                    on:input=move |e| {
                        if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok()) {
                            input.set(el.value());
                        }
                    }
                    on:keydown=move |e: web_sys::KeyboardEvent| {
                        if e.key() == "Enter" {
                            submit();
                        }
                    }
                />
                <button
                    style="padding: 4px 10px; background: #1a1d2a; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 4px; cursor: pointer; font-size: 0.75rem;"
                    on:click=move |_| submit()
                >
                    "Render"
                </button>
            </div>
            {move || error.get().map(|msg| view! {
                <div style="margin-top: 6px; font-size: 0.7rem; color: #e06c5a;">{msg}</div>
            })}
        </div>
    }
}
