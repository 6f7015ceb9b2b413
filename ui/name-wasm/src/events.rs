//! Event binding.
//!
//! Wires all UI event listeners. Async handlers are spawned via
//! `wasm_bindgen_futures::spawn_local`.

use crate::dom::{self, Elements};
use crate::domain_ops;
use crate::render;
use crate::state;
use nm_api_types::DomainForm;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Helper: attach an async handler for `$event` to an element.
macro_rules! on_event_async {
    ($el:expr, $event:expr, $els:expr, $handler:expr) => {{
        let els = $els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
            let els2 = els.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&els2).await;
            });
        }) as Box<dyn FnMut(_)>);
        if let Err(e) = $el.add_event_listener_with_callback($event, cb.as_ref().unchecked_ref())
        {
            gloo_console::error!(format!("failed to bind {}: {:?}", $event, e));
        }
        cb.forget();
    }};
}

macro_rules! on_click_async {
    ($el:expr, $els:expr, $handler:expr) => {
        on_event_async!($el, "click", $els, $handler)
    };
}

/// Bind all static UI event listeners. Call once after init.
pub fn bind_events(els: &Elements) {
    // ── Wallet / network ──
    on_click_async!(els.connect_btn, els, domain_ops::on_connect);
    on_click_async!(els.switch_btn, els, domain_ops::on_switch_network);

    // ── Form ──
    on_click_async!(els.mint_btn, els, domain_ops::on_mint);
    on_click_async!(els.set_record_btn, els, domain_ops::on_set_record);
    on_click_async!(els.cancel_btn, els, domain_ops::on_cancel_edit);
    on_event_async!(els.name_input, "change", els, domain_ops::on_form_change);
    on_event_async!(els.hint_input, "change", els, domain_ops::on_form_change);

    // Price follows keystrokes locally; the service sees the value on change.
    {
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
            let editing = state::with(|s| s.snapshot.as_ref().is_some_and(|snap| snap.form.editing));
            let form = DomainForm {
                name: dom::get_input_value(&els2.name_input),
                editing,
                ..DomainForm::default()
            };
            render::render_price(&els2, &form);
        }) as Box<dyn FnMut(_)>);
        if let Err(e) = els
            .name_input
            .add_event_listener_with_callback("input", cb.as_ref().unchecked_ref())
        {
            gloo_console::error!(format!("failed to bind input: {:?}", e));
        }
        cb.forget();
    }

    // ── Records ──
    on_click_async!(els.retry_btn, els, domain_ops::on_retry_hint);
    on_click_async!(els.refresh_btn, els, domain_ops::on_refresh);
}

/// Wire edit buttons on freshly rendered mint cards.
pub fn wire_mint_card_events(els: &Elements) {
    for btn in dom::query_all_within(&els.mint_list, ".mint-edit-btn") {
        let name = btn.get_attribute("data-name").unwrap_or_default();
        let els2 = els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els3 = els2.clone();
            let name = name.clone();
            wasm_bindgen_futures::spawn_local(async move {
                domain_ops::on_edit(&els3, &name).await;
            });
        }) as Box<dyn FnMut(_)>);
        if let Err(e) = btn.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref()) {
            gloo_console::error!(format!("failed to bind edit button: {:?}", e));
        }
        cb.forget();
    }
}
