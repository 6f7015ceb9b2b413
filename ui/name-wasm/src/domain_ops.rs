//! Session actions.
//!
//! Each handler posts one command to name-service and then pulls a fresh
//! snapshot. User-facing messages arrive through the notice feed, so request
//! errors here only go to the console.

use crate::api;
use crate::dom::{self, Elements};
use crate::render;
use crate::state;
use crate::toast;
use serde_json::json;

/// Pull the snapshot and any new notices, then re-render.
pub async fn sync(els: &Elements) {
    let generation = state::form_generation();
    match api::session().await {
        Ok(snapshot) => {
            let list_changed = state::set_snapshot(snapshot);
            render::render(els, list_changed, state::form_settled_since(generation));
        }
        Err(e) => gloo_console::warn!(format!("session poll failed: {e}")),
    }
    sync_notices(els).await;
}

pub async fn sync_notices(els: &Elements) {
    match api::notices(state::notice_seq()).await {
        Ok(feed) => {
            toast::show_all(els, &feed.notices);
            state::set_notice_seq(feed.last_seq);
        }
        Err(e) => gloo_console::warn!(format!("notice poll failed: {e}")),
    }
}

pub async fn load_chain_config(els: &Elements) {
    match api::chain_config().await {
        Ok(config) => {
            dom::set_text(&els.tld_label, &config.tld);
            state::set_chain_config(config);
        }
        Err(e) => gloo_console::warn!(format!("chain config unavailable: {e}")),
    }
}

/// Runs one mutating request, refusing overlapping clicks.
async fn run_action(els: &Elements, label: &str, path: &str, body: Option<serde_json::Value>) {
    if !state::begin_action() {
        return;
    }
    if let Err(e) = api::post(path, body).await {
        gloo_console::warn!(format!("{label}: {e}"));
    }
    state::end_action();
    sync(els).await;
}

fn form_body(els: &Elements) -> serde_json::Value {
    json!({
        "name": dom::get_input_value(&els.name_input),
        "hint": dom::get_input_value(&els.hint_input),
    })
}

pub async fn on_connect(els: &Elements) {
    run_action(els, "connect", "/wallet/connect", None).await;
}

pub async fn on_switch_network(els: &Elements) {
    run_action(els, "switch network", "/network/switch", None).await;
}

pub async fn on_mint(els: &Elements) {
    run_action(els, "mint", "/domains/mint", Some(form_body(els))).await;
}

pub async fn on_set_record(els: &Elements) {
    run_action(els, "set record", "/domains/update", Some(form_body(els))).await;
}

pub async fn on_cancel_edit(els: &Elements) {
    run_action(els, "cancel edit", "/domains/cancel-edit", None).await;
}

pub async fn on_edit(els: &Elements, name: &str) {
    run_action(els, "edit", "/domains/edit", Some(json!({ "name": name }))).await;
}

pub async fn on_retry_hint(els: &Elements) {
    run_action(els, "retry record", "/domains/retry-hint", None).await;
}

pub async fn on_refresh(els: &Elements) {
    run_action(els, "refresh", "/domains/refresh", None).await;
}

/// Pushes typed form values so the service snapshot stays authoritative.
pub async fn on_form_change(els: &Elements) {
    state::begin_form_post();
    let result = api::post("/form", Some(form_body(els))).await;
    state::end_form_post();
    if let Err(e) = result {
        gloo_console::warn!(format!("form update: {e}"));
    }
}
