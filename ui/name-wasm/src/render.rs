//! Snapshot rendering.
//!
//! The service owns all session state; this module only projects the last
//! snapshot onto the page. Pure view helpers are split out so they can be
//! unit tested without a browser.

use crate::dom::{self, Elements};
use crate::state;
use nm_api_types::{ChainConfigResponse, DomainForm, MintView, SessionPhase, SessionSnapshot};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Which form buttons are shown and whether they accept clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormButtons {
    pub mint: bool,
    pub set_record: bool,
    pub cancel: bool,
    pub disabled: bool,
}

pub fn form_buttons(form: &DomainForm) -> FormButtons {
    FormButtons {
        mint: !form.editing,
        set_record: form.editing,
        cancel: form.editing,
        disabled: form.submitting,
    }
}

pub fn account_text(snapshot: &SessionSnapshot) -> String {
    match &snapshot.account_short {
        Some(short) => format!("Wallet: {short}"),
        None => "Not connected".to_string(),
    }
}

pub fn network_text(snapshot: &SessionSnapshot) -> String {
    if snapshot.network_name.is_empty() {
        "Unknown network".to_string()
    } else {
        snapshot.network_name.clone()
    }
}

pub fn submit_label(form: &DomainForm) -> &'static str {
    match (form.editing, form.submitting) {
        (false, false) => "Mint",
        (false, true) => "Minting...",
        (true, false) => "Set record",
        (true, true) => "Updating...",
    }
}

/// Price of the typed name, or `None` while it is shorter than any tier.
pub fn price_text(config: &ChainConfigResponse, name: &str) -> Option<String> {
    let len = nm_api_types::name_length(name);
    if len < config.min_name_length {
        return None;
    }
    config
        .price_tiers
        .iter()
        .filter(|tier| tier.min_length <= len)
        .max_by_key(|tier| tier.min_length)
        .map(|tier| format!("{} {}", tier.price, config.chain.native_currency.symbol))
}

pub fn mint_card_html(mint: &MintView, tld: &str) -> String {
    let edit_btn = if mint.editable {
        format!(
            r#"<button class="mint-edit-btn icon-btn" data-name="{}" title="Edit record">✎</button>"#,
            dom::escape(&mint.name)
        )
    } else {
        String::new()
    };
    format!(
        r#"<a class="mint-link" href="{}" target="_blank" rel="noopener noreferrer">
             <span class="mint-name">{}{}</span>
             <span class="mint-hint">{}</span>
           </a>
           {}"#,
        dom::escape(&mint.marketplace_url),
        dom::escape(&mint.name),
        dom::escape(tld),
        dom::escape(&mint.hint),
        edit_btn,
    )
}

/// Re-render from the stored snapshot. The mint list is rebuilt only when
/// `list_changed`, which keeps its listeners from piling up between polls.
/// Input values are copied from the snapshot only when `sync_fields`.
pub fn render(els: &Elements, list_changed: bool, sync_fields: bool) {
    let Some(snapshot) = state::snapshot() else {
        return;
    };
    render_header(els, &snapshot);
    render_containers(els, &snapshot);
    render_form(els, &snapshot, sync_fields);
    render_retry_banner(els, &snapshot);
    if !list_changed {
        return;
    }
    if let Err(e) = render_mint_list(els, &snapshot) {
        gloo_console::error!(format!("mint list render failed: {:?}", e));
    }
}

fn render_header(els: &Elements, snapshot: &SessionSnapshot) {
    dom::set_text(&els.account_label, &account_text(snapshot));
    dom::set_text(&els.network_label, &network_text(snapshot));
    dom::set_text(
        &els.switch_label,
        &format!("Switch to {}", snapshot.target_network),
    );
}

fn render_containers(els: &Elements, snapshot: &SessionSnapshot) {
    let (connect, switch, form) = match snapshot.phase {
        SessionPhase::Disconnected => (true, false, false),
        SessionPhase::WrongNetwork => (false, true, false),
        SessionPhase::Ready(_) => (false, false, true),
    };
    dom::set_visible(&els.connect_container, connect);
    dom::set_visible(&els.switch_container, switch);
    dom::set_visible(&els.form_container, form);
}

fn render_form(els: &Elements, snapshot: &SessionSnapshot, sync_fields: bool) {
    let form = &snapshot.form;
    let buttons = form_buttons(form);

    dom::set_text(&els.tld_label, &snapshot.tld);
    if sync_fields {
        dom::sync_input_value(&els.name_input, &form.name);
        dom::sync_input_value(&els.hint_input, &form.hint);
    }
    els.name_input.set_disabled(form.editing || form.submitting);
    els.hint_input.set_disabled(form.submitting);

    dom::set_visible(els.mint_btn.unchecked_ref(), buttons.mint);
    dom::set_visible(els.set_record_btn.unchecked_ref(), buttons.set_record);
    dom::set_visible(els.cancel_btn.unchecked_ref(), buttons.cancel);
    els.mint_btn.set_disabled(buttons.disabled);
    els.set_record_btn.set_disabled(buttons.disabled);
    els.cancel_btn.set_disabled(buttons.disabled);

    let label = submit_label(form);
    if form.editing {
        dom::set_text(els.set_record_btn.unchecked_ref(), label);
    } else {
        dom::set_text(els.mint_btn.unchecked_ref(), label);
    }

    render_price(els, form);
}

pub fn render_price(els: &Elements, form: &DomainForm) {
    let text = state::chain_config()
        .filter(|_| !form.editing)
        .and_then(|config| price_text(&config, &form.name));
    match text {
        Some(text) => {
            dom::set_text(&els.price_label, &text);
            dom::set_visible(&els.price_label, true);
        }
        None => dom::set_visible(&els.price_label, false),
    }
}

fn render_retry_banner(els: &Elements, snapshot: &SessionSnapshot) {
    match &snapshot.pending_hint {
        Some(pending) => {
            dom::set_text(
                &els.retry_text,
                &format!(
                    "{}{} is registered but its record was not saved.",
                    pending.name, snapshot.tld
                ),
            );
            els.retry_btn.set_disabled(snapshot.form.submitting);
            dom::set_visible(&els.retry_banner, true);
        }
        None => dom::set_visible(&els.retry_banner, false),
    }
}

fn render_mint_list(els: &Elements, snapshot: &SessionSnapshot) -> Result<(), JsValue> {
    let container = &els.mint_list;
    dom::set_inner_html(container, "");

    if snapshot.account.is_none() {
        return Ok(());
    }
    if snapshot.mints.is_empty() {
        dom::set_inner_html(
            container,
            r#"<div class="mint-card mint-card--empty">No domains minted yet.</div>"#,
        );
        return Ok(());
    }

    for mint in &snapshot.mints {
        let card = dom::create_element("div")?;
        card.set_attribute("class", "mint-card")?;
        dom::set_inner_html(&card, &mint_card_html(mint, &snapshot.tld));
        container.append_child(&card)?;
    }

    crate::events::wire_mint_card_events(els);
    Ok(())
}
