//! DOM element bindings.
//!
//! All fields are resolved once at startup. New controls get a field here
//! and a line in `Elements::bind()`.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlInputElement};

// ── Helpers ──

pub fn window() -> Option<web_sys::Window> {
    web_sys::window()
}

pub fn document() -> Option<Document> {
    window()?.document()
}

pub fn by_id(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn set_inner_html(el: &Element, html: &str) {
    el.set_inner_html(html);
}

pub fn get_input_value(el: &HtmlInputElement) -> String {
    el.value().trim().to_string()
}

/// Leaves a focused input alone so polling never overwrites what is being typed.
pub fn sync_input_value(el: &HtmlInputElement, val: &str) {
    let focused = document()
        .and_then(|d| d.active_element())
        .is_some_and(|active| active.is_same_node(Some(el.unchecked_ref())));
    if !focused && el.value() != val {
        el.set_value(val);
    }
}

pub fn add_class(el: &Element, cls: &str) {
    let _ = el.class_list().add_1(cls);
}

pub fn remove_class(el: &Element, cls: &str) {
    let _ = el.class_list().remove_1(cls);
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

/// Hidden is a class toggle; the stylesheet owns `display`.
pub fn set_visible(el: &Element, visible: bool) {
    toggle_class(el, "hidden", !visible);
}

pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    document()
        .ok_or_else(|| JsValue::from_str("no document"))?
        .create_element(tag)
}

/// Query all matching elements within a parent element.
pub fn query_all_within(parent: &Element, selector: &str) -> Vec<Element> {
    let Ok(nl) = parent.query_selector_all(selector) else {
        return Vec::new();
    };
    let mut v = Vec::new();
    for i in 0..nl.length() {
        if let Some(e) = nl.item(i) {
            if let Ok(el) = e.dyn_into::<Element>() {
                v.push(el);
            }
        }
    }
    v
}

/// Escape text for interpolation into `set_inner_html` templates.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Elements struct ──

/// All DOM element references used by the minting UI.
/// Clone-friendly (all inner types are reference-counted via JS GC).
#[derive(Clone)]
pub struct Elements {
    // Header / config
    pub base_url: HtmlInputElement,
    pub account_label: Element,
    pub network_label: Element,

    // Connect / switch
    pub connect_container: Element,
    pub connect_btn: HtmlButtonElement,
    pub switch_container: Element,
    pub switch_btn: HtmlButtonElement,
    pub switch_label: Element,

    // Form
    pub form_container: Element,
    pub name_input: HtmlInputElement,
    pub hint_input: HtmlInputElement,
    pub tld_label: Element,
    pub price_label: Element,
    pub mint_btn: HtmlButtonElement,
    pub set_record_btn: HtmlButtonElement,
    pub cancel_btn: HtmlButtonElement,

    // Pending hint
    pub retry_banner: Element,
    pub retry_text: Element,
    pub retry_btn: HtmlButtonElement,

    // Mint list
    pub mint_list: Element,
    pub refresh_btn: HtmlButtonElement,

    // Notices
    pub toast_container: HtmlElement,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_button {
    ($id:expr) => {
        by_id_typed::<HtmlButtonElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing button #{}", $id)))?
    };
}

macro_rules! get_html {
    ($id:expr) => {
        by_id_typed::<HtmlElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing html element #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after DOMContentLoaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            base_url: get_input!("baseUrl"),
            account_label: get_el!("accountLabel"),
            network_label: get_el!("networkLabel"),

            connect_container: get_el!("connectContainer"),
            connect_btn: get_button!("connectBtn"),
            switch_container: get_el!("switchContainer"),
            switch_btn: get_button!("switchBtn"),
            switch_label: get_el!("switchLabel"),

            form_container: get_el!("formContainer"),
            name_input: get_input!("nameInput"),
            hint_input: get_input!("hintInput"),
            tld_label: get_el!("tldLabel"),
            price_label: get_el!("priceLabel"),
            mint_btn: get_button!("mintBtn"),
            set_record_btn: get_button!("setRecordBtn"),
            cancel_btn: get_button!("cancelBtn"),

            retry_banner: get_el!("retryBanner"),
            retry_text: get_el!("retryText"),
            retry_btn: get_button!("retryBtn"),

            mint_list: get_el!("mintList"),
            refresh_btn: get_button!("refreshBtn"),

            toast_container: get_html!("toastContainer"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::escape;

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            escape(r#"<b onclick="x">'hi' & bye</b>"#),
            "&lt;b onclick=&quot;x&quot;&gt;&#39;hi&#39; &amp; bye&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }
}
