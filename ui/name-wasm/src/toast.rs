//! Notice toasts.
//!
//! Every notice is mirrored to the browser console and shown as a toast that
//! removes itself after a few seconds. Alerts stay until clicked.

use crate::dom::{self, Elements};
use gloo_timers::callback::Timeout;
use nm_api_types::{Notice, NoticeLevel};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

const TOAST_MS: u32 = 5_000;

pub fn level_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "toast--info",
        NoticeLevel::Success => "toast--success",
        NoticeLevel::Error => "toast--error",
        NoticeLevel::Alert => "toast--alert",
    }
}

pub fn show_all(els: &Elements, notices: &[Notice]) {
    for notice in notices {
        log(notice);
        if let Err(e) = show(els, notice) {
            gloo_console::error!(format!("toast failed: {:?}", e));
        }
    }
}

fn log(notice: &Notice) {
    let line = format!("[{}] {}", notice.seq, notice.message);
    match notice.level {
        NoticeLevel::Info | NoticeLevel::Success => gloo_console::log!(line),
        NoticeLevel::Error => gloo_console::error!(line),
        NoticeLevel::Alert => gloo_console::warn!(line),
    }
}

fn show(els: &Elements, notice: &Notice) -> Result<(), JsValue> {
    let toast = dom::create_element("div")?;
    toast.set_attribute("class", &format!("toast {}", level_class(notice.level)))?;

    let time = js_sys::Date::new_0().to_locale_time_string("en-US");
    dom::set_inner_html(
        &toast,
        &format!(
            r#"<span class="toast-time">{}</span><span class="toast-msg">{}</span>"#,
            dom::escape(&String::from(time)),
            dom::escape(&notice.message)
        ),
    );
    els.toast_container.append_child(&toast)?;

    let dismiss = toast.clone();
    let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
        dismiss.remove();
    }) as Box<dyn FnMut(_)>);
    toast.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
    cb.forget();

    if notice.level != NoticeLevel::Alert {
        Timeout::new(TOAST_MS, move || toast.remove()).forget();
    }
    Ok(())
}
