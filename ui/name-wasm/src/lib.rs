//! NameMint WASM Frontend
//!
//! Thin browser client for name-service: it renders the session snapshot,
//! forwards clicks as commands and shows the notice feed as toasts.

pub mod api;
pub mod dom;
pub mod domain_ops;
pub mod events;
pub mod render;
pub mod state;
pub mod toast;

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::prelude::*;

/// How often the snapshot and notice feed are polled.
pub const POLL_MS: u32 = 1_000;

/// WASM entry point, called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;

    domain_ops::load_chain_config(&els).await;
    domain_ops::sync(&els).await;
    events::bind_events(&els);

    wasm_bindgen_futures::spawn_local(async move {
        loop {
            TimeoutFuture::new(POLL_MS).await;
            domain_ops::sync(&els).await;
        }
    });

    Ok(())
}
