//! HTTP API client.
//!
//! Wraps `fetch` for JSON requests to name-service and decodes replies into
//! the shared `nm-api-types` bodies.

use crate::dom;
use nm_api_types::{ChainConfigResponse, ErrorResponse, NoticesResponse, SessionSnapshot};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

pub const SERVICE_PORT: u16 = 8080;

/// Determine the API base URL.
///
/// Priority: user-supplied `#baseUrl` input, then same host on the service port.
pub fn base_url() -> String {
    if let Some(input) = dom::by_id_typed::<web_sys::HtmlInputElement>("baseUrl") {
        let v = input.value().trim().to_string();
        if !v.is_empty() {
            return v.trim_end_matches('/').to_string();
        }
    }

    let Some(window) = dom::window() else {
        return format!("http://localhost:{SERVICE_PORT}");
    };
    let loc = window.location();
    let host = loc.hostname().unwrap_or_default();
    let protocol = loc.protocol().unwrap_or_else(|_| "http:".into());
    same_host_url(&protocol, &host)
}

fn same_host_url(protocol: &str, host: &str) -> String {
    let host = if host.is_empty() { "localhost" } else { host };
    format!("{protocol}//{host}:{SERVICE_PORT}")
}

/// Perform a fetch request and decode the JSON reply.
///
/// Non-2xx replies surface the service's `error` field when present.
pub async fn request<T: DeserializeOwned>(
    path: &str,
    method: &str,
    body: Option<String>,
) -> Result<T, String> {
    let url = format!("{}{}", base_url(), path);

    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);

    let headers = Headers::new().map_err(|e| format!("{:?}", e))?;
    if let Some(ref b) = body {
        headers
            .set("Content-Type", "application/json")
            .map_err(|e| format!("{:?}", e))?;
        opts.set_body(&JsValue::from_str(b));
    }
    opts.set_headers(&headers);

    let request = Request::new_with_str_and_init(&url, &opts).map_err(|e| format!("{:?}", e))?;

    let window = dom::window().ok_or_else(|| "no window".to_string())?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("fetch error: {:?}", e))?;

    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| "response is not a Response".to_string())?;

    let text = JsFuture::from(resp.text().map_err(|e| format!("{:?}", e))?)
        .await
        .map_err(|e| format!("text error: {:?}", e))?;
    let text_str = text.as_string().unwrap_or_default();

    if !resp.ok() {
        return Err(error_message(resp.status(), &text_str));
    }

    serde_json::from_str(&text_str).map_err(|e| format!("JSON parse error: {e}, raw: {text_str}"))
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => err.error,
        Err(_) => format!("{status}: {body}"),
    }
}

pub async fn session() -> Result<SessionSnapshot, String> {
    request("/session", "GET", None).await
}

pub async fn notices(after: u64) -> Result<NoticesResponse, String> {
    request(&format!("/notices?after={after}"), "GET", None).await
}

pub async fn chain_config() -> Result<ChainConfigResponse, String> {
    request("/chain/config", "GET", None).await
}

/// POST with an optional JSON body, discarding the decoded reply.
pub async fn post(path: &str, body: Option<serde_json::Value>) -> Result<(), String> {
    request::<serde_json::Value>(path, "POST", body.map(|b| b.to_string()))
        .await
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_host_targets_service_port() {
        assert_eq!(same_host_url("https:", "mint.local"), "https://mint.local:8080");
        assert_eq!(same_host_url("http:", ""), "http://localhost:8080");
    }

    #[test]
    fn error_message_prefers_service_error_field() {
        assert_eq!(
            error_message(412, r#"{"error":"wallet is not connected"}"#),
            "wallet is not connected"
        );
        assert_eq!(error_message(502, "Bad Gateway"), "502: Bad Gateway");
    }
}
