mod chain_config;
mod domains;
mod settings;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use nm_api_types::{ErrorResponse, WalletAddress};
use nm_chain_client::memory::{InMemoryNameContract, InMemoryWallet};
use nm_chain_client::{ContractGateway, WalletGateway};
use nm_chain_rpc::{RpcNameContract, RpcTransport, RpcWallet};
use nm_session::{NoticeLog, SessionConfig, SessionController, SessionHandle, spawn_session};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::settings::{GatewayMode, ServiceSettings, config_source, load_settings};

/// Account the in-memory wallet hands out.
const DEMO_ACCOUNT: &str = "0x00000000000000000000000000000000000000d3";

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Clone)]
struct AppState {
    session: SessionHandle,
    notices: Arc<NoticeLog>,
    config: Arc<SessionConfig>,
}

struct Gateways {
    wallet: Arc<dyn WalletGateway>,
    contract: Arc<dyn ContractGateway>,
    chain_watcher: Option<JoinHandle<()>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = load_settings()?;
    if let Some(path) = config_source() {
        info!("loaded configuration from {}", path.display());
    }
    let config = Arc::new(settings.session);
    let gateways = build_gateways(&settings.service, &config)?;
    info!(
        gateway = ?settings.service.gateway,
        wallet_rpc_url = %settings.service.wallet_rpc_url,
        target_chain = %config.target_chain.chain_id.0,
        "session gateways ready"
    );

    let notices = Arc::new(NoticeLog::default());
    let controller = SessionController::new(
        Arc::clone(&config),
        gateways.wallet,
        gateways.contract,
        notices.clone(),
    );
    let (session, session_task) = spawn_session(controller);

    let app = router(AppState {
        session,
        notices,
        config,
    });

    let addr = settings.service.bind;
    info!("name-service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(watcher) = gateways.chain_watcher {
        watcher.abort();
    }
    session_task.abort();
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/chain/config", get(chain_config::chain_config))
        .route("/session", get(domains::session))
        .route("/notices", get(domains::notices))
        .route("/wallet/connect", post(domains::wallet_connect))
        .route("/network/switch", post(domains::network_switch))
        .route("/form", post(domains::set_form))
        .route("/domains/mint", post(domains::mint))
        .route("/domains/update", post(domains::update))
        .route("/domains/edit", post(domains::edit))
        .route("/domains/cancel-edit", post(domains::cancel_edit))
        .route("/domains/refresh", post(domains::refresh))
        .route("/domains/retry-hint", post(domains::retry_hint))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn build_gateways(
    service: &ServiceSettings,
    config: &SessionConfig,
) -> anyhow::Result<Gateways> {
    match service.gateway {
        GatewayMode::Rpc => {
            let transport = Arc::new(RpcTransport::new(Some(service.wallet_rpc_url.clone())));
            let wallet = Arc::new(RpcWallet::new(Arc::clone(&transport)));
            let chain_watcher = wallet.spawn_chain_watcher(service.chain_poll);
            let contract = RpcNameContract::new(transport, config.contract()?)
                .with_receipt_poll(service.receipt_poll);
            Ok(Gateways {
                wallet,
                contract: Arc::new(contract),
                chain_watcher: Some(chain_watcher),
            })
        }
        GatewayMode::Memory => {
            let account = WalletAddress(DEMO_ACCOUNT.to_owned());
            let wallet = InMemoryWallet::new(account.clone(), config.target_chain.chain_id.clone());
            Ok(Gateways {
                wallet: Arc::new(wallet),
                contract: Arc::new(InMemoryNameContract::new(account)),
                chain_watcher: None,
            })
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "name-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "name-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn conflict(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn demo_app() -> Router {
        let config = Arc::new(SessionConfig::default());
        let gateways = build_gateways(
            &ServiceSettings {
                gateway: GatewayMode::Memory,
                ..ServiceSettings::default()
            },
            &config,
        )
        .unwrap();
        let notices = Arc::new(NoticeLog::default());
        let controller = SessionController::new(
            Arc::clone(&config),
            gateways.wallet,
            gateways.contract,
            notices.clone(),
        );
        let (session, _task) = spawn_session(controller);
        router(AppState {
            session,
            notices,
            config,
        })
    }

    fn app_with_contract(contract: Arc<InMemoryNameContract>) -> Router {
        let config = Arc::new(SessionConfig::default());
        let wallet = InMemoryWallet::new(
            WalletAddress(DEMO_ACCOUNT.to_owned()),
            config.target_chain.chain_id.clone(),
        );
        let notices = Arc::new(NoticeLog::default());
        let controller = SessionController::new(
            Arc::clone(&config),
            Arc::new(wallet),
            contract,
            notices.clone(),
        );
        let (session, _task) = spawn_session(controller);
        router(AppState {
            session,
            notices,
            config,
        })
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_and_chain_config() {
        let app = demo_app().await;

        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "name-service");

        let (status, body) = call(&app, "GET", "/chain/config", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tld"], ".plgn");
        assert_eq!(body["chain"]["chainId"], "0x13881");
        assert_eq!(body["price_tiers"][0]["price"], "0.005");
    }

    #[tokio::test]
    async fn mint_requires_a_connected_wallet() {
        let app = demo_app().await;

        let (status, _) = call(
            &app,
            "POST",
            "/domains/mint",
            Some(json!({ "name": "abcd", "hint": "h" })),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        let (status, _) = call(
            &app,
            "POST",
            "/domains/mint",
            Some(json!({ "name": "ab", "hint": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn connect_mint_and_read_back() {
        let app = demo_app().await;

        let (status, body) = call(&app, "POST", "/wallet/connect", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["account"], DEMO_ACCOUNT);

        let (status, body) = call(
            &app,
            "POST",
            "/domains/mint",
            Some(json!({ "name": "abcde", "hint": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "minted");

        let (_, snapshot) = call(&app, "GET", "/session", None).await;
        assert_eq!(snapshot["form"]["name"], "");
        assert_eq!(snapshot["refresh_scheduled"], true);
        assert_eq!(snapshot["phase"]["phase"], "ready");

        let (status, body) = call(&app, "POST", "/domains/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);

        let (_, snapshot) = call(&app, "GET", "/session", None).await;
        assert_eq!(snapshot["mints"][0]["name"], "abcde");
        assert_eq!(snapshot["mints"][0]["editable"], true);

        let (_, notices) = call(&app, "GET", "/notices?after=0", None).await;
        assert!(notices["last_seq"].as_u64().unwrap() >= 3);
        let (_, newer) = call(
            &app,
            "GET",
            &format!("/notices?after={}", notices["last_seq"]),
            None,
        )
        .await;
        assert!(newer["notices"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_flow_updates_the_form() {
        let app = demo_app().await;
        call(&app, "POST", "/wallet/connect", None).await;

        let (status, snapshot) = call(
            &app,
            "POST",
            "/domains/edit",
            Some(json!({ "name": "alice" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["form"]["editing"], true);
        assert_eq!(snapshot["form"]["name"], "alice");

        let (_, snapshot) = call(&app, "POST", "/domains/cancel-edit", None).await;
        assert_eq!(snapshot["form"]["editing"], false);

        let (status, body) = call(
            &app,
            "POST",
            "/domains/update",
            Some(json!({ "name": "alice", "hint": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "skipped");
    }

    #[tokio::test]
    async fn retry_without_pending_hint_is_not_found() {
        let app = demo_app().await;
        call(&app, "POST", "/wallet/connect", None).await;
        let (status, body) = call(&app, "POST", "/domains/retry-hint", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("hint"));
    }

    #[tokio::test]
    async fn mutations_conflict_while_a_mint_is_in_flight() {
        let contract = Arc::new(InMemoryNameContract::new(WalletAddress(
            DEMO_ACCOUNT.to_owned(),
        )));
        contract.stall_confirmations();
        let app = app_with_contract(contract.clone());
        call(&app, "POST", "/wallet/connect", None).await;

        let in_flight = {
            let app = app.clone();
            tokio::spawn(async move {
                call(
                    &app,
                    "POST",
                    "/domains/mint",
                    Some(json!({ "name": "abcd", "hint": "h" })),
                )
                .await
            })
        };

        let mut submitting = false;
        for _ in 0..200 {
            let (_, snapshot) = call(&app, "GET", "/session", None).await;
            if snapshot["form"]["submitting"] == true {
                submitting = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(submitting);

        let (status, body) = call(
            &app,
            "POST",
            "/domains/mint",
            Some(json!({ "name": "abcde", "hint": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("in flight"));

        let (status, _) = call(
            &app,
            "POST",
            "/domains/update",
            Some(json!({ "name": "abcd", "hint": "y" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        assert_eq!(contract.mutating_calls().len(), 1);
        in_flight.abort();
    }
}
