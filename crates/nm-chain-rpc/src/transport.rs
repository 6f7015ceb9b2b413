use nm_chain_client::{ContractError, WalletError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_WALLET_RPC_URL: &str = "http://127.0.0.1:1248";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("wallet endpoint unreachable: {0}")]
    Transport(String),
    #[error("wallet endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed rpc response: {0}")]
    Decode(String),
}

impl From<RpcError> for WalletError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Transport(reason) => WalletError::Unavailable(reason),
            RpcError::Rpc { code, message } => WalletError::from_provider(code, message),
            other => WalletError::Other(other.to_string()),
        }
    }
}

impl RpcError {
    pub(crate) fn into_contract(self, method: &'static str) -> ContractError {
        match self {
            RpcError::Decode(message) => ContractError::Decode { method, message },
            RpcError::Rpc { code, message }
                if code == nm_chain_client::USER_REJECTED_CODE =>
            {
                ContractError::Wallet(WalletError::from_provider(code, message))
            }
            RpcError::Rpc { message, .. } => ContractError::Call { method, message },
            other => ContractError::Wallet(other.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

/// JSON-RPC 2.0 over HTTP against an EIP-1193 style wallet endpoint.
///
/// Reads `NAMEMINT_WALLET_RPC_URL` when no endpoint is given
/// (default: `http://127.0.0.1:1248`).
pub struct RpcTransport {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl Default for RpcTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RpcTransport {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("NAMEMINT_WALLET_RPC_URL").ok())
            .unwrap_or_else(|| DEFAULT_WALLET_RPC_URL.to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        debug!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| RpcError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| RpcError::Decode(err.to_string()))?;

        if let Some(error) = body.get("error").filter(|error| !error.is_null()) {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32603);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_owned();
            return Err(RpcError::Rpc { code, message });
        }

        let result = body.get("result").cloned().unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|err| RpcError::Decode(format!("{method}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_normalized() {
        let transport = RpcTransport::new(Some("http://localhost:1248/".to_owned()));
        assert_eq!(transport.endpoint(), "http://localhost:1248");
    }

    #[test]
    fn unreachable_endpoint_means_no_wallet() {
        let err: WalletError = RpcError::Transport("connection refused".to_owned()).into();
        assert!(matches!(err, WalletError::Unavailable(_)));
    }

    #[test]
    fn rejected_transaction_is_a_wallet_rejection() {
        let err = RpcError::Rpc {
            code: 4001,
            message: "User denied transaction signature.".to_owned(),
        }
        .into_contract("register");
        assert!(err.is_user_rejection());

        let err = RpcError::Rpc {
            code: 3,
            message: "execution reverted".to_owned(),
        }
        .into_contract("register");
        assert!(matches!(err, ContractError::Call { method: "register", .. }));
    }
}
