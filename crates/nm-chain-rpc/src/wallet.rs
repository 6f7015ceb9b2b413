use crate::transport::RpcTransport;
use async_trait::async_trait;
use nm_api_types::{ChainDescriptor, ChainId, WalletAddress};
use nm_chain_client::{ChainChanges, WalletError, WalletGateway};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Wallet gateway speaking the EIP-1193 method set over HTTP.
///
/// HTTP has no push channel, so chain changes are detected by polling
/// `eth_chainId` from [`RpcWallet::spawn_chain_watcher`].
pub struct RpcWallet {
    transport: Arc<RpcTransport>,
    chain_events: broadcast::Sender<ChainId>,
}

impl RpcWallet {
    pub fn new(transport: Arc<RpcTransport>) -> Self {
        let (chain_events, _) = broadcast::channel(16);
        Self {
            transport,
            chain_events,
        }
    }

    pub fn spawn_chain_watcher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let wallet = Arc::clone(self);
        tokio::spawn(async move {
            let mut last_seen: Option<ChainId> = None;
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let current = match wallet.chain_id().await {
                    Ok(chain_id) => chain_id,
                    Err(err) => {
                        debug!(error = %err, "chain poll failed");
                        continue;
                    }
                };
                match &last_seen {
                    Some(previous) if previous.same_chain(&current) => {}
                    Some(previous) => {
                        info!(from = %previous.0, to = %current.0, "wallet changed chain");
                        let _ = wallet.chain_events.send(current.clone());
                        last_seen = Some(current);
                    }
                    None => last_seen = Some(current),
                }
            }
        })
    }
}

fn into_addresses(raw: Vec<String>) -> Vec<WalletAddress> {
    raw.into_iter().map(WalletAddress).collect()
}

#[async_trait]
impl WalletGateway for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, WalletError> {
        let accounts: Vec<String> = self
            .transport
            .call("eth_requestAccounts", json!([]))
            .await?;
        Ok(into_addresses(accounts))
    }

    async fn accounts(&self) -> Result<Vec<WalletAddress>, WalletError> {
        let accounts: Vec<String> = self.transport.call("eth_accounts", json!([])).await?;
        Ok(into_addresses(accounts))
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        let chain_id: String = self.transport.call("eth_chainId", json!([])).await?;
        Ok(ChainId(chain_id))
    }

    async fn switch_chain(&self, chain_id: &ChainId) -> Result<(), WalletError> {
        let _: serde_json::Value = self
            .transport
            .call(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id.0 }]),
            )
            .await
            .map_err(|err| {
                let err = WalletError::from(err);
                if !matches!(err, WalletError::UnrecognizedChain(_)) {
                    warn!(chain_id = %chain_id.0, error = %err, "wallet_switchEthereumChain failed");
                }
                err
            })?;
        Ok(())
    }

    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), WalletError> {
        let _: serde_json::Value = self
            .transport
            .call("wallet_addEthereumChain", json!([descriptor]))
            .await?;
        Ok(())
    }

    fn subscribe_chain_changed(&self) -> ChainChanges {
        self.chain_events.subscribe()
    }
}
