use crate::abi;
use crate::transport::{RpcError, RpcTransport};
use alloy_primitives::{Address, U256, hex};
use async_trait::async_trait;
use nm_api_types::{Receipt, TxHash, TxStatus, WalletAddress};
use nm_chain_client::{ContractError, ContractGateway, PendingTx, TxHandle, WalletError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_RECEIPT_POLL: Duration = Duration::from_millis(1_500);

/// Name registry reached through the wallet's JSON-RPC endpoint. Reads go
/// through `eth_call`; writes through `eth_sendTransaction`, signed by the
/// wallet's first authorized account.
pub struct RpcNameContract {
    transport: Arc<RpcTransport>,
    address: Address,
    receipt_poll: Duration,
}

impl RpcNameContract {
    pub fn new(transport: Arc<RpcTransport>, address: Address) -> Self {
        Self {
            transport,
            address,
            receipt_poll: DEFAULT_RECEIPT_POLL,
        }
    }

    pub fn with_receipt_poll(mut self, interval: Duration) -> Self {
        self.receipt_poll = interval;
        self
    }

    async fn sender(&self, method: &'static str) -> Result<String, ContractError> {
        let accounts: Vec<String> = self
            .transport
            .call("eth_accounts", json!([]))
            .await
            .map_err(|err| err.into_contract(method))?;
        accounts.into_iter().next().ok_or_else(|| {
            ContractError::Wallet(WalletError::Other(
                "no authorized account to sign with".to_owned(),
            ))
        })
    }

    async fn send(
        &self,
        method: &'static str,
        data: Vec<u8>,
        value: U256,
    ) -> Result<TxHandle, ContractError> {
        let from = self.sender(method).await?;
        let tx = json!({
            "from": from,
            "to": self.address.to_checksum(None),
            "data": hex::encode_prefixed(&data),
            "value": format!("0x{value:x}"),
        });

        let hash: String = self
            .transport
            .call("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|err| err.into_contract(method))?;
        info!(method, tx_hash = %hash, "transaction submitted");

        Ok(Box::new(RpcPendingTx {
            transport: Arc::clone(&self.transport),
            hash: TxHash(hash),
            poll: self.receipt_poll,
        }))
    }

    async fn read(&self, method: &'static str, data: Vec<u8>) -> Result<Vec<u8>, ContractError> {
        let call = json!({
            "to": self.address.to_checksum(None),
            "data": hex::encode_prefixed(&data),
        });
        let raw: String = self
            .transport
            .call("eth_call", json!([call, "latest"]))
            .await
            .map_err(|err| err.into_contract(method))?;
        hex::decode(raw.trim_start_matches("0x"))
            .map_err(|err| RpcError::Decode(err.to_string()).into_contract(method))
    }
}

#[async_trait]
impl ContractGateway for RpcNameContract {
    async fn register(&self, name: &str, value: U256) -> Result<TxHandle, ContractError> {
        self.send("register", abi::encode_register(name), value).await
    }

    async fn set_record(&self, name: &str, record: &str) -> Result<TxHandle, ContractError> {
        self.send("setRecord", abi::encode_set_record(name, record), U256::ZERO)
            .await
    }

    async fn all_names(&self) -> Result<Vec<String>, ContractError> {
        let data = self.read("getAllNames", abi::encode_get_all_names()).await?;
        abi::decode_get_all_names(&data).map_err(|err| ContractError::Decode {
            method: "getAllNames",
            message: err.to_string(),
        })
    }

    async fn record(&self, name: &str) -> Result<String, ContractError> {
        let data = self.read("records", abi::encode_records(name)).await?;
        abi::decode_records(&data).map_err(|err| ContractError::Decode {
            method: "records",
            message: err.to_string(),
        })
    }

    async fn owner(&self, name: &str) -> Result<WalletAddress, ContractError> {
        let data = self.read("domains", abi::encode_domains(name)).await?;
        let owner = abi::decode_domains(&data).map_err(|err| ContractError::Decode {
            method: "domains",
            message: err.to_string(),
        })?;
        Ok(WalletAddress(owner.to_checksum(None)))
    }
}

#[derive(Debug, Deserialize)]
struct RawReceipt {
    status: Option<String>,
}

/// Polls `eth_getTransactionReceipt` until the node reports the
/// transaction. There is no deadline; a dropped transaction keeps the
/// caller waiting.
pub struct RpcPendingTx {
    transport: Arc<RpcTransport>,
    hash: TxHash,
    poll: Duration,
}

#[async_trait]
impl PendingTx for RpcPendingTx {
    fn hash(&self) -> &TxHash {
        &self.hash
    }

    async fn confirmation(&self) -> Result<Receipt, ContractError> {
        loop {
            let receipt: Option<RawReceipt> = self
                .transport
                .call("eth_getTransactionReceipt", json!([self.hash.0]))
                .await
                .map_err(|err| err.into_contract("eth_getTransactionReceipt"))?;

            if let Some(receipt) = receipt {
                let status = match receipt.status.as_deref() {
                    Some("0x1") | Some("0x01") => TxStatus::Success,
                    _ => TxStatus::Failure,
                };
                debug!(tx_hash = %self.hash.0, ?status, "transaction confirmed");
                return Ok(Receipt {
                    status,
                    hash: self.hash.clone(),
                });
            }

            tokio::time::sleep(self.poll).await;
        }
    }
}
