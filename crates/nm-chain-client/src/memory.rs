//! In-process wallet and registry used by the demo gateway mode and tests.
//!
//! Both gateways record every call so callers can assert on the exact
//! sequence of wallet and contract traffic.

use crate::{
    ChainChanges, ContractError, ContractGateway, PendingTx, TxHandle, WalletError, WalletGateway,
};
use alloy_primitives::U256;
use async_trait::async_trait;
use nm_api_types::{ChainDescriptor, ChainId, Receipt, TxHash, TxStatus, WalletAddress};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCall {
    RequestAccounts,
    Accounts,
    ChainId,
    SwitchChain(ChainId),
    AddChain(ChainId),
}

struct WalletInner {
    available: bool,
    reject_requests: bool,
    switch_error: Option<WalletError>,
    user_account: WalletAddress,
    authorized: Vec<WalletAddress>,
    chain_id: ChainId,
    known_chains: Vec<ChainId>,
    calls: Vec<WalletCall>,
}

pub struct InMemoryWallet {
    inner: Mutex<WalletInner>,
    chain_events: broadcast::Sender<ChainId>,
}

impl InMemoryWallet {
    /// Wallet holding `user_account`, pointed at `chain_id`, with nothing
    /// authorized yet.
    pub fn new(user_account: WalletAddress, chain_id: ChainId) -> Self {
        let (chain_events, _) = broadcast::channel(16);
        Self {
            inner: Mutex::new(WalletInner {
                available: true,
                reject_requests: false,
                switch_error: None,
                user_account,
                authorized: Vec::new(),
                known_chains: vec![chain_id.clone()],
                chain_id,
                calls: Vec::new(),
            }),
            chain_events,
        }
    }

    /// No provider installed: every request fails with `Unavailable`.
    pub fn unavailable() -> Self {
        let wallet = Self::new(WalletAddress(String::new()), ChainId(String::new()));
        wallet.lock().available = false;
        wallet
    }

    pub fn with_authorized_account(self) -> Self {
        {
            let mut inner = self.lock();
            let account = inner.user_account.clone();
            inner.authorized = vec![account];
        }
        self
    }

    pub fn with_known_chain(self, chain_id: ChainId) -> Self {
        self.lock().known_chains.push(chain_id);
        self
    }

    pub fn rejecting_requests(self) -> Self {
        self.lock().reject_requests = true;
        self
    }

    /// Every `switch_chain` fails with `err`.
    pub fn failing_switch(self, err: WalletError) -> Self {
        self.lock().switch_error = Some(err);
        self
    }

    /// Simulates the user picking another network in the wallet UI.
    pub fn change_chain(&self, chain_id: ChainId) {
        {
            let mut inner = self.lock();
            if !inner.known_chains.iter().any(|known| known.same_chain(&chain_id)) {
                inner.known_chains.push(chain_id.clone());
            }
            inner.chain_id = chain_id.clone();
        }
        let _ = self.chain_events.send(chain_id);
    }

    pub fn current_chain(&self) -> ChainId {
        self.lock().chain_id.clone()
    }

    pub fn calls(&self) -> Vec<WalletCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, WalletInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, call: WalletCall) -> Result<MutexGuard<'_, WalletInner>, WalletError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if !inner.available {
            return Err(WalletError::Unavailable("no injected provider".to_owned()));
        }
        Ok(inner)
    }
}

#[async_trait]
impl WalletGateway for InMemoryWallet {
    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, WalletError> {
        let mut inner = self.begin(WalletCall::RequestAccounts)?;
        if inner.reject_requests {
            return Err(WalletError::UserRejected);
        }
        let account = inner.user_account.clone();
        inner.authorized = vec![account];
        Ok(inner.authorized.clone())
    }

    async fn accounts(&self) -> Result<Vec<WalletAddress>, WalletError> {
        let inner = self.begin(WalletCall::Accounts)?;
        Ok(inner.authorized.clone())
    }

    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        let inner = self.begin(WalletCall::ChainId)?;
        Ok(inner.chain_id.clone())
    }

    async fn switch_chain(&self, chain_id: &ChainId) -> Result<(), WalletError> {
        {
            let mut inner = self.begin(WalletCall::SwitchChain(chain_id.clone()))?;
            if inner.reject_requests {
                return Err(WalletError::UserRejected);
            }
            if let Some(err) = inner.switch_error.clone() {
                return Err(err);
            }
            if !inner.known_chains.iter().any(|known| known.same_chain(chain_id)) {
                return Err(WalletError::UnrecognizedChain(format!(
                    "Unrecognized chain ID \"{}\"",
                    chain_id.0
                )));
            }
            if inner.chain_id.same_chain(chain_id) {
                return Ok(());
            }
            inner.chain_id = chain_id.clone();
        }
        let _ = self.chain_events.send(chain_id.clone());
        Ok(())
    }

    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), WalletError> {
        let mut inner = self.begin(WalletCall::AddChain(descriptor.chain_id.clone()))?;
        if inner.reject_requests {
            return Err(WalletError::UserRejected);
        }
        if !inner
            .known_chains
            .iter()
            .any(|known| known.same_chain(&descriptor.chain_id))
        {
            inner.known_chains.push(descriptor.chain_id.clone());
        }
        Ok(())
    }

    fn subscribe_chain_changed(&self) -> ChainChanges {
        self.chain_events.subscribe()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    Register { name: String, value: U256 },
    SetRecord { name: String, record: String },
    AllNames,
    Record(String),
    Owner(String),
}

#[derive(Default)]
struct ContractInner {
    sender: Option<WalletAddress>,
    names: Vec<String>,
    records: HashMap<String, String>,
    owners: HashMap<String, WalletAddress>,
    calls: Vec<ContractCall>,
    next_tx: u64,
    fail_next_register: bool,
    fail_next_set_record: bool,
    fail_enumeration: bool,
    stall_confirmations: bool,
    failing_reads: HashSet<String>,
}

/// Registry with the same surface as the deployed name contract.
#[derive(Default)]
pub struct InMemoryNameContract {
    inner: Mutex<ContractInner>,
}

impl InMemoryNameContract {
    /// `sender` is the account that signs transactions.
    pub fn new(sender: WalletAddress) -> Self {
        let contract = Self::default();
        contract.lock().sender = Some(sender);
        contract
    }

    /// Pre-registers a name as if minted earlier by `owner`.
    pub fn seed(&self, name: &str, hint: &str, owner: WalletAddress) {
        let mut inner = self.lock();
        inner.names.push(name.to_owned());
        inner.records.insert(name.to_owned(), hint.to_owned());
        inner.owners.insert(name.to_owned(), owner);
    }

    /// The next registration is mined but its receipt reports failure.
    pub fn fail_next_register(&self) {
        self.lock().fail_next_register = true;
    }

    /// The next `setRecord` is mined but its receipt reports failure.
    pub fn fail_next_set_record(&self) {
        self.lock().fail_next_set_record = true;
    }

    /// Transactions are accepted but never confirm.
    pub fn stall_confirmations(&self) {
        self.lock().stall_confirmations = true;
    }

    pub fn fail_enumeration(&self, failing: bool) {
        self.lock().fail_enumeration = failing;
    }

    /// Record and owner reads for `name` fail until cleared.
    pub fn fail_reads_for(&self, name: &str) {
        self.lock().failing_reads.insert(name.to_owned());
    }

    pub fn clear_read_failures(&self) {
        self.lock().failing_reads.clear();
    }

    pub fn calls(&self) -> Vec<ContractCall> {
        self.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<ContractCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    ContractCall::Register { .. } | ContractCall::SetRecord { .. }
                )
            })
            .collect()
    }

    pub fn hint_of(&self, name: &str) -> Option<String> {
        self.lock().records.get(name).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, ContractInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContractInner {
    fn next_hash(&mut self) -> TxHash {
        self.next_tx += 1;
        TxHash(format!("0x{:064x}", self.next_tx))
    }

    fn sender(&self) -> WalletAddress {
        self.sender
            .clone()
            .unwrap_or_else(|| WalletAddress(format!("0x{:040x}", 0)))
    }
}

struct SettledTx {
    receipt: Receipt,
}

#[async_trait]
impl PendingTx for SettledTx {
    fn hash(&self) -> &TxHash {
        &self.receipt.hash
    }

    async fn confirmation(&self) -> Result<Receipt, ContractError> {
        Ok(self.receipt.clone())
    }
}

struct StalledTx {
    hash: TxHash,
}

#[async_trait]
impl PendingTx for StalledTx {
    fn hash(&self) -> &TxHash {
        &self.hash
    }

    async fn confirmation(&self) -> Result<Receipt, ContractError> {
        std::future::pending().await
    }
}

fn settled(hash: TxHash, succeeded: bool) -> TxHandle {
    let status = if succeeded {
        TxStatus::Success
    } else {
        TxStatus::Failure
    };
    Box::new(SettledTx {
        receipt: Receipt { status, hash },
    })
}

#[async_trait]
impl ContractGateway for InMemoryNameContract {
    async fn register(&self, name: &str, value: U256) -> Result<TxHandle, ContractError> {
        let mut inner = self.lock();
        inner.calls.push(ContractCall::Register {
            name: name.to_owned(),
            value,
        });
        let hash = inner.next_hash();
        if inner.stall_confirmations {
            return Ok(Box::new(StalledTx { hash }));
        }

        let taken = inner.owners.contains_key(name);
        if std::mem::take(&mut inner.fail_next_register) || taken {
            return Ok(settled(hash, false));
        }

        let owner = inner.sender();
        inner.names.push(name.to_owned());
        inner.owners.insert(name.to_owned(), owner);
        inner.records.entry(name.to_owned()).or_default();
        Ok(settled(hash, true))
    }

    async fn set_record(&self, name: &str, record: &str) -> Result<TxHandle, ContractError> {
        let mut inner = self.lock();
        inner.calls.push(ContractCall::SetRecord {
            name: name.to_owned(),
            record: record.to_owned(),
        });
        let hash = inner.next_hash();
        if inner.stall_confirmations {
            return Ok(Box::new(StalledTx { hash }));
        }

        let sender = inner.sender();
        let owned = inner
            .owners
            .get(name)
            .is_some_and(|owner| owner.matches(&sender));
        if std::mem::take(&mut inner.fail_next_set_record) || !owned {
            return Ok(settled(hash, false));
        }

        inner.records.insert(name.to_owned(), record.to_owned());
        Ok(settled(hash, true))
    }

    async fn all_names(&self) -> Result<Vec<String>, ContractError> {
        let mut inner = self.lock();
        inner.calls.push(ContractCall::AllNames);
        if inner.fail_enumeration {
            return Err(ContractError::Call {
                method: "getAllNames",
                message: "execution reverted".to_owned(),
            });
        }
        Ok(inner.names.clone())
    }

    async fn record(&self, name: &str) -> Result<String, ContractError> {
        let mut inner = self.lock();
        inner.calls.push(ContractCall::Record(name.to_owned()));
        if inner.failing_reads.contains(name) {
            return Err(ContractError::Call {
                method: "records",
                message: format!("read of {name} failed"),
            });
        }
        Ok(inner.records.get(name).cloned().unwrap_or_default())
    }

    async fn owner(&self, name: &str) -> Result<WalletAddress, ContractError> {
        let mut inner = self.lock();
        inner.calls.push(ContractCall::Owner(name.to_owned()));
        if inner.failing_reads.contains(name) {
            return Err(ContractError::Call {
                method: "domains",
                message: format!("read of {name} failed"),
            });
        }
        Ok(inner
            .owners
            .get(name)
            .cloned()
            .unwrap_or_else(|| WalletAddress(format!("0x{:040x}", 0))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> WalletAddress {
        WalletAddress("0x00000000000000000000000000000000000000a1".to_owned())
    }

    #[tokio::test]
    async fn unknown_chain_needs_add_before_switch() {
        let wallet = InMemoryWallet::new(account(), ChainId("0x1".to_owned()));
        let mut changes = wallet.subscribe_chain_changed();
        let target = ChainId("0x13881".to_owned());

        let err = wallet.switch_chain(&target).await.unwrap_err();
        assert!(matches!(err, WalletError::UnrecognizedChain(_)));

        let descriptor = ChainDescriptor {
            chain_id: target.clone(),
            chain_name: "Polygon Mumbai Testnet".to_owned(),
            rpc_urls: Vec::new(),
            native_currency: nm_api_types::NativeCurrency {
                name: "Mumbai Matic".to_owned(),
                symbol: "MATIC".to_owned(),
                decimals: 18,
            },
            block_explorer_urls: Vec::new(),
        };
        wallet.add_chain(&descriptor).await.unwrap();
        assert_eq!(wallet.current_chain(), ChainId("0x1".to_owned()));

        wallet.switch_chain(&target).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), target);
    }

    #[tokio::test]
    async fn known_chain_switches_without_adding() {
        let target = ChainId("0x89".to_owned());
        let wallet =
            InMemoryWallet::new(account(), ChainId("0x1".to_owned())).with_known_chain(target.clone());

        wallet.switch_chain(&target).await.unwrap();

        assert_eq!(wallet.current_chain(), target);
        assert_eq!(wallet.calls(), vec![WalletCall::SwitchChain(target)]);
    }

    #[tokio::test]
    async fn failing_switch_keeps_the_chain() {
        let wallet = InMemoryWallet::new(account(), ChainId("0x1".to_owned())).failing_switch(
            WalletError::Provider {
                code: -32002,
                message: "request already pending".to_owned(),
            },
        );
        let err = wallet
            .switch_chain(&ChainId("0x13881".to_owned()))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Provider { code: -32002, .. }));
        assert_eq!(wallet.current_chain(), ChainId("0x1".to_owned()));
    }

    #[tokio::test]
    async fn unavailable_wallet_fails_every_request() {
        let wallet = InMemoryWallet::unavailable();
        assert!(matches!(
            wallet.request_accounts().await,
            Err(WalletError::Unavailable(_))
        ));
        assert!(matches!(wallet.chain_id().await, Err(WalletError::Unavailable(_))));
    }

    #[tokio::test]
    async fn registration_assigns_sender_as_owner() {
        let contract = InMemoryNameContract::new(account());
        let tx = contract.register("alice", U256::from(1u64)).await.unwrap();
        assert!(tx.confirmation().await.unwrap().succeeded());

        let again = contract.register("alice", U256::from(1u64)).await.unwrap();
        assert!(!again.confirmation().await.unwrap().succeeded());

        assert_eq!(contract.owner("alice").await.unwrap(), account());
        assert_eq!(contract.all_names().await.unwrap(), vec!["alice".to_owned()]);
    }

    #[tokio::test]
    async fn set_record_requires_ownership() {
        let contract = InMemoryNameContract::new(account());
        contract.seed(
            "bob",
            "",
            WalletAddress("0x00000000000000000000000000000000000000b2".to_owned()),
        );

        let tx = contract.set_record("bob", "mine now").await.unwrap();
        assert!(!tx.confirmation().await.unwrap().succeeded());
        assert_eq!(contract.hint_of("bob").as_deref(), Some(""));
    }
}
