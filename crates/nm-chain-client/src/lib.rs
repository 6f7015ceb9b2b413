mod error;
pub mod memory;

use alloy_primitives::U256;
use async_trait::async_trait;
use nm_api_types::{ChainDescriptor, ChainId, Receipt, TxHash, WalletAddress};
use tokio::sync::broadcast;

pub use error::{ContractError, UNRECOGNIZED_CHAIN_CODE, USER_REJECTED_CODE, WalletError};

/// Stream of chain ids pushed whenever the wallet moves to another network.
pub type ChainChanges = broadcast::Receiver<ChainId>;

/// The user's wallet: account authorization, network selection and
/// chain-change notifications.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// Prompts the user to authorize accounts.
    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, WalletError>;
    /// Accounts already authorized for this origin. Never prompts.
    async fn accounts(&self) -> Result<Vec<WalletAddress>, WalletError>;
    async fn chain_id(&self) -> Result<ChainId, WalletError>;
    async fn switch_chain(&self, chain_id: &ChainId) -> Result<(), WalletError>;
    async fn add_chain(&self, descriptor: &ChainDescriptor) -> Result<(), WalletError>;
    fn subscribe_chain_changed(&self) -> ChainChanges;
}

/// A submitted transaction that has not been observed on-chain yet.
#[async_trait]
pub trait PendingTx: Send + Sync {
    fn hash(&self) -> &TxHash;
    /// Resolves once the transaction is included and executed.
    async fn confirmation(&self) -> Result<Receipt, ContractError>;
}

pub type TxHandle = Box<dyn PendingTx>;

/// Binding of the name registry contract.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    async fn register(&self, name: &str, value: U256) -> Result<TxHandle, ContractError>;
    async fn set_record(&self, name: &str, record: &str) -> Result<TxHandle, ContractError>;
    async fn all_names(&self) -> Result<Vec<String>, ContractError>;
    async fn record(&self, name: &str) -> Result<String, ContractError>;
    async fn owner(&self, name: &str) -> Result<WalletAddress, ContractError>;
}
