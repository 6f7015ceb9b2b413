//! JSON-RPC adapters for the wallet and the name registry contract.

pub mod abi;
mod contract;
mod transport;
mod wallet;

pub use contract::{DEFAULT_RECEIPT_POLL, RpcNameContract, RpcPendingTx};
pub use transport::{DEFAULT_WALLET_RPC_URL, RpcError, RpcTransport};
pub use wallet::RpcWallet;
