use nm_api_types::TxHash;
use nm_chain_client::{ContractError, WalletError};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no wallet provider available")]
    WalletUnavailable,
    #[error("request rejected in wallet")]
    UserRejected,
    #[error("chain is not known to the wallet: {0}")]
    UnrecognizedChain(String),
    #[error("{0}")]
    Validation(String),
    #[error("transaction {0} failed")]
    TransactionFailure(TxHash),
    #[error("could not read registered names: {0}")]
    ReadFailure(ContractError),
    #[error("another transaction is still in flight")]
    Busy,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("wallet is not on {0}")]
    WrongNetwork(String),
    #[error(transparent)]
    Wallet(WalletError),
    #[error(transparent)]
    Contract(ContractError),
    #[error("session runtime has stopped")]
    RuntimeClosed,
    #[error("no registered name is waiting for its hint")]
    NoPendingHint,
}

impl From<WalletError> for SessionError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Unavailable(_) => Self::WalletUnavailable,
            WalletError::UserRejected => Self::UserRejected,
            WalletError::UnrecognizedChain(reason) => Self::UnrecognizedChain(reason),
            other => Self::Wallet(other),
        }
    }
}

impl From<ContractError> for SessionError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::Wallet(err) => err.into(),
            other => Self::Contract(other),
        }
    }
}
