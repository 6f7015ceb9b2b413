use thiserror::Error;

/// EIP-1193 code for a request the user declined in the wallet.
pub const USER_REJECTED_CODE: i64 = 4001;
/// Code wallets return from `wallet_switchEthereumChain` for a chain they
/// have never been told about.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("no wallet provider available: {0}")]
    Unavailable(String),
    #[error("request rejected in wallet")]
    UserRejected,
    #[error("chain {0} is not known to the wallet")]
    UnrecognizedChain(String),
    #[error("wallet error {code}: {message}")]
    Provider { code: i64, message: String },
    #[error("{0}")]
    Other(String),
}

impl WalletError {
    /// Classifies a provider error object by its code.
    pub fn from_provider(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            USER_REJECTED_CODE => Self::UserRejected,
            UNRECOGNIZED_CHAIN_CODE => Self::UnrecognizedChain(message),
            _ => Self::Provider { code, message },
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("{method} call failed: {message}")]
    Call { method: &'static str, message: String },
    #[error("could not decode {method} result: {message}")]
    Decode { method: &'static str, message: String },
}

impl ContractError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Wallet(WalletError::UserRejected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_map_to_taxonomy() {
        assert_eq!(WalletError::from_provider(4001, "denied"), WalletError::UserRejected);
        assert_eq!(
            WalletError::from_provider(4902, "Unrecognized chain ID \"0x13881\""),
            WalletError::UnrecognizedChain("Unrecognized chain ID \"0x13881\"".to_owned())
        );
        assert!(matches!(
            WalletError::from_provider(-32603, "internal"),
            WalletError::Provider { code: -32603, .. }
        ));
    }

    #[test]
    fn rejection_survives_contract_wrapping() {
        let err = ContractError::from(WalletError::UserRejected);
        assert!(err.is_user_rejection());
        assert!(
            !ContractError::Call {
                method: "register",
                message: "reverted".to_owned()
            }
            .is_user_rejection()
        );
    }
}
