use crate::pricing::PriceTable;
use alloy_primitives::Address;
use nm_api_types::{ChainDescriptor, ChainId, NativeCurrency, TxHash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

pub const TARGET_CHAIN_ID: &str = "0x13881";
pub const TARGET_CHAIN_NAME: &str = "Polygon Mumbai Testnet";
pub const CONTRACT_ADDRESS: &str = "0x6331fA5f77442b83fC74481D4dBf00a068DEf1B1";
pub const DEFAULT_TLD: &str = ".plgn";
pub const DEFAULT_REFRESH_DELAY_MS: u64 = 2_000;
pub const MARKETPLACE_BASE_URL: &str = "https://testnets.opensea.io/assets/mumbai";

const CHAIN_NAMES: &[(&str, &str)] = &[
    ("0x1", "Mainnet"),
    ("0x3", "Ropsten"),
    ("0x2a", "Kovan"),
    ("0x4", "Rinkeby"),
    ("0x5", "Goerli"),
    ("0x61", "BSC Testnet"),
    ("0x38", "BSC Mainnet"),
    ("0x89", "Polygon Mainnet"),
    ("0x13881", "Polygon Mumbai Testnet"),
    ("0xa86a", "AVAX Mainnet"),
];

/// What `edit_record` does with the hint field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EditHintPolicy {
    /// Leave whatever the user last typed.
    #[default]
    Keep,
    Clear,
    /// Copy the hint from the last fetched list.
    Prefill,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("min_name_length must be at least 1")]
    MinNameLength,
    #[error("names of length {0} have no price")]
    UnpricedLength(usize),
    #[error("invalid contract address {address:?}: {reason}")]
    ContractAddress { address: String, reason: String },
    #[error("tld must not be empty")]
    EmptyTld,
    #[error("target chain {0} is missing from the chain-name table")]
    UnnamedTarget(String),
}

/// Static tables the controller runs against.
///
/// `Default` is the Polygon Mumbai deployment. Every field can be overridden
/// from a TOML file; missing fields keep their default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub target_chain: ChainDescriptor,
    pub contract_address: String,
    pub tld: String,
    /// Lowercase hex chain id to display name.
    pub chain_names: BTreeMap<String, String>,
    pub price_tiers: PriceTable,
    pub min_name_length: usize,
    pub refresh_delay_ms: u64,
    pub edit_hint_policy: EditHintPolicy,
    pub marketplace_base_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_chain: ChainDescriptor {
                chain_id: ChainId(TARGET_CHAIN_ID.to_owned()),
                chain_name: TARGET_CHAIN_NAME.to_owned(),
                rpc_urls: vec!["https://rpc-mumbai.maticvigil.com/".to_owned()],
                native_currency: NativeCurrency {
                    name: "Mumbai Matic".to_owned(),
                    symbol: "MATIC".to_owned(),
                    decimals: 18,
                },
                block_explorer_urls: vec!["https://mumbai.polygonscan.com/".to_owned()],
            },
            contract_address: CONTRACT_ADDRESS.to_owned(),
            tld: DEFAULT_TLD.to_owned(),
            chain_names: CHAIN_NAMES
                .iter()
                .map(|(id, name)| ((*id).to_owned(), (*name).to_owned()))
                .collect(),
            price_tiers: PriceTable::default(),
            min_name_length: 3,
            refresh_delay_ms: DEFAULT_REFRESH_DELAY_MS,
            edit_hint_policy: EditHintPolicy::default(),
            marketplace_base_url: MARKETPLACE_BASE_URL.to_owned(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_name_length == 0 {
            return Err(ConfigError::MinNameLength);
        }
        if self.price_tiers.price_for(self.min_name_length).is_none() {
            return Err(ConfigError::UnpricedLength(self.min_name_length));
        }
        self.contract()?;
        if self.tld.trim().is_empty() {
            return Err(ConfigError::EmptyTld);
        }
        if self.network_name(&self.target_chain.chain_id).is_empty() {
            return Err(ConfigError::UnnamedTarget(self.target_chain.chain_id.0.clone()));
        }
        Ok(())
    }

    pub fn contract(&self) -> Result<Address, ConfigError> {
        self.contract_address
            .parse::<Address>()
            .map_err(|err| ConfigError::ContractAddress {
                address: self.contract_address.clone(),
                reason: err.to_string(),
            })
    }

    pub fn target_chain_id(&self) -> &ChainId {
        &self.target_chain.chain_id
    }

    /// Display name for `chain_id`, or an empty string for chains not in
    /// the table.
    pub fn network_name(&self, chain_id: &ChainId) -> String {
        self.chain_names
            .get(&chain_id.0.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn currency_symbol(&self) -> &str {
        &self.target_chain.native_currency.symbol
    }

    pub fn explorer_tx_url(&self, hash: &TxHash) -> Option<String> {
        self.target_chain
            .block_explorer_urls
            .first()
            .map(|base| format!("{}/tx/{hash}", base.trim_end_matches('/')))
    }

    pub fn marketplace_url(&self, id: usize) -> String {
        format!(
            "{}/{}/{id}",
            self.marketplace_base_url.trim_end_matches('/'),
            self.contract_address
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SessionConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.refresh_delay(), Duration::from_millis(2_000));
    }

    #[test]
    fn network_names_resolve_case_insensitively() {
        let config = SessionConfig::default();
        assert_eq!(
            config.network_name(&ChainId("0xA86A".to_owned())),
            "AVAX Mainnet"
        );
        assert_eq!(
            config.network_name(&ChainId("0x13881".to_owned())),
            "Polygon Mumbai Testnet"
        );
        assert_eq!(config.network_name(&ChainId("0x999".to_owned())), "");
    }

    #[test]
    fn links_are_built_from_configured_bases() {
        let config = SessionConfig::default();
        assert_eq!(
            config.explorer_tx_url(&TxHash("0xabc".to_owned())).as_deref(),
            Some("https://mumbai.polygonscan.com/tx/0xabc")
        );
        assert_eq!(
            config.marketplace_url(7),
            "https://testnets.opensea.io/assets/mumbai/0x6331fA5f77442b83fC74481D4dBf00a068DEf1B1/7"
        );
    }

    #[test]
    fn validation_catches_broken_tables() {
        let mut config = SessionConfig::default();
        config.min_name_length = 2;
        assert_eq!(config.validate(), Err(ConfigError::UnpricedLength(2)));

        let mut config = SessionConfig::default();
        config.contract_address = "0x1234".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ContractAddress { .. })
        ));

        let mut config = SessionConfig::default();
        config.chain_names.remove(TARGET_CHAIN_ID);
        assert!(matches!(config.validate(), Err(ConfigError::UnnamedTarget(_))));
    }

    #[test]
    fn partial_overrides_keep_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"edit_hint_policy":"prefill","refresh_delay_ms":500}"#)
                .unwrap();
        assert_eq!(config.edit_hint_policy, EditHintPolicy::Prefill);
        assert_eq!(config.refresh_delay(), Duration::from_millis(500));
        assert_eq!(config.tld, ".plgn");
        assert_eq!(config.min_name_length, 3);
    }
}
