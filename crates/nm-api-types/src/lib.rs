use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Hex addresses only use case for the EIP-55 checksum, so ownership
    /// checks compare them case-insensitively.
    pub fn matches(&self, other: &WalletAddress) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// `0x1234...abcd` form used in the header.
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 10 {
            return self.0.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn same_chain(&self, other: &ChainId) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub status: TxStatus,
    pub hash: TxHash,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == TxStatus::Success
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Chain description in the shape `wallet_addEthereumChain` expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    pub block_explorer_urls: Vec<String>,
}

/// One entry of the on-chain name enumeration.
///
/// Length of a domain name in UTF-16 code units, the unit browsers count
/// in. Pricing and the minimum-length check both use it, so a name made of
/// two emoji is four long.
pub fn name_length(name: &str) -> usize {
    name.encode_utf16().count()
}

/// `id` is the position in the enumeration of the fetch that produced the
/// record. It is not a persistent identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintRecord {
    pub id: usize,
    pub name: String,
    pub hint: String,
    pub owner: WalletAddress,
}

impl MintRecord {
    pub fn is_owned_by(&self, account: &WalletAddress) -> bool {
        self.owner.matches(account)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainForm {
    pub name: String,
    pub hint: String,
    pub editing: bool,
    pub submitting: bool,
}

impl DomainForm {
    /// Empties the text fields. Edit mode is left alone.
    pub fn clear_fields(&mut self) {
        self.name.clear();
        self.hint.clear();
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
    Alert,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub seq: u64,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    #[default]
    Idle,
    Minting,
    Updating,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "phase", content = "activity")]
pub enum SessionPhase {
    Disconnected,
    WrongNetwork,
    Ready(Activity),
}

/// Name registered on-chain whose hint transaction never confirmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingHint {
    pub name: String,
    pub hint: String,
    pub registration_hash: TxHash,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintView {
    pub id: usize,
    pub name: String,
    pub hint: String,
    pub owner: WalletAddress,
    pub editable: bool,
    pub marketplace_url: String,
}

/// Read-only copy of the session published after every state change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub account: Option<WalletAddress>,
    pub account_short: Option<String>,
    pub chain_id: Option<ChainId>,
    pub network_name: String,
    pub target_network: String,
    pub tld: String,
    pub phase: SessionPhase,
    pub form: DomainForm,
    pub mints: Vec<MintView>,
    pub pending_hint: Option<PendingHint>,
    pub refresh_scheduled: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            account: None,
            account_short: None,
            chain_id: None,
            network_name: String::new(),
            target_network: String::new(),
            tld: String::new(),
            phase: SessionPhase::Disconnected,
            form: DomainForm::default(),
            mints: Vec::new(),
            pending_hint: None,
            refresh_scheduled: false,
        }
    }
}

// ── HTTP bodies ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRequest {
    pub name: String,
    #[serde(default)]
    pub hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub account: WalletAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticesResponse {
    pub notices: Vec<Notice>,
    pub last_seq: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTierInfo {
    pub min_length: usize,
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfigResponse {
    pub chain: ChainDescriptor,
    pub tld: String,
    pub contract_address: String,
    pub min_name_length: usize,
    pub price_tiers: Vec<PriceTierInfo>,
    pub refresh_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_length_counts_utf16_units() {
        assert_eq!(name_length("abcd"), 4);
        assert_eq!(name_length("\u{1F600}\u{1F600}"), 4);
        assert_eq!(name_length("caf\u{e9}"), 4);
    }

    #[test]
    fn ownership_ignores_checksum_case() {
        let record = MintRecord {
            id: 0,
            name: "alice".to_owned(),
            hint: "wonderland".to_owned(),
            owner: WalletAddress("0xAbCdEf0000000000000000000000000000001234".to_owned()),
        };

        assert!(record.is_owned_by(&WalletAddress(
            "0xabcdef0000000000000000000000000000001234".to_owned()
        )));
        assert!(!record.is_owned_by(&WalletAddress(
            "0xabcdef0000000000000000000000000000009999".to_owned()
        )));
    }

    #[test]
    fn short_address_keeps_prefix_and_tail() {
        let addr = WalletAddress("0x1234567890abcdef1234567890abcdef12345678".to_owned());
        assert_eq!(addr.short(), "0x1234...5678");
        assert_eq!(WalletAddress("0x12".to_owned()).short(), "0x12");
    }

    #[test]
    fn chain_descriptor_uses_wallet_field_names() {
        let descriptor = ChainDescriptor {
            chain_id: ChainId("0x13881".to_owned()),
            chain_name: "Polygon Mumbai Testnet".to_owned(),
            rpc_urls: vec!["https://rpc-mumbai.maticvigil.com/".to_owned()],
            native_currency: NativeCurrency {
                name: "Mumbai Matic".to_owned(),
                symbol: "MATIC".to_owned(),
                decimals: 18,
            },
            block_explorer_urls: vec!["https://mumbai.polygonscan.com/".to_owned()],
        };

        let value = serde_json::to_value(&descriptor).expect("serialize descriptor");
        assert_eq!(value["chainId"], "0x13881");
        assert_eq!(value["nativeCurrency"]["decimals"], 18);
        assert!(value.get("blockExplorerUrls").is_some());
    }

    #[test]
    fn phase_serializes_with_activity() {
        let value = serde_json::to_value(SessionPhase::Ready(Activity::Minting)).expect("serialize");
        assert_eq!(value["phase"], "ready");
        assert_eq!(value["activity"], "minting");
    }
}
