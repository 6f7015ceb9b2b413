//! Session controller for minting and editing names on the registry
//! contract, plus the task that owns it.

mod config;
mod controller;
mod error;
mod notify;
mod pricing;
mod runtime;
mod state;

pub use config::{
    CONTRACT_ADDRESS, ConfigError, DEFAULT_REFRESH_DELAY_MS, DEFAULT_TLD, EditHintPolicy,
    SessionConfig, TARGET_CHAIN_ID, TARGET_CHAIN_NAME,
};
pub use controller::{MintOutcome, SessionController, SwitchOutcome, Trigger, UpdateOutcome};
pub use error::SessionError;
pub use notify::{DEFAULT_NOTICE_CAPACITY, NoticeLog, Notifier, TracingNotifier};
pub use pricing::{Price, PriceError, PriceTable, PriceTier};
pub use runtime::{SessionHandle, spawn_session};
pub use state::SessionState;
