use nm_api_types::{Activity, ChainId, DomainForm, MintRecord, SessionPhase, WalletAddress};
use tokio::time::Instant;

/// Everything a reload throws away.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub account: Option<WalletAddress>,
    pub chain_id: Option<ChainId>,
    /// Empty when the chain id is not in the name table.
    pub network_name: String,
    pub form: DomainForm,
    pub activity: Activity,
    pub mints: Vec<MintRecord>,
    pub refresh_at: Option<Instant>,
}

impl SessionState {
    pub fn on_chain(&self, target: &ChainId) -> bool {
        self.chain_id
            .as_ref()
            .is_some_and(|chain_id| chain_id.same_chain(target))
    }

    pub fn phase(&self, target: &ChainId) -> SessionPhase {
        if self.account.is_none() {
            SessionPhase::Disconnected
        } else if !self.on_chain(target) {
            SessionPhase::WrongNetwork
        } else {
            SessionPhase::Ready(self.activity)
        }
    }

    pub fn is_busy(&self) -> bool {
        self.activity != Activity::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_follows_account_then_chain() {
        let target = ChainId("0x13881".to_owned());
        let mut state = SessionState::default();
        assert_eq!(state.phase(&target), SessionPhase::Disconnected);

        state.chain_id = Some(ChainId("0x1".to_owned()));
        assert_eq!(state.phase(&target), SessionPhase::Disconnected);

        state.account = Some(WalletAddress("0xa1".to_owned()));
        assert_eq!(state.phase(&target), SessionPhase::WrongNetwork);

        state.chain_id = Some(target.clone());
        state.activity = Activity::Minting;
        assert_eq!(state.phase(&target), SessionPhase::Ready(Activity::Minting));
        assert!(state.is_busy());
    }
}
