use crate::config::{EditHintPolicy, SessionConfig};
use crate::error::SessionError;
use crate::notify::Notifier;
use crate::pricing::Price;
use crate::state::SessionState;
use futures::future::{pending, try_join_all};
use nm_api_types::{
    Activity, ChainId, MintRecord, MintView, PendingHint, Receipt, SessionPhase, SessionSnapshot,
    TxHash, WalletAddress,
};
use nm_chain_client::{
    ChainChanges, ContractError, ContractGateway, TxHandle, WalletError, WalletGateway,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

const TX_FAILED: &str = "Transaction failed! Please try again";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MintOutcome {
    Minted { registration: TxHash, record: TxHash },
    /// Registered, but the hint transaction did not go through. See
    /// [`SessionController::retry_pending_hint`].
    HintPending { registration: TxHash },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Updated { record: TxHash },
    /// Name or hint was empty; nothing was sent.
    Skipped,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwitchOutcome {
    Switched,
    /// The wallet did not know the chain and has now been told about it.
    /// The user still has to switch.
    ChainAdded,
}

/// Something the session reacts to without being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// `None` when notifications were dropped and the new chain is unknown.
    ChainChanged(Option<ChainId>),
    RefreshDue,
}

/// Owns the session state and sequences wallet and contract calls.
///
/// Every mutation publishes a [`SessionSnapshot`] on a watch channel, so
/// readers never need access to the controller itself.
pub struct SessionController {
    config: Arc<SessionConfig>,
    wallet: Arc<dyn WalletGateway>,
    contract: Arc<dyn ContractGateway>,
    notifier: Arc<dyn Notifier>,
    state: SessionState,
    pending_hint: Option<PendingHint>,
    chain_events: Option<ChainChanges>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    pub fn new(
        config: Arc<SessionConfig>,
        wallet: Arc<dyn WalletGateway>,
        contract: Arc<dyn ContractGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        let controller = Self {
            config,
            wallet,
            contract,
            notifier,
            state: SessionState::default(),
            pending_hint: None,
            chain_events: None,
            snapshots,
        };
        controller.publish();
        controller
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn pending_hint(&self) -> Option<&PendingHint> {
        self.pending_hint.as_ref()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase(self.config.target_chain_id())
    }

    /// Deadline of the refresh scheduled after a mint, if any.
    pub fn pending_refresh(&self) -> Option<Instant> {
        self.state.refresh_at
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mints = match &self.state.account {
            Some(account) => self
                .state
                .mints
                .iter()
                .map(|record| MintView {
                    id: record.id,
                    name: record.name.clone(),
                    hint: record.hint.clone(),
                    owner: record.owner.clone(),
                    editable: record.is_owned_by(account),
                    marketplace_url: self.config.marketplace_url(record.id),
                })
                .collect(),
            None => Vec::new(),
        };

        SessionSnapshot {
            account: self.state.account.clone(),
            account_short: self.state.account.as_ref().map(WalletAddress::short),
            chain_id: self.state.chain_id.clone(),
            network_name: self.state.network_name.clone(),
            target_network: self.config.target_chain.chain_name.clone(),
            tld: self.config.tld.clone(),
            phase: self.phase(),
            form: self.state.form.clone(),
            mints,
            pending_hint: self.pending_hint.clone(),
            refresh_scheduled: self.state.refresh_at.is_some(),
        }
    }

    /// Adopts an already-authorized account and the wallet's current chain.
    /// Never prompts the user.
    pub async fn initialize_session(&mut self) -> Result<(), SessionError> {
        self.chain_events = Some(self.wallet.subscribe_chain_changed());

        let accounts = match self.wallet.accounts().await {
            Ok(accounts) => accounts,
            Err(WalletError::Unavailable(reason)) => {
                warn!(%reason, "no wallet provider; session stays disconnected");
                self.publish();
                return Ok(());
            }
            Err(err) => {
                warn!(error = %err, "could not read authorized accounts");
                self.publish();
                return Err(err.into());
            }
        };
        match accounts.into_iter().next() {
            Some(account) => {
                info!(account = %account.0, "found authorized account");
                self.state.account = Some(account);
            }
            None => debug!("no authorized account"),
        }

        match self.wallet.chain_id().await {
            Ok(chain_id) => self.apply_chain(chain_id),
            Err(err) => {
                warn!(error = %err, "could not read chain id");
                self.publish();
                return Err(err.into());
            }
        }

        self.publish();
        self.refresh_if_on_target().await;
        Ok(())
    }

    /// Full reset followed by [`Self::initialize_session`]. A pending hint
    /// marker is the only thing that survives.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        info!("reloading session");
        self.state = SessionState::default();
        self.publish();
        self.initialize_session().await
    }

    pub async fn connect_wallet(&mut self) -> Result<WalletAddress, SessionError> {
        let accounts = match self.wallet.request_accounts().await {
            Ok(accounts) => accounts,
            Err(WalletError::UserRejected) => {
                info!("connect request rejected in wallet");
                self.notifier.error("Error connecting to the wallet");
                return Err(SessionError::UserRejected);
            }
            Err(err) => return Err(self.wallet_failure("Connecting the wallet", err)),
        };

        let Some(account) = accounts.into_iter().next() else {
            warn!("wallet authorized no accounts");
            self.notifier.error("The wallet did not share any account");
            return Err(SessionError::Wallet(WalletError::Other(
                "no accounts authorized".to_owned(),
            )));
        };

        info!(account = %account.0, "wallet connected");
        self.state.account = Some(account.clone());
        self.publish();
        self.refresh_if_on_target().await;
        Ok(account)
    }

    /// Asks the wallet to move to the target chain, registering the chain
    /// first when the wallet has never seen it. The state itself changes only
    /// when the wallet reports the new chain.
    pub async fn switch_network(&mut self) -> Result<SwitchOutcome, SessionError> {
        let target = self.config.target_chain.clone();
        match self.wallet.switch_chain(&target.chain_id).await {
            Ok(()) => {
                info!(chain_id = %target.chain_id.0, "switch requested");
                Ok(SwitchOutcome::Switched)
            }
            Err(WalletError::UnrecognizedChain(reason)) => {
                info!(chain_id = %target.chain_id.0, %reason, "adding chain to wallet");
                self.wallet
                    .add_chain(&target)
                    .await
                    .map_err(|err| self.wallet_failure("Adding the network", err))?;
                self.notifier.info(&format!(
                    "{} was added to your wallet. Switch network again to continue",
                    target.chain_name
                ));
                Ok(SwitchOutcome::ChainAdded)
            }
            Err(err) => Err(self.wallet_failure("Switching network", err)),
        }
    }

    pub fn set_form(&mut self, name: &str, hint: &str) {
        self.state.form.name = name.to_owned();
        self.state.form.hint = hint.to_owned();
        self.publish();
    }

    pub fn edit_record(&mut self, name: &str) {
        let form = &mut self.state.form;
        form.editing = true;
        form.name = name.to_owned();
        match self.config.edit_hint_policy {
            EditHintPolicy::Keep => {}
            EditHintPolicy::Clear => form.hint.clear(),
            EditHintPolicy::Prefill => {
                if let Some(record) = self.state.mints.iter().find(|record| record.name == name) {
                    form.hint = record.hint.clone();
                }
            }
        }
        self.publish();
    }

    pub fn cancel_edit(&mut self) {
        self.state.form.editing = false;
        self.publish();
    }

    /// Registers `name`, then stores `hint` as its record.
    ///
    /// The record is only written once the registration receipt reports
    /// success. If the second step fails the name stays registered and a
    /// [`PendingHint`] is kept for [`Self::retry_pending_hint`].
    pub async fn mint_domain(&mut self, name: &str, hint: &str) -> Result<MintOutcome, SessionError> {
        self.ensure_idle()?;
        self.set_form(name, hint);
        let price = self.validate_name(name)?;
        self.ensure_ready()?;

        self.begin(Activity::Minting);
        let result = self.run_mint(name, hint, price).await;
        self.finish();
        result
    }

    async fn run_mint(
        &mut self,
        name: &str,
        hint: &str,
        price: Price,
    ) -> Result<MintOutcome, SessionError> {
        let domain = self.domain(name);
        self.notifier.info(&format!(
            "Minting {domain} for {} {}...",
            price.ether,
            self.config.currency_symbol()
        ));

        let submitted = self.contract.register(name, price.wei).await;
        let registration = self.confirm("register", name, submitted).await?;
        if !registration.succeeded() {
            warn!(name, tx_hash = %registration.hash, "registration failed");
            self.notifier.alert(TX_FAILED);
            return Err(SessionError::TransactionFailure(registration.hash));
        }
        self.notifier
            .success(&self.confirmed_message(&format!("Domain minted: {domain}"), &registration.hash));

        match self.attach_hint(name, hint).await {
            Ok(record) => {
                self.notifier
                    .success(&self.confirmed_message(&format!("Record set for {domain}"), &record));
                self.schedule_refresh();
                self.state.form.clear_fields();
                Ok(MintOutcome::Minted {
                    registration: registration.hash,
                    record,
                })
            }
            Err(err) => {
                warn!(name, error = %err, "name registered without its hint");
                self.pending_hint = Some(PendingHint {
                    name: name.to_owned(),
                    hint: hint.to_owned(),
                    registration_hash: registration.hash.clone(),
                });
                self.schedule_refresh();
                self.notifier.alert(&format!(
                    "{domain} is registered but its record was not saved. Retry setting the record"
                ));
                Ok(MintOutcome::HintPending {
                    registration: registration.hash,
                })
            }
        }
    }

    /// Rewrites the record of a name the user owns. Empty input is ignored.
    pub async fn update_domain(
        &mut self,
        name: &str,
        hint: &str,
    ) -> Result<UpdateOutcome, SessionError> {
        if name.is_empty() || hint.is_empty() {
            debug!(name, "update skipped: name and record are both required");
            return Ok(UpdateOutcome::Skipped);
        }
        self.ensure_idle()?;
        self.set_form(name, hint);
        self.ensure_ready()?;

        self.begin(Activity::Updating);
        let domain = self.domain(name);
        self.notifier.info(&format!("Updating {domain}..."));

        let result = match self.attach_hint(name, hint).await {
            Ok(record) => {
                if self
                    .pending_hint
                    .as_ref()
                    .is_some_and(|pending| pending.name == name)
                {
                    self.pending_hint = None;
                }
                self.notifier
                    .success(&self.confirmed_message(&format!("Updated {domain}"), &record));
                let _ = self.fetch_mints().await;
                self.state.form.clear_fields();
                Ok(UpdateOutcome::Updated { record })
            }
            Err(err) => {
                if matches!(err, SessionError::TransactionFailure(_)) {
                    self.notifier.alert(TX_FAILED);
                }
                Err(err)
            }
        };
        self.finish();
        result
    }

    /// Sends only the record transaction for the name left behind by a
    /// partially failed mint.
    pub async fn retry_pending_hint(&mut self) -> Result<TxHash, SessionError> {
        self.ensure_idle()?;
        let Some(pending) = self.pending_hint.clone() else {
            return Err(SessionError::NoPendingHint);
        };
        self.ensure_ready()?;

        self.begin(Activity::Updating);
        let domain = self.domain(&pending.name);
        self.notifier.info(&format!("Setting record for {domain}..."));

        let result = match self.attach_hint(&pending.name, &pending.hint).await {
            Ok(record) => {
                self.pending_hint = None;
                self.notifier
                    .success(&self.confirmed_message(&format!("Record set for {domain}"), &record));
                let _ = self.fetch_mints().await;
                self.state.form.clear_fields();
                Ok(record)
            }
            Err(err) => {
                if matches!(err, SessionError::TransactionFailure(_)) {
                    self.notifier.alert(TX_FAILED);
                }
                Err(err)
            }
        };
        self.finish();
        result
    }

    /// Replaces the mint list with a fresh read of the contract. Any failed
    /// read leaves the previous list in place.
    pub async fn fetch_mints(&mut self) -> Result<usize, SessionError> {
        let contract = Arc::clone(&self.contract);
        let fetched: Result<Vec<MintRecord>, ContractError> = async {
            let names = contract.all_names().await?;
            let contract = &contract;
            let reads = names.into_iter().enumerate().map(|(id, name)| async move {
                let (hint, owner) =
                    futures::try_join!(contract.record(&name), contract.owner(&name))?;
                Ok::<_, ContractError>(MintRecord {
                    id,
                    name,
                    hint,
                    owner,
                })
            });
            try_join_all(reads).await
        }
        .await;

        match fetched {
            Ok(mints) => {
                let count = mints.len();
                debug!(count, "mint list refreshed");
                self.state.mints = mints;
                self.publish();
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "could not read registered names, keeping previous list");
                Err(SessionError::ReadFailure(err))
            }
        }
    }

    pub async fn run_scheduled_refresh(&mut self) -> Result<usize, SessionError> {
        self.state.refresh_at = None;
        self.publish();
        self.fetch_mints().await
    }

    /// Waits for the next chain change or the scheduled refresh deadline.
    /// Cancel safe.
    pub async fn next_trigger(&mut self) -> Trigger {
        let refresh_at = self.state.refresh_at;
        let chain_events = self.chain_events.as_mut();

        let chain_changed = async move {
            let Some(events) = chain_events else {
                return pending().await;
            };
            match events.recv().await {
                Ok(chain_id) => Some(chain_id),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "missed chain notifications");
                    None
                }
                Err(broadcast::error::RecvError::Closed) => pending().await,
            }
        };
        let refresh_due = async move {
            match refresh_at {
                Some(deadline) => sleep_until(deadline).await,
                None => pending().await,
            }
        };

        tokio::select! {
            chain_id = chain_changed => Trigger::ChainChanged(chain_id),
            () = refresh_due => Trigger::RefreshDue,
        }
    }

    pub async fn handle_trigger(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::ChainChanged(chain_id) => {
                info!(
                    chain_id = chain_id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown"),
                    "wallet changed chain"
                );
                if let Err(err) = self.reload().await {
                    warn!(error = %err, "reload after chain change failed");
                }
            }
            Trigger::RefreshDue => {
                let _ = self.run_scheduled_refresh().await;
            }
        }
    }

    async fn attach_hint(&self, name: &str, hint: &str) -> Result<TxHash, SessionError> {
        let submitted = self.contract.set_record(name, hint).await;
        let receipt = self.confirm("setRecord", name, submitted).await?;
        if !receipt.succeeded() {
            warn!(name, tx_hash = %receipt.hash, "setRecord failed");
            return Err(SessionError::TransactionFailure(receipt.hash));
        }
        Ok(receipt.hash)
    }

    async fn confirm(
        &self,
        method: &'static str,
        name: &str,
        submitted: Result<TxHandle, ContractError>,
    ) -> Result<Receipt, SessionError> {
        let tx = submitted.map_err(|err| self.contract_failure(method, name, err))?;
        debug!(method, name, tx_hash = %tx.hash(), "waiting for confirmation");
        let receipt = tx
            .confirmation()
            .await
            .map_err(|err| self.contract_failure(method, name, err))?;
        let explorer = self.config.explorer_tx_url(&receipt.hash).unwrap_or_default();
        info!(
            method,
            name,
            tx_hash = %receipt.hash,
            succeeded = receipt.succeeded(),
            explorer = %explorer,
            "transaction confirmed"
        );
        Ok(receipt)
    }

    fn contract_failure(&self, method: &'static str, name: &str, err: ContractError) -> SessionError {
        match &err {
            ContractError::Wallet(WalletError::UserRejected) => {
                info!(method, name, "transaction rejected in wallet");
            }
            ContractError::Wallet(WalletError::Unavailable(reason)) => {
                warn!(method, name, %reason, "wallet went away");
                self.notifier.alert("Get a wallet such as MetaMask to continue");
            }
            _ => {
                warn!(method, name, error = %err, "contract call failed");
                self.notifier.error(
                    "Transaction could not be sent. Check you have enough gas and try again",
                );
            }
        }
        err.into()
    }

    fn wallet_failure(&self, action: &str, err: WalletError) -> SessionError {
        match &err {
            WalletError::UserRejected => info!(action, "request rejected in wallet"),
            WalletError::Unavailable(reason) => {
                warn!(action, %reason, "no wallet provider");
                self.notifier.alert("Get a wallet such as MetaMask to continue");
            }
            _ => {
                warn!(action, error = %err, "wallet request failed");
                self.notifier.error(&format!("{action} failed: {err}"));
            }
        }
        err.into()
    }

    fn validate_name(&self, name: &str) -> Result<Price, SessionError> {
        let length = nm_api_types::name_length(name);
        let min = self.config.min_name_length;
        if length == 0 {
            self.notifier.error("Enter a domain name first");
            return Err(SessionError::Validation("domain name is required".to_owned()));
        }
        if length < min {
            let message = format!("Domain must be at least {min} characters long");
            self.notifier.alert(&message);
            return Err(SessionError::Validation(message));
        }
        self.config
            .price_tiers
            .price_for(length)
            .cloned()
            .ok_or_else(|| SessionError::Validation(format!("no price for names of length {length}")))
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.state.is_busy() {
            debug!(activity = ?self.state.activity, "rejecting request while busy");
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.state.account.is_none() {
            self.notifier.error("Connect your wallet first");
            return Err(SessionError::NotConnected);
        }
        if !self.on_target_network() {
            let target = &self.config.target_chain.chain_name;
            self.notifier.error(&format!("Switch to {target} first"));
            return Err(SessionError::WrongNetwork(target.clone()));
        }
        Ok(())
    }

    fn on_target_network(&self) -> bool {
        self.state.on_chain(self.config.target_chain_id())
    }

    async fn refresh_if_on_target(&mut self) {
        if self.on_target_network() {
            let _ = self.fetch_mints().await;
        }
    }

    fn apply_chain(&mut self, chain_id: ChainId) {
        self.state.network_name = self.config.network_name(&chain_id);
        debug!(chain_id = %chain_id.0, network = %self.state.network_name, "wallet chain");
        self.state.chain_id = Some(chain_id);
    }

    fn begin(&mut self, activity: Activity) {
        self.state.activity = activity;
        self.state.form.submitting = true;
        self.publish();
    }

    fn finish(&mut self) {
        self.state.activity = Activity::Idle;
        self.state.form.submitting = false;
        self.publish();
    }

    fn schedule_refresh(&mut self) {
        let deadline = Instant::now() + self.config.refresh_delay();
        debug!(delay_ms = self.config.refresh_delay_ms, "refresh scheduled");
        self.state.refresh_at = Some(deadline);
    }

    fn domain(&self, name: &str) -> String {
        format!("{name}{}", self.config.tld)
    }

    fn confirmed_message(&self, headline: &str, hash: &TxHash) -> String {
        match self.config.explorer_tx_url(hash) {
            Some(url) => format!("{headline} ({url})"),
            None => headline.to_owned(),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
