//! Global application state.
//!
//! `RefCell`-wrapped `thread_local!` storage (WASM is single-threaded).

use nm_api_types::{ChainConfigResponse, SessionSnapshot};
use std::cell::RefCell;

#[derive(Default)]
pub struct AppState {
    pub snapshot: Option<SessionSnapshot>,
    pub chain_config: Option<ChainConfigResponse>,
    /// Highest notice sequence already shown as a toast.
    pub notice_seq: u64,
    /// Set while a user action is waiting on the service.
    pub action_in_flight: bool,
    /// `/form` posts started so far, and how many have not answered yet.
    pub form_posts_started: u64,
    pub form_posts_pending: u32,
}

thread_local! {
    static STATE: RefCell<AppState> = RefCell::new(AppState::default());
}

pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&AppState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut AppState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

pub fn snapshot() -> Option<SessionSnapshot> {
    with(|s| s.snapshot.clone())
}

/// Stores the snapshot; true when the rendered mint list would change.
pub fn set_snapshot(snapshot: SessionSnapshot) -> bool {
    with_mut(|s| {
        let list_changed = s.snapshot.as_ref().is_none_or(|prev| {
            prev.mints != snapshot.mints
                || prev.account != snapshot.account
                || prev.tld != snapshot.tld
        });
        s.snapshot = Some(snapshot);
        list_changed
    })
}

pub fn chain_config() -> Option<ChainConfigResponse> {
    with(|s| s.chain_config.clone())
}

pub fn set_chain_config(config: ChainConfigResponse) {
    with_mut(|s| s.chain_config = Some(config));
}

pub fn notice_seq() -> u64 {
    with(|s| s.notice_seq)
}

pub fn set_notice_seq(seq: u64) {
    with_mut(|s| s.notice_seq = s.notice_seq.max(seq));
}

/// Claims the action slot; false when another action is already running.
pub fn begin_action() -> bool {
    with_mut(|s| !std::mem::replace(&mut s.action_in_flight, true))
}

pub fn end_action() {
    with_mut(|s| s.action_in_flight = false);
}

pub fn begin_form_post() {
    with_mut(|s| {
        s.form_posts_started += 1;
        s.form_posts_pending += 1;
    });
}

pub fn end_form_post() {
    with_mut(|s| s.form_posts_pending = s.form_posts_pending.saturating_sub(1));
}

/// Marker taken before a snapshot request.
pub fn form_generation() -> u64 {
    with(|s| s.form_posts_started)
}

/// True when no `/form` post started after `generation` or is still
/// running, so a snapshot requested at `generation` holds current values.
pub fn form_settled_since(generation: u64) -> bool {
    with(|s| s.form_posts_pending == 0 && s.form_posts_started == generation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_slot_is_exclusive() {
        assert!(begin_action());
        assert!(!begin_action());
        end_action();
        assert!(begin_action());
        end_action();
    }

    #[test]
    fn list_change_detection_ignores_form_edits() {
        let mut snapshot = SessionSnapshot::default();
        assert!(set_snapshot(snapshot.clone()));

        snapshot.form.name = "abc".to_string();
        assert!(!set_snapshot(snapshot.clone()));

        snapshot.account_short = Some("0x1234...abcd".to_string());
        snapshot.account = Some(nm_api_types::WalletAddress("0x12".to_string()));
        assert!(set_snapshot(snapshot));
    }

    #[test]
    fn snapshot_fields_are_stale_around_form_posts() {
        let before = form_generation();
        assert!(form_settled_since(before));

        begin_form_post();
        assert!(!form_settled_since(before));
        assert!(!form_settled_since(form_generation()));

        end_form_post();
        assert!(!form_settled_since(before));
        assert!(form_settled_since(form_generation()));
    }

    #[test]
    fn notice_seq_never_moves_backwards() {
        set_notice_seq(7);
        set_notice_seq(3);
        assert_eq!(notice_seq(), 7);
    }
}
