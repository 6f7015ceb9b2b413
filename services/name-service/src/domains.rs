use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use nm_api_types::{
    ConnectResponse, DomainRequest, EditRequest, ErrorResponse, NoticesResponse, SessionSnapshot,
    TxHash,
};
use nm_session::{MintOutcome, SessionError, SwitchOutcome, UpdateOutcome};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppState, ApiResult, conflict};

#[derive(Debug, Deserialize)]
pub(crate) struct NoticesQuery {
    after: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SwitchResponse {
    outcome: SwitchOutcome,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshResponse {
    count: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct RetryHintResponse {
    record: TxHash,
}

pub(crate) async fn session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

pub(crate) async fn notices(
    State(state): State<AppState>,
    Query(query): Query<NoticesQuery>,
) -> Json<NoticesResponse> {
    let after = query.after.unwrap_or_default();
    Json(NoticesResponse {
        notices: state.notices.since(after),
        last_seq: state.notices.last_seq(),
    })
}

pub(crate) async fn wallet_connect(State(state): State<AppState>) -> ApiResult<ConnectResponse> {
    let account = state.session.connect_wallet().await.map_err(session_error)?;
    Ok(Json(ConnectResponse { account }))
}

pub(crate) async fn network_switch(State(state): State<AppState>) -> ApiResult<SwitchResponse> {
    let outcome = state.session.switch_network().await.map_err(session_error)?;
    Ok(Json(SwitchResponse { outcome }))
}

pub(crate) async fn set_form(
    State(state): State<AppState>,
    Json(request): Json<DomainRequest>,
) -> ApiResult<SessionSnapshot> {
    ensure_idle(&state)?;
    state
        .session
        .set_form(request.name, request.hint)
        .await
        .map_err(session_error)?;
    Ok(Json(state.session.snapshot()))
}

pub(crate) async fn mint(
    State(state): State<AppState>,
    Json(request): Json<DomainRequest>,
) -> ApiResult<MintOutcome> {
    ensure_idle(&state)?;
    let outcome = state
        .session
        .mint_domain(request.name, request.hint)
        .await
        .map_err(session_error)?;
    Ok(Json(outcome))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    Json(request): Json<DomainRequest>,
) -> ApiResult<UpdateOutcome> {
    ensure_idle(&state)?;
    let outcome = state
        .session
        .update_domain(request.name, request.hint)
        .await
        .map_err(session_error)?;
    Ok(Json(outcome))
}

pub(crate) async fn edit(
    State(state): State<AppState>,
    Json(request): Json<EditRequest>,
) -> ApiResult<SessionSnapshot> {
    ensure_idle(&state)?;
    state
        .session
        .edit_record(request.name)
        .await
        .map_err(session_error)?;
    Ok(Json(state.session.snapshot()))
}

pub(crate) async fn cancel_edit(State(state): State<AppState>) -> ApiResult<SessionSnapshot> {
    ensure_idle(&state)?;
    state.session.cancel_edit().await.map_err(session_error)?;
    Ok(Json(state.session.snapshot()))
}

pub(crate) async fn refresh(State(state): State<AppState>) -> ApiResult<RefreshResponse> {
    let count = state.session.fetch_mints().await.map_err(session_error)?;
    Ok(Json(RefreshResponse { count }))
}

pub(crate) async fn retry_hint(State(state): State<AppState>) -> ApiResult<RetryHintResponse> {
    ensure_idle(&state)?;
    let record = state
        .session
        .retry_pending_hint()
        .await
        .map_err(session_error)?;
    Ok(Json(RetryHintResponse { record }))
}

/// Mutations queue behind an in-flight transaction; refuse them up front
/// instead of holding the request open.
fn ensure_idle(state: &AppState) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if state.session.snapshot().form.submitting {
        debug!("rejecting request while a transaction is in flight");
        return Err(conflict("a transaction is still in flight"));
    }
    Ok(())
}

pub(crate) fn session_error(err: SessionError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        SessionError::Validation(_) => StatusCode::BAD_REQUEST,
        SessionError::Busy => StatusCode::CONFLICT,
        SessionError::NotConnected | SessionError::WrongNetwork(_) => {
            StatusCode::PRECONDITION_FAILED
        }
        SessionError::UserRejected => StatusCode::FORBIDDEN,
        SessionError::UnrecognizedChain(_) => StatusCode::BAD_GATEWAY,
        SessionError::TransactionFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::ReadFailure(_) | SessionError::Wallet(_) | SessionError::Contract(_) => {
            StatusCode::BAD_GATEWAY
        }
        SessionError::WalletUnavailable | SessionError::RuntimeClosed => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        SessionError::NoPendingHint => StatusCode::NOT_FOUND,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
