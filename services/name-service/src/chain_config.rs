use axum::{Json, extract::State};
use nm_api_types::{ChainConfigResponse, PriceTierInfo};

use crate::AppState;

/// Returns the static deployment the session runs against.
///
/// The UI uses this to label prices and the target network without
/// hardcoding either.
pub(crate) async fn chain_config(State(state): State<AppState>) -> Json<ChainConfigResponse> {
    let config = &state.config;
    Json(ChainConfigResponse {
        chain: config.target_chain.clone(),
        tld: config.tld.clone(),
        contract_address: config.contract_address.clone(),
        min_name_length: config.min_name_length,
        price_tiers: config
            .price_tiers
            .tiers()
            .into_iter()
            .map(|tier| PriceTierInfo {
                min_length: tier.min_length,
                price: tier.price,
            })
            .collect(),
        refresh_delay_ms: config.refresh_delay_ms,
    })
}
