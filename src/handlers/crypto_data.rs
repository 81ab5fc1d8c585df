//! Coin market-data handler
//!
//! Joins the currency backend's classification against the price oracle's
//! per-coin market data. Both sides of the pair are validated before the
//! data fetch: the valuation currency must classify as fiat and the coin as
//! crypto, otherwise the request is rejected outright.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    error::ApiError,
    grpc_clients::{currency::CurrencyType, price},
    models::CoinDetailsResponse,
    server::AppState,
};

use super::{backend_error, currency};

const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Deserialize)]
pub struct CoinDetailsQuery {
    pub coin_id: String,
    /// Fiat currency the market figures are expressed in
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "usd".to_string()
}

/// GET /details?coin_id=&currency=
pub async fn get_coin_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CoinDetailsQuery>,
) -> Result<Json<CoinDetailsResponse>, ApiError> {
    state.authorize(&headers)?;

    let fiat_class = currency::classify(&state, &query.currency).await?;
    let coin_class = currency::classify(&state, &query.coin_id).await?;
    if fiat_class != CurrencyType::Fiat || coin_class != CurrencyType::Crypto {
        return Err(ApiError::InvalidData);
    }

    let mut client = state.clients.price.clone();
    let response = client
        .get_coin_data(price::CoinDataRequest {
            coin_id: query.coin_id.clone(),
            fiat_currency: query.currency.clone(),
        })
        .await
        .map_err(|e| backend_error("get_coin_data", "price", &e))?
        .into_inner();

    if response.status != STATUS_SUCCESS {
        error!(
            "Coin data lookup for {} failed: {} ({})",
            query.coin_id, response.status, response.error_message
        );
        return Err(ApiError::Internal);
    }
    let Some(data) = response.data else {
        error!("Coin data lookup for {} returned no payload", query.coin_id);
        return Err(ApiError::Internal);
    };

    info!("Retrieved market data for {}", query.coin_id);
    Ok(Json(CoinDetailsResponse {
        coin_id: data.coin_id,
        name: data.name,
        current_price: data.current_price,
        market_cap: data.market_cap,
        total_volume: data.total_volume,
        price_change_percentage_24h: data.price_change_percentage_24h,
        high_24h: data.high_24h,
        low_24h: data.low_24h,
        values_in_currency: query.currency,
    }))
}
