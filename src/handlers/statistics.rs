//! Portfolio statistics
//!
//! Joins the portfolio owner's crypto wallets against the price oracle and
//! reports per-coin fiat value and portfolio share.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;

use crate::{
    error::ApiError,
    grpc_clients::price,
    middleware::Role,
    models::{CryptoWalletStat, PortfolioDiversityResponse},
    server::AppState,
};

use super::{backend_error, wallet};

#[derive(Debug, Deserialize)]
pub struct DiversityQuery {
    /// Fiat currency the valuation is expressed in
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Portfolio owner; reading another user's portfolio needs SuperAdmin
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_currency() -> String {
    "usd".to_string()
}

/// GET /statistics/portfolio-diversity?currency=
pub async fn portfolio_diversity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DiversityQuery>,
) -> Result<Json<PortfolioDiversityResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    let fiat = query.currency.to_lowercase();

    let target = match query.user_id {
        Some(ref id) if *id != identity.user_id => {
            identity.require_role(Role::SuperAdmin)?;
            id.clone()
        }
        _ => identity.user_id.clone(),
    };

    let crypto_wallets: Vec<_> = wallet::list_user_wallets(&state, &target)
        .await?
        .into_iter()
        .filter(|w| w.is_crypto)
        .collect();

    if crypto_wallets.is_empty() {
        return Err(ApiError::NoContent);
    }

    let mut client = state.clients.price.clone();
    let prices = client
        .get_all_coin_prices(price::CoinPricesRequest {})
        .await
        .map_err(|e| backend_error("get_all_coin_prices", "price", &e))?
        .into_inner();

    let quotes: HashMap<String, HashMap<String, String>> = prices
        .coins
        .into_iter()
        .map(|coin| (coin.coin, coin.quotes))
        .collect();

    let mut stats = Vec::with_capacity(crypto_wallets.len());
    let mut total = 0.0_f64;
    for held in crypto_wallets {
        let coin = held.currency.to_lowercase();
        let Some(quote) = quotes.get(&coin).and_then(|q| q.get(&fiat)) else {
            // No quote for this coin in the requested fiat; skip it rather
            // than failing the whole report.
            continue;
        };
        let current_price: f64 = quote.parse().map_err(|_| ApiError::Internal)?;
        let amount: f64 = held.value.parse().map_err(|_| ApiError::Internal)?;
        let fiat_value = amount * current_price;
        total += fiat_value;
        stats.push(CryptoWalletStat {
            cryptocurrency: held.currency,
            fiat_value,
            current_price,
            share_in_portfolio: 0.0,
        });
    }

    if stats.is_empty() || total <= 0.0 {
        return Err(ApiError::NoContent);
    }

    for stat in &mut stats {
        stat.share_in_portfolio = (stat.fiat_value / total * 10000.0).round() / 100.0;
    }

    Ok(Json(PortfolioDiversityResponse {
        calculation_fiat_currency: fiat,
        crypto_wallets_statistics: stats,
    }))
}
