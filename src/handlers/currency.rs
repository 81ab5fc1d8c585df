//! Currency classification handlers
//!
//! Public endpoints (no session required) plus the classification helper the
//! wallet and order handlers call before any mutation.

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::{
    error::ApiError,
    grpc_clients::currency::{self, CurrencyType},
    models::{CurrencyListResponse, CurrencyTypeResponse},
    server::AppState,
};

use super::backend_error;

#[derive(Debug, Deserialize)]
pub struct CurrencyTypeQuery {
    pub currency_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrencyListQuery {
    pub currency_type: String,
}

/// GET /currency?currency_name=
pub async fn get_currency_type(
    State(state): State<AppState>,
    Query(query): Query<CurrencyTypeQuery>,
) -> Result<Json<CurrencyTypeResponse>, ApiError> {
    let currency_type = classify(&state, &query.currency_name).await?;

    Ok(Json(CurrencyTypeResponse {
        currency_name: query.currency_name,
        currency_type: type_name(currency_type).to_string(),
    }))
}

/// GET /currency/currencies?currency_type=
pub async fn get_currencies_by_type(
    State(state): State<AppState>,
    Query(query): Query<CurrencyListQuery>,
) -> Result<Json<CurrencyListResponse>, ApiError> {
    let currency_type = parse_type_name(&query.currency_type)?;

    let mut client = state.clients.currency.clone();
    let response = client
        .get_supported_currencies(currency::CurrencyClass {
            currency_type: currency_type as i32,
        })
        .await
        .map_err(|e| backend_error("get_supported_currencies", "currency", &e))?
        .into_inner();

    if response.currencies.is_empty() {
        return Err(ApiError::NoContent);
    }

    Ok(Json(CurrencyListResponse {
        currencies: response.currencies.into_iter().map(|c| c.name).collect(),
    }))
}

/// Ask the currency backend how it classifies a currency code.
pub(crate) async fn classify(state: &AppState, name: &str) -> Result<CurrencyType, ApiError> {
    let mut client = state.clients.currency.clone();
    let response = client
        .get_currency_type(currency::CurrencyName {
            name: name.to_string(),
        })
        .await
        .map_err(|e| backend_error("get_currency_type", "currency", &e))?
        .into_inner();

    Ok(CurrencyType::try_from(response.currency_type).unwrap_or(CurrencyType::NotSupported))
}

pub(crate) const fn type_name(currency_type: CurrencyType) -> &'static str {
    match currency_type {
        CurrencyType::NotSupported => "NOT_SUPPORTED",
        CurrencyType::Fiat => "FIAT",
        CurrencyType::Crypto => "CRYPTO",
    }
}

fn parse_type_name(name: &str) -> Result<CurrencyType, ApiError> {
    match name {
        "FIAT" => Ok(CurrencyType::Fiat),
        "CRYPTO" => Ok(CurrencyType::Crypto),
        _ => Err(ApiError::InvalidData),
    }
}
