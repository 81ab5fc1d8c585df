//! Wallet handlers
//!
//! The client-facing update carries a signed delta; the backend RPC always
//! receives an absolute value computed here. `user_id` is always taken from
//! the verified identity, never from the request body.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    error::ApiError,
    grpc_clients::{currency::CurrencyType, wallet},
    middleware::{Identity, Role},
    models::{CreateWalletRequest, UpdateWalletRequest, WalletListResponse, WalletResponse},
    server::AppState,
    utils::{fixed_point_to_string, parse_fixed_point},
};

use super::{backend_error, currency};

#[derive(Debug, Deserialize)]
pub struct WalletIdQuery {
    pub wallet_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WalletListQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// POST /wallets
pub async fn create_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateWalletRequest>,
) -> Result<Json<WalletResponse>, ApiError> {
    let identity = state.authorize(&headers)?;

    let value = request.value.as_deref().unwrap_or("0");
    let fixed_value = parse_fixed_point(value).map_err(|_| ApiError::InvalidData)?;
    if fixed_value < 0 {
        return Err(ApiError::NegativeValue);
    }

    let classification = currency::classify(&state, &request.currency).await?;
    if classification == CurrencyType::NotSupported {
        return Err(ApiError::CurrencyTypeNotSupported);
    }

    // Ordinary users may not self-fund a crypto wallet; funding flows through
    // orders and payments.
    let is_crypto = classification == CurrencyType::Crypto;
    if is_crypto && fixed_value > 0 && identity.role < Role::SuperAdmin {
        warn!("Rejected self-funded crypto wallet for user {}", identity.user_id);
        return Err(ApiError::OperationFailed);
    }

    let created = create_backend_wallet(
        &state,
        &identity.user_id,
        &request.currency,
        fixed_value,
        is_crypto,
    )
    .await?;

    info!("Created wallet {} for user {}", created.id, identity.user_id);
    Ok(Json(to_response(created)))
}

/// GET /wallets/wallet?wallet_id=
pub async fn get_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WalletIdQuery>,
) -> Result<Json<WalletResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    let wallet = fetch_owned_wallet(&state, &identity, &query.wallet_id).await?;
    Ok(Json(to_response(wallet)))
}

/// PUT /wallets
pub async fn update_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateWalletRequest>,
) -> Result<Json<WalletResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    let existing = fetch_owned_wallet(&state, &identity, &request.id).await?;

    let delta = parse_fixed_point(&request.value).map_err(|_| ApiError::InvalidData)?;
    let current = parse_fixed_point(&existing.value).map_err(|_| ApiError::Internal)?;
    let new_value = current + delta;
    if new_value < 0 {
        return Err(ApiError::NegativeValue);
    }

    let (currency_code, is_crypto) = match request.currency {
        Some(ref name) if *name != existing.currency => {
            let classification = currency::classify(&state, name).await?;
            if classification == CurrencyType::NotSupported {
                return Err(ApiError::CurrencyTypeNotSupported);
            }
            (name.clone(), classification == CurrencyType::Crypto)
        }
        _ => (existing.currency.clone(), existing.is_crypto),
    };

    let mut client = state.clients.wallet.clone();
    let updated = client
        .update_wallet(wallet::Wallet {
            id: existing.id,
            currency: currency_code,
            value: fixed_point_to_string(new_value),
            user_id: existing.user_id,
            is_crypto,
        })
        .await
        .map_err(|e| backend_error("update_wallet", "wallet", &e))?
        .into_inner();

    if updated.id.is_empty() {
        return Err(ApiError::OperationFailed);
    }

    info!("Updated wallet {} (delta {})", updated.id, request.value);
    Ok(Json(to_response(updated)))
}

/// GET /wallets?user_id=
pub async fn list_wallets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WalletListQuery>,
) -> Result<Json<WalletListResponse>, ApiError> {
    let identity = state.authorize(&headers)?;

    let target = match query.user_id {
        Some(ref id) if *id != identity.user_id => {
            identity.require_role(Role::SuperAdmin)?;
            id.clone()
        }
        _ => identity.user_id.clone(),
    };

    let wallets = list_user_wallets(&state, &target).await?;
    if wallets.is_empty() {
        return Err(ApiError::NoContent);
    }

    Ok(Json(WalletListResponse {
        wallets: wallets.into_iter().map(to_response).collect(),
    }))
}

/// DELETE /wallets?wallet_id=
pub async fn delete_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WalletIdQuery>,
) -> Result<Json<WalletResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    // Ownership is proven on a fetch before the delete RPC is issued.
    let existing = fetch_owned_wallet(&state, &identity, &query.wallet_id).await?;

    let mut client = state.clients.wallet.clone();
    let deleted = client
        .delete_wallet(wallet::WalletId { id: existing.id })
        .await
        .map_err(|e| backend_error("delete_wallet", "wallet", &e))?
        .into_inner();

    if deleted.id.is_empty() {
        return Err(ApiError::OperationFailed);
    }

    info!("Deleted wallet {} for user {}", deleted.id, identity.user_id);
    Ok(Json(to_response(deleted)))
}

/// Validated, ownership-checked fetch shared by get/update/delete.
async fn fetch_owned_wallet(
    state: &AppState,
    identity: &Identity,
    wallet_id: &str,
) -> Result<wallet::Wallet, ApiError> {
    validate_wallet_id(wallet_id)?;

    let mut client = state.clients.wallet.clone();
    let response = client
        .get_wallet(wallet::WalletId {
            id: wallet_id.to_string(),
        })
        .await
        .map_err(|e| backend_error("get_wallet", "wallet", &e))?
        .into_inner();

    if response.id.is_empty() {
        return Err(ApiError::NoContent);
    }
    identity.require_owner(&response.user_id)?;
    Ok(response)
}

/// Wallet ids are positive integers on the wire.
pub(crate) fn validate_wallet_id(wallet_id: &str) -> Result<(), ApiError> {
    match wallet_id.parse::<u64>() {
        Ok(id) if id > 0 => Ok(()),
        _ => Err(ApiError::WalletIdIncorrectValue),
    }
}

pub(crate) async fn list_user_wallets(
    state: &AppState,
    user_id: &str,
) -> Result<Vec<wallet::Wallet>, ApiError> {
    let mut client = state.clients.wallet.clone();
    let response = client
        .get_user_wallets(wallet::UserId {
            id: user_id.to_string(),
        })
        .await
        .map_err(|e| backend_error("get_user_wallets", "wallet", &e))?
        .into_inner();
    Ok(response.wallets)
}

/// Create-order support: reuse the caller's existing wallet for the currency
/// when one exists, otherwise open an empty one.
pub(crate) async fn find_or_create_wallet(
    state: &AppState,
    user_id: &str,
    currency_code: &str,
    is_crypto: bool,
) -> Result<wallet::Wallet, ApiError> {
    let existing = list_user_wallets(state, user_id)
        .await?
        .into_iter()
        .find(|w| w.currency == currency_code);
    if let Some(found) = existing {
        return Ok(found);
    }

    let created = create_backend_wallet(state, user_id, currency_code, 0, is_crypto).await?;
    info!("Provisioned {} wallet {} for user {}", currency_code, created.id, user_id);
    Ok(created)
}

async fn create_backend_wallet(
    state: &AppState,
    user_id: &str,
    currency_code: &str,
    fixed_value: i64,
    is_crypto: bool,
) -> Result<wallet::Wallet, ApiError> {
    let mut client = state.clients.wallet.clone();
    let response = client
        .create_wallet(wallet::Wallet {
            id: String::new(),
            currency: currency_code.to_string(),
            value: fixed_point_to_string(fixed_value),
            user_id: user_id.to_string(),
            is_crypto,
        })
        .await
        .map_err(|e| backend_error("create_wallet", "wallet", &e))?
        .into_inner();

    if response.id.is_empty() {
        return Err(ApiError::OperationFailed);
    }
    Ok(response)
}

fn to_response(wallet: wallet::Wallet) -> WalletResponse {
    WalletResponse {
        id: wallet.id,
        currency: wallet.currency,
        value: wallet.value,
        user_id: wallet.user_id,
        is_crypto: wallet.is_crypto,
    }
}
