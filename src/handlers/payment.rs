//! Payment handlers
//!
//! Checkout sessions live at the external processor; the payment backend
//! stores a record keyed by the processor's session id. Creation compensates
//! a failed record write by expiring the session; cancellation is idempotent
//! against already-closed sessions.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, header},
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    error::ApiError,
    grpc_clients::payment::{self, PaymentState},
    middleware::{Identity, Role},
    models::{CreatePaymentRequest, PaymentCreatedResponse, PaymentListResponse, PaymentResponse},
    processor::CheckoutRequest,
    server::AppState,
    utils::parse_fixed_point,
};

use super::backend_error;

#[derive(Debug, Deserialize)]
pub struct PaymentIdQuery {
    pub payment_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// POST /payments
pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Json<Vec<PaymentCreatedResponse>>, ApiError> {
    let identity = state.authorize(&headers)?;

    if !state
        .config
        .payments
        .supported_currencies
        .contains(&request.currency)
    {
        return Err(ApiError::NotSupportedCurrency);
    }

    let nominal = parse_fixed_point(&request.nominal).map_err(|_| ApiError::InvalidNominal)?;
    if nominal <= 0 {
        return Err(ApiError::InvalidNominal);
    }

    // Fixed point carries 4 decimals; the processor wants minor units.
    let unit_amount = nominal / 100;
    let origin = request_origin(&headers).unwrap_or_else(|| state.config.payments.default_origin.clone());

    let session = state
        .processor
        .create_session(CheckoutRequest {
            currency: request.currency.to_lowercase(),
            unit_amount,
            product_name: format!("Donate from {}.", identity.user_id),
            success_url: format!("{origin}/payment/success"),
            cancel_url: format!("{origin}/payment/fail"),
        })
        .await
        .map_err(|e| {
            warn!("Processor session creation failed: {}", e);
            ApiError::InvalidPaymentSession
        })?;

    let mut client = state.clients.payment.clone();
    let record = client
        .create_payment(payment::PaymentDetails {
            id: session.id.clone(),
            currency: request.currency,
            value: request.nominal,
            user_id: identity.user_id.clone(),
            state: PaymentState::Pending as i32,
        })
        .await;

    let details = match record {
        Ok(response) => response.into_inner(),
        Err(status) => {
            error!(error = %status, "Payment record creation failed, expiring session {}", session.id);
            // Best-effort compensation so the session cannot be paid against
            // a record that does not exist.
            if let Err(e) = state.processor.expire_session(&session.id).await {
                error!("Failed to expire orphaned session {}: {}", session.id, e);
            }
            return Err(ApiError::Internal);
        }
    };

    info!("Created payment {} for user {}", details.id, identity.user_id);
    Ok(Json(vec![PaymentCreatedResponse {
        session_url: session.url,
        payment_details: to_response(details),
    }]))
}

/// GET /payments?payment_id=
pub async fn get_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PaymentIdQuery>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    let details = fetch_owned_payment(&state, &identity, &query.payment_id).await?;
    Ok(Json(to_response(details)))
}

/// GET /payments/payments?user_id=
pub async fn list_payments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<PaymentListResponse>, ApiError> {
    let identity = state.authorize(&headers)?;

    let target = match query.user_id {
        Some(ref id) if *id != identity.user_id => {
            identity.require_role(Role::SuperAdmin)?;
            id.clone()
        }
        _ => identity.user_id.clone(),
    };

    let mut client = state.clients.payment.clone();
    let response = client
        .get_user_payments(payment::UserId { id: target })
        .await
        .map_err(|e| backend_error("get_user_payments", "payment", &e))?
        .into_inner();

    if response.payments.is_empty() {
        return Err(ApiError::NoContent);
    }

    Ok(Json(PaymentListResponse {
        payments: response.payments.into_iter().map(to_response).collect(),
    }))
}

/// PUT /payments/payment/cancel?payment_id=
///
/// Cancelling a payment whose session is already closed is a no-op that
/// returns the stored details, so repeated cancels always succeed.
pub async fn cancel_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PaymentIdQuery>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    let existing = fetch_owned_payment(&state, &identity, &query.payment_id).await?;

    let status = state
        .processor
        .session_status(&existing.id)
        .await
        .map_err(|e| {
            warn!("Processor status query failed for {}: {}", existing.id, e);
            ApiError::Internal
        })?;

    if !status.is_open() {
        info!("Cancel of closed session {} is a no-op", existing.id);
        return Ok(Json(to_response(existing)));
    }

    state.processor.expire_session(&existing.id).await.map_err(|e| {
        error!("Failed to expire session {}: {}", existing.id, e);
        ApiError::Internal
    })?;

    let mut client = state.clients.payment.clone();
    let updated = client
        .update_payment(payment::PaymentDetails {
            state: PaymentState::Cancelled as i32,
            ..existing
        })
        .await
        .map_err(|e| backend_error("update_payment", "payment", &e))?
        .into_inner();

    info!("Cancelled payment {}", updated.id);
    Ok(Json(to_response(updated)))
}

async fn fetch_owned_payment(
    state: &AppState,
    identity: &Identity,
    payment_id: &str,
) -> Result<payment::PaymentDetails, ApiError> {
    let mut client = state.clients.payment.clone();
    let response = client
        .get_payment(payment::PaymentId {
            id: payment_id.to_string(),
        })
        .await
        .map_err(|e| backend_error("get_payment", "payment", &e))?
        .into_inner();

    if response.id.is_empty() {
        return Err(ApiError::NoContent);
    }
    identity.require_owner(&response.user_id)?;
    Ok(response)
}

/// Redirect origin for checkout: the caller's Origin header, then Referer,
/// then the configured default.
fn request_origin(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) {
        return Some(origin.trim_end_matches('/').to_string());
    }
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(|referer| referer.trim_end_matches('/').to_string())
}

pub(crate) const fn state_name(state: PaymentState) -> &'static str {
    match state {
        PaymentState::Unspecified => "UNSPECIFIED",
        PaymentState::Pending => "PENDING",
        PaymentState::Accepted => "ACCEPTED",
        PaymentState::Cancelled => "CANCELLED",
    }
}

fn to_response(details: payment::PaymentDetails) -> PaymentResponse {
    let state = PaymentState::try_from(details.state).unwrap_or(PaymentState::Unspecified);
    PaymentResponse {
        id: details.id,
        currency: details.currency,
        value: details.value,
        user_id: details.user_id,
        state: state_name(state).to_string(),
    }
}
