//! Order handlers
//!
//! Order creation is the one multi-backend workflow on the write path: the
//! destination wallet is provisioned before the order RPC. If the order RPC
//! then fails the wallet stays, an accepted inconsistency window; the next
//! attempt reuses it.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    error::ApiError,
    grpc_clients::{
        currency::CurrencyType,
        order::{self, OrderSide, OrderStatus, OrderType},
    },
    middleware::Identity,
    models::{CreateOrderRequest, OrderListResponse, OrderResponse},
    server::AppState,
    utils::parse_fixed_point,
};

use super::{backend_error, currency, wallet};

#[derive(Debug, Deserialize)]
pub struct OrderIdQuery {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub wallet_id: Option<String>,
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
}

/// POST /order
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let identity = state.authorize(&headers)?;

    // All validation happens before any backend mutation.
    let order_type = parse_order_type(&request.order_type).ok_or(ApiError::OperationFailed)?;
    let side = parse_order_side(&request.side).ok_or(ApiError::OperationFailed)?;

    let nominal = parse_fixed_point(&request.nominal).map_err(|_| ApiError::OperationFailed)?;
    let price = parse_fixed_point(&request.price).map_err(|_| ApiError::OperationFailed)?;
    if nominal <= 0 || price <= 0 {
        return Err(ApiError::OperationFailed);
    }

    wallet::validate_wallet_id(&request.currency_used_wallet_id)?;
    let funding = fetch_owned_order_wallet(&state, &identity, &request.currency_used_wallet_id).await?;

    let classification = currency::classify(&state, &request.currency_target).await?;
    if classification == CurrencyType::NotSupported {
        return Err(ApiError::CurrencyTypeNotSupported);
    }
    let target_is_crypto = classification == CurrencyType::Crypto;

    // An order implicitly opens its destination wallet.
    let target = wallet::find_or_create_wallet(
        &state,
        &identity.user_id,
        &request.currency_target,
        target_is_crypto,
    )
    .await?;

    let (crypto_wallet_id, fiat_wallet_id) = if target_is_crypto {
        (target.id, funding.id)
    } else {
        (funding.id, target.id)
    };

    let mut client = state.clients.order.clone();
    let created = client
        .create_order(order::OrderDetails {
            id: String::new(),
            user_id: identity.user_id.clone(),
            date_created: Utc::now().timestamp(),
            date_executed: 0,
            // Status is never client-supplied at creation.
            status: OrderStatus::Pending as i32,
            nominal: request.nominal,
            cash_quantity: request.cash_quantity.unwrap_or_default(),
            price: request.price,
            order_type: order_type as i32,
            side: side as i32,
            crypto_wallet_id,
            fiat_wallet_id,
        })
        .await
        .map_err(|e| backend_error("create_order", "order", &e))?
        .into_inner();

    if created.id.is_empty() {
        warn!("Order creation rejected for user {}", identity.user_id);
        return Err(ApiError::OperationFailed);
    }

    info!("Created order {} for user {}", created.id, identity.user_id);
    Ok(Json(to_response(created)))
}

/// GET /order?order_id=
pub async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OrderIdQuery>,
) -> Result<Json<OrderResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    let order = fetch_owned_order(&state, &identity, &query.order_id).await?;
    Ok(Json(to_response(order)))
}

/// DELETE /order?order_id=
pub async fn delete_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OrderIdQuery>,
) -> Result<Json<OrderResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    let existing = fetch_owned_order(&state, &identity, &query.order_id).await?;

    let mut client = state.clients.order.clone();
    let deleted = client
        .delete_order(order::OrderId { id: existing.id })
        .await
        .map_err(|e| backend_error("delete_order", "order", &e))?
        .into_inner();

    if deleted.id.is_empty() {
        return Err(ApiError::OperationFailed);
    }

    info!("Deleted order {} for user {}", deleted.id, identity.user_id);
    Ok(Json(to_response(deleted)))
}

/// GET /order/orders. Always scoped to the caller; omitted or unknown
/// filters become the backend's "no filter" sentinels.
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let identity = state.authorize(&headers)?;

    let status = query
        .order_status
        .as_deref()
        .and_then(parse_order_status)
        .unwrap_or(OrderStatus::Undefined);
    let order_type = query
        .order_type
        .as_deref()
        .and_then(parse_order_type)
        .unwrap_or(OrderType::Undefined);
    let side = query
        .side
        .as_deref()
        .and_then(parse_order_side)
        .unwrap_or(OrderSide::Undefined);

    let mut client = state.clients.order.clone();
    let response = client
        .list_orders(order::OrderFilter {
            user_id: identity.user_id,
            wallet_id: query.wallet_id.unwrap_or_default(),
            status: status as i32,
            order_type: order_type as i32,
            side: side as i32,
        })
        .await
        .map_err(|e| backend_error("list_orders", "order", &e))?
        .into_inner();

    if response.orders.is_empty() {
        return Err(ApiError::NoContent);
    }

    Ok(Json(OrderListResponse {
        orders: response.orders.into_iter().map(to_response).collect(),
    }))
}

async fn fetch_owned_order(
    state: &AppState,
    identity: &Identity,
    order_id: &str,
) -> Result<order::OrderDetails, ApiError> {
    let mut client = state.clients.order.clone();
    let response = client
        .get_order(order::OrderId {
            id: order_id.to_string(),
        })
        .await
        .map_err(|e| backend_error("get_order", "order", &e))?
        .into_inner();

    if response.id.is_empty() {
        return Err(ApiError::NoContent);
    }
    identity.require_owner(&response.user_id)?;
    Ok(response)
}

/// Funding-wallet lookup for order creation; wraps the wallet backend's
/// sentinel and ownership rule the same way the wallet handler does.
async fn fetch_owned_order_wallet(
    state: &AppState,
    identity: &Identity,
    wallet_id: &str,
) -> Result<crate::grpc_clients::wallet::Wallet, ApiError> {
    use crate::grpc_clients::wallet as wallet_proto;

    let mut client = state.clients.wallet.clone();
    let response = client
        .get_wallet(wallet_proto::WalletId {
            id: wallet_id.to_string(),
        })
        .await
        .map_err(|e| backend_error("get_wallet", "wallet", &e))?
        .into_inner();

    if response.id.is_empty() {
        return Err(ApiError::WalletIdIncorrectValue);
    }
    identity.require_owner(&response.user_id)?;
    Ok(response)
}

fn parse_order_type(name: &str) -> Option<OrderType> {
    match name {
        "STOP_LOSS" => Some(OrderType::StopLoss),
        "TAKE_PROFIT" => Some(OrderType::TakeProfit),
        "INSTANT" => Some(OrderType::Instant),
        "PENDING" => Some(OrderType::Pending),
        _ => None,
    }
}

fn parse_order_side(name: &str) -> Option<OrderSide> {
    match name {
        "BUY" => Some(OrderSide::Buy),
        "SELL" => Some(OrderSide::Sell),
        _ => None,
    }
}

fn parse_order_status(name: &str) -> Option<OrderStatus> {
    match name {
        "PENDING" => Some(OrderStatus::Pending),
        "ACCEPTED" => Some(OrderStatus::Accepted),
        "REJECTED" => Some(OrderStatus::Rejected),
        "PARTIALLY_COMPLETED" => Some(OrderStatus::PartiallyCompleted),
        "COMPLETED" => Some(OrderStatus::Completed),
        "CANCELLED" => Some(OrderStatus::Cancelled),
        "EXPIRED" => Some(OrderStatus::Expired),
        "IN_PROGRESS" => Some(OrderStatus::InProgress),
        _ => None,
    }
}

const fn status_name(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Undefined => "UNDEFINED",
        OrderStatus::Pending => "PENDING",
        OrderStatus::Accepted => "ACCEPTED",
        OrderStatus::Rejected => "REJECTED",
        OrderStatus::PartiallyCompleted => "PARTIALLY_COMPLETED",
        OrderStatus::Completed => "COMPLETED",
        OrderStatus::Cancelled => "CANCELLED",
        OrderStatus::Expired => "EXPIRED",
        OrderStatus::InProgress => "IN_PROGRESS",
    }
}

const fn type_name(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Undefined => "UNDEFINED",
        OrderType::StopLoss => "STOP_LOSS",
        OrderType::TakeProfit => "TAKE_PROFIT",
        OrderType::Instant => "INSTANT",
        OrderType::Pending => "PENDING",
    }
}

const fn side_name(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Undefined => "UNDEFINED",
        OrderSide::Buy => "BUY",
        OrderSide::Sell => "SELL",
    }
}

fn to_response(order: order::OrderDetails) -> OrderResponse {
    let status = OrderStatus::try_from(order.status).unwrap_or(OrderStatus::Undefined);
    let order_type = OrderType::try_from(order.order_type).unwrap_or(OrderType::Undefined);
    let side = OrderSide::try_from(order.side).unwrap_or(OrderSide::Undefined);

    OrderResponse {
        id: order.id,
        user_id: order.user_id,
        date_created: order.date_created,
        date_executed: order.date_executed,
        status: status_name(status).to_string(),
        nominal: order.nominal,
        cash_quantity: order.cash_quantity,
        price: order.price,
        order_type: type_name(order_type).to_string(),
        side: side_name(side).to_string(),
        crypto_wallet_id: order.crypto_wallet_id,
        fiat_wallet_id: order.fiat_wallet_id,
    }
}
