//! REST API models and request/response types

use serde::{Deserialize, Serialize};

/// Authentication models
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email address
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OauthLoginRequest {
    /// Provider-issued id token
    #[serde(rename = "OAuth_token")]
    pub token: String,
}

/// Session issued after login/register/OAuth, all in one shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "authScheme")]
    pub auth_scheme: String,
    pub email: String,
    pub username: String,
}

/// User models
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDetailsResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub street: String,
    pub building: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub user_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub street: String,
    pub building: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserDetailsResponse>,
}

/// Wallet models
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateWalletRequest {
    pub currency: String,
    /// Initial value; defaults to zero
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateWalletRequest {
    pub id: String,
    #[serde(default)]
    pub currency: Option<String>,
    /// Delta applied to the current value; may be negative
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    pub id: String,
    pub currency: String,
    pub value: String,
    pub user_id: String,
    pub is_crypto: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletListResponse {
    pub wallets: Vec<WalletResponse>,
}

/// Order models
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Wallet the order is funded from
    pub currency_used_wallet_id: String,
    /// Currency the order buys into or sells out of
    pub currency_target: String,
    pub nominal: String,
    #[serde(default)]
    pub cash_quantity: Option<String>,
    pub price: String,
    /// "STOP_LOSS", "TAKE_PROFIT", "INSTANT" or "PENDING"
    pub order_type: String,
    /// "BUY" or "SELL"
    pub side: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub date_created: i64,
    pub date_executed: i64,
    pub status: String,
    pub nominal: String,
    pub cash_quantity: String,
    pub price: String,
    pub order_type: String,
    pub side: String,
    pub crypto_wallet_id: String,
    pub fiat_wallet_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
}

/// Payment models
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub currency: String,
    pub nominal: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: String,
    pub currency: String,
    pub value: String,
    pub user_id: String,
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentCreatedResponse {
    pub session_url: String,
    pub payment_details: PaymentResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
}

/// Currency models
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrencyTypeResponse {
    pub currency_name: String,
    pub currency_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrencyListResponse {
    pub currencies: Vec<String>,
}

/// Coin market-data models
#[derive(Debug, Serialize, Deserialize)]
pub struct CoinDetailsResponse {
    pub coin_id: String,
    pub name: String,
    pub current_price: String,
    pub market_cap: String,
    pub total_volume: String,
    pub price_change_percentage_24h: String,
    pub high_24h: String,
    pub low_24h: String,
    /// Fiat currency the figures above are expressed in
    pub values_in_currency: String,
}

/// Statistics models
#[derive(Debug, Serialize, Deserialize)]
pub struct CryptoWalletStat {
    pub cryptocurrency: String,
    pub fiat_value: f64,
    pub current_price: f64,
    pub share_in_portfolio: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioDiversityResponse {
    pub calculation_fiat_currency: String,
    pub crypto_wallets_statistics: Vec<CryptoWalletStat>,
}

/// Blog models
#[derive(Debug, Serialize, Deserialize)]
pub struct BlogRequest {
    pub language: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlogUpdateRequest {
    pub language: String,
    pub title: String,
    pub content: String,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlogResponse {
    pub language: String,
    pub title: String,
    pub content: String,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlogListResponse {
    pub blogs: Vec<BlogResponse>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
}
