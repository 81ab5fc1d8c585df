//! Error taxonomy for the HTTP surface
//!
//! Every failure a handler can surface maps to exactly one stable detail
//! string and HTTP status. Backend/transport failures are logged at the call
//! site and collapse into `Internal` so nothing downstream leaks to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Gateway error surfaced to HTTP clients as `{"detail": <kind>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    // Authorization failures (401)
    #[error("no_authorization_header")]
    NoAuthorizationHeader,
    #[error("invalid_auth_scheme")]
    InvalidAuthScheme,
    #[error("invalid_token")]
    InvalidToken,
    #[error("expired_token")]
    ExpiredToken,
    #[error("unauthorized_user_for_method")]
    UnauthorizedForMethod,

    // Client input / business precondition failures (400)
    #[error("invalid_credentials")]
    InvalidCredentials,
    // Same detail string as InvalidToken; a rejected provider token is a bad
    // request, not a failed session.
    #[error("invalid_token")]
    InvalidProviderToken,
    #[error("email_or_username_occupied")]
    EmailOrUsernameOccupied,
    #[error("password_length_too_short")]
    PasswordLengthTooShort,
    #[error("common_password")]
    CommonPassword,
    #[error("invalid_old_password")]
    InvalidOldPassword,
    #[error("negative_value")]
    NegativeValue,
    #[error("currency_type_not_supported")]
    CurrencyTypeNotSupported,
    #[error("wallet_id_incorrect_value")]
    WalletIdIncorrectValue,
    #[error("not_supported_currency")]
    NotSupportedCurrency,
    #[error("invalid_nominal")]
    InvalidNominal,
    #[error("invalid_payment_session")]
    InvalidPaymentSession,
    #[error("invalid_data")]
    InvalidData,
    #[error("operation_failed")]
    OperationFailed,

    // Backend returned its empty "not found" sentinel (204, no body)
    #[error("no_content")]
    NoContent,

    // Downstream transport or backend-internal failure (500)
    #[error("internal_server_error")]
    Internal,
}

impl ApiError {
    /// HTTP status for this error kind.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoAuthorizationHeader
            | Self::InvalidAuthScheme
            | Self::InvalidToken
            | Self::ExpiredToken
            | Self::UnauthorizedForMethod => StatusCode::UNAUTHORIZED,
            Self::NoContent => StatusCode::NO_CONTENT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // 204 carries no body by definition.
        if self == Self::NoContent {
            return StatusCode::NO_CONTENT.into_response();
        }
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
