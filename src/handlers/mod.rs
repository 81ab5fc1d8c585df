//! HTTP handlers for each backend domain

pub mod auth;
pub mod blog;
pub mod crypto_data;
pub mod currency;
pub mod health;
pub mod order;
pub mod payment;
pub mod statistics;
pub mod user;
pub mod wallet;

use tracing::error;

use crate::error::ApiError;

/// Translate a transport failure at the point of call. Nothing about the
/// backend leaks to the client beyond an opaque 500.
pub(crate) fn backend_error(operation: &str, backend: &str, status: &tonic::Status) -> ApiError {
    error!(operation, backend, error = %status, "Backend call failed");
    ApiError::Internal
}
