//! Request authorization
//!
//! Extracts and verifies the bearer token from an inbound request and yields
//! the request-scoped [`Identity`]. Role and ownership checks live on the
//! identity so handlers state their policy in one line.

use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::grpc_clients::user::UserType;
use crate::token::{Claims, TokenCodec};

const BEARER_PREFIX: &str = "Bearer ";

/// Privilege level of an authenticated user.
///
/// The declaration order *is* the privilege order: `Standard < Blogger <
/// SuperAdmin`. `privilege_tiers` pins this down so a reordering cannot slip
/// through unnoticed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Standard,
    Blogger,
    SuperAdmin,
}

impl Role {
    /// All roles, lowest privilege first.
    #[must_use]
    pub const fn privilege_tiers() -> [Self; 3] {
        [Self::Standard, Self::Blogger, Self::SuperAdmin]
    }

    /// Map the identity backend's user type onto a role. Unknown values fall
    /// back to the least privileged tier.
    #[must_use]
    pub fn from_user_type(user_type: i32) -> Self {
        match UserType::try_from(user_type) {
            Ok(UserType::Blogger) => Self::Blogger,
            Ok(UserType::SuperAdmin) => Self::SuperAdmin,
            _ => Self::Standard,
        }
    }

    /// The identity backend's wire value for this role.
    #[must_use]
    pub const fn to_user_type(self) -> UserType {
        match self {
            Self::Standard => UserType::Standard,
            Self::Blogger => UserType::Blogger,
            Self::SuperAdmin => UserType::SuperAdmin,
        }
    }
}

/// Verified request-scoped identity derived from a session token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub login: String,
    pub email: String,
    pub role: Role,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl Identity {
    /// Reject callers below the required privilege level.
    pub fn require_role(&self, minimum: Role) -> Result<(), ApiError> {
        if self.role >= minimum {
            Ok(())
        } else {
            Err(ApiError::UnauthorizedForMethod)
        }
    }

    /// Reject callers who neither own the resource nor hold SuperAdmin.
    pub fn require_owner(&self, resource_user_id: &str) -> Result<(), ApiError> {
        if self.user_id == resource_user_id || self.role >= Role::SuperAdmin {
            Ok(())
        } else {
            Err(ApiError::UnauthorizedForMethod)
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            login: claims.login,
            email: claims.email,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// Verify the Authorization header and produce an [`Identity`].
pub fn authorize(headers: &HeaderMap, codec: &TokenCodec) -> Result<Identity, ApiError> {
    let token = bearer_token(headers)?;
    codec.verify(token).map(Identity::from)
}

/// Extract the raw token from a `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::NoAuthorizationHeader)?
        .to_str()
        .map_err(|_| ApiError::InvalidAuthScheme)?;

    raw.strip_prefix(BEARER_PREFIX)
        .ok_or(ApiError::InvalidAuthScheme)
}
