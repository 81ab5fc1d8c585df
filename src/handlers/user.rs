//! User account handlers
//!
//! All account reads and writes act on the verified identity except the
//! SuperAdmin operations, which target an explicit user id.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    error::ApiError,
    grpc_clients::user::{self, UserType},
    middleware::Role,
    models::{
        ResultResponse, UpdatePasswordRequest, UpdateUserRequest, UserDetailsResponse,
        UserListResponse,
    },
    server::AppState,
    utils::hash_password,
};

use super::{auth, backend_error};

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeUserTypeQuery {
    pub user_id: String,
    pub new_user_type: String,
}

/// GET /user
pub async fn get_details(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserDetailsResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    let details = fetch_details(&state, &identity.user_id).await?;
    Ok(Json(to_response(details)))
}

/// PUT /user
pub async fn update_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ResultResponse>, ApiError> {
    let identity = state.authorize(&headers)?;

    let mut client = state.clients.user.clone();
    let response = client
        .update_user(user::UpdateUserRequest {
            id: identity.user_id.clone(),
            email: request.email,
            name: request.name,
            surname: request.surname,
            street: request.street,
            building: request.building,
            city: request.city,
            postal_code: request.postal_code,
            country: request.country,
            // An account update never changes privilege.
            user_type: identity.role.to_user_type() as i32,
        })
        .await
        .map_err(|e| backend_error("update_user", "user", &e))?
        .into_inner();

    if !response.success {
        return Err(ApiError::OperationFailed);
    }

    info!("Updated details for user {}", identity.user_id);
    Ok(Json(ResultResponse {
        success: response.success,
        id: response.id,
    }))
}

/// PUT /user/update-password
pub async fn update_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<Json<ResultResponse>, ApiError> {
    let identity = state.authorize(&headers)?;

    // The new password passes the same policy as registration.
    auth::validate_password(&state, &request.new_password).await?;

    let mut client = state.clients.user.clone();
    let response = client
        .change_password(user::ChangePasswordRequest {
            login: identity.login.clone(),
            old_password_hash: hash_password(&request.old_password),
            new_password_hash: hash_password(&request.new_password),
        })
        .await
        .map_err(|e| backend_error("change_password", "user", &e))?
        .into_inner();

    if !response.success {
        warn!("Password change refused for user {}", identity.user_id);
        return Err(ApiError::InvalidOldPassword);
    }

    info!("Password changed for user {}", identity.user_id);
    Ok(Json(ResultResponse {
        success: response.success,
        id: response.id,
    }))
}

/// DELETE /user?user_id=  (SuperAdmin)
pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<ResultResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    identity.require_role(Role::SuperAdmin)?;

    let mut client = state.clients.user.clone();
    let response = client
        .delete_user(user::UserId {
            id: query.user_id.clone(),
        })
        .await
        .map_err(|e| backend_error("delete_user", "user", &e))?
        .into_inner();

    if !response.success {
        return Err(ApiError::OperationFailed);
    }

    info!("Deleted user {} by admin {}", query.user_id, identity.user_id);
    Ok(Json(ResultResponse {
        success: response.success,
        id: response.id,
    }))
}

/// GET /user/list-users  (SuperAdmin)
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserListResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    identity.require_role(Role::SuperAdmin)?;

    let mut client = state.clients.user.clone();
    let response = client
        .list_users(user::ListUsersRequest {})
        .await
        .map_err(|e| backend_error("list_users", "user", &e))?
        .into_inner();

    if response.users.is_empty() {
        return Err(ApiError::NoContent);
    }

    Ok(Json(UserListResponse {
        users: response.users.into_iter().map(to_response).collect(),
    }))
}

/// PUT /user/change-user-type?user_id=&new_user_type=  (SuperAdmin)
pub async fn change_user_type(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ChangeUserTypeQuery>,
) -> Result<Json<ResultResponse>, ApiError> {
    let identity = state.authorize(&headers)?;
    identity.require_role(Role::SuperAdmin)?;

    // An admin cannot demote or promote their own account.
    if identity.user_id == query.user_id {
        return Err(ApiError::UnauthorizedForMethod);
    }

    let new_type = parse_user_type(&query.new_user_type).ok_or(ApiError::InvalidData)?;
    let target = fetch_details(&state, &query.user_id).await?;

    let mut client = state.clients.user.clone();
    let response = client
        .update_user(user::UpdateUserRequest {
            id: target.id,
            email: target.email,
            name: target.name,
            surname: target.surname,
            street: target.street,
            building: target.building,
            city: target.city,
            postal_code: target.postal_code,
            country: target.country,
            user_type: new_type as i32,
        })
        .await
        .map_err(|e| backend_error("update_user", "user", &e))?
        .into_inner();

    if !response.success {
        return Err(ApiError::OperationFailed);
    }

    info!(
        "Changed user {} to {} by admin {}",
        query.user_id, query.new_user_type, identity.user_id
    );
    Ok(Json(ResultResponse {
        success: response.success,
        id: response.id,
    }))
}

async fn fetch_details(state: &AppState, user_id: &str) -> Result<user::UserDetails, ApiError> {
    let mut client = state.clients.user.clone();
    let response = client
        .get_user_details(user::UserId {
            id: user_id.to_string(),
        })
        .await
        .map_err(|e| backend_error("get_user_details", "user", &e))?
        .into_inner();

    if response.id.is_empty() {
        return Err(ApiError::NoContent);
    }
    Ok(response)
}

fn parse_user_type(name: &str) -> Option<UserType> {
    match name {
        "STANDARD" => Some(UserType::Standard),
        "BLOGGER" => Some(UserType::Blogger),
        "SUPER_ADMIN" => Some(UserType::SuperAdmin),
        _ => None,
    }
}

fn to_response(details: user::UserDetails) -> UserDetailsResponse {
    let role = Role::from_user_type(details.user_type);
    UserDetailsResponse {
        id: details.id,
        username: details.username,
        email: details.email,
        name: details.name,
        surname: details.surname,
        street: details.street,
        building: details.building,
        city: details.city,
        postal_code: details.postal_code,
        country: details.country,
        user_type: role_name(role).to_string(),
    }
}

const fn role_name(role: Role) -> &'static str {
    match role {
        Role::Standard => "STANDARD",
        Role::Blogger => "BLOGGER",
        Role::SuperAdmin => "SUPER_ADMIN",
    }
}
