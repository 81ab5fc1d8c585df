//! Authentication handlers: login, registration, OAuth and token refresh

use axum::{extract::State, http::HeaderMap, response::Json};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    grpc_clients::user,
    middleware::{Role, bearer_token},
    models::{LoginRequest, OauthLoginRequest, RegisterRequest, SessionResponse},
    server::AppState,
    utils::{derive_oauth_password, hash_password},
};

use super::backend_error;

const MIN_PASSWORD_LENGTH: usize = 12;
const AUTH_SCHEME: &str = "Bearer";

/// Login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    info!("Login request for: {}", request.login);
    let session = authenticate(&state, &request.login, &request.password).await?;
    Ok(Json(session))
}

/// Register endpoint: password policy, then register, then first login.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    info!("Registration request for: {}", request.username);

    validate_password(&state, &request.password).await?;
    register_backend(&state, &request).await?;

    // Registration and first login are two sequential RPCs; a crash between
    // them leaves a registered user who can simply call login afterwards.
    let session = authenticate(&state, &request.username, &request.password).await?;
    Ok(Json(session))
}

/// OAuth login endpoint. A returning OAuth user authenticates through the
/// register-then-fallback-to-login path with a deterministic derived
/// credential, so no separate account linkage exists.
pub async fn oauth_google(
    State(state): State<AppState>,
    Json(request): Json<OauthLoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let provider = state.oauth.verify(&request.token).await?;
    info!("OAuth login for: {}", provider.email);

    let password = derive_oauth_password(&provider.sub, &provider.email);
    let registration = RegisterRequest {
        username: provider.email.clone(),
        password: password.clone(),
        email: provider.email.clone(),
        name: provider.given_name.clone(),
        surname: provider.family_name.clone(),
        street: None,
        building: None,
        city: None,
        postal_code: None,
        country: None,
    };

    match register_backend(&state, &registration).await {
        Ok(()) | Err(ApiError::EmailOrUsernameOccupied) => {}
        Err(e) => return Err(e),
    }

    let session = authenticate(&state, &provider.email, &password).await?;
    Ok(Json(session))
}

/// Refresh endpoint: re-issues a still-valid token with a fresh TTL window.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let claims = state.codec.verify(token)?;
    let refreshed = state.codec.refresh(token)?;

    Ok(Json(SessionResponse {
        access_token: refreshed,
        auth_scheme: AUTH_SCHEME.to_string(),
        email: claims.email,
        username: claims.login,
    }))
}

/// Shared authenticate-and-issue flow used by login, register and OAuth.
async fn authenticate(
    state: &AppState,
    login: &str,
    password: &str,
) -> Result<SessionResponse, ApiError> {
    let mut client = state.clients.user.clone();

    let response = client
        .authenticate(user::Credentials {
            login: login.to_string(),
            password_hash: hash_password(password),
        })
        .await
        .map_err(|e| backend_error("authenticate", "user", &e))?
        .into_inner();

    if !response.success {
        warn!("Authentication rejected for: {}", login);
        return Err(ApiError::InvalidCredentials);
    }

    let role = Role::from_user_type(response.user_type);
    let token = state
        .codec
        .issue(&response.id, &response.username, &response.email, role)?;

    info!("Session issued for: {}", response.username);
    Ok(SessionResponse {
        access_token: token,
        auth_scheme: AUTH_SCHEME.to_string(),
        email: response.email,
        username: response.username,
    })
}

async fn register_backend(state: &AppState, request: &RegisterRequest) -> Result<(), ApiError> {
    let mut client = state.clients.user.clone();

    let response = client
        .register(user::RegisterRequest {
            username: request.username.clone(),
            password_hash: hash_password(&request.password),
            email: request.email.clone(),
            name: request.name.clone().unwrap_or_default(),
            surname: request.surname.clone().unwrap_or_default(),
            street: request.street.clone().unwrap_or_default(),
            building: request.building.clone().unwrap_or_default(),
            city: request.city.clone().unwrap_or_default(),
            postal_code: request.postal_code.clone().unwrap_or_default(),
            country: request.country.clone().unwrap_or_default(),
        })
        .await
        .map_err(|e| backend_error("register", "user", &e))?
        .into_inner();

    if response.occupied {
        warn!("Registration rejected, identity occupied: {}", request.username);
        return Err(ApiError::EmailOrUsernameOccupied);
    }
    if !response.success {
        return Err(ApiError::OperationFailed);
    }
    Ok(())
}

/// Password policy: minimum length, then the common-password corpus check.
/// Runs before any backend mutation.
pub(crate) async fn validate_password(state: &AppState, password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::PasswordLengthTooShort);
    }

    let mut client = state.clients.password.clone();
    let response = client
        .check_password(crate::grpc_clients::password::PasswordCheckRequest {
            password: password.to_string(),
        })
        .await
        .map_err(|e| backend_error("check_password", "password-policy", &e))?
        .into_inner();

    if response.is_common {
        return Err(ApiError::CommonPassword);
    }
    Ok(())
}
