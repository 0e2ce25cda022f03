/// Authentication endpoints
///
/// - `POST /api/auth/login`: exchange email/password for a token pair
/// - `POST /api/auth/refresh`: exchange a refresh token for an access token
/// - `POST /api/auth/logout`: end the session of the presented access token
/// - `GET  /api/auth/validate-token`: report who the token belongs to

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::AuthContext,
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use taskhive_shared::auth::credentials::Identity;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Identity,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateTokenResponse {
    pub valid: bool,
    pub user: Identity,
}

/// Login
///
/// ```text
/// POST /api/auth/login
/// { "email": "alice@example.com", "password": "Str0ng!pass" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields
/// - `401 Unauthorized`: unknown email or wrong password (same message)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let identity = state.credentials.authenticate(&req.email, &req.password).await?;
    let pair = state.credentials.issue_pair(&identity)?;

    tracing::info!(email = %identity.email, "User logged in");

    Ok(Json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: identity,
    }))
}

/// Refresh
///
/// # Errors
///
/// - `401 Unauthorized`: expired, revoked or malformed refresh token, or an
///   access token presented instead
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    req.validate()?;

    let access_token = state.credentials.refresh(&req.refresh_token).await?;
    Ok(Json(RefreshResponse { access_token }))
}

/// Logout
///
/// Denylists the access token used for this request and its session. The
/// refresh token issued alongside it and any access token it minted stop
/// working too.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    state.credentials.logout(&auth.session).await?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

pub async fn validate_token(Extension(auth): Extension<AuthContext>) -> Json<ValidateTokenResponse> {
    Json(ValidateTokenResponse {
        valid: true,
        user: auth.session.identity,
    })
}
