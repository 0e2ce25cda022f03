/// Account endpoints
///
/// ```text
/// POST /api/users/signup
/// { "email": "alice@example.com", "password": "Str0ng!pass", "licenseKey": "LIC-..." }
/// ```
///
/// Responds `201 Created` with `{ "user": { "email", "created_at" } }`.
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, malformed email, weak password
/// - `404 Not Found`: unknown license key
/// - `409 Conflict`: email already registered or license already used

use crate::{app::AppState, error::ApiResult, views::UserView};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, message = "License key is required"))]
    pub license_key: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: UserView,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    req.validate()?;

    let user = state
        .accounts
        .signup(&req.email, &req.password, req.license_key.trim())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: UserView::from(&user),
        }),
    ))
}
