/// Invitation endpoints
///
/// - `GET  /api/invites`: invitations waiting for the caller
/// - `POST /api/invites/send`: invite a registered user into a group
/// - `POST /api/invites/:group_id/accept`
/// - `POST /api/invites/:group_id/decline`: deletes the invitation

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::AuthContext,
    views::{self, MembershipView},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhive_shared::models::membership::Role;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SendInvitationRequest {
    #[validate(email(message = "Invalid invitee email"))]
    pub email: String,

    pub group_id: Uuid,

    /// Defaults to reader
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub invitation: MembershipView,
}

#[derive(Debug, Serialize)]
pub struct InvitationListResponse {
    pub invitations: Vec<MembershipView>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub membership: MembershipView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<InvitationListResponse>> {
    let invitations = state.memberships.list_invitations(auth.email()).await?;

    Ok(Json(InvitationListResponse {
        invitations: views::many(&invitations),
    }))
}

/// Sends an invitation
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an accepted admin or contributor
/// - `404 Not Found`: invitee has no account, or the group does not exist
/// - `409 Conflict`: invitee already invited or already a member
pub async fn send_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SendInvitationRequest>,
) -> ApiResult<(StatusCode, Json<InvitationResponse>)> {
    req.validate()?;

    let invitation = state
        .memberships
        .send_invitation(auth.email(), &req.email, req.group_id, req.role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse {
            invitation: MembershipView::from(&invitation),
        }),
    ))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<MembershipResponse>> {
    let membership = state.memberships.accept_invitation(auth.email(), group_id).await?;

    Ok(Json(MembershipResponse {
        membership: MembershipView::from(&membership),
    }))
}

pub async fn decline_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.memberships.decline_invitation(auth.email(), group_id).await?;

    Ok(Json(MessageResponse {
        message: "Invitation declined".to_string(),
    }))
}
