/// Group endpoints
///
/// All routes require a valid access token. Reads need an accepted
/// membership of any role; updates need admin.

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::AuthContext,
    views::{self, GroupView, MembershipView},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhive_shared::models::group::UpdateGroup;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Group name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,
}

/// Merge-patch body; blank strings are treated as absent
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<UpdateGroupRequest> for UpdateGroup {
    fn from(req: UpdateGroupRequest) -> Self {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        UpdateGroup {
            name: present(req.name),
            description: present(req.description),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub group: GroupView,
}

#[derive(Debug, Serialize)]
pub struct GroupListResponse {
    pub groups: Vec<GroupView>,
}

#[derive(Debug, Serialize)]
pub struct MemberListResponse {
    pub members: Vec<MembershipView>,
}

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub message: String,

    /// Member promoted to admin, if the last admin left
    pub promoted: Option<String>,
    pub group_deleted: bool,
}

pub async fn list_groups(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<GroupListResponse>> {
    let groups = state.memberships.list_groups(auth.email()).await?;

    Ok(Json(GroupListResponse {
        groups: views::many(&groups),
    }))
}

/// Creates a group; the caller becomes its sole admin
pub async fn create_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<(StatusCode, Json<GroupResponse>)> {
    req.validate()?;

    let group = state
        .memberships
        .create_group(auth.email(), &req.name, req.description.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GroupResponse {
            group: GroupView::from(&group),
        }),
    ))
}

pub async fn get_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<GroupResponse>> {
    let group = state.memberships.get_group(auth.email(), group_id).await?;

    Ok(Json(GroupResponse {
        group: GroupView::from(&group),
    }))
}

pub async fn update_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<UpdateGroupRequest>,
) -> ApiResult<Json<GroupResponse>> {
    let patch = UpdateGroup::from(req);
    let group = state
        .memberships
        .update_group(auth.email(), group_id, &patch)
        .await?;

    Ok(Json(GroupResponse {
        group: GroupView::from(&group),
    }))
}

pub async fn leave_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<LeaveResponse>> {
    let outcome = state.memberships.leave_group(auth.email(), group_id).await?;

    Ok(Json(LeaveResponse {
        message: "Left group successfully".to_string(),
        promoted: outcome.promoted,
        group_deleted: outcome.group_deleted,
    }))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<MemberListResponse>> {
    let members = state.memberships.list_members(auth.email(), group_id).await?;

    Ok(Json(MemberListResponse {
        members: views::many(&members),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_update_fields_are_ignored() {
        let patch = UpdateGroup::from(UpdateGroupRequest {
            name: Some("   ".to_string()),
            description: Some("Quarterly planning".to_string()),
        });

        assert_eq!(patch.name, None);
        assert_eq!(patch.description.as_deref(), Some("Quarterly planning"));
    }

    #[test]
    fn test_empty_update_is_empty() {
        assert!(UpdateGroup::from(UpdateGroupRequest::default()).is_empty());
    }
}
