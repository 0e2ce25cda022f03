/// Response representations of domain entities
///
/// Each entity has exactly one JSON shape. Timestamps are RFC 3339 in UTC
/// with millisecond precision and task status is rendered as
/// `"pending"` or `"completed"`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use taskhive_shared::models::{
    group::Group,
    membership::{InvitationStatus, Membership, Role},
    task::Task,
    user::User,
};
use uuid::Uuid;

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub email: String,
    pub created_at: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            created_at: timestamp(user.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<&Group> for GroupView {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            description: group.description.clone(),
            created_at: timestamp(group.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub group_id: Uuid,
    pub created_at: String,
    pub due_date: Option<String>,
    pub status: &'static str,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            group_id: task.group_id,
            created_at: timestamp(task.created_at),
            due_date: task.due_date.map(timestamp),
            status: task.status_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MembershipView {
    pub user_email: String,
    pub group_id: Uuid,
    pub role: Role,
    pub inviter_email: Option<String>,
    pub invite_date: Option<String>,
    pub status: InvitationStatus,
    pub join_date: Option<String>,
}

impl From<&Membership> for MembershipView {
    fn from(membership: &Membership) -> Self {
        Self {
            user_email: membership.user_email.clone(),
            group_id: membership.group_id,
            role: membership.role,
            inviter_email: membership.inviter_email.clone(),
            invite_date: membership.invite_date.map(timestamp),
            status: membership.status,
            join_date: membership.join_date.map(timestamp),
        }
    }
}

/// Maps a slice of entities to their views
pub fn many<'a, T, V>(items: &'a [T]) -> Vec<V>
where
    V: From<&'a T>,
{
    items.iter().map(V::from).collect()
}
