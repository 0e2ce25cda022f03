/// Membership model and database operations
///
/// A membership joins one user to one group and carries both the member's
/// role and the state of the invitation that created it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('admin', 'contributor', 'reader');
/// CREATE TYPE invitation_status AS ENUM ('sent', 'accepted', 'rejected');
///
/// CREATE TABLE memberships (
///     user_email TEXT NOT NULL REFERENCES users(email) ON DELETE CASCADE,
///     group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'reader',
///     inviter_email TEXT REFERENCES users(email) ON DELETE SET NULL,
///     invite_date TIMESTAMPTZ,
///     status invitation_status NOT NULL,
///     join_date TIMESTAMPTZ,
///     PRIMARY KEY (user_email, group_id)
/// );
/// ```
///
/// # Lifecycle
///
/// ```text
/// NONE --invite--> SENT --accept--> ACCEPTED --leave--> NONE
///                   |
///                   +--decline--> NONE
/// ```
///
/// Declined invitations are deleted, so `rejected` is never written by this
/// crate. A legacy `rejected` row is treated like NONE and may be re-invited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use uuid::Uuid;

/// Permission level within a single group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages the group and its members
    Admin,

    /// Creates and edits tasks, invites others
    Contributor,

    /// Read-only access
    Reader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Contributor => "contributor",
            Role::Reader => "reader",
        }
    }

    /// Priority when choosing a replacement admin; lower goes first
    ///
    /// `None` means the role is never promoted.
    pub fn succession_rank(&self) -> Option<u8> {
        match self {
            Role::Admin => None,
            Role::Contributor => Some(0),
            Role::Reader => Some(1),
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Reader
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the invitation behind a membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Sent,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Sent => "sent",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's relationship to a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub user_email: String,
    pub group_id: Uuid,
    pub role: Role,

    /// Who sent the invitation; `None` for the founding admin
    pub inviter_email: Option<String>,

    /// When the invitation was sent; `None` for the founding admin
    pub invite_date: Option<DateTime<Utc>>,

    pub status: InvitationStatus,

    /// Set when the invitation is accepted
    pub join_date: Option<DateTime<Utc>>,
}

impl Membership {
    /// True for an accepted member
    pub fn is_active(&self) -> bool {
        self.status == InvitationStatus::Accepted
    }

    /// Finds the membership row for a (user, group) pair
    pub async fn find<'e, E>(
        executor: E,
        user_email: &str,
        group_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT user_email, group_id, role, inviter_email, invite_date, status, join_date
            FROM memberships
            WHERE user_email = $1 AND group_id = $2
            "#,
        )
        .bind(user_email)
        .bind(group_id)
        .fetch_optional(executor)
        .await
    }

    /// Inserts the founding admin of a freshly created group
    pub async fn create_founder<'e, E>(
        executor: E,
        user_email: &str,
        group_id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (user_email, group_id, role, status, join_date)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING user_email, group_id, role, inviter_email, invite_date, status, join_date
            "#,
        )
        .bind(user_email)
        .bind(group_id)
        .bind(Role::Admin)
        .bind(InvitationStatus::Accepted)
        .fetch_one(executor)
        .await
    }

    /// Records a sent invitation
    ///
    /// Succeeds if the pair has no row or only a `rejected` one. Returns
    /// `None` when a `sent` or `accepted` row already exists; the existing row
    /// is left untouched.
    pub async fn invite<'e, E>(
        executor: E,
        invitee_email: &str,
        group_id: Uuid,
        role: Role,
        inviter_email: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships
                (user_email, group_id, role, inviter_email, invite_date, status, join_date)
            VALUES ($1, $2, $3, $4, NOW(), 'sent', NULL)
            ON CONFLICT (user_email, group_id) DO UPDATE
            SET role = EXCLUDED.role,
                inviter_email = EXCLUDED.inviter_email,
                invite_date = EXCLUDED.invite_date,
                status = EXCLUDED.status,
                join_date = NULL
            WHERE memberships.status = 'rejected'
            RETURNING user_email, group_id, role, inviter_email, invite_date, status, join_date
            "#,
        )
        .bind(invitee_email)
        .bind(group_id)
        .bind(role)
        .bind(inviter_email)
        .fetch_optional(executor)
        .await
    }

    /// Moves a `sent` invitation to `accepted`
    ///
    /// Returns `None` if there is no `sent` row for the pair.
    pub async fn accept<'e, E>(
        executor: E,
        user_email: &str,
        group_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET status = 'accepted', join_date = NOW()
            WHERE user_email = $1 AND group_id = $2 AND status = 'sent'
            RETURNING user_email, group_id, role, inviter_email, invite_date, status, join_date
            "#,
        )
        .bind(user_email)
        .bind(group_id)
        .fetch_optional(executor)
        .await
    }

    /// Deletes the pair's row only if it is in `status`
    pub async fn delete_with_status<'e, E>(
        executor: E,
        user_email: &str,
        group_id: Uuid,
        status: InvitationStatus,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "DELETE FROM memberships WHERE user_email = $1 AND group_id = $2 AND status = $3",
        )
        .bind(user_email)
        .bind(group_id)
        .bind(status)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Changes the role of an existing member
    pub async fn set_role<'e, E>(
        executor: E,
        user_email: &str,
        group_id: Uuid,
        role: Role,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result =
            sqlx::query("UPDATE memberships SET role = $3 WHERE user_email = $1 AND group_id = $2")
                .bind(user_email)
                .bind(group_id)
                .bind(role)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Accepted members of a group other than `excluded_email`
    pub async fn list_accepted_except<'e, E>(
        executor: E,
        group_id: Uuid,
        excluded_email: &str,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT user_email, group_id, role, inviter_email, invite_date, status, join_date
            FROM memberships
            WHERE group_id = $1 AND status = 'accepted' AND user_email <> $2
            ORDER BY user_email ASC
            "#,
        )
        .bind(group_id)
        .bind(excluded_email)
        .fetch_all(executor)
        .await
    }

    /// Number of accepted members in a group
    pub async fn count_accepted<'e, E>(executor: E, group_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM memberships WHERE group_id = $1 AND status = 'accepted'",
        )
        .bind(group_id)
        .fetch_one(executor)
        .await
    }

    /// Deletes every outstanding invitation to a group
    pub async fn delete_pending_for_group<'e, E>(
        executor: E,
        group_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM memberships WHERE group_id = $1 AND status <> 'accepted'")
            .bind(group_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// All memberships of a group, accepted and pending
    pub async fn list_by_group<'e, E>(executor: E, group_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT user_email, group_id, role, inviter_email, invite_date, status, join_date
            FROM memberships
            WHERE group_id = $1
            ORDER BY status ASC, user_email ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(executor)
        .await
    }

    /// Invitations still awaiting a response from `user_email`
    pub async fn list_sent_for_user<'e, E>(
        executor: E,
        user_email: &str,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT user_email, group_id, role, inviter_email, invite_date, status, join_date
            FROM memberships
            WHERE user_email = $1 AND status = 'sent'
            ORDER BY invite_date DESC
            "#,
        )
        .bind(user_email)
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Contributor).unwrap(), r#""contributor""#);
        let role: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>(r#""owner""#).is_err());
    }

    #[test]
    fn test_default_role_is_reader() {
        assert_eq!(Role::default(), Role::Reader);
    }

    #[test]
    fn test_succession_rank() {
        assert_eq!(Role::Admin.succession_rank(), None);
        assert!(Role::Contributor.succession_rank() < Role::Reader.succession_rank());
    }

    #[test]
    fn test_display() {
        assert_eq!(Role::Reader.to_string(), "reader");
        assert_eq!(InvitationStatus::Accepted.to_string(), "accepted");
    }
}
