/// Group authorization gate
///
/// Every group and task operation calls [`authorize`] before touching data.
/// Access is granted iff the caller holds an **accepted** membership in the
/// target group whose role is in the required set.
///
/// # Access levels
///
/// | Access   | Roles                          |
/// |----------|--------------------------------|
/// | `Read`   | admin, contributor, reader     |
/// | `Write`  | admin, contributor             |
/// | `Manage` | admin                          |
///
/// A pending (`sent`) invitation grants nothing. When the caller has no
/// membership, the gate reports `NotFound` if the group does not exist and
/// `PermissionDenied` otherwise.
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::auth::authorization::{authorize, Access};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, group_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let mut conn = pool.acquire().await?;
/// let membership = authorize(&mut conn, "alice@example.com", group_id, Access::Write.roles()).await?;
/// println!("alice is {}", membership.role);
/// # Ok(())
/// # }
/// ```

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::group::Group;
use crate::models::membership::{InvitationStatus, Membership, Role};

/// Why the gate refused
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Group {0} does not exist")]
    GroupNotFound(Uuid),

    #[error("Not a member of group {0}")]
    NotMember(Uuid),

    #[error("Invitation to group {0} has not been accepted")]
    NotAccepted(Uuid),

    #[error("Role {actual} may not perform this action")]
    InsufficientRole { actual: Role },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::GroupNotFound(_) => ServiceError::NotFound("Group".to_string()),
            AuthzError::NotMember(_)
            | AuthzError::NotAccepted(_)
            | AuthzError::InsufficientRole { .. } => ServiceError::PermissionDenied(err.to_string()),
            AuthzError::DatabaseError(e) => ServiceError::from(e),
        }
    }
}

/// Named role sets used by the services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// View a group, its members and its tasks
    Read,

    /// Create, edit and delete tasks; send invitations
    Write,

    /// Edit group details
    Manage,
}

impl Access {
    pub fn roles(self) -> &'static [Role] {
        match self {
            Access::Read => &[Role::Admin, Role::Contributor, Role::Reader],
            Access::Write => &[Role::Admin, Role::Contributor],
            Access::Manage => &[Role::Admin],
        }
    }
}

/// Decides access from an already-loaded membership row
pub fn check(
    membership: Option<&Membership>,
    group_id: Uuid,
    required: &[Role],
) -> Result<(), AuthzError> {
    let Some(membership) = membership else {
        return Err(AuthzError::NotMember(group_id));
    };

    match membership.status {
        InvitationStatus::Accepted => {}
        InvitationStatus::Sent => return Err(AuthzError::NotAccepted(group_id)),
        InvitationStatus::Rejected => return Err(AuthzError::NotMember(group_id)),
    }

    if required.contains(&membership.role) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            actual: membership.role,
        })
    }
}

/// The authorization gate
///
/// Returns the caller's membership on success so callers can act on the role.
pub async fn authorize(
    conn: &mut PgConnection,
    email: &str,
    group_id: Uuid,
    required: &[Role],
) -> Result<Membership, ServiceError> {
    let membership = Membership::find(&mut *conn, email, group_id).await?;

    match check(membership.as_ref(), group_id, required) {
        Ok(()) => Ok(membership.ok_or(AuthzError::NotMember(group_id))?),
        Err(AuthzError::NotMember(_)) if membership.is_none() => {
            // Tell a missing group apart from one the caller is outside of
            if Group::find_by_id(&mut *conn, group_id).await?.is_none() {
                return Err(AuthzError::GroupNotFound(group_id).into());
            }
            tracing::warn!(email = %email, %group_id, "Access denied: not a member");
            Err(AuthzError::NotMember(group_id).into())
        }
        Err(e) => {
            tracing::warn!(email = %email, %group_id, reason = %e, "Access denied");
            Err(e.into())
        }
    }
}
