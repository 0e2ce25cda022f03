/// Membership engine
///
/// Owns the group/membership state machine and is the only component that
/// creates, promotes or removes memberships.
///
/// ```text
/// NONE --send_invitation--> SENT --accept_invitation--> ACCEPTED
///                            |                             |
///                            +--decline_invitation--> NONE <--leave_group
/// ```
///
/// Every mutating operation runs in its own transaction. Returning early with
/// `?` drops the transaction, which rolls it back.

use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::{self, Access};
use crate::error::{ServiceError, ServiceResult};
use crate::models::group::{Group, UpdateGroup};
use crate::models::membership::{InvitationStatus, Membership, Role};
use crate::models::task::Task;
use crate::models::user::{normalize_email, User};

const MAX_GROUP_NAME_LEN: usize = 255;

/// What happened as a side effect of leaving a group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Member promoted to admin because the last admin left
    pub promoted: Option<String>,

    /// The leaver was the last accepted member and the group is gone
    pub group_deleted: bool,
}

/// Chooses a replacement admin
///
/// Picks uniformly at random among the best-ranked candidates: contributors
/// if there are any, otherwise readers. Admins and non-accepted rows are
/// never chosen.
pub fn pick_successor<'a, R>(candidates: &'a [Membership], rng: &mut R) -> Option<&'a Membership>
where
    R: Rng + ?Sized,
{
    let eligible = || {
        candidates
            .iter()
            .filter(|m| m.is_active())
            .filter_map(|m| m.role.succession_rank().map(|rank| (rank, m)))
    };

    let best = eligible().map(|(rank, _)| rank).min()?;
    let pool: Vec<&Membership> = eligible()
        .filter(|(rank, _)| *rank == best)
        .map(|(_, m)| m)
        .collect();

    pool.choose(rng).copied()
}

fn validate_group_name(name: &str) -> ServiceResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation("Group name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(ServiceError::Validation(format!(
            "Group name must be at most {} characters",
            MAX_GROUP_NAME_LEN
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct MembershipEngine {
    db: PgPool,
}

impl MembershipEngine {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// The authorization gate, for callers outside this crate
    pub async fn authorize(
        &self,
        email: &str,
        group_id: Uuid,
        required: &[Role],
    ) -> ServiceResult<Membership> {
        let mut conn = self.db.acquire().await?;
        authorization::authorize(&mut conn, email, group_id, required).await
    }

    /// Creates a group with `email` as its sole accepted admin
    pub async fn create_group(
        &self,
        email: &str,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Group> {
        validate_group_name(name)?;

        let mut tx = self.db.begin().await?;
        let group = Group::create(&mut *tx, name.trim(), description).await?;
        Membership::create_founder(&mut *tx, email, group.id).await?;
        tx.commit().await?;

        tracing::info!(group_id = %group.id, admin = %email, "Group created");
        Ok(group)
    }

    /// Groups in which `email` is an accepted member
    pub async fn list_groups(&self, email: &str) -> ServiceResult<Vec<Group>> {
        Ok(Group::list_for_user(&self.db, email).await?)
    }

    pub async fn get_group(&self, email: &str, group_id: Uuid) -> ServiceResult<Group> {
        let mut conn = self.db.acquire().await?;
        authorization::authorize(&mut conn, email, group_id, Access::Read.roles()).await?;

        Group::find_by_id(&mut *conn, group_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Group".to_string()))
    }

    /// Merge-patches name and description; admins only
    pub async fn update_group(
        &self,
        email: &str,
        group_id: Uuid,
        patch: &UpdateGroup,
    ) -> ServiceResult<Group> {
        if let Some(name) = &patch.name {
            validate_group_name(name)?;
        }

        let patch = UpdateGroup {
            name: patch.name.as_ref().map(|n| n.trim().to_string()),
            description: patch.description.clone(),
        };

        let mut tx = self.db.begin().await?;
        authorization::authorize(&mut *tx, email, group_id, Access::Manage.roles()).await?;

        let group = if patch.is_empty() {
            Group::find_by_id(&mut *tx, group_id).await?
        } else {
            Group::update(&mut *tx, group_id, &patch).await?
        }
        .ok_or_else(|| ServiceError::NotFound("Group".to_string()))?;
        tx.commit().await?;

        tracing::info!(%group_id, by = %email, "Group updated");
        Ok(group)
    }

    /// Every membership of a group, accepted and pending
    pub async fn list_members(&self, email: &str, group_id: Uuid) -> ServiceResult<Vec<Membership>> {
        let mut conn = self.db.acquire().await?;
        authorization::authorize(&mut conn, email, group_id, Access::Read.roles()).await?;

        Ok(Membership::list_by_group(&mut *conn, group_id).await?)
    }

    /// Invitations waiting for `email` to respond
    pub async fn list_invitations(&self, email: &str) -> ServiceResult<Vec<Membership>> {
        Ok(Membership::list_sent_for_user(&self.db, email).await?)
    }

    /// Invites `invitee` into `group_id` with `role` (reader by default)
    ///
    /// The inviter must be an accepted admin or contributor. Fails with
    /// `NotFound` if the invitee has no account and `Conflict` if the
    /// invitee already has a pending invitation or is already a member.
    pub async fn send_invitation(
        &self,
        inviter: &str,
        invitee: &str,
        group_id: Uuid,
        role: Option<Role>,
    ) -> ServiceResult<Membership> {
        let invitee = normalize_email(invitee);
        let role = role.unwrap_or_default();

        let mut tx = self.db.begin().await?;
        authorization::authorize(&mut *tx, inviter, group_id, Access::Write.roles()).await?;

        if !User::exists(&mut *tx, &invitee).await? {
            tracing::warn!(%inviter, %invitee, %group_id, "Invitation to unknown user");
            return Err(ServiceError::NotFound("User".to_string()));
        }

        let Some(invitation) = Membership::invite(&mut *tx, &invitee, group_id, role, inviter).await? else {
            tracing::warn!(%inviter, %invitee, %group_id, "Duplicate invitation rejected");
            return Err(ServiceError::Conflict("User already invited or a member".to_string()));
        };
        tx.commit().await?;

        tracing::info!(%inviter, %invitee, %group_id, %role, "Invitation sent");
        Ok(invitation)
    }

    /// Accepts a pending invitation
    ///
    /// Takes the group lock so an accept cannot interleave with the last
    /// member leaving.
    pub async fn accept_invitation(&self, email: &str, group_id: Uuid) -> ServiceResult<Membership> {
        let mut tx = self.db.begin().await?;
        if Group::lock_for_update(&mut *tx, group_id).await?.is_none() {
            return Err(ServiceError::NotFound("Group".to_string()));
        }
        let membership = Membership::accept(&mut *tx, email, group_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Invitation".to_string()))?;
        tx.commit().await?;

        tracing::info!(%email, %group_id, role = %membership.role, "Invitation accepted");
        Ok(membership)
    }

    /// Declines a pending invitation by deleting it
    ///
    /// An accepted membership is never touched; declining one is `NotFound`.
    pub async fn decline_invitation(&self, email: &str, group_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.db.begin().await?;
        if Group::lock_for_update(&mut *tx, group_id).await?.is_none() {
            return Err(ServiceError::NotFound("Group".to_string()));
        }
        let deleted =
            Membership::delete_with_status(&mut *tx, email, group_id, InvitationStatus::Sent).await?;
        if !deleted {
            return Err(ServiceError::NotFound("Invitation".to_string()));
        }
        tx.commit().await?;

        tracing::info!(%email, %group_id, "Invitation declined");
        Ok(())
    }

    /// Removes `email` from the group
    ///
    /// When the last admin leaves, a random contributor is promoted, or a
    /// random reader if there are no contributors. When the last accepted
    /// member leaves, the group's tasks, pending invitations and the group
    /// itself are deleted. The group row is locked first so concurrent
    /// leaves on the same group run one after another.
    pub async fn leave_group(&self, email: &str, group_id: Uuid) -> ServiceResult<LeaveOutcome> {
        let mut tx = self.db.begin().await?;

        if Group::lock_for_update(&mut *tx, group_id).await?.is_none() {
            return Err(ServiceError::NotFound("Group".to_string()));
        }

        let membership = Membership::find(&mut *tx, email, group_id)
            .await?
            .filter(Membership::is_active)
            .ok_or_else(|| ServiceError::NotFound("Membership".to_string()))?;

        let mut outcome = LeaveOutcome::default();

        if membership.role == Role::Admin {
            let others = Membership::list_accepted_except(&mut *tx, group_id, email).await?;

            if !others.iter().any(|m| m.role == Role::Admin) {
                let successor = pick_successor(&others, &mut rand::thread_rng()).cloned();

                if let Some(successor) = successor {
                    Membership::set_role(&mut *tx, &successor.user_email, group_id, Role::Admin).await?;
                    tracing::info!(
                        %group_id,
                        promoted = %successor.user_email,
                        previous_role = %successor.role,
                        "Promoted member to admin"
                    );
                    outcome.promoted = Some(successor.user_email);
                }
            }
        }

        Membership::delete_with_status(&mut *tx, email, group_id, InvitationStatus::Accepted).await?;

        if Membership::count_accepted(&mut *tx, group_id).await? == 0 {
            let tasks = Task::delete_by_group(&mut *tx, group_id).await?;
            let invitations = Membership::delete_pending_for_group(&mut *tx, group_id).await?;
            Group::delete(&mut *tx, group_id).await?;

            tracing::info!(
                %group_id,
                tasks_deleted = tasks,
                invitations_deleted = invitations,
                "Last member left; group deleted"
            );
            outcome.group_deleted = true;
        }

        tx.commit().await?;

        tracing::info!(%email, %group_id, "Member left group");
        Ok(outcome)
    }
}
