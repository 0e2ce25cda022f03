/// Database models for TaskHive
///
/// Row types and the queries that read and write them. Every query function
/// is generic over `sqlx::PgExecutor`, so the same call works against the
/// pool or inside a service's transaction (`&mut *tx`).
///
/// # Models
///
/// - `user`: Accounts keyed by email
/// - `group`: Collaboration groups
/// - `membership`: User-group relationships with role and invitation state
/// - `task`: Tasks owned by a group
/// - `license`: Single-use signup licenses
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::group::Group;
/// use taskhive_shared::models::membership::Membership;
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let mut tx = pool.begin().await?;
/// let group = Group::create(&mut *tx, "Project Alpha", None).await?;
/// Membership::create_founder(&mut *tx, "alice@example.com", group.id).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod group;
pub mod license;
pub mod membership;
pub mod task;
pub mod user;
