/// Token revocation cache
///
/// Session tokens are stateless, so logout is implemented as negative
/// caching: the token's `jti` is written to a denylist under
/// `revoked:<jti>` with a TTL equal to the token's remaining lifetime. The
/// entry disappears on its own once the token would have expired anyway.
/// Logout also writes `revoked-session:<sid>`, which kills every token that
/// shares the login's session id, refresh tokens included.
///
/// The store sits behind the [`Denylist`] trait. Production uses Redis;
/// tests use an in-memory map.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhive_shared::auth::revocation::RevocationCache;
/// use taskhive_shared::redis::{RedisClient, RedisConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let redis = RedisClient::new(RedisConfig::new("redis://localhost:6379")).await?;
/// let cache = RevocationCache::new(Arc::new(redis));
///
/// let jti = Uuid::new_v4();
/// cache.revoke(jti, 3600).await?;
/// assert!(cache.is_revoked(jti).await?);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::jwt::Claims;
use crate::redis::{RedisClient, RedisClientError};

/// Key prefix for denylist entries
pub const REVOKED_KEY_PREFIX: &str = "revoked:";

/// Key prefix for revoked sessions
pub const REVOKED_SESSION_PREFIX: &str = "revoked-session:";

#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("Denylist unavailable: {0}")]
    Store(String),
}

impl From<RedisClientError> for RevocationError {
    fn from(err: RedisClientError) -> Self {
        RevocationError::Store(err.to_string())
    }
}

/// Key-value store with expiring entries
#[async_trait]
pub trait Denylist: Send + Sync {
    /// Stores `key` so that it expires after `ttl_secs`
    async fn set_ex(&self, key: &str, ttl_secs: u64) -> Result<(), RevocationError>;

    /// Whether `key` is currently present
    async fn exists(&self, key: &str) -> Result<bool, RevocationError>;

    /// Liveness probe used by health checks
    async fn ping(&self) -> Result<(), RevocationError> {
        Ok(())
    }
}

#[async_trait]
impl Denylist for RedisClient {
    async fn set_ex(&self, key: &str, ttl_secs: u64) -> Result<(), RevocationError> {
        RedisClient::set_ex(self, key, "", ttl_secs).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, RevocationError> {
        Ok(RedisClient::exists(self, key).await?)
    }

    async fn ping(&self) -> Result<(), RevocationError> {
        if RedisClient::ping(self).await? {
            Ok(())
        } else {
            Err(RevocationError::Store("Unexpected PING reply".to_string()))
        }
    }
}

/// Denylist key for a token ID
pub fn revoked_key(jti: Uuid) -> String {
    format!("{}{}", REVOKED_KEY_PREFIX, jti)
}

/// Denylist key for a session ID
pub fn revoked_session_key(sid: Uuid) -> String {
    format!("{}{}", REVOKED_SESSION_PREFIX, sid)
}

/// Remaining lifetime of a token in whole seconds, zero once expired
pub fn remaining_ttl(claims: &Claims) -> u64 {
    u64::try_from(claims.exp - Utc::now().timestamp()).unwrap_or(0)
}

/// Marks token IDs as revoked until their natural expiry
#[derive(Clone)]
pub struct RevocationCache {
    store: Arc<dyn Denylist>,
}

impl RevocationCache {
    pub fn new(store: Arc<dyn Denylist>) -> Self {
        Self { store }
    }

    /// Denylists `jti` for `ttl_secs`
    ///
    /// A zero TTL means the token is already dead; nothing is written.
    pub async fn revoke(&self, jti: Uuid, ttl_secs: u64) -> Result<(), RevocationError> {
        if ttl_secs == 0 {
            tracing::debug!(%jti, "Token already expired, skipping denylist write");
            return Ok(());
        }

        self.store.set_ex(&revoked_key(jti), ttl_secs).await?;
        tracing::info!(%jti, ttl_secs, "Token revoked");
        Ok(())
    }

    /// Denylists the token described by `claims` for its remaining lifetime
    pub async fn revoke_claims(&self, claims: &Claims) -> Result<(), RevocationError> {
        self.revoke(claims.jti, remaining_ttl(claims)).await
    }

    pub async fn is_revoked(&self, jti: Uuid) -> Result<bool, RevocationError> {
        self.store.exists(&revoked_key(jti)).await
    }

    /// Denylists every token of session `sid` for `ttl_secs`
    pub async fn revoke_session(&self, sid: Uuid, ttl_secs: u64) -> Result<(), RevocationError> {
        if ttl_secs == 0 {
            return Ok(());
        }

        self.store.set_ex(&revoked_session_key(sid), ttl_secs).await?;
        tracing::info!(%sid, ttl_secs, "Session revoked");
        Ok(())
    }

    pub async fn is_session_revoked(&self, sid: Uuid) -> Result<bool, RevocationError> {
        self.store.exists(&revoked_session_key(sid)).await
    }

    pub async fn ping(&self) -> Result<(), RevocationError> {
        self.store.ping().await
    }
}
