/// Credential store
///
/// Verifies email/password pairs, issues session tokens and checks presented
/// tokens against signature, expiry and the revocation denylist.
///
/// # Example
///
/// ```no_run
/// use sqlx::PgPool;
/// use taskhive_shared::auth::credentials::{CredentialStore, TokenSettings};
/// use taskhive_shared::auth::revocation::RevocationCache;
///
/// # async fn example(pool: PgPool, revocations: RevocationCache) -> Result<(), Box<dyn std::error::Error>> {
/// let settings = TokenSettings::new("a-secret-that-is-at-least-32-bytes-long");
/// let store = CredentialStore::new(pool, settings, revocations);
///
/// let identity = store.authenticate("alice@example.com", "MyP@ssw0rd!").await?;
/// let pair = store.issue_pair(&identity)?;
/// let verified = store.verify(&pair.access_token).await?;
/// assert_eq!(verified.identity, identity);
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::jwt::{self, Claims, JwtError, TokenType};
use super::password::verify_password;
use super::revocation::{RevocationCache, RevocationError};
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::User;

/// Message used for every failed login so callers cannot probe for accounts
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// The authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub email: String,
}

/// A verified token together with its claims
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub claims: Claims,
}

/// Freshly issued access and refresh tokens
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signing secret and token lifetimes
#[derive(Clone)]
pub struct TokenSettings {
    secret: Arc<str>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    /// Settings with the default lifetimes (1 hour access, 30 days refresh)
    pub fn new(secret: &str) -> Self {
        Self {
            secret: Arc::from(secret),
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(30),
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"***")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => {
                tracing::error!(error = %msg, "Failed to sign token");
                ServiceError::Internal("Could not issue token".to_string())
            }
            JwtError::Expired => ServiceError::Authentication("Token has expired".to_string()),
            JwtError::Malformed(_) => ServiceError::Authentication("Invalid token".to_string()),
            JwtError::WrongType { expected } => {
                ServiceError::Authentication(format!("Expected {} token", expected))
            }
        }
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    db: PgPool,
    settings: TokenSettings,
    revocations: RevocationCache,
}

impl CredentialStore {
    pub fn new(db: PgPool, settings: TokenSettings, revocations: RevocationCache) -> Self {
        Self {
            db,
            settings,
            revocations,
        }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Checks an email/password pair
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<Identity> {
        let Some(user) = User::find_by_email(&self.db, email).await? else {
            tracing::warn!(email = %email, "Login attempt for unknown account");
            return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ServiceError::Internal(format!("Verification task failed: {}", e)))?
            .map_err(|e| {
                tracing::error!(email = %user.email, error = %e, "Stored password hash is unusable");
                ServiceError::Authentication(INVALID_CREDENTIALS.to_string())
            })?;

        if !matches {
            tracing::warn!(email = %user.email, "Login attempt with wrong password");
            return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        Ok(Identity { email: user.email })
    }

    /// Issues one token of the given type for `identity` in a new session
    pub fn issue_token(&self, identity: &Identity, token_type: TokenType) -> ServiceResult<String> {
        self.issue_in_session(identity, Uuid::new_v4(), token_type)
    }

    fn issue_in_session(&self, identity: &Identity, sid: Uuid, token_type: TokenType) -> ServiceResult<String> {
        let claims = Claims::in_session(&identity.email, sid, token_type, self.settings.ttl(token_type));
        Ok(jwt::create_token(&claims, &self.settings.secret)?)
    }

    /// Issues an access token and a refresh token sharing one session
    pub fn issue_pair(&self, identity: &Identity) -> ServiceResult<TokenPair> {
        let sid = Uuid::new_v4();
        Ok(TokenPair {
            access_token: self.issue_in_session(identity, sid, TokenType::Access)?,
            refresh_token: self.issue_in_session(identity, sid, TokenType::Refresh)?,
        })
    }

    async fn verify_typed(&self, token: &str, token_type: TokenType) -> ServiceResult<Session> {
        let claims = match token_type {
            TokenType::Access => jwt::validate_access_token(token, &self.settings.secret)?,
            TokenType::Refresh => jwt::validate_refresh_token(token, &self.settings.secret)?,
        };

        // Unreachable denylist rejects the request
        let unavailable = |e: RevocationError| {
            tracing::error!(error = %e, "Revocation check failed");
            ServiceError::Authentication("Unable to verify token".to_string())
        };
        let revoked = self.revocations.is_revoked(claims.jti).await.map_err(unavailable)?
            || self.revocations.is_session_revoked(claims.sid).await.map_err(unavailable)?;

        if revoked {
            tracing::debug!(jti = %claims.jti, "Rejected revoked token");
            return Err(ServiceError::Authentication("Token has been revoked".to_string()));
        }

        Ok(Session {
            identity: Identity {
                email: claims.sub.clone(),
            },
            claims,
        })
    }

    /// Verifies an access token: signature, issuer, expiry, then denylist
    pub async fn verify(&self, token: &str) -> ServiceResult<Session> {
        self.verify_typed(token, TokenType::Access).await
    }

    /// Exchanges a refresh token for a new access token in the same session
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<String> {
        let session = self.verify_typed(refresh_token, TokenType::Refresh).await?;
        self.issue_in_session(&session.identity, session.claims.sid, TokenType::Access)
    }

    /// Revokes the presented token and the session it belongs to
    ///
    /// The session entry outlives any token the session can still hold: a
    /// refresh token plus one access token minted just before it expires.
    pub async fn logout(&self, session: &Session) -> ServiceResult<()> {
        let failed = |e: RevocationError| {
            tracing::error!(error = %e, "Failed to write denylist entry");
            ServiceError::Authentication("Logout failed".to_string())
        };
        let session_ttl = (self.settings.refresh_ttl + self.settings.access_ttl).num_seconds();

        self.revocations.revoke_claims(&session.claims).await.map_err(failed)?;
        self.revocations
            .revoke_session(session.claims.sid, u64::try_from(session_ttl).unwrap_or(0))
            .await
            .map_err(failed)?;

        tracing::info!(email = %session.identity.email, "User logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::revocation::{Denylist, RevocationError};
    use crate::db::pool::{create_lazy_pool, DatabaseConfig};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryDenylist(Mutex<HashSet<String>>);

    #[async_trait]
    impl Denylist for MemoryDenylist {
        async fn set_ex(&self, key: &str, _ttl_secs: u64) -> Result<(), RevocationError> {
            self.0.lock().unwrap().insert(key.to_string());
            Ok(())
        }

        async fn exists(&self, key: &str) -> Result<bool, RevocationError> {
            Ok(self.0.lock().unwrap().contains(key))
        }
    }

    fn store() -> CredentialStore {
        let pool = create_lazy_pool(DatabaseConfig::new("postgresql://localhost/unused", 1))
            .expect("URL should parse");
        CredentialStore::new(
            pool,
            TokenSettings::new("test-secret-key-at-least-32-bytes-long"),
            RevocationCache::new(Arc::new(MemoryDenylist::default())),
        )
    }

    fn alice() -> Identity {
        Identity {
            email: "alice@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let store = store();
        let pair = store.issue_pair(&alice()).unwrap();

        let session = store.verify(&pair.access_token).await.unwrap();
        assert_eq!(session.identity, alice());
        assert_eq!(session.claims.token_type, TokenType::Access);
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_access() {
        let store = store();
        let pair = store.issue_pair(&alice()).unwrap();

        let err = store.verify(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_access_token() {
        let store = store();
        let pair = store.issue_pair(&alice()).unwrap();

        let access = store.refresh(&pair.refresh_token).await.unwrap();
        let session = store.verify(&access).await.unwrap();
        assert_eq!(session.identity, alice());

        assert!(store.refresh(&pair.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let store = store();
        let token = store.issue_token(&alice(), TokenType::Access).unwrap();
        let session = store.verify(&token).await.unwrap();

        store.logout(&session).await.unwrap();

        let err = store.verify(&token).await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: Token has been revoked");

        // Other tokens for the same user stay valid
        let other = store.issue_token(&alice(), TokenType::Access).unwrap();
        assert!(store.verify(&other).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_ends_whole_session() {
        let store = store();
        let pair = store.issue_pair(&alice()).unwrap();
        let refreshed = store.refresh(&pair.refresh_token).await.unwrap();

        let session = store.verify(&pair.access_token).await.unwrap();
        store.logout(&session).await.unwrap();

        assert!(matches!(
            store.refresh(&pair.refresh_token).await,
            Err(ServiceError::Authentication(_))
        ));
        assert!(matches!(store.verify(&refreshed).await, Err(ServiceError::Authentication(_))));

        let other = store.issue_pair(&alice()).unwrap();
        assert!(store.refresh(&other.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refreshed_token_stays_in_session() {
        let store = store();
        let pair = store.issue_pair(&alice()).unwrap();
        let original = store.verify(&pair.access_token).await.unwrap();

        let refreshed = store.refresh(&pair.refresh_token).await.unwrap();
        let session = store.verify(&refreshed).await.unwrap();

        assert_eq!(session.claims.sid, original.claims.sid);
        assert_ne!(session.claims.jti, original.claims.jti);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let store = store();
        let claims = Claims::new("alice@example.com", TokenType::Access, Duration::seconds(-10));
        let token = jwt::create_token(&claims, "test-secret-key-at-least-32-bytes-long").unwrap();

        let err = store.verify(&token).await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: Token has expired");
    }

    #[test]
    fn test_settings_debug_hides_secret() {
        let settings = TokenSettings::new("super-secret-value-that-is-long-enough");
        assert!(!format!("{:?}", settings).contains("super-secret"));
    }
}
