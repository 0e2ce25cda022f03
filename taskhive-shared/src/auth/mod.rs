/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing, password policy and email format checks
/// - [`jwt`]: HS256 access/refresh tokens carrying a unique `jti`
/// - [`revocation`]: `revoked:<jti>` denylist behind the `Denylist` trait
/// - [`credentials`]: login, token issue/verify/refresh, logout
/// - [`authorization`]: the single group authorization gate
///
/// # Request flow
///
/// ```text
/// bearer token -> jwt::validate_access_token -> RevocationCache::is_revoked
///              -> authorization::authorize(email, group, roles) -> service
/// ```

pub mod authorization;
pub mod credentials;
pub mod jwt;
pub mod password;
pub mod revocation;
