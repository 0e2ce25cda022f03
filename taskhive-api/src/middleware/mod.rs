/// Middleware for the API server
///
/// - `auth`: Bearer token verification, injects `AuthContext`
/// - `security`: OWASP security response headers

pub mod auth;
pub mod security;
