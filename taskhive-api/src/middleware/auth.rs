/// Bearer token authentication
///
/// `require_auth` reads `Authorization: Bearer <token>`, verifies the access
/// token through the credential store (signature, issuer, expiry, denylist)
/// and inserts an [`AuthContext`] into the request extensions. Handlers pick
/// it up with `Extension<AuthContext>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use taskhive_shared::auth::credentials::Session;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller of the current request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session: Session,
}

impl AuthContext {
    pub fn email(&self) -> &str {
        &self.session.identity.email
    }
}

/// Extracts the token from an `Authorization` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = bearer_token(header_value)
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let session = state.credentials.verify(token).await?;
    tracing::debug!(email = %session.identity.email, jti = %session.claims.jti, "Request authenticated");

    req.extensions_mut().insert(AuthContext { session });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }
}
