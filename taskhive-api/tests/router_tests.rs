/// Router tests that need neither PostgreSQL nor Redis
///
/// Token verification only consults the signing secret and the denylist, so
/// the whole authentication surface can be exercised offline.

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::offline();

    for (method, uri) in [
        (Method::GET, "/api/groups"),
        (Method::GET, "/api/tasks"),
        (Method::GET, "/api/invites"),
        (Method::GET, "/api/auth/validate-token"),
        (Method::POST, "/api/auth/logout"),
    ] {
        let (status, body) = ctx.send(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let ctx = TestContext::offline();

    let (status, body) = ctx
        .send(Method::GET, "/api/auth/validate-token", Some("not-a-jwt"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn test_validate_token_reports_identity() {
    let ctx = TestContext::offline();
    let tokens = ctx.tokens_for("alice@example.com");

    let (status, body) = ctx
        .send(Method::GET, "/api/auth/validate-token", Some(&tokens.access_token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": true, "user": { "email": "alice@example.com" } }));
}

#[tokio::test]
async fn test_refresh_token_rejected_as_access_token() {
    let ctx = TestContext::offline();
    let tokens = ctx.tokens_for("alice@example.com");

    let (status, body) = ctx
        .send(Method::GET, "/api/auth/validate-token", Some(&tokens.refresh_token), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Expected access token");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let ctx = TestContext::offline();
    let tokens = ctx.tokens_for("alice@example.com");

    let (status, _) = ctx
        .send(Method::POST, "/api/auth/logout", Some(&tokens.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.denylist.len(), 2);

    let (status, body) = ctx
        .send(Method::GET, "/api/auth/validate-token", Some(&tokens.access_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has been revoked");
}

#[tokio::test]
async fn test_refresh_after_logout_is_rejected() {
    let ctx = TestContext::offline();
    let tokens = ctx.tokens_for("alice@example.com");

    ctx.send(Method::POST, "/api/auth/logout", Some(&tokens.access_token), None)
        .await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": tokens.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has been revoked");
}

#[tokio::test]
async fn test_logout_leaves_other_sessions_alone() {
    let ctx = TestContext::offline();
    let first = ctx.tokens_for("alice@example.com");
    let second = ctx.tokens_for("alice@example.com");

    ctx.send(Method::POST, "/api/auth/logout", Some(&first.access_token), None)
        .await;

    let (status, _) = ctx
        .send(Method::GET, "/api/auth/validate-token", Some(&second.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_issues_working_access_token() {
    let ctx = TestContext::offline();
    let tokens = ctx.tokens_for("alice@example.com");

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": tokens.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let access_token = body["access_token"].as_str().unwrap().to_string();
    let (status, body) = ctx
        .send(Method::GET, "/api/auth/validate-token", Some(&access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let ctx = TestContext::offline();
    let tokens = ctx.tokens_for("alice@example.com");

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": tokens.access_token })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Expected refresh token");
}

#[tokio::test]
async fn test_signup_validation_errors_list_fields() {
    let ctx = TestContext::offline();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/signup",
            None,
            Some(json!({ "email": "", "password": "Str0ng!pass", "licenseKey": "" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "license_key"]);
}

#[tokio::test]
async fn test_signup_rejects_malformed_email() {
    let ctx = TestContext::offline();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/signup",
            None,
            Some(json!({ "email": "alice.example.com", "password": "Str0ng!pass", "licenseKey": "LIC-x" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "email");
    assert_eq!(body["details"][0]["message"], "Invalid email format");
}

#[tokio::test]
async fn test_invitation_requires_valid_email() {
    let ctx = TestContext::offline();
    let tokens = ctx.tokens_for("alice@example.com");

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/invites/send",
            Some(&tokens.access_token),
            Some(json!({ "email": "bob", "group_id": "00000000-0000-0000-0000-000000000000" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "email");
}

#[tokio::test]
async fn test_signup_rejects_weak_password_before_storage() {
    let ctx = TestContext::offline();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/users/signup",
            None,
            Some(json!({ "email": "alice@example.com", "password": "weak", "licenseKey": "LIC-x" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let ctx = TestContext::offline();

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["denylist"], "connected");
    assert!(body["connections"]["idle_connections"].is_u64());
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let ctx = TestContext::offline();

    let response = {
        use tower::ServiceExt;
        ctx.app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/groups")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    };

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().get("strict-transport-security").is_none());
}
