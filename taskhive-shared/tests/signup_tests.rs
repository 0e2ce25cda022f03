/// Signup, license redemption and login against a real database
///
/// Run with: cargo test -p taskhive-shared --test signup_tests -- --ignored

mod common;

use common::{license, setup};
use std::sync::Arc;
use taskhive_shared::{
    auth::{
        credentials::{CredentialStore, TokenSettings},
        revocation::{Denylist, RevocationCache, RevocationError},
    },
    error::ServiceError,
    models::{license::SoftwareLicense, user::User},
    services::{licenses::LicenseLedger, AccountService},
};
use uuid::Uuid;

const PASSWORD: &str = "Str0ng!pass";

fn email(name: &str) -> String {
    format!("{}-{}@example.com", name, Uuid::new_v4())
}

struct NoopDenylist;

#[async_trait::async_trait]
impl Denylist for NoopDenylist {
    async fn set_ex(&self, _key: &str, _ttl_secs: u64) -> Result<(), RevocationError> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> Result<bool, RevocationError> {
        Ok(false)
    }
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_signup_consumes_license() {
    let pool = setup().await;
    let accounts = AccountService::new(pool.clone());
    let key = license(&pool).await;
    let address = email("alice");

    let user = accounts.signup(&address.to_uppercase(), PASSWORD, &key).await.unwrap();
    assert_eq!(user.email, address);
    assert!(user.password_hash.starts_with("$argon2id$"));

    let stored = SoftwareLicense::find(&pool, &key).await.unwrap().unwrap();
    assert!(stored.used_status);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_used_license_is_rejected() {
    let pool = setup().await;
    let accounts = AccountService::new(pool.clone());
    let key = license(&pool).await;

    accounts.signup(&email("first"), PASSWORD, &key).await.unwrap();

    let second = email("second");
    let result = accounts.signup(&second, PASSWORD, &key).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert!(!User::exists(&pool, &second).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_unknown_license_is_not_found() {
    let pool = setup().await;
    let accounts = AccountService::new(pool.clone());

    let result = accounts.signup(&email("alice"), PASSWORD, "LIC-doesnotexist").await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_duplicate_email_leaves_license_unused() {
    let pool = setup().await;
    let accounts = AccountService::new(pool.clone());
    let address = email("alice");

    accounts.signup(&address, PASSWORD, &license(&pool).await).await.unwrap();

    let spare = license(&pool).await;
    let result = accounts.signup(&address, PASSWORD, &spare).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));

    let stored = SoftwareLicense::find(&pool, &spare).await.unwrap().unwrap();
    assert!(!stored.used_status);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_invalid_input_never_touches_license() {
    let pool = setup().await;
    let accounts = AccountService::new(pool.clone());
    let key = license(&pool).await;

    let bad_email = accounts.signup("not-an-email", PASSWORD, &key).await;
    assert!(matches!(bad_email, Err(ServiceError::Validation(_))));

    let weak = accounts.signup(&email("alice"), "password", &key).await;
    assert!(matches!(weak, Err(ServiceError::Validation(_))));

    let stored = SoftwareLicense::find(&pool, &key).await.unwrap().unwrap();
    assert!(!stored.used_status);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_concurrent_redemption_has_one_winner() {
    let pool = setup().await;
    let accounts = AccountService::new(pool.clone());
    let key = license(&pool).await;
    let (first, second) = (email("first"), email("second"));

    let (a, b) = futures::join!(
        accounts.signup(&first, PASSWORD, &key),
        accounts.signup(&second, PASSWORD, &key)
    );

    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);

    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(ServiceError::Conflict(_))));

    let stored = SoftwareLicense::find(&pool, &key).await.unwrap().unwrap();
    assert!(stored.used_status);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_redeem_rolls_back_with_transaction() {
    let pool = setup().await;
    let key = license(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    LicenseLedger::redeem(&mut tx, &key).await.unwrap();
    tx.rollback().await.unwrap();

    let stored = SoftwareLicense::find(&pool, &key).await.unwrap().unwrap();
    assert!(!stored.used_status);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_login_after_signup() {
    let pool = setup().await;
    let accounts = AccountService::new(pool.clone());
    let address = email("alice");
    accounts.signup(&address, PASSWORD, &license(&pool).await).await.unwrap();

    let store = CredentialStore::new(
        pool.clone(),
        TokenSettings::new("test-secret-key-at-least-32-bytes-long"),
        RevocationCache::new(Arc::new(NoopDenylist)),
    );

    let identity = store.authenticate(&address, PASSWORD).await.unwrap();
    assert_eq!(identity.email, address);

    let wrong = store.authenticate(&address, "Wr0ng!pass").await.unwrap_err();
    let unknown = store.authenticate(&email("ghost"), PASSWORD).await.unwrap_err();
    assert_eq!(wrong.to_string(), unknown.to_string());
}
