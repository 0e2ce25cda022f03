/// Domain error taxonomy
///
/// Every service operation in TaskHive returns [`ServiceResult`]. The variants
/// are deliberately coarse so that the boundary layer can map each of them to
/// exactly one transport status code:
///
/// | Variant            | HTTP |
/// |--------------------|------|
/// | `Validation`       | 400  |
/// | `Authentication`   | 401  |
/// | `PermissionDenied` | 403  |
/// | `NotFound`         | 404  |
/// | `Conflict`         | 409  |
/// | `Storage`          | 500  |
/// | `Internal`         | 500  |
///
/// Storage failures always surface after the enclosing transaction has been
/// dropped, which rolls it back.

use thiserror::Error;

/// Result alias used by every service operation
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the membership engine, task store, license ledger and
/// credential store
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input; never touches the store
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Bad credentials or an expired/revoked/malformed token
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authenticated but not allowed to act on the target group
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Referenced group, task, membership, user or license does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate invitation, already-registered email, already-used license
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transaction or query failure
    #[error("Storage error: {0}")]
    Storage(sqlx::Error),

    /// Failure in a local primitive such as hashing or token signing
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Short machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Authentication(_) => "unauthorized",
            ServiceError::PermissionDenied(_) => "forbidden",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Storage(_) | ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                return ServiceError::Conflict(format!("Constraint violation: {}", constraint));
            }
            if db_err.is_foreign_key_violation() {
                return ServiceError::NotFound(referenced_entity(db_err.constraint()).to_string());
            }
        }

        ServiceError::Storage(err)
    }
}

/// Names the row a foreign key points at, from Postgres' default
/// `<table>_<column>_fkey` constraint names
fn referenced_entity(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(name) if name.ends_with("email_fkey") => "User",
        _ => "Group",
    }
}
