/// API route handlers, one module per resource
///
/// - `health`: database and denylist health
/// - `auth`: login, refresh, logout, token validation
/// - `users`: signup
/// - `groups`: group CRUD, leave, member listing
/// - `invites`: invitation lifecycle
/// - `tasks`: task CRUD

pub mod auth;
pub mod groups;
pub mod health;
pub mod invites;
pub mod tasks;
pub mod users;
