//! # TaskHive Shared Library
//!
//! This crate contains the domain types, persistence layer and business logic
//! behind the TaskHive API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pooling and migrations
//! - `auth`: Password hashing, JWT tokens, revocation, authorization gate
//! - `redis`: Redis client used by the revocation denylist
//! - `services`: Membership engine, task store, license ledger and signup
//! - `error`: Domain error taxonomy shared by every service

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod redis;
pub mod services;

/// Current version of the TaskHive shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
