//! # TaskHive API Server Library
//!
//! HTTP surface of TaskHive: groups, invitations and tasks behind bearer
//! token authentication.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `cli`: Command-line arguments
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Authentication and security headers
//! - `routes`: API route handlers
//! - `views`: JSON representations of domain entities

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod views;
