//! # Taskboard Shared Library
//!
//! Types, persistence and business logic used by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: database models and their queries
//! - `db`: connection pool and migrations
//! - `auth`: password hashing, session tokens and cookies
//! - `calendar`: local calendar windows over UTC timestamps
//! - `query`: filtered, paginated task lists
//! - `board`: kanban projection
//! - `metrics`: per-user completion metrics
//! - `dependency`: cycle guard for blocker edges

pub mod auth;
pub mod board;
pub mod calendar;
pub mod db;
pub mod dependency;
pub mod metrics;
pub mod models;
pub mod query;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
