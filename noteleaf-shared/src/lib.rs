//! # Noteleaf Shared Library
//!
//! This crate contains the data layer and security primitives shared by the
//! Noteleaf API server and its integration tests.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their query operations
//! - `db`: Connection pool, migrations, and the generic record controller
//! - `auth`: Password hashing and bearer-token utilities
//! - `storage`: Attachment file storage on the local filesystem

pub mod auth;
pub mod db;
pub mod models;
pub mod storage;

/// Current version of the Noteleaf shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
