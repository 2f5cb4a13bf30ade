//! Student Portal Backend Library
//!
//! This library provides the core functionality for the student portal
//! backend, including password and token authentication, database
//! management, and REST API services.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::{ApiServer, AppState};
pub use auth::{PasswordHasher, TokenService};
pub use crate::core::Config;
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for the library
pub type Result<T> = anyhow::Result<T>;
