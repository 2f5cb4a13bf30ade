//! Authentication module
//!
//! This module provides authentication functionality including:
//! - User signup and login
//! - JWT token issuance and validation
//! - Password hashing and verification
//! - Authentication middleware

pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use crate::db::repository::CredentialStore;
pub use handlers::{login, profile, signup};
pub use jwt::{Claims, IssuedToken, TokenError, TokenService, TOKEN_LIFETIME_SECS};
pub use middleware::{authenticate, AuthUser};
pub use password::PasswordHasher;
