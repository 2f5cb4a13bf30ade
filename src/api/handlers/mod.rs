pub mod students;

pub use students::*;

use crate::auth::jwt::TokenService;
use crate::auth::password::PasswordHasher;
use crate::db::manager::DatabaseManager;
use crate::db::repository::{CredentialStore, StudentRepository, UserRepository};
use std::sync::Arc;

/// Shared application state for handlers
///
/// Everything in here is immutable after startup and cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn CredentialStore>,
    pub student_repo: Arc<StudentRepository>,
    pub tokens: Arc<TokenService>,
    pub passwords: Arc<PasswordHasher>,
}

impl AppState {
    /// Build the state with SQLite-backed repositories
    pub fn new(
        db: Arc<DatabaseManager>,
        tokens: Arc<TokenService>,
        passwords: Arc<PasswordHasher>,
    ) -> Self {
        Self {
            users: Arc::new(UserRepository::new(db.clone())),
            student_repo: Arc::new(StudentRepository::new(db)),
            tokens,
            passwords,
        }
    }
}
