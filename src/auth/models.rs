//! Authentication request/response models

use crate::db::models::User;
use serde::{Deserialize, Serialize};

/// Signup request
///
/// Every field is optional at the parsing level so that missing fields are
/// reported as validation errors rather than body rejections.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request
///
/// Clients name the account with `identifier`, `username` or `email`; when
/// several are sent the first non-blank one in that order wins.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub identifier: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Take the account name out of whichever field carries it
    pub fn take_identifier(&mut self) -> Option<String> {
        [self.identifier.take(), self.username.take(), self.email.take()]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
    }
}

/// Public profile (without password hash)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Signup response
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserProfile,
}
