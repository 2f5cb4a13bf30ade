//! Password hashing and verification using bcrypt

use crate::core::error::{AppError, Result};

/// Lowest work factor bcrypt accepts
pub const MIN_COST: u32 = 4;
/// Highest work factor bcrypt accepts
pub const MAX_COST: u32 = 31;

/// Hashes and verifies passwords at a fixed bcrypt work factor
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    // Verified against when a login names an unknown user, so that path
    // costs the same as a wrong password
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self> {
        let dummy_hash = bcrypt::hash("dummy-password-for-timing", cost)
            .map_err(|e| AppError::ConfigError(format!("Invalid bcrypt cost {}: {}", cost, e)))?;

        Ok(Self { cost, dummy_hash })
    }

    /// Hash a password; every call uses a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::InternalError(format!("Failed to hash password: {}", e)))
    }

    /// Verify a password against a hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash)
            .map_err(|e| AppError::InternalError(format!("Failed to verify password: {}", e)))
    }

    /// Burn the same hashing time as a real verification; always fails
    pub fn verify_dummy(&self, password: &str) {
        let _ = bcrypt::verify(password, &self.dummy_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_COST).unwrap()
    }

    #[test]
    fn test_password_hash_and_verify_correct() {
        let hasher = hasher();
        let hash = hasher.hash("my-secure-password").unwrap();
        assert!(hasher.verify("my-secure-password", &hash).unwrap());
        assert!(!hash.contains("my-secure-password"));
    }

    #[test]
    fn test_password_verify_wrong() {
        let hasher = hasher();
        let hash = hasher.hash("correct-password").unwrap();
        assert!(!hasher.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_password_different_salts() {
        let hasher = hasher();
        let hash1 = hasher.hash("same-password").unwrap();
        let hash2 = hasher.hash("same-password").unwrap();
        assert_ne!(hash1, hash2);
        assert!(hasher.verify("same-password", &hash1).unwrap());
        assert!(hasher.verify("same-password", &hash2).unwrap());
    }

    #[test]
    fn test_corrupt_hash_is_an_error() {
        let hasher = hasher();
        assert!(matches!(
            hasher.verify("password", "not-a-bcrypt-hash"),
            Err(AppError::InternalError(_))
        ));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(matches!(
            PasswordHasher::new(2),
            Err(AppError::ConfigError(_))
        ));
    }
}
