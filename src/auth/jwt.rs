//! JWT token generation and validation
//!
//! Tokens are HS256-signed JWTs carrying [`Claims`]. They live for exactly
//! [`TOKEN_LIFETIME_SECS`] and are valid while `nbf <= now < exp`, with no
//! leeway. Validation is a pure function of the token, the secret and the
//! clock: nothing is stored server-side.

use crate::core::clock::Clock;
use crate::core::error::{AppError, Result};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token lifetime: 24 hours
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Reasons a presented token is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Seconds until expiry
    pub expires_in: i64,
    /// Unix timestamp of expiry
    pub expires_at: i64,
}

/// Issues and validates session tokens with a single signing secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        if secret.is_empty() {
            return Err(AppError::ConfigError("JWT signing secret is empty".to_string()));
        }

        // Time checks are done against the injected clock in `validate`
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "nbf", "iat"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        })
    }

    /// Generate a token for a user
    pub fn issue(&self, user_id: i64, username: &str, email: &str) -> Result<IssuedToken> {
        let now = self.clock.now();
        let exp = now
            .checked_add(TOKEN_LIFETIME_SECS)
            .ok_or_else(|| AppError::InternalError("Failed to calculate expiration".to_string()))?;

        let claims = Claims {
            user_id,
            username: username.to_string(),
            email: email.to_string(),
            iat: now,
            nbf: now,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_in: TOKEN_LIFETIME_SECS,
            expires_at: exp,
        })
    }

    /// Validate a token and extract its claims
    ///
    /// The signature is checked before the claims are decoded; the HMAC
    /// comparison inside `jsonwebtoken` is constant-time.
    pub fn validate(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            })?
            .claims;

        let now = self.clock.now();
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        if now < claims.nbf {
            return Err(TokenError::NotYetValid);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use proptest::prelude::*;

    const START: i64 = 1_700_000_000;

    fn service(secret: &str) -> (TokenService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let tokens = TokenService::new(secret, clock.clone()).unwrap();
        (tokens, clock)
    }

    /// Replace the first character of the signature segment with a different base64url character
    fn tamper_signature(token: &str) -> String {
        let (signed, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", signed, chars.into_iter().collect::<String>())
    }

    #[test]
    fn test_issue_sets_24h_window() {
        let (tokens, _) = service("secret");
        let issued = tokens.issue(7, "ada", "ada@x.com").unwrap();
        let claims = tokens.validate(&issued.token).unwrap();

        assert_eq!(claims.iat, START);
        assert_eq!(claims.nbf, START);
        assert_eq!(claims.exp, START + TOKEN_LIFETIME_SECS);
        assert_eq!(issued.expires_in, 86_400);
        assert_eq!(issued.expires_at, claims.exp);
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = TokenService::new("", Arc::new(ManualClock::new(START)));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let (tokens, _) = service("secret");
        let issued = tokens.issue(1, "ada", "ada@x.com").unwrap();

        assert_eq!(
            tokens.validate(&tamper_signature(&issued.token)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let (issuer, _) = service("secret-1");
        let (validator, _) = service("secret-2");
        let issued = issuer.issue(1, "ada", "ada@x.com").unwrap();

        assert_eq!(
            validator.validate(&issued.token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_expiry_boundary_is_exact() {
        let (tokens, clock) = service("secret");
        let issued = tokens.issue(1, "ada", "ada@x.com").unwrap();

        clock.set(START + TOKEN_LIFETIME_SECS - 1);
        assert!(tokens.validate(&issued.token).is_ok());

        clock.set(START + TOKEN_LIFETIME_SECS);
        assert_eq!(tokens.validate(&issued.token), Err(TokenError::Expired));

        clock.advance(chrono::Duration::hours(1));
        assert_eq!(tokens.validate(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_not_yet_valid() {
        let (tokens, clock) = service("secret");
        let issued = tokens.issue(1, "ada", "ada@x.com").unwrap();

        clock.set(START - 1);
        assert_eq!(tokens.validate(&issued.token), Err(TokenError::NotYetValid));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (tokens, _) = service("secret");
        assert_eq!(tokens.validate("garbage"), Err(TokenError::Malformed));
        assert_eq!(tokens.validate(""), Err(TokenError::Malformed));
        assert_eq!(tokens.validate("a.b.c"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_signed_foreign_claims_are_malformed() {
        #[derive(Serialize)]
        struct Foreign {
            sub: String,
            exp: i64,
        }

        let (tokens, _) = service("secret");
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Foreign {
                sub: "someone".to_string(),
                exp: START + 60,
            },
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert_eq!(tokens.validate(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let (tokens, _) = service("secret");
        let claims = Claims {
            user_id: 1,
            username: "ada".to_string(),
            email: "ada@x.com".to_string(),
            iat: START,
            nbf: START,
            exp: START + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert_eq!(tokens.validate(&token), Err(TokenError::InvalidSignature));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_validate_recovers_issued_identity(
            user_id in 1i64..i64::MAX,
            username in "[a-zA-Z0-9_]{1,32}",
            email in "[a-z0-9.]{1,16}@[a-z]{1,12}\\.[a-z]{2,4}",
            elapsed in 0i64..TOKEN_LIFETIME_SECS,
        ) {
            let (tokens, clock) = service("property-secret");
            let issued = tokens.issue(user_id, &username, &email).unwrap();

            clock.set(START + elapsed);
            let claims = tokens.validate(&issued.token).unwrap();

            prop_assert_eq!(claims.user_id, user_id);
            prop_assert_eq!(claims.username, username);
            prop_assert_eq!(claims.email, email);
        }
    }
}
