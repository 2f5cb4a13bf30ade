//! Authentication API handlers

use crate::api::handlers::AppState;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{LoginRequest, LoginResponse, SignupRequest, SignupResponse, UserProfile};
use crate::auth::password::PasswordHasher;
use crate::core::error::{AppError, Result};
use crate::db::models::NewUser;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// Trimmed value of a required field, or a validation error naming it
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::ValidationError(format!("{} is required", field)))
}

/// Like [`required`] but keeps the value byte-for-byte
fn required_secret(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError(format!("{} is required", field)))
}

/// Unwrap a JSON body, reporting unreadable bodies as validation errors
pub(crate) fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::ValidationError(format!("Invalid request body: {}", e.body_text())))
}

/// Run bcrypt off the async workers
async fn blocking_hash<F, T>(passwords: &Arc<PasswordHasher>, f: F) -> Result<T>
where
    F: FnOnce(&PasswordHasher) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let passwords = passwords.clone();
    tokio::task::spawn_blocking(move || f(&passwords))
        .await
        .map_err(|e| AppError::TaskError(format!("Password task panicked: {}", e)))?
}

/// Handler for POST /api/auth/signup - User registration
pub async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let req = json_body(body)?;

    let name = required(req.name, "name")?;
    let email = required(req.email, "email")?.to_lowercase();
    let password = required_secret(req.password, "password")?;
    if !email.contains('@') {
        return Err(AppError::ValidationError("email is invalid".to_string()));
    }
    let username = req
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| email.clone());

    tracing::info!(username = %username, "User signup attempt");

    let password_hash = blocking_hash(&state.passwords, move |p| p.hash(&password)).await?;

    let user = state
        .users
        .insert(NewUser {
            username,
            name,
            email,
            password_hash,
        })
        .await
        .map_err(|e| {
            if matches!(e, AppError::DuplicateIdentity(_)) {
                tracing::warn!("Signup rejected: identity already registered");
            }
            e
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered successfully");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user: UserProfile::from(user),
        }),
    ))
}

/// Handler for POST /api/auth/login - User login
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let mut req = json_body(body)?;

    let identifier = required(req.take_identifier(), "identifier")?;
    let password = required_secret(req.password, "password")?;

    tracing::info!(identifier = %identifier, "Login attempt");

    let user = match state.users.find_by_identifier(&identifier).await? {
        Some(user) => user,
        None => {
            blocking_hash(&state.passwords, move |p| {
                p.verify_dummy(&password);
                Ok(())
            })
            .await?;
            tracing::warn!(identifier = %identifier, "Login failed");
            return Err(AppError::InvalidCredentials);
        }
    };

    let hash = user.password_hash.clone();
    let is_valid = blocking_hash(&state.passwords, move |p| p.verify(&password, &hash)).await?;
    if !is_valid {
        tracing::warn!(identifier = %identifier, "Login failed");
        return Err(AppError::InvalidCredentials);
    }

    let issued = state.tokens.issue(user.id, &user.username, &user.email)?;

    tracing::info!(user_id = user.id, username = %user.username, "Login successful");

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_in: issued.expires_in,
        user: UserProfile::from(user),
    }))
}

/// Handler for GET /api/auth/profile - Current user's profile
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>> {
    tracing::debug!(user_id = user.id, "Fetching profile");

    let db_user = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(db_user)))
}
