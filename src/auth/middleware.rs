//! Authentication middleware
//!
//! Every protected route sits behind [`authenticate`]. A request either
//! carries a valid `Authorization: Bearer <token>` header and continues with
//! an [`AuthUser`] in its extensions, or it is answered with 401 before any
//! handler runs.

use crate::api::handlers::AppState;
use crate::auth::jwt::Claims;
use crate::core::error::AppError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Authenticated identity attached to a request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            username: claims.username,
            email: claims.email,
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Some(t) => t,
        None => return AppError::MissingCredentials.into_response(),
    };

    let claims = match state.tokens.validate(token) {
        Ok(c) => c,
        Err(e) => return AppError::Unauthorized(e).into_response(),
    };

    tracing::debug!(user_id = claims.user_id, "Request authenticated");

    request.extensions_mut().insert(AuthUser::from(claims));

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenService;
    use crate::auth::password::{PasswordHasher, MIN_COST};
    use crate::core::clock::ManualClock;
    use crate::core::error::UnauthorizedResponse;
    use crate::db::manager::DatabaseManager;
    use axum::{
        body::Body,
        http::{HeaderValue, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::util::ServiceExt; // For oneshot method

    struct Harness {
        app: Router,
        tokens: Arc<TokenService>,
        clock: Arc<ManualClock>,
        calls: Arc<AtomicUsize>,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let tokens = Arc::new(TokenService::new("gate-secret", clock.clone()).unwrap());
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let passwords = Arc::new(PasswordHasher::new(MIN_COST).unwrap());
        let state = AppState::new(db, tokens.clone(), passwords);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let app = Router::new()
            .route(
                "/protected",
                get(move |user: AuthUser| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        user.id.to_string()
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(state, authenticate));

        Harness {
            app,
            tokens,
            clock,
            calls,
        }
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn assert_unauthorized(response: Response) {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: UnauthorizedResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "unauthorized");
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let h = harness();
        let issued = h.tokens.issue(42, "ada", "ada@x.com").unwrap();

        let response = h
            .app
            .oneshot(request(Some(&format!("Bearer {}", issued.token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"42");
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_garbage_token_never_reaches_handler() {
        let h = harness();

        let response = h
            .app
            .oneshot(request(Some("Bearer garbage")))
            .await
            .unwrap();

        assert_unauthorized(response).await;
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_rejected() {
        for header_value in [None, Some("Basic dGVzdDp0ZXN0"), Some("Bearer "), Some("bearer abc")] {
            let h = harness();
            let response = h.app.oneshot(request(header_value)).await.unwrap();
            assert_unauthorized(response).await;
            assert_eq!(h.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let h = harness();
        let issued = h.tokens.issue(42, "ada", "ada@x.com").unwrap();
        h.clock.advance(chrono::Duration::hours(25));

        let response = h
            .app
            .oneshot(request(Some(&format!("Bearer {}", issued.token))))
            .await
            .unwrap();

        assert_unauthorized(response).await;
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
