//! API routes

use crate::api::handlers::{
    create_student, delete_student, list_students, list_students_by_department, update_student,
    AppState,
};
use crate::auth::handlers::{login, profile, signup};
use crate::auth::middleware::authenticate;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/api/auth/profile", get(profile))
        // Student record endpoints
        .route("/api/students", get(list_students).post(create_student))
        .route(
            "/api/students/department/:department",
            get(list_students_by_department),
        )
        .route("/api/students/:id", put(update_student).delete(delete_student))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    // Combine public and protected routes
    public_routes
        .merge(protected_routes)
        .with_state(state)
}
