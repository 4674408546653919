pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Course API
        .route("/api/v1/courses", get(handlers::handle_list_courses))
        .route("/api/v1/courses/generate", post(handlers::handle_generate))
        .route("/api/v1/courses/:id", get(handlers::handle_get_course))
        .route(
            "/api/v1/courses/:id/content",
            get(handlers::handle_get_content),
        )
        .route("/api/v1/courses/:id/job", get(handlers::handle_get_job))
        .with_state(state)
}
