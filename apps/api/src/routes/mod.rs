pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/session", post(session::handle_create_session))
        .route("/session/:id", get(session::handle_get_session))
        .route("/session/:id/context", post(session::handle_set_context))
        // Interview flow
        .route(
            "/session/:id/interview-config",
            post(interview::handle_interview_config),
        )
        .route("/session/:id/start", post(interview::handle_start))
        .route("/session/:id/message", post(interview::handle_message))
        .route("/session/:id/summary", get(interview::handle_summary))
        .route("/session/:id/feedback", get(interview::handle_feedback))
        .with_state(state)
}
