use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/topics", get(handlers::list_topics))
        // Interview control
        .route("/interview", get(handlers::get_interview))
        .route("/interview/phase", get(handlers::get_phase))
        .route("/interview/start", post(handlers::start_interview))
        .route("/interview/input", post(handlers::submit_input))
        .route("/interview/next", post(handlers::next_question))
        // History
        .route("/history", get(handlers::list_history))
        .route(
            "/history/:session_id/load",
            post(handlers::load_history),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
