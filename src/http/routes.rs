use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Companion catalog
        .route(
            "/companions",
            post(handlers::create_companion).get(handlers::list_companions),
        )
        .route("/companions/users/:user_id", get(handlers::user_companions))
        .route("/companions/:companion_id", get(handlers::get_companion))
        .route(
            "/companions/:companion_id/bookmark",
            post(handlers::bookmark_companion),
        )
        // Session control
        .route("/sessions/:companion_id/start", post(handlers::launch_session))
        .route("/sessions/:companion_id/stop", post(handlers::stop_session))
        .route("/sessions/:companion_id/mute", post(handlers::toggle_microphone))
        .route("/sessions/:companion_id", get(handlers::get_session))
        // Session history
        .route("/history/recent", get(handlers::recent_sessions))
        .route("/history/users/:user_id", get(handlers::user_sessions))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
