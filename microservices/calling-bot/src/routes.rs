//! Router configuration for the calling bot API

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Stats
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/stats", get(handlers::stats))
        .route("/actions", get(handlers::list_actions))
        // Test call trigger
        .route("/makeTestCall", get(handlers::make_test_call))
        // Platform notifications
        .route("/callback", post(handlers::callback))
        // Call control
        .route("/joinMeeting", post(handlers::join_meeting))
        .route("/calls/{call_id}", delete(handlers::hang_up))
        .route("/calls/{call_id}/invite", post(handlers::invite_participant))
        .route("/onlineMeetings", post(handlers::create_online_meeting))
        .with_state(state)
}
