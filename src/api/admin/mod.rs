//! Admin API endpoints, gated by the admin check in the service layer

pub mod events;
pub mod registrations;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/registrations", get(registrations::list_registrations))
        .route(
            "/registrations/{registration_id}/manual-verification",
            post(registrations::manual_verify),
        )
        .route(
            "/registrations/{registration_id}/check-in",
            post(registrations::check_in),
        )
        .route("/events", post(events::create_event))
        .route("/users", get(users::export_users))
}
