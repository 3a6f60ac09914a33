//! Participant-facing v1 API endpoints

pub mod events;
pub mod payments;
pub mod profiles;
pub mod registrations;
pub mod teams;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/profiles", post(profiles::register_profile))
        .route("/profiles/me", get(profiles::get_me))
        .route("/teams", post(teams::create_team))
        .route("/teams/leave", post(teams::leave_team))
        .route("/teams/{team_id}", get(teams::get_team))
        .route("/teams/{team_id}/join-requests", post(teams::request_join))
        .route(
            "/teams/{team_id}/join-requests/approve",
            post(teams::approve_join),
        )
        .route(
            "/teams/{team_id}/join-requests/reject",
            post(teams::reject_join),
        )
        .route("/teams/{team_id}/invitations", post(teams::invite))
        .route(
            "/teams/{team_id}/invitations/{profile_id}",
            delete(teams::cancel_invite),
        )
        .route("/events", get(events::list_events))
        .route(
            "/registrations",
            get(registrations::list_my_registrations).post(registrations::create_registration),
        )
        .route("/payments/callback", post(payments::gateway_callback))
        .route("/payments/pending", post(payments::mark_pending))
}
