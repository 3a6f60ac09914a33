//! Admin user export endpoint

use axum::{extract::State, Json};
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ProfileView};

/// GET /admin/users - full user export
pub async fn export_users(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
) -> Result<Json<Vec<ProfileView>>, ApiError> {
    debug!(caller = %profile.id(), "User export requested");

    let profiles = state.identity_service.export_profiles(&profile).await?;
    Ok(Json(profiles.iter().map(ProfileView::from_domain).collect()))
}
