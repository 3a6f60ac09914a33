//! Profile endpoint handlers

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use tracing::debug;

use crate::api::middleware::{extract_external_id, RequireUser};
use crate::api::state::AppState;
use crate::api::types::{ApiError, ProfileView};

#[derive(Debug, Deserialize)]
pub struct RegisterProfileRequest {
    pub name: String,
    pub email: String,
}

/// POST /v1/profiles - resolve the caller's identity, creating a profile
/// on first visit
pub async fn register_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterProfileRequest>,
) -> Result<Json<ProfileView>, ApiError> {
    let external_id = extract_external_id(&headers)?;

    let profile = state
        .identity_service
        .resolve_or_register(&external_id, &request.name, &request.email)
        .await?;

    Ok(Json(ProfileView::from_domain(&profile)))
}

/// GET /v1/profiles/me
pub async fn get_me(RequireUser(profile): RequireUser) -> Json<ProfileView> {
    debug!(id = %profile.id(), "Returning own profile");
    Json(ProfileView::from_domain(&profile))
}
