//! Registration endpoint handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, RegistrationView};
use crate::domain::event::EventId;
use crate::domain::profile::ProfileId;
use crate::domain::team::TeamId;
use crate::infrastructure::registration::CreateRegistrationRequest;

#[derive(Debug, Deserialize)]
pub struct CreateRegistrationBody {
    pub event_id: String,
    #[serde(default)]
    pub team_id: Option<String>,
    pub selected_members: Vec<String>,
    pub razorpay_order_id: String,
}

/// POST /v1/registrations
pub async fn create_registration(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Json(body): Json<CreateRegistrationBody>,
) -> Result<Json<RegistrationView>, ApiError> {
    let event_id =
        EventId::new(body.event_id).map_err(ApiError::from)?;
    let team_id = body
        .team_id
        .map(TeamId::new)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let selected_members = body
        .selected_members
        .into_iter()
        .map(ProfileId::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let registration = state
        .registration_service
        .create_registration(
            &profile,
            CreateRegistrationRequest {
                event_id,
                team_id,
                selected_members,
                razorpay_order_id: body.razorpay_order_id,
            },
        )
        .await?;

    Ok(Json(RegistrationView::from_domain(&registration)))
}

/// GET /v1/registrations - registrations visible to the caller
pub async fn list_my_registrations(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
) -> Result<Json<Vec<RegistrationView>>, ApiError> {
    debug!(profile = %profile.id(), "Listing own registrations");

    let registrations = state.registration_service.find_for_user(&profile).await?;
    let views = registrations
        .iter()
        .map(RegistrationView::from_domain)
        .collect();

    Ok(Json(views))
}
