//! Admin registration endpoints
//!
//! Every handler passes the resolved caller into the service layer,
//! where the admin gate decides. Unauthenticated callers are rejected
//! with 401 by the extractor; resolved non-admins get 403.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, RegistrationView};
use crate::domain::event::EventId;
use crate::domain::registration::{PaymentStatus, RegistrationId, RegistrationQuery};

#[derive(Debug, Deserialize, Default)]
pub struct ListFilters {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ManualVerifyBody {
    pub action: String,
    pub notes: String,
}

fn registration_id(raw: &str) -> Result<RegistrationId, ApiError> {
    RegistrationId::new(raw).map_err(ApiError::from)
}

/// GET /admin/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Query(filters): Query<ListFilters>,
) -> Result<Json<Vec<RegistrationView>>, ApiError> {
    let mut query = RegistrationQuery::new();

    if let Some(event_id) = filters.event_id {
        query = query.with_event(EventId::new(event_id).map_err(ApiError::from)?);
    }

    if let Some(status) = filters.status {
        query = query.with_status(status.parse::<PaymentStatus>().map_err(ApiError::from)?);
    }

    let registrations = state
        .registration_service
        .list_for_admin(&profile, query)
        .await?;

    Ok(Json(
        registrations
            .iter()
            .map(RegistrationView::from_domain)
            .collect(),
    ))
}

/// POST /admin/registrations/{registration_id}/manual-verification
pub async fn manual_verify(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Path(id): Path<String>,
    Json(body): Json<ManualVerifyBody>,
) -> Result<Json<RegistrationView>, ApiError> {
    info!(registration = %id, action = %body.action, "Manual verification requested");

    let registration = state
        .payment_service
        .manual_verify(&profile, &registration_id(&id)?, &body.action, &body.notes)
        .await?;

    Ok(Json(RegistrationView::from_domain(&registration)))
}

/// POST /admin/registrations/{registration_id}/check-in
pub async fn check_in(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Path(id): Path<String>,
) -> Result<Json<RegistrationView>, ApiError> {
    let registration = state
        .registration_service
        .check_in(&profile, &registration_id(&id)?)
        .await?;

    Ok(Json(RegistrationView::from_domain(&registration)))
}
