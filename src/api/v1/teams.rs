//! Team endpoint handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ProfileView, TeamView};
use crate::domain::profile::ProfileId;
use crate::domain::team::TeamId;

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub profile_id: String,
}

fn team_id(raw: &str) -> Result<TeamId, ApiError> {
    TeamId::new(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn profile_id(raw: &str) -> Result<ProfileId, ApiError> {
    ProfileId::new(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// POST /v1/teams
pub async fn create_team(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Json(request): Json<CreateTeamRequest>,
) -> Result<Json<TeamView>, ApiError> {
    let team = state.team_service.create_team(&profile, &request.name).await?;
    Ok(Json(TeamView::from_domain(&team)))
}

/// GET /v1/teams/{team_id}
pub async fn get_team(
    State(state): State<AppState>,
    RequireUser(_profile): RequireUser,
    Path(id): Path<String>,
) -> Result<Json<TeamView>, ApiError> {
    let team = state.team_service.get(&team_id(&id)?).await?;
    Ok(Json(TeamView::from_domain(&team)))
}

/// POST /v1/teams/{team_id}/join-requests
pub async fn request_join(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Path(id): Path<String>,
) -> Result<Json<TeamView>, ApiError> {
    debug!(team = %id, requester = %profile.id(), "Join request received");

    let team = state
        .team_service
        .request_join(&profile, &team_id(&id)?)
        .await?;
    Ok(Json(TeamView::from_domain(&team)))
}

/// POST /v1/teams/{team_id}/join-requests/approve
pub async fn approve_join(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<MemberRequest>,
) -> Result<Json<TeamView>, ApiError> {
    let team = state
        .team_service
        .approve_join(&profile, &team_id(&id)?, &profile_id(&request.profile_id)?)
        .await?;
    Ok(Json(TeamView::from_domain(&team)))
}

/// POST /v1/teams/{team_id}/join-requests/reject
pub async fn reject_join(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<MemberRequest>,
) -> Result<Json<TeamView>, ApiError> {
    let team = state
        .team_service
        .reject_join(&profile, &team_id(&id)?, &profile_id(&request.profile_id)?)
        .await?;
    Ok(Json(TeamView::from_domain(&team)))
}

/// POST /v1/teams/{team_id}/invitations
pub async fn invite(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<MemberRequest>,
) -> Result<Json<ProfileView>, ApiError> {
    let invitee = state
        .team_service
        .invite(&profile, &team_id(&id)?, &profile_id(&request.profile_id)?)
        .await?;
    Ok(Json(ProfileView::from_domain(&invitee)))
}

/// DELETE /v1/teams/{team_id}/invitations/{profile_id}
pub async fn cancel_invite(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Path((id, invitee)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, ApiError> {
    state
        .team_service
        .cancel_invite(&profile, &team_id(&id)?, &profile_id(&invitee)?)
        .await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// POST /v1/teams/leave - leave the caller's team, disbanding if leader
pub async fn leave_team(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
) -> Result<axum::http::StatusCode, ApiError> {
    state.team_service.leave_or_disband(&profile).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
