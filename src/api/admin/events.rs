//! Admin event endpoints

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, EventView};
use crate::infrastructure::event::CreateEventRequest;

#[derive(Debug, Deserialize)]
pub struct CreateEventBody {
    pub name: String,
    pub entry_fee: i64,
    #[serde(default)]
    pub team_event: bool,
    #[serde(default)]
    pub min_roster: Option<usize>,
    #[serde(default)]
    pub max_roster: Option<usize>,
}

/// POST /admin/events
pub async fn create_event(
    State(state): State<AppState>,
    RequireUser(profile): RequireUser,
    Json(body): Json<CreateEventBody>,
) -> Result<Json<EventView>, ApiError> {
    let event = state
        .event_service
        .create(
            &profile,
            CreateEventRequest {
                name: body.name,
                entry_fee: body.entry_fee,
                team_event: body.team_event,
                min_roster: body.min_roster,
                max_roster: body.max_roster,
            },
        )
        .await?;

    Ok(Json(EventView::from_domain(&event)))
}
