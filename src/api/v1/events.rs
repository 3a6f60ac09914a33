//! Event listing handlers

use axum::{extract::State, Json};

use crate::api::state::AppState;
use crate::api::types::{ApiError, EventView};

/// GET /v1/events - the public event catalogue
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let events = state.event_service.list().await?;
    Ok(Json(events.iter().map(EventView::from_domain).collect()))
}
