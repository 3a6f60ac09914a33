//! Event catalogue service

use std::sync::Arc;

use tracing::info;

use crate::domain::event::{Event, EventId, EventRepository};
use crate::domain::profile::{require_admin, Profile};
use crate::domain::DomainError;

/// Request for creating a new event
#[derive(Debug, Clone)]
pub struct CreateEventRequest {
    pub name: String,
    pub entry_fee: i64,
    pub team_event: bool,
    pub min_roster: Option<usize>,
    pub max_roster: Option<usize>,
}

/// Admin-owned event catalogue; the registration ledger only reads it
#[derive(Debug, Clone)]
pub struct EventService {
    events: Arc<dyn EventRepository>,
}

impl EventService {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self { events }
    }

    /// Create an event; admin only
    pub async fn create(
        &self,
        caller: &Profile,
        request: CreateEventRequest,
    ) -> Result<Event, DomainError> {
        require_admin(caller)?;

        info!(name = %request.name, fee = request.entry_fee, "Creating event");

        let mut event = Event::new(
            EventId::generate(),
            request.name,
            request.entry_fee,
            request.team_event,
        )?;

        if let (Some(min), Some(max)) = (request.min_roster, request.max_roster) {
            event = event.with_roster_bounds(min, max)?;
        } else if request.min_roster.is_some() || request.max_roster.is_some() {
            return Err(DomainError::validation(
                "Roster bounds must be given as a min/max pair",
            ));
        }

        self.events.create(event).await
    }

    pub async fn get(&self, id: &EventId) -> Result<Event, DomainError> {
        self.events
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Event '{}' not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<Event>, DomainError> {
        self.events.list().await
    }
}
