//! Event repository trait

use async_trait::async_trait;

use super::entity::{Event, EventId};
use crate::domain::DomainError;

/// Repository for event records
#[async_trait]
pub trait EventRepository: Send + Sync + std::fmt::Debug {
    /// Get an event by ID
    async fn get(&self, id: &EventId) -> Result<Option<Event>, DomainError>;

    /// Create a new event; conflicts on duplicate id
    async fn create(&self, event: Event) -> Result<Event, DomainError>;

    /// List all events
    async fn list(&self) -> Result<Vec<Event>, DomainError>;
}
