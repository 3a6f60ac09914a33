//! In-memory event repository

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::event::{Event, EventId, EventRepository};
use crate::domain::DomainError;

/// Thread-safe in-memory implementation of `EventRepository`
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<String, Event>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn get(&self, id: &EventId) -> Result<Option<Event>, DomainError> {
        let events = self
            .events
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire event lock: {}", e)))?;
        Ok(events.get(id.as_str()).cloned())
    }

    async fn create(&self, event: Event) -> Result<Event, DomainError> {
        let mut events = self
            .events
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire event lock: {}", e)))?;

        if events.contains_key(event.id().as_str()) {
            return Err(DomainError::conflict(format!(
                "Event '{}' already exists",
                event.id()
            )));
        }

        events.insert(event.id().as_str().to_string(), event.clone());
        Ok(event)
    }

    async fn list(&self) -> Result<Vec<Event>, DomainError> {
        let events = self
            .events
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire event lock: {}", e)))?;
        let mut result: Vec<Event> = events.values().cloned().collect();
        result.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_list() {
        let repo = InMemoryEventRepository::new();
        let event = Event::new(EventId::generate(), "Robo Race", 500, true).unwrap();
        let id = event.id().clone();

        repo.create(event).await.unwrap();
        assert!(repo.get(&id).await.unwrap().is_some());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_event_conflicts() {
        let repo = InMemoryEventRepository::new();
        let id = EventId::generate();
        repo.create(Event::new(id.clone(), "Robo Race", 500, true).unwrap())
            .await
            .unwrap();

        let result = repo
            .create(Event::new(id, "Robo Race 2", 600, true).unwrap())
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }
}
