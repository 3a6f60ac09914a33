//! Event entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

const MAX_EVENT_ID_LENGTH: usize = 50;
const MAX_EVENT_NAME_LENGTH: usize = 100;

/// Event identifier - alphanumeric + hyphens, max 50 characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(String);

impl EventId {
    /// Create a new EventId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if id.is_empty() || id.len() > MAX_EVENT_ID_LENGTH {
            return Err(DomainError::invalid_id(format!(
                "Event ID must be 1-{} characters",
                MAX_EVENT_ID_LENGTH
            )));
        }

        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomainError::invalid_id(
                "Event ID can only contain alphanumeric characters and hyphens",
            ));
        }

        Ok(Self(id))
    }

    /// Mint a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EventId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event record consulted by the registration ledger
///
/// Owned by administrators; the ledger only reads it for existence checks
/// and the expected entry fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    id: EventId,
    /// Display name
    name: String,
    /// Entry fee in minor currency units
    entry_fee: i64,
    /// Whether registrations carry a team, or are individual entries
    team_event: bool,
    /// Smallest allowed roster, team events only
    #[serde(skip_serializing_if = "Option::is_none")]
    min_roster: Option<usize>,
    /// Largest allowed roster, team events only
    #[serde(skip_serializing_if = "Option::is_none")]
    max_roster: Option<usize>,
    /// Creation timestamp
    created_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event
    pub fn new(
        id: EventId,
        name: impl Into<String>,
        entry_fee: i64,
        team_event: bool,
    ) -> Result<Self, DomainError> {
        let name = name.into();

        if name.trim().is_empty() || name.len() > MAX_EVENT_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Event name must be 1-{} characters",
                MAX_EVENT_NAME_LENGTH
            )));
        }

        if entry_fee < 0 {
            return Err(DomainError::validation("Entry fee cannot be negative"));
        }

        Ok(Self {
            id,
            name,
            entry_fee,
            team_event,
            min_roster: None,
            max_roster: None,
            created_at: Utc::now(),
        })
    }

    /// Constrain roster size (builder pattern)
    pub fn with_roster_bounds(mut self, min: usize, max: usize) -> Result<Self, DomainError> {
        if min == 0 || min > max {
            return Err(DomainError::validation(
                "Roster bounds must satisfy 1 <= min <= max",
            ));
        }

        self.min_roster = Some(min);
        self.max_roster = Some(max);
        Ok(self)
    }

    // Getters

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_fee(&self) -> i64 {
        self.entry_fee
    }

    pub fn is_team_event(&self) -> bool {
        self.team_event
    }

    pub fn min_roster(&self) -> Option<usize> {
        self.min_roster
    }

    pub fn max_roster(&self) -> Option<usize> {
        self.max_roster
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Check a submitted roster size against the event's bounds
    pub fn roster_size_allowed(&self, size: usize) -> bool {
        if size == 0 {
            return false;
        }

        let min_ok = self.min_roster.is_none_or(|min| size >= min);
        let max_ok = self.max_roster.is_none_or(|max| size <= max);
        min_ok && max_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_validation() {
        assert!(EventId::new("robo-race").is_ok());
        assert!(EventId::new("").is_err());
        assert!(EventId::new("robo race").is_err());
    }

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventId::generate(), "Robo Race", 500, true).unwrap();
        assert_eq!(event.entry_fee(), 500);
        assert!(event.is_team_event());
    }

    #[test]
    fn test_negative_fee_rejected() {
        let result = Event::new(EventId::generate(), "Robo Race", -1, true);
        assert!(result.is_err());
    }

    #[test]
    fn test_roster_bounds() {
        let event = Event::new(EventId::generate(), "Robo Race", 500, true)
            .unwrap()
            .with_roster_bounds(2, 4)
            .unwrap();

        assert!(!event.roster_size_allowed(0));
        assert!(!event.roster_size_allowed(1));
        assert!(event.roster_size_allowed(2));
        assert!(event.roster_size_allowed(4));
        assert!(!event.roster_size_allowed(5));
    }

    #[test]
    fn test_unbounded_roster() {
        let event = Event::new(EventId::generate(), "Quiz", 100, true).unwrap();
        assert!(event.roster_size_allowed(1));
        assert!(event.roster_size_allowed(50));
        assert!(!event.roster_size_allowed(0));
    }
}
