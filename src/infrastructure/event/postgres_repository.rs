//! PostgreSQL event repository implementation

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sqlx::{PgPool, Row};

use crate::domain::event::{Event, EventId, EventRepository};
use crate::domain::DomainError;

/// PostgreSQL implementation of `EventRepository`
#[derive(Debug, Clone)]
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EVENT_COLUMNS: &str =
    "id, name, entry_fee, team_event, min_roster, max_roster, created_at";

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn get(&self, id: &EventId) -> Result<Option<Event>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get event: {}", e)))?;

        row.as_ref().map(row_to_event).transpose()
    }

    async fn create(&self, event: Event) -> Result<Event, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO events (id, name, entry_fee, team_event, min_roster, max_roster,
                                created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id().as_str())
        .bind(event.name())
        .bind(event.entry_fee())
        .bind(event.is_team_event())
        .bind(event.min_roster().map(|n| n as i32))
        .bind(event.max_roster().map(|n| n as i32))
        .bind(event.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict(format!("Event '{}' already exists", event.id()))
            } else {
                DomainError::storage(format!("Failed to create event: {}", e))
            }
        })?;

        Ok(event)
    }

    async fn list(&self) -> Result<Vec<Event>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM events ORDER BY name",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list events: {}", e)))?;

        rows.iter().map(row_to_event).collect()
    }
}

fn row_to_event(row: &sqlx::postgres::PgRow) -> Result<Event, DomainError> {
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

    let mut value = Map::new();
    value.insert("id".into(), json!(row.get::<String, _>("id")));
    value.insert("name".into(), json!(row.get::<String, _>("name")));
    value.insert("entry_fee".into(), json!(row.get::<i64, _>("entry_fee")));
    value.insert("team_event".into(), json!(row.get::<bool, _>("team_event")));
    value.insert("created_at".into(), json!(created_at));

    if let Some(min) = row.get::<Option<i32>, _>("min_roster") {
        value.insert("min_roster".into(), json!(min as usize));
    }

    if let Some(max) = row.get::<Option<i32>, _>("max_roster") {
        value.insert("max_roster".into(), json!(max as usize));
    }

    serde_json::from_value(Value::Object(value))
        .map_err(|e| DomainError::storage(format!("Invalid event row: {}", e)))
}
