//! PostgreSQL pool configuration and schema bootstrap

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::DomainError;

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/event_registration".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Open a connection pool with these settings
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

/// Ensure the tables and uniqueness indexes exist.
///
/// The partial unique index on (team_id, event_id) is what makes the
/// checked-then-inserted registration creation race-free.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DomainError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id VARCHAR(50) PRIMARY KEY,
            external_id VARCHAR(255) NOT NULL UNIQUE,
            name VARCHAR(100) NOT NULL,
            email VARCHAR(255) NOT NULL,
            role VARCHAR(20) NOT NULL DEFAULT 'user',
            current_team_id VARCHAR(50),
            invitations TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id VARCHAR(50) PRIMARY KEY,
            name VARCHAR(100) NOT NULL UNIQUE,
            leader_id VARCHAR(50) NOT NULL,
            members TEXT[] NOT NULL,
            join_requests TEXT[] NOT NULL DEFAULT '{}',
            is_locked BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id VARCHAR(50) PRIMARY KEY,
            name VARCHAR(100) NOT NULL,
            entry_fee BIGINT NOT NULL,
            team_event BOOLEAN NOT NULL,
            min_roster INT,
            max_roster INT,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS registrations (
            id VARCHAR(50) PRIMARY KEY,
            team_id VARCHAR(50),
            event_id VARCHAR(50) NOT NULL,
            selected_members TEXT[] NOT NULL,
            payment_status VARCHAR(20) NOT NULL,
            amount_expected BIGINT NOT NULL,
            amount_paid BIGINT NOT NULL DEFAULT 0,
            razorpay_order_id VARCHAR(255),
            razorpay_payment_id VARCHAR(255),
            razorpay_signature VARCHAR(255),
            payment_attempts JSONB NOT NULL DEFAULT '[]',
            manual_verifications JSONB NOT NULL DEFAULT '[]',
            checked_in BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS registrations_team_event_idx
        ON registrations (team_id, event_id)
        WHERE team_id IS NOT NULL
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS registrations_order_idx
        ON registrations (razorpay_order_id)
        WHERE razorpay_order_id IS NOT NULL
        "#,
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to ensure schema: {}", e)))?;
    }

    Ok(())
}
