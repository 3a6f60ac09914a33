//! Storage backends and the repository factory

pub mod postgres;

use std::sync::Arc;

use crate::domain::{
    DomainError, EventRepository, ProfileRepository, RegistrationRepository, TeamRepository,
};
use crate::infrastructure::event::{InMemoryEventRepository, PostgresEventRepository};
use crate::infrastructure::profile::{InMemoryProfileRepository, PostgresProfileRepository};
use crate::infrastructure::registration::{
    InMemoryRegistrationRepository, PostgresRegistrationRepository,
};
use crate::infrastructure::team::{InMemoryTeamRepository, PostgresTeamRepository};

pub use postgres::{ensure_schema, PostgresConfig};

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Bundle of repository handles, constructed once at process start and
/// passed by reference into each service
#[derive(Debug, Clone)]
pub struct Repositories {
    pub profiles: Arc<dyn ProfileRepository>,
    pub teams: Arc<dyn TeamRepository>,
    pub events: Arc<dyn EventRepository>,
    pub registrations: Arc<dyn RegistrationRepository>,
}

impl Repositories {
    /// Repositories backed by in-memory stores
    pub fn in_memory() -> Self {
        Self {
            profiles: Arc::new(InMemoryProfileRepository::new()),
            teams: Arc::new(InMemoryTeamRepository::new()),
            events: Arc::new(InMemoryEventRepository::new()),
            registrations: Arc::new(InMemoryRegistrationRepository::new()),
        }
    }

    /// Repositories backed by the configured store
    pub async fn connect(config: &StorageConfig) -> Result<Self, DomainError> {
        match config {
            StorageConfig::InMemory => Ok(Self::in_memory()),
            StorageConfig::Postgres(pg_config) => {
                let pool = pg_config.connect().await?;
                ensure_schema(&pool).await?;

                Ok(Self {
                    profiles: Arc::new(PostgresProfileRepository::new(pool.clone())),
                    teams: Arc::new(PostgresTeamRepository::new(pool.clone())),
                    events: Arc::new(PostgresEventRepository::new(pool.clone())),
                    registrations: Arc::new(PostgresRegistrationRepository::new(pool)),
                })
            }
        }
    }
}
