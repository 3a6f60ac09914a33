use serde::Deserialize;

use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSection,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage backend selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// "memory" or "postgres"
    pub backend: String,
    pub database_url: String,
    pub max_connections: u32,
}

/// Payment gateway settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Shared secret for gateway signature verification
    pub webhook_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: "postgres://localhost/event_registration".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            webhook_secret: String::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Translate the storage section into a backend configuration
    pub fn storage_config(&self) -> Result<StorageConfig, config::ConfigError> {
        let backend = StorageType::parse(&self.storage.backend).ok_or_else(|| {
            config::ConfigError::Message(format!(
                "Unknown storage backend '{}'",
                self.storage.backend
            ))
        })?;

        Ok(match backend {
            StorageType::InMemory => StorageConfig::in_memory(),
            StorageType::Postgres => StorageConfig::Postgres(
                PostgresConfig::new(&self.storage.database_url)
                    .with_max_connections(self.storage.max_connections),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.backend, "memory");
        assert!(config.payment.webhook_secret.is_empty());
    }

    #[test]
    fn test_storage_config_translation() {
        let mut config = AppConfig::default();
        assert!(matches!(
            config.storage_config().unwrap(),
            StorageConfig::InMemory
        ));

        config.storage.backend = "postgres".to_string();
        assert!(matches!(
            config.storage_config().unwrap(),
            StorageConfig::Postgres(_)
        ));

        config.storage.backend = "sqlite".to_string();
        assert!(config.storage_config().is_err());
    }
}
