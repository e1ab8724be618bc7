//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::event::EventStatus;

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub events: EventsConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: Option<u64>,
    pub max_lifetime_seconds: Option<u64>,
}

/// Which store backs the services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Storage backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    pub json: bool,
}

/// Event lifecycle policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    /// Status given to newly created events that are not saved as drafts
    pub initial_status: EventStatus,
    /// Window used by the dashboard "upcoming" list
    pub upcoming_window_days: i64,
    /// Length of the opaque check-in token handed to attendees
    pub check_in_token_length: usize,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    /// Development-only self-service role switch
    pub dev_role_switch: bool,
    pub run_migrations: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("CAMPUSHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load settings from an explicit TOML file, on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::from(path))
            .build()?;

        settings.try_deserialize()
    }

    /// Parse a complete settings document from a TOML string
    pub fn from_toml_str(raw: &str) -> Result<Self, crate::utils::errors::CampusHubError> {
        toml::from_str(raw).map_err(|e| crate::utils::errors::CampusHubError::Config(e.to_string()))
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::CampusHubError> {
        super::validation::validate_settings(self)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/campushub".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
                idle_timeout_seconds: Some(600),
                max_lifetime_seconds: Some(1800),
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "/var/log/campushub".to_string(),
                file_prefix: "campushub.log".to_string(),
                json: false,
            },
            events: EventsConfig {
                initial_status: EventStatus::Pending,
                upcoming_window_days: 7,
                check_in_token_length: 32,
            },
            features: FeaturesConfig {
                dev_role_switch: false,
                run_migrations: true,
            },
        }
    }
}
