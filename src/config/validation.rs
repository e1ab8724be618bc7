//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::models::event::EventStatus;
use crate::utils::errors::{CampusHubError, Result};
use super::{Settings, StorageBackend};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    if settings.storage.backend == StorageBackend::Postgres {
        validate_database_config(&settings.database)?;
    }
    validate_logging_config(&settings.logging)?;
    validate_events_config(&settings.events)?;

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(CampusHubError::Config(
            "Server host is required".to_string()
        ));
    }

    if config.port == 0 {
        return Err(CampusHubError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CampusHubError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(CampusHubError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(CampusHubError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    if config.acquire_timeout_seconds == 0 {
        return Err(CampusHubError::Config(
            "Acquire timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CampusHubError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(CampusHubError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if config.file_prefix.is_empty() {
        return Err(CampusHubError::Config(
            "Log file prefix is required".to_string()
        ));
    }

    Ok(())
}

/// Validate event policy configuration
fn validate_events_config(config: &super::EventsConfig) -> Result<()> {
    if !matches!(config.initial_status, EventStatus::Pending | EventStatus::Draft) {
        return Err(CampusHubError::Config(
            format!("Initial event status must be pending or draft, got {}", config.initial_status)
        ));
    }

    if config.upcoming_window_days <= 0 {
        return Err(CampusHubError::Config(
            "Upcoming window must be at least one day".to_string()
        ));
    }

    if config.check_in_token_length < 16 {
        return Err(CampusHubError::Config(
            "Check-in token length must be at least 16 characters".to_string()
        ));
    }

    Ok(())
}
