//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the CampusHub application.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::utils::errors::{CampusHubError, Result};

/// Initialize logging based on configuration.
///
/// Writes to stdout and to a daily rolling file. `RUST_LOG` overrides the
/// configured level. Keep the returned guard alive for the life of the
/// process or buffered file output is lost.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (json_stdout, plain_stdout) = if config.json {
        (Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout)), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_writer(std::io::stdout)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_stdout)
        .with(plain_stdout)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| CampusHubError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log event lifecycle actions
pub fn log_event_action(event_id: Uuid, action: &str, actor_id: Uuid, details: Option<&str>) {
    info!(
        event_id = %event_id,
        action = action,
        actor_id = %actor_id,
        details = details,
        "Event action performed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: Uuid, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = %admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log registration ledger actions
pub fn log_registration_action(registration_id: Uuid, event_id: Uuid, action: &str, actor_id: Uuid) {
    info!(
        registration_id = %registration_id,
        event_id = %event_id,
        action = action,
        actor_id = %actor_id,
        "Registration action performed"
    );
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}

/// Log a broken storage invariant. Always at error level.
pub fn log_consistency_error(operation: &str, error: &CampusHubError) {
    error!(
        operation = operation,
        error = %error,
        severity = %error.severity(),
        "Consistency violation"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_returns_guard() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = LoggingConfig {
            level: "debug".to_string(),
            directory: dir.path().to_string_lossy().into_owned(),
            file_prefix: "campushub-test.log".to_string(),
            json: true,
        };

        // a global subscriber may already be installed by another test
        match init_logging(&config) {
            Ok(_guard) => log_event_action(Uuid::new_v4(), "test", Uuid::new_v4(), None),
            Err(err) => assert!(matches!(err, CampusHubError::Config(_))),
        }
    }
}
