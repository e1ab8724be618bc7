//! Error handling for CampusHub
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for CampusHub application
#[derive(Error, Debug)]
pub enum CampusHubError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    #[error("Registration not found: {0}")]
    RegistrationNotFound(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("A reason is required when cancelling an event")]
    ReasonRequired,

    #[error("End date must be after start date")]
    InvalidDateRange,

    #[error("Event is at capacity ({capacity} seats)")]
    CapacityReached { capacity: i32 },

    #[error("Registration is closed for {status} events")]
    RegistrationClosed { status: String },

    #[error("You are already registered for this event")]
    AlreadyRegistered,

    #[error("Already checked in")]
    AlreadyCheckedIn,

    #[error("Already cancelled")]
    AlreadyCancelled,

    #[error("Cannot {action} a cancelled registration")]
    RegistrationCancelled { action: &'static str },

    #[error("Cannot cancel a registration that has already checked in")]
    CheckedInRegistration,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Consistency violation: {0}")]
    Consistency(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Result type alias for CampusHub operations
pub type Result<T> = std::result::Result<T, CampusHubError>;

/// Failure taxonomy surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// No identity was presented
    Authentication,
    /// The actor's role lacks the required permission
    Authorization,
    /// Malformed input or a rule violation; nothing was written
    Validation,
    /// The referenced record does not exist
    NotFound,
    /// Storage-level atomicity violation; fatal
    Consistency,
    /// Storage, configuration and other infrastructure failures
    Internal,
}

impl CampusHubError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            CampusHubError::Database(_) => false,
            CampusHubError::Migration(_) => false,
            CampusHubError::Config(_) => false,
            CampusHubError::Unauthenticated => false,
            CampusHubError::PermissionDenied(_) => false,
            CampusHubError::UserNotFound(_) => false,
            CampusHubError::EventNotFound { .. } => false,
            CampusHubError::RegistrationNotFound(_) => false,
            CampusHubError::InvalidStateTransition { .. } => false,
            CampusHubError::ReasonRequired => false,
            CampusHubError::InvalidDateRange => false,
            CampusHubError::CapacityReached { .. } => false,
            CampusHubError::RegistrationClosed { .. } => false,
            CampusHubError::AlreadyRegistered => false,
            CampusHubError::AlreadyCheckedIn => false,
            CampusHubError::AlreadyCancelled => false,
            CampusHubError::RegistrationCancelled { .. } => false,
            CampusHubError::CheckedInRegistration => false,
            CampusHubError::Conflict(_) => true,
            CampusHubError::Consistency(_) => false,
            CampusHubError::Serialization(_) => false,
            CampusHubError::Io(_) => true,
            CampusHubError::InvalidInput(_) => false,
            CampusHubError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CampusHubError::Database(_) => ErrorSeverity::Critical,
            CampusHubError::Migration(_) => ErrorSeverity::Critical,
            CampusHubError::Config(_) => ErrorSeverity::Critical,
            CampusHubError::Consistency(_) => ErrorSeverity::Critical,
            CampusHubError::Unauthenticated => ErrorSeverity::Warning,
            CampusHubError::PermissionDenied(_) => ErrorSeverity::Warning,
            CampusHubError::Serialization(_)
            | CampusHubError::Io(_)
            | CampusHubError::ServiceUnavailable(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Info,
        }
    }

    /// Classify the error into the caller-facing taxonomy
    pub fn category(&self) -> ErrorCategory {
        match self {
            CampusHubError::Unauthenticated => ErrorCategory::Authentication,
            CampusHubError::PermissionDenied(_) => ErrorCategory::Authorization,
            CampusHubError::UserNotFound(_)
            | CampusHubError::EventNotFound { .. }
            | CampusHubError::RegistrationNotFound(_) => ErrorCategory::NotFound,
            CampusHubError::InvalidStateTransition { .. }
            | CampusHubError::ReasonRequired
            | CampusHubError::InvalidDateRange
            | CampusHubError::CapacityReached { .. }
            | CampusHubError::RegistrationClosed { .. }
            | CampusHubError::AlreadyRegistered
            | CampusHubError::AlreadyCheckedIn
            | CampusHubError::AlreadyCancelled
            | CampusHubError::RegistrationCancelled { .. }
            | CampusHubError::CheckedInRegistration
            | CampusHubError::Conflict(_)
            | CampusHubError::InvalidInput(_) => ErrorCategory::Validation,
            CampusHubError::Consistency(_) => ErrorCategory::Consistency,
            CampusHubError::Database(_)
            | CampusHubError::Migration(_)
            | CampusHubError::Config(_)
            | CampusHubError::Serialization(_)
            | CampusHubError::Io(_)
            | CampusHubError::ServiceUnavailable(_) => ErrorCategory::Internal,
        }
    }

    /// Short message safe to show to the caller.
    ///
    /// Storage and infrastructure details are replaced by a generic message.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::Internal | ErrorCategory::Consistency => {
                "Something went wrong, please try again later".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
