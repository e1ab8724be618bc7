//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod event;
pub mod registration;
pub mod audit;

// Re-export commonly used models
pub use user::{User, Role, Permissions, UserLocation, SignInRequest, OnboardingRequest};
pub use event::{
    Event, EventStatus, TicketType, LocationType, CreateEventRequest, EventDetailsUpdate,
    ProtectedFieldChanges, EventFilter, effective_status,
};
pub use registration::{Registration, RegistrationStatus, AttendeeDetails};
pub use audit::{AuditLogEntry, AuditAction, AuditActor};
