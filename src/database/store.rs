//! Storage seam for the campus services
//!
//! Every mutating method is one atomic unit: the closure runs against the
//! current state while the backend holds its lock (the collection write lock
//! in memory, row locks inside a transaction in Postgres), and either all of
//! its effects are written or none are.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AuditLogEntry, Event, Registration, User};
use crate::utils::errors::Result;

/// Edits an event in place.
///
/// `Ok(None)` means nothing to write. `Ok(Some(entries))` writes the event
/// and appends `entries` to the audit log. `registration_count` is not
/// writable through this path.
pub type EventMutation = Box<dyn FnOnce(&mut Event) -> Result<Option<Vec<AuditLogEntry>>> + Send>;

/// Builds a new registration from the locked event and current seat usage
pub type RegistrationFactory = Box<dyn FnOnce(&Event, &SeatUsage) -> Result<Registration> + Send>;

/// Edits a registration in place, with its (locked) event for authorization
pub type RegistrationMutation = Box<dyn FnOnce(&mut Registration, &Event) -> Result<()> + Send>;

pub type UserMutation = Box<dyn FnOnce(&mut User) -> Result<()> + Send>;

/// Seat bookkeeping observed under the event lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatUsage {
    /// Confirmed registrations currently held for the event
    pub confirmed: i64,
    /// Whether the registering user already holds one of them
    pub already_registered: bool,
}

#[derive(Debug, Clone)]
pub enum RegistrationLookup {
    Id(Uuid),
    Token(String),
}

impl std::fmt::Display for RegistrationLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationLookup::Id(id) => write!(f, "{}", id),
            RegistrationLookup::Token(_) => write!(f, "check-in token"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EventUpdateOutcome {
    NotFound,
    /// The mutation decided there was nothing to write
    Unchanged(Event),
    Updated {
        event: Event,
        entries: Vec<AuditLogEntry>,
    },
}

#[derive(Debug, Clone)]
pub enum PromoteOutcome {
    Promoted(User),
    /// A superadmin already exists; nothing changed
    AlreadyExists,
    UserNotFound,
}

#[async_trait]
pub trait CampusStore: Send + Sync + 'static {
    // users

    async fn insert_user(&self, user: User) -> Result<User>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_token(&self, identity_token: &str) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    /// Returns `None` when the user does not exist
    async fn update_user(&self, id: Uuid, mutation: UserMutation) -> Result<Option<User>>;

    /// Promote the user with `email` to superadmin unless one already exists.
    /// Serialized against concurrent callers.
    async fn promote_first_superadmin(&self, email: &str, now: DateTime<Utc>) -> Result<PromoteOutcome>;

    // events

    /// Insert a new event and bump its organiser's created-events counter
    async fn insert_event(&self, event: Event) -> Result<Event>;

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>>;

    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    /// All events, newest first
    async fn list_events(&self) -> Result<Vec<Event>>;

    async fn update_event(&self, id: Uuid, mutation: EventMutation) -> Result<EventUpdateOutcome>;

    // registrations

    /// Create a confirmed registration and increment the event's counter.
    /// Returns `None` when the event does not exist.
    async fn create_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        factory: RegistrationFactory,
    ) -> Result<Option<(Registration, Event)>>;

    /// Apply `mutation`; a confirmed registration that ends up cancelled
    /// decrements the event's counter (never below zero).
    /// Returns `None` when the registration does not exist.
    async fn update_registration(
        &self,
        lookup: RegistrationLookup,
        mutation: RegistrationMutation,
    ) -> Result<Option<(Registration, Event)>>;

    async fn find_registration(&self, lookup: RegistrationLookup) -> Result<Option<Registration>>;

    /// All registrations, newest first
    async fn list_registrations(&self) -> Result<Vec<Registration>>;

    async fn list_event_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>>;

    async fn list_user_registrations(&self, user_id: Uuid) -> Result<Vec<Registration>>;

    // audit

    /// Entries for one event, newest first
    async fn list_audit_entries(&self, event_id: Uuid) -> Result<Vec<AuditLogEntry>>;

    async fn health_check(&self) -> Result<()>;
}
