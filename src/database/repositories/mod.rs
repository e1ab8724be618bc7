//! Database repositories module
//!
//! Read helpers run against the pool; writes take a connection so the
//! caller can group them into one transaction.

pub mod user;
pub mod event;
pub mod registration;
pub mod audit;

// Re-export repositories
pub use user::UserRepository;
pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use audit::AuditRepository;
