//! CampusHub
//!
//! Backend for campus event management: an event lifecycle with admin
//! moderation, a capacity-checked registration ledger with QR check-in,
//! an append-only audit log, analytics and per-event compliance reports.
//! The same services run over Postgres or an in-memory store.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{CampusHubError, Result};

// Re-export main components for easy access
pub use database::{CampusStore, DatabaseService, MemoryStore};
pub use handlers::create_router;
pub use services::ServiceFactory;
pub use state::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
