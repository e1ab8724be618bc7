//! Database module
//!
//! This module handles the storage seam, its in-memory and Postgres
//! implementations, connections and migrations

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

use std::sync::Arc;

use crate::config::{Settings, StorageBackend};
use crate::utils::errors::Result;

// Re-export commonly used database components
pub use connection::{DatabasePool, create_pool, run_migrations, health_check};
pub use memory::MemoryStore;
pub use repositories::{UserRepository, EventRepository, RegistrationRepository, AuditRepository};
pub use service::DatabaseService;
pub use store::{CampusStore, EventUpdateOutcome, PromoteOutcome, RegistrationLookup, SeatUsage};

/// Build the store selected by `storage.backend`
pub async fn connect_store(settings: &Settings) -> Result<Arc<dyn CampusStore>> {
    match settings.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = create_pool(&settings.database).await?;
            if settings.features.run_migrations {
                run_migrations(&pool).await?;
            }
            Ok(Arc::new(DatabaseService::new(pool)))
        }
    }
}
