//! Services module
//!
//! This module contains business logic services

pub mod analytics;
pub mod events;
pub mod identity;
pub mod registrations;
pub mod reports;

// Re-export commonly used services
pub use analytics::{AggregatedAnalytics, AnalyticsService, DashboardStats, EventAnalytics, EventStats};
pub use events::{AuditedChange, BulkUpdateResult, EventDetail, EventService, EventSummary, EventView};
pub use identity::{Actor, IdentityService};
pub use registrations::{MyRegistration, RegistrationListing, RegistrationRow, RegistrationService, RegistrationTotals};
pub use reports::{EventReport, JsonReportRenderer, ReportRenderer, ReportSelectorItem, ReportService};

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::store::CampusStore;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub identity_service: IdentityService,
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    pub analytics_service: AnalyticsService,
    pub report_service: ReportService,
    store: Arc<dyn CampusStore>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services sharing one store
    pub fn new(store: Arc<dyn CampusStore>, settings: Settings) -> Self {
        Self {
            identity_service: IdentityService::new(store.clone(), settings.clone()),
            event_service: EventService::new(store.clone(), settings.clone()),
            registration_service: RegistrationService::new(store.clone(), settings.clone()),
            analytics_service: AnalyticsService::new(store.clone(), settings),
            report_service: ReportService::new(store.clone()),
            store,
        }
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let store_healthy = match self.store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "Store health check failed");
                false
            }
        };

        ServiceHealthStatus { store_healthy }
    }
}

/// Health status for all services
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceHealthStatus {
    pub store_healthy: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.store_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.store_healthy {
            issues.push("Store connection failed".to_string());
        }
        issues
    }
}
