//! Application state shared across handlers

use std::sync::Arc;

use crate::config::Settings;
use crate::database::CampusStore;
use crate::services::ServiceFactory;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceFactory>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Arc<dyn CampusStore>, settings: Settings) -> Self {
        Self {
            services: Arc::new(ServiceFactory::new(store, settings.clone())),
            settings: Arc::new(settings),
        }
    }
}
