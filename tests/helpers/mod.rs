//! Test helpers module
//!
//! Builds a service stack over the in-memory store and seeds users and
//! events directly through the store.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use uuid::Uuid;

use CampusHub::config::{Settings, StorageBackend};
use CampusHub::database::{CampusStore, MemoryStore};
use CampusHub::models::{AttendeeDetails, Event, EventStatus, LocationType, Role, TicketType, User};
use CampusHub::services::{Actor, ServiceFactory};

/// Settings suitable for tests: memory backend, dev role switch on
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.storage.backend = StorageBackend::Memory;
    settings.features.dev_role_switch = true;
    settings.features.run_migrations = false;
    settings.logging.directory = std::env::temp_dir().to_string_lossy().into_owned();
    settings
}

/// Unified test context over a fresh store
pub struct TestContext {
    pub store: Arc<dyn CampusStore>,
    pub services: ServiceFactory,
    pub settings: Settings,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn CampusStore>) -> Self {
        let settings = test_settings();
        let services = ServiceFactory::new(store.clone(), settings.clone());
        Self { store, services, settings }
    }

    /// Insert a user with `role` and return it as an actor
    pub async fn actor(&self, role: Role) -> Actor {
        let user = self.store.insert_user(test_user(role)).await.expect("insert user");
        Actor::for_user(user)
    }

    /// Insert an event directly, bypassing creation rules
    pub async fn event(&self, organiser: &Actor, status: Option<EventStatus>, capacity: i32) -> Event {
        let user = organiser.user().expect("organiser has a user record");
        let mut event = test_event(user, status, Utc::now());
        event.capacity = capacity;
        self.store.insert_event(event).await.expect("insert event")
    }

    pub async fn reload(&self, event_id: Uuid) -> Event {
        self.store
            .find_event(event_id)
            .await
            .expect("find event")
            .expect("event exists")
    }
}

pub fn test_user(role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        identity_token: format!("token-{}", Uuid::new_v4()),
        email: SafeEmail().fake::<String>().to_lowercase(),
        name: Name().fake(),
        image_url: None,
        role,
        onboarding_completed: true,
        location: None,
        interests: Vec::new(),
        free_events_created: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_event(organiser: &User, status: Option<EventStatus>, now: DateTime<Utc>) -> Event {
    let id = Uuid::new_v4();
    Event {
        id,
        title: "Intro to Rust".to_string(),
        description: "Hands-on systems programming session".to_string(),
        slug: format!("intro-to-rust-{}", id.simple()),
        organizer_id: organiser.id,
        organizer_name: organiser.name.clone(),
        category: "tech".to_string(),
        tags: vec!["rust".to_string()],
        start_date: now + Duration::days(2),
        end_date: now + Duration::days(2) + Duration::hours(3),
        timezone: "Asia/Kolkata".to_string(),
        location_type: LocationType::Physical,
        venue: Some("Seminar Hall".to_string()),
        address: None,
        city: "Bengaluru".to_string(),
        state: Some("Karnataka".to_string()),
        country: "India".to_string(),
        capacity: 50,
        ticket_type: TicketType::Free,
        ticket_price: None,
        registration_count: 0,
        status,
        cover_image: None,
        theme_color: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn attendee() -> AttendeeDetails {
    AttendeeDetails {
        name: Name().fake(),
        email: SafeEmail().fake(),
    }
}
