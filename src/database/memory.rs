//! In-memory store
//!
//! All collections live behind one `RwLock`; every mutation holds the write
//! lock for its whole read-modify-write, so each call is atomic with respect
//! to every other call.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{
    CampusStore, EventMutation, EventUpdateOutcome, PromoteOutcome, RegistrationFactory,
    RegistrationLookup, RegistrationMutation, SeatUsage, UserMutation,
};
use crate::models::{AuditLogEntry, Event, Registration, Role, User};
use crate::utils::errors::{CampusHubError, Result};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    registrations: HashMap<Uuid, Registration>,
    /// Insertion order
    audit: Vec<AuditLogEntry>,
}

impl Collections {
    fn registration_id(&self, lookup: &RegistrationLookup) -> Option<Uuid> {
        match lookup {
            RegistrationLookup::Id(id) => self.registrations.contains_key(id).then_some(*id),
            RegistrationLookup::Token(token) => self
                .registrations
                .values()
                .find(|r| &r.check_in_token == token)
                .map(|r| r.id),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, F: Fn(&T) -> DateTime<Utc>>(mut items: Vec<T>, key: F) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

#[async_trait]
impl CampusStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        let mut data = self.inner.write().await;
        if data.users.values().any(|u| u.identity_token == user.identity_token) {
            return Err(CampusHubError::Conflict("identity token already registered".to_string()));
        }
        data.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_token(&self, identity_token: &str) -> Result<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.values().find(|u| u.identity_token == identity_token).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.inner.read().await.users.values().cloned().collect();
        Ok(newest_first(users, |u: &User| u.created_at))
    }

    async fn update_user(&self, id: Uuid, mutation: UserMutation) -> Result<Option<User>> {
        let mut data = self.inner.write().await;
        let Some(current) = data.users.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        mutation(&mut updated)?;
        updated.id = id;
        data.users.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn promote_first_superadmin(&self, email: &str, now: DateTime<Utc>) -> Result<PromoteOutcome> {
        let mut data = self.inner.write().await;
        if data.users.values().any(|u| u.role == Role::SuperAdmin) {
            return Ok(PromoteOutcome::AlreadyExists);
        }

        let Some(user) = data.users.values_mut().find(|u| u.email == email) else {
            return Ok(PromoteOutcome::UserNotFound);
        };
        user.role = Role::SuperAdmin;
        user.updated_at = now;
        Ok(PromoteOutcome::Promoted(user.clone()))
    }

    async fn insert_event(&self, event: Event) -> Result<Event> {
        let mut data = self.inner.write().await;
        if data.events.values().any(|e| e.slug == event.slug) {
            return Err(CampusHubError::Conflict(format!("slug {} already taken", event.slug)));
        }
        if let Some(organiser) = data.users.get_mut(&event.organizer_id) {
            organiser.free_events_created += 1;
        }
        data.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.inner.read().await.events.get(&id).cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.inner.read().await.events.values().any(|e| e.slug == slug))
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let events = self.inner.read().await.events.values().cloned().collect();
        Ok(newest_first(events, |e: &Event| e.created_at))
    }

    async fn update_event(&self, id: Uuid, mutation: EventMutation) -> Result<EventUpdateOutcome> {
        let mut data = self.inner.write().await;
        let Some(current) = data.events.get(&id) else {
            return Ok(EventUpdateOutcome::NotFound);
        };

        let mut updated = current.clone();
        let Some(entries) = mutation(&mut updated)? else {
            return Ok(EventUpdateOutcome::Unchanged(current.clone()));
        };

        // owned by the registration path
        updated.id = current.id;
        updated.registration_count = current.registration_count;
        updated.created_at = current.created_at;

        data.events.insert(id, updated.clone());
        data.audit.extend(entries.iter().cloned());
        Ok(EventUpdateOutcome::Updated { event: updated, entries })
    }

    async fn create_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        factory: RegistrationFactory,
    ) -> Result<Option<(Registration, Event)>> {
        let mut data = self.inner.write().await;
        let Some(event) = data.events.get(&event_id) else {
            return Ok(None);
        };

        let confirmed: Vec<&Registration> = data
            .registrations
            .values()
            .filter(|r| r.event_id == event_id && r.is_confirmed())
            .collect();
        let usage = SeatUsage {
            confirmed: confirmed.len() as i64,
            already_registered: confirmed.iter().any(|r| r.user_id == user_id),
        };

        let registration = factory(event, &usage)?;
        if registration.event_id != event_id || registration.user_id != user_id {
            return Err(CampusHubError::Consistency(
                "registration built for a different event or user".to_string(),
            ));
        }

        let mut event = event.clone();
        event.registration_count += 1;
        data.events.insert(event_id, event.clone());
        data.registrations.insert(registration.id, registration.clone());
        Ok(Some((registration, event)))
    }

    async fn update_registration(
        &self,
        lookup: RegistrationLookup,
        mutation: RegistrationMutation,
    ) -> Result<Option<(Registration, Event)>> {
        let mut data = self.inner.write().await;
        let Some(id) = data.registration_id(&lookup) else {
            return Ok(None);
        };
        let Some(current) = data.registrations.get(&id).cloned() else {
            return Ok(None);
        };
        let Some(mut event) = data.events.get(&current.event_id).cloned() else {
            return Err(CampusHubError::Consistency(format!(
                "registration {} points at missing event {}",
                id, current.event_id
            )));
        };

        let mut updated = current.clone();
        mutation(&mut updated, &event)?;
        updated.id = current.id;
        updated.event_id = current.event_id;
        updated.user_id = current.user_id;

        if current.is_confirmed() && !updated.is_confirmed() {
            event.registration_count = (event.registration_count - 1).max(0);
            data.events.insert(event.id, event.clone());
        }
        data.registrations.insert(id, updated.clone());
        Ok(Some((updated, event)))
    }

    async fn find_registration(&self, lookup: RegistrationLookup) -> Result<Option<Registration>> {
        let data = self.inner.read().await;
        Ok(data
            .registration_id(&lookup)
            .and_then(|id| data.registrations.get(&id).cloned()))
    }

    async fn list_registrations(&self) -> Result<Vec<Registration>> {
        let registrations = self.inner.read().await.registrations.values().cloned().collect();
        Ok(newest_first(registrations, |r: &Registration| r.registered_at))
    }

    async fn list_event_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        let data = self.inner.read().await;
        let registrations = data
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        Ok(newest_first(registrations, |r: &Registration| r.registered_at))
    }

    async fn list_user_registrations(&self, user_id: Uuid) -> Result<Vec<Registration>> {
        let data = self.inner.read().await;
        let registrations = data
            .registrations
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(registrations, |r: &Registration| r.registered_at))
    }

    async fn list_audit_entries(&self, event_id: Uuid) -> Result<Vec<AuditLogEntry>> {
        let data = self.inner.read().await;
        let mut entries: Vec<AuditLogEntry> = data
            .audit
            .iter()
            .rev()
            .filter(|e| e.event_id == event_id)
            .cloned()
            .collect();
        // stable: equal timestamps keep newest-inserted first
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
