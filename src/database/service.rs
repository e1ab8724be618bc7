//! Database service layer
//!
//! Postgres implementation of [`CampusStore`]. Each mutating call runs in
//! its own transaction; rows are locked with `SELECT ... FOR UPDATE` before
//! any rule is evaluated against them. Dropping a transaction without
//! committing rolls it back, so every early return leaves no trace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::connection::{self, DatabasePool};
use crate::database::repositories::registration::CONFIRMED_REGISTRATION_INDEX;
use crate::database::repositories::{AuditRepository, EventRepository, RegistrationRepository, UserRepository};
use crate::database::store::{
    CampusStore, EventMutation, EventUpdateOutcome, PromoteOutcome, RegistrationFactory,
    RegistrationLookup, RegistrationMutation, UserMutation,
};
use crate::models::*;
use crate::utils::errors::{CampusHubError, Result};

/// Key for the transaction-scoped advisory lock around superadmin bootstrap
const SUPERADMIN_BOOTSTRAP_LOCK: i64 = 0x4341_4d50_5553;

#[derive(Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub audit: AuditRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            audit: AuditRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

fn violates(err: &CampusHubError, constraint: &str) -> bool {
    match err {
        CampusHubError::Database(sqlx::Error::Database(db)) => {
            db.is_unique_violation() && db.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[async_trait]
impl CampusStore for DatabaseService {
    async fn insert_user(&self, user: User) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        UserRepository::insert(&mut conn, &user).await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn find_user_by_token(&self, identity_token: &str) -> Result<Option<User>> {
        self.users.find_by_identity_token(identity_token).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find_by_email(email).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.users.list().await
    }

    async fn update_user(&self, id: Uuid, mutation: UserMutation) -> Result<Option<User>> {
        let mut tx = self.pool.begin().await?;
        let Some(mut user) = UserRepository::lock(&mut tx, id).await? else {
            return Ok(None);
        };

        mutation(&mut user)?;
        user.id = id;
        let user = UserRepository::save(&mut tx, &user).await?;
        tx.commit().await?;
        Ok(Some(user))
    }

    async fn promote_first_superadmin(&self, email: &str, now: DateTime<Utc>) -> Result<PromoteOutcome> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SUPERADMIN_BOOTSTRAP_LOCK)
            .execute(&mut *tx)
            .await?;

        if UserRepository::superadmin_exists(&mut tx).await? {
            return Ok(PromoteOutcome::AlreadyExists);
        }
        let Some(mut user) = UserRepository::lock_by_email(&mut tx, email).await? else {
            return Ok(PromoteOutcome::UserNotFound);
        };

        user.role = Role::SuperAdmin;
        user.updated_at = now;
        let user = UserRepository::save(&mut tx, &user).await?;
        tx.commit().await?;
        Ok(PromoteOutcome::Promoted(user))
    }

    async fn insert_event(&self, event: Event) -> Result<Event> {
        let mut tx = self.pool.begin().await?;
        let event = EventRepository::insert(&mut tx, &event).await?;
        UserRepository::increment_events_created(&mut tx, event.organizer_id).await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        self.events.find_by_id(id).await
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        self.events.slug_exists(slug).await
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        self.events.list().await
    }

    async fn update_event(&self, id: Uuid, mutation: EventMutation) -> Result<EventUpdateOutcome> {
        let mut tx = self.pool.begin().await?;
        let Some(current) = EventRepository::lock(&mut tx, id).await? else {
            return Ok(EventUpdateOutcome::NotFound);
        };

        let mut updated = current.clone();
        let Some(entries) = mutation(&mut updated)? else {
            return Ok(EventUpdateOutcome::Unchanged(current));
        };
        updated.id = current.id;

        let event = EventRepository::save(&mut tx, &updated).await?;
        for entry in &entries {
            AuditRepository::insert(&mut tx, entry).await?;
        }
        tx.commit().await?;

        Ok(EventUpdateOutcome::Updated { event, entries })
    }

    async fn create_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        factory: RegistrationFactory,
    ) -> Result<Option<(Registration, Event)>> {
        let mut tx = self.pool.begin().await?;
        let Some(event) = EventRepository::lock(&mut tx, event_id).await? else {
            return Ok(None);
        };

        let usage = RegistrationRepository::seat_usage(&mut tx, event_id, user_id).await?;
        let registration = factory(&event, &usage)?;
        if registration.event_id != event_id || registration.user_id != user_id {
            return Err(CampusHubError::Consistency(
                "registration built for a different event or user".to_string(),
            ));
        }

        let registration = match RegistrationRepository::insert(&mut tx, &registration).await {
            Ok(registration) => registration,
            Err(err) if violates(&err, CONFIRMED_REGISTRATION_INDEX) => {
                return Err(CampusHubError::AlreadyRegistered)
            }
            Err(err) => return Err(err),
        };
        let event = EventRepository::adjust_registration_count(&mut tx, event_id, 1).await?;
        tx.commit().await?;

        Ok(Some((registration, event)))
    }

    async fn update_registration(
        &self,
        lookup: RegistrationLookup,
        mutation: RegistrationMutation,
    ) -> Result<Option<(Registration, Event)>> {
        let mut tx = self.pool.begin().await?;

        // event row first, matching the lock order of create_registration
        let Some(event_id) = RegistrationRepository::event_id_for(&mut tx, &lookup).await? else {
            return Ok(None);
        };
        let Some(mut event) = EventRepository::lock(&mut tx, event_id).await? else {
            return Err(CampusHubError::Consistency(format!(
                "registration {} points at missing event {}",
                lookup, event_id
            )));
        };
        let Some(current) = RegistrationRepository::lock(&mut tx, &lookup).await? else {
            return Ok(None);
        };

        let mut updated = current.clone();
        mutation(&mut updated, &event)?;
        updated.id = current.id;

        let registration = RegistrationRepository::save(&mut tx, &updated).await?;
        if current.is_confirmed() && !registration.is_confirmed() {
            event = EventRepository::adjust_registration_count(&mut tx, event_id, -1).await?;
        }
        tx.commit().await?;

        Ok(Some((registration, event)))
    }

    async fn find_registration(&self, lookup: RegistrationLookup) -> Result<Option<Registration>> {
        self.registrations.find(&lookup).await
    }

    async fn list_registrations(&self) -> Result<Vec<Registration>> {
        self.registrations.list().await
    }

    async fn list_event_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        self.registrations.list_for_event(event_id).await
    }

    async fn list_user_registrations(&self, user_id: Uuid) -> Result<Vec<Registration>> {
        self.registrations.list_for_user(user_id).await
    }

    async fn list_audit_entries(&self, event_id: Uuid) -> Result<Vec<AuditLogEntry>> {
        self.audit.list_for_event(event_id).await
    }

    async fn health_check(&self) -> Result<()> {
        connection::health_check(&self.pool).await
    }
}
