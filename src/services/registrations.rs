//! Registration ledger service
//!
//! Seat allocation, QR check-in and cancellation. The capacity check and the
//! counter update run inside the store's atomic unit for the event.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::database::store::{CampusStore, RegistrationLookup, SeatUsage};
use crate::models::event::{effective_status, Event, TicketType};
use crate::models::registration::{AttendeeDetails, Registration, RegistrationStatus};
use crate::services::identity::Actor;
use crate::utils::errors::{CampusHubError, ErrorCategory, Result};
use crate::utils::helpers::{generate_token, is_valid_email};
use crate::utils::logging::{log_consistency_error, log_registration_action};

/// A registration as seen by its attendee
#[derive(Debug, Clone, Serialize)]
pub struct MyRegistration {
    #[serde(flatten)]
    pub registration: Registration,
    pub event_title: Option<String>,
    pub event_slug: Option<String>,
    pub event_start_date: Option<DateTime<Utc>>,
}

/// Admin listing row joined with its event
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRow {
    #[serde(flatten)]
    pub registration: Registration,
    pub event_title: String,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_category: Option<String>,
    pub ticket_type: Option<TicketType>,
    pub ticket_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationTotals {
    pub total: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub checked_in: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationListing {
    pub registrations: Vec<RegistrationRow>,
    pub stats: RegistrationTotals,
}

impl RegistrationTotals {
    pub fn tally(registrations: &[Registration]) -> Self {
        registrations.iter().fold(Self::default(), |mut totals, r| {
            totals.total += 1;
            match r.status {
                RegistrationStatus::Confirmed => totals.confirmed += 1,
                RegistrationStatus::Cancelled => totals.cancelled += 1,
            }
            if r.attended() {
                totals.checked_in += 1;
            }
            totals
        })
    }
}

/// Decide whether a seat may be taken, given usage observed under the lock
fn admit(event: &Event, usage: &SeatUsage, now: DateTime<Utc>) -> Result<()> {
    let status = effective_status(event, now);
    if !status.accepts_registrations() {
        return Err(CampusHubError::RegistrationClosed { status: status.to_string() });
    }
    if usage.already_registered {
        return Err(CampusHubError::AlreadyRegistered);
    }
    if usage.confirmed >= i64::from(event.capacity) {
        return Err(CampusHubError::CapacityReached { capacity: event.capacity });
    }
    Ok(())
}

/// Registration service for the seat ledger
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn CampusStore>,
    settings: Settings,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn CampusStore>, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub async fn register(&self, actor: &Actor, event_id: Uuid, attendee: AttendeeDetails) -> Result<Registration> {
        let user = actor.require_user()?;
        let name = attendee.name.trim().to_string();
        if name.is_empty() {
            return Err(CampusHubError::InvalidInput("Attendee name is required".to_string()));
        }
        let email = attendee.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(CampusHubError::InvalidInput(format!("Invalid email: {}", email)));
        }

        let user_id = user.id;
        let token = generate_token(self.settings.events.check_in_token_length);
        let now = Utc::now();

        let created = self
            .store
            .create_registration(
                event_id,
                user_id,
                Box::new(move |event: &Event, usage: &SeatUsage| {
                    admit(event, usage, now)?;
                    Ok(Registration {
                        id: Uuid::new_v4(),
                        event_id: event.id,
                        user_id,
                        attendee_name: name,
                        attendee_email: email,
                        check_in_token: token,
                        checked_in: false,
                        checked_in_at: None,
                        status: RegistrationStatus::Confirmed,
                        registered_at: now,
                    })
                }),
            )
            .await
            .map_err(|err| self.observe("register", err))?;

        let (registration, event) = created.ok_or(CampusHubError::EventNotFound { event_id })?;
        debug!(
            event_id = %event.id,
            registration_count = event.registration_count,
            capacity = event.capacity,
            "Seat allocated"
        );
        log_registration_action(registration.id, event_id, "register", user_id);
        Ok(registration)
    }

    /// Check in by the token scanned from the attendee's QR code
    pub async fn check_in_by_token(&self, actor: &Actor, token: &str) -> Result<Registration> {
        let user = actor.require_user()?;
        let token = token.trim();
        if token.is_empty() {
            return Err(CampusHubError::InvalidInput("Check-in token is required".to_string()));
        }
        let (user_id, is_admin) = (user.id, actor.permissions().is_admin);
        let now = Utc::now();

        let updated = self
            .store
            .update_registration(
                RegistrationLookup::Token(token.to_string()),
                Box::new(move |registration: &mut Registration, event: &Event| {
                    if !(is_admin || event.is_owned_by(user_id)) {
                        return Err(CampusHubError::PermissionDenied(
                            "Only the event organiser or an admin can check attendees in".to_string(),
                        ));
                    }
                    registration.check_in(now)
                }),
            )
            .await
            .map_err(|err| self.observe("check_in_by_token", err))?;

        let (registration, _) =
            updated.ok_or_else(|| CampusHubError::RegistrationNotFound("invalid check-in token".to_string()))?;
        log_registration_action(registration.id, registration.event_id, "check_in", user_id);
        Ok(registration)
    }

    pub async fn admin_check_in(&self, actor: &Actor, registration_id: Uuid) -> Result<Registration> {
        let admin = actor.require_admin()?;
        let admin_id = admin.id;
        let now = Utc::now();

        let updated = self
            .store
            .update_registration(
                RegistrationLookup::Id(registration_id),
                Box::new(move |registration: &mut Registration, _: &Event| registration.check_in(now)),
            )
            .await
            .map_err(|err| self.observe("admin_check_in", err))?;

        let (registration, _) = updated.ok_or_else(|| CampusHubError::RegistrationNotFound(registration_id.to_string()))?;
        log_registration_action(registration.id, registration.event_id, "admin_check_in", admin_id);
        Ok(registration)
    }

    /// Self-service cancellation by the attendee (admins may also use it)
    pub async fn cancel_registration(&self, actor: &Actor, registration_id: Uuid) -> Result<Registration> {
        let user = actor.require_user()?;
        let (user_id, is_admin) = (user.id, actor.permissions().is_admin);
        self.cancel(registration_id, user_id, "cancel", move |registration: &Registration| {
            if registration.user_id == user_id || is_admin {
                Ok(())
            } else {
                Err(CampusHubError::PermissionDenied(
                    "You can only cancel your own registrations".to_string(),
                ))
            }
        })
        .await
    }

    pub async fn admin_cancel_registration(&self, actor: &Actor, registration_id: Uuid) -> Result<Registration> {
        let admin = actor.require_admin()?;
        self.cancel(registration_id, admin.id, "admin_cancel", |_: &Registration| Ok(()))
            .await
    }

    async fn cancel<F>(&self, registration_id: Uuid, actor_id: Uuid, action: &'static str, authorize: F) -> Result<Registration>
    where
        F: FnOnce(&Registration) -> Result<()> + Send + 'static,
    {
        let updated = self
            .store
            .update_registration(
                RegistrationLookup::Id(registration_id),
                Box::new(move |registration: &mut Registration, _: &Event| {
                    authorize(registration)?;
                    registration.cancel()
                }),
            )
            .await
            .map_err(|err| self.observe(action, err))?;

        let (registration, event) =
            updated.ok_or_else(|| CampusHubError::RegistrationNotFound(registration_id.to_string()))?;
        debug!(event_id = %event.id, registration_count = event.registration_count, "Seat released");
        log_registration_action(registration.id, registration.event_id, action, actor_id);
        Ok(registration)
    }

    /// The caller's registrations, newest first, with event context
    pub async fn my_registrations(&self, actor: &Actor) -> Result<Vec<MyRegistration>> {
        let user = actor.require_user()?;
        let registrations = self.store.list_user_registrations(user.id).await?;
        let events = self.events_by_id().await?;

        Ok(registrations
            .into_iter()
            .map(|registration| {
                let event = events.get(&registration.event_id);
                MyRegistration {
                    event_title: event.map(|e| e.title.clone()),
                    event_slug: event.map(|e| e.slug.clone()),
                    event_start_date: event.map(|e| e.start_date),
                    registration,
                }
            })
            .collect())
    }

    pub async fn list_registrations(&self, actor: &Actor) -> Result<RegistrationListing> {
        actor.require_admin()?;
        let registrations = self.store.list_registrations().await?;
        let events = self.events_by_id().await?;
        let stats = RegistrationTotals::tally(&registrations);

        let registrations = registrations
            .into_iter()
            .map(|registration| {
                let event = events.get(&registration.event_id);
                RegistrationRow {
                    event_title: event.map_or_else(|| "Unknown Event".to_string(), |e| e.title.clone()),
                    event_start_date: event.map(|e| e.start_date),
                    event_category: event.map(|e| e.category.clone()),
                    ticket_type: event.map(|e| e.ticket_type),
                    ticket_price: event.and_then(|e| e.ticket_price),
                    registration,
                }
            })
            .collect();

        Ok(RegistrationListing { registrations, stats })
    }

    async fn events_by_id(&self) -> Result<HashMap<Uuid, Event>> {
        Ok(self.store.list_events().await?.into_iter().map(|e| (e.id, e)).collect())
    }

    fn observe(&self, operation: &str, err: CampusHubError) -> CampusHubError {
        if err.category() == ErrorCategory::Consistency {
            log_consistency_error(operation, &err);
        }
        err
    }
}
