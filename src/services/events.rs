//! Event service implementation
//!
//! Creation, content edits and the administrative status lifecycle. Every
//! mutation runs as one store unit together with its audit entries.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::database::store::{CampusStore, EventUpdateOutcome};
use crate::models::audit::{AuditAction, AuditActor, AuditLogEntry};
use crate::models::event::{
    canonical_timestamp, check_transition, effective_status, require_reason, CreateEventRequest, Event,
    EventDetailsUpdate, EventFilter, EventStatus, ProtectedFieldChanges, TicketType,
};
use crate::models::registration::Registration;
use crate::services::analytics::EventStats;
use crate::services::identity::Actor;
use crate::utils::errors::{CampusHubError, Result};
use crate::utils::helpers::{non_blank, unique_slug};
use crate::utils::logging::{log_admin_action, log_event_action};

const SLUG_ATTEMPTS: usize = 5;

/// Statuses accepted by bulk moderation
pub const BULK_TARGETS: [EventStatus; 3] = [EventStatus::Approved, EventStatus::Cancelled, EventStatus::Pending];

/// An event together with the status users see right now
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub effective_status: EventStatus,
}

impl EventView {
    pub fn at(event: Event, now: DateTime<Utc>) -> Self {
        let effective_status = effective_status(&event, now);
        Self { event, effective_status }
    }
}

/// Result of an audited mutation
#[derive(Debug, Clone, Serialize)]
pub struct AuditedChange {
    pub event: Event,
    pub entries: Vec<AuditLogEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkUpdateResult {
    pub updated: usize,
}

/// Admin listing row
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub effective_status: EventStatus,
    pub total_registrations: usize,
    pub total_checked_in: usize,
    pub revenue: f64,
}

/// Admin detail page
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub effective_status: EventStatus,
    pub stats: EventStats,
    /// Confirmed registrations only
    pub registrations: Vec<Registration>,
    pub audit_log: Vec<AuditLogEntry>,
}

/// Event service for lifecycle and moderation
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn CampusStore>,
    settings: Settings,
}

fn validate_schedule(event: &Event) -> Result<()> {
    if event.title.trim().is_empty() {
        return Err(CampusHubError::InvalidInput("Title is required".to_string()));
    }
    if event.capacity <= 0 {
        return Err(CampusHubError::InvalidInput("Capacity must be greater than 0".to_string()));
    }
    if event.end_date < event.start_date {
        return Err(CampusHubError::InvalidDateRange);
    }
    Ok(())
}

fn validate_pricing(ticket_type: TicketType, ticket_price: Option<f64>) -> Result<()> {
    if ticket_price.map_or(false, |p| !p.is_finite() || p < 0.0) {
        return Err(CampusHubError::InvalidInput("Ticket price cannot be negative".to_string()));
    }
    if ticket_type == TicketType::Paid && !ticket_price.map_or(false, |p| p > 0.0) {
        return Err(CampusHubError::InvalidInput("Paid events need a positive ticket price".to_string()));
    }
    Ok(())
}

fn status_entry(
    event: &Event,
    actor: &AuditActor,
    action: AuditAction,
    target: EventStatus,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> AuditLogEntry {
    AuditLogEntry::new(event.id, actor, action, now)
        .field("status")
        .values(event.stored_status().as_str(), target.as_str())
        .reason(reason)
}

impl EventService {
    pub fn new(store: Arc<dyn CampusStore>, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub async fn create_event(&self, actor: &Actor, request: CreateEventRequest) -> Result<Event> {
        let organiser = actor.require_event_creator()?;
        validate_pricing(request.ticket_type, request.ticket_price)?;

        let slug = self.allocate_slug(&request.title).await?;
        let now = Utc::now();
        let status = if request.as_draft {
            EventStatus::Draft
        } else {
            self.settings.events.initial_status
        };

        let event = Event {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description,
            slug,
            organizer_id: organiser.id,
            organizer_name: organiser.name.clone(),
            category: request.category,
            tags: request.tags,
            start_date: request.start_date,
            end_date: request.end_date,
            timezone: request.timezone,
            location_type: request.location_type,
            venue: request.venue,
            address: request.address,
            city: request.city,
            state: request.state,
            country: request.country,
            capacity: request.capacity,
            ticket_type: request.ticket_type,
            ticket_price: match request.ticket_type {
                TicketType::Paid => request.ticket_price,
                TicketType::Free => None,
            },
            registration_count: 0,
            status: Some(status),
            cover_image: request.cover_image,
            theme_color: request.theme_color,
            created_at: now,
            updated_at: now,
        };
        validate_schedule(&event)?;

        let event = self.store.insert_event(event).await?;
        log_event_action(event.id, "create", organiser.id, Some(event.stored_status().as_str()));
        Ok(event)
    }

    async fn allocate_slug(&self, title: &str) -> Result<String> {
        for _ in 0..SLUG_ATTEMPTS {
            let slug = unique_slug(title);
            if !self.store.slug_exists(&slug).await? {
                return Ok(slug);
            }
            debug!(slug = %slug, "Slug collision, retrying");
        }
        Err(CampusHubError::Conflict("Could not allocate a unique slug".to_string()))
    }

    pub async fn get_event(&self, event_id: Uuid) -> Result<EventView> {
        let event = self.find(event_id).await?;
        Ok(EventView::at(event, Utc::now()))
    }

    async fn find(&self, event_id: Uuid) -> Result<Event> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or(CampusHubError::EventNotFound { event_id })
    }

    /// Owner or admin edit of non-protected content fields. Not audited.
    pub async fn update_event_details(&self, actor: &Actor, event_id: Uuid, details: EventDetailsUpdate) -> Result<Event> {
        let user = actor.require_user()?;
        let (user_id, is_admin) = (user.id, actor.permissions().is_admin);
        let now = Utc::now();

        let outcome = self
            .store
            .update_event(
                event_id,
                Box::new(move |event: &mut Event| {
                    if !(event.is_owned_by(user_id) || is_admin) {
                        return Err(CampusHubError::PermissionDenied(
                            "Only the organiser or an admin can edit this event".to_string(),
                        ));
                    }
                    if event.stored_status() == EventStatus::Cancelled {
                        return Err(CampusHubError::InvalidInput("Cancelled events cannot be edited".to_string()));
                    }
                    details.apply(event);
                    validate_pricing(event.ticket_type, event.ticket_price)?;
                    event.updated_at = now;
                    Ok(Some(Vec::new()))
                }),
            )
            .await?;

        match outcome {
            EventUpdateOutcome::NotFound => Err(CampusHubError::EventNotFound { event_id }),
            EventUpdateOutcome::Unchanged(event) | EventUpdateOutcome::Updated { event, .. } => {
                log_event_action(event.id, "update_details", user_id, None);
                Ok(event)
            }
        }
    }

    /// Owner moves a draft into the review queue
    pub async fn submit_for_review(&self, actor: &Actor, event_id: Uuid) -> Result<AuditedChange> {
        let audit_actor = actor.audit_actor()?;
        let now = Utc::now();

        let outcome = self
            .store
            .update_event(
                event_id,
                Box::new(move |event: &mut Event| {
                    if !event.is_owned_by(audit_actor.id) {
                        return Err(CampusHubError::PermissionDenied(
                            "Only the organiser can submit this event".to_string(),
                        ));
                    }
                    if event.stored_status() != EventStatus::Draft {
                        return Err(CampusHubError::InvalidStateTransition {
                            from: effective_status(event, now).to_string(),
                            to: EventStatus::Pending.to_string(),
                        });
                    }
                    let entry = status_entry(event, &audit_actor, AuditAction::StatusChange, EventStatus::Pending, None, now);
                    event.status = Some(EventStatus::Pending);
                    event.updated_at = now;
                    Ok(Some(vec![entry]))
                }),
            )
            .await?;

        self.finish(event_id, outcome, "submit_for_review")
    }

    pub async fn update_event_status(
        &self,
        actor: &Actor,
        event_id: Uuid,
        status: EventStatus,
        reason: Option<&str>,
    ) -> Result<AuditedChange> {
        actor.require_admin()?;
        let audit_actor = actor.audit_actor()?;
        let reason = non_blank(reason).map(str::to_string);
        require_reason(status, reason.as_deref())?;
        let now = Utc::now();

        let outcome = self
            .store
            .update_event(
                event_id,
                Box::new(move |event: &mut Event| {
                    if !check_transition(event, status, now)? {
                        return Ok(None);
                    }
                    let entry = status_entry(event, &audit_actor, AuditAction::StatusChange, status, reason.as_deref(), now);
                    event.status = Some(status);
                    event.updated_at = now;
                    Ok(Some(vec![entry]))
                }),
            )
            .await?;

        let change = self.finish(event_id, outcome, "status_change")?;
        if let Some(entry) = change.entries.first() {
            log_admin_action(entry.user_id, "update_event_status", Some(&event_id.to_string()), Some(status.as_str()));
        }
        Ok(change)
    }

    /// Privileged override of protected fields. Bypasses the transition
    /// table; one `date_edit` entry per field that actually changed.
    pub async fn super_admin_edit_event(
        &self,
        actor: &Actor,
        event_id: Uuid,
        changes: ProtectedFieldChanges,
        reason: Option<&str>,
    ) -> Result<AuditedChange> {
        actor.require_super_admin()?;
        let audit_actor = actor.audit_actor()?;
        let reason = non_blank(reason).map(str::to_string);
        let now = Utc::now();

        let outcome = self
            .store
            .update_event(
                event_id,
                Box::new(move |event: &mut Event| {
                    let mut entries = Vec::new();
                    let mut record = |field: &str, old: String, new: String| {
                        entries.push(
                            AuditLogEntry::new(event_id, &audit_actor, AuditAction::DateEdit, now)
                                .field(field)
                                .values(old, new)
                                .reason(reason.as_deref()),
                        );
                    };

                    if let Some(title) = changes.title.map(|t| t.trim().to_string()) {
                        if title != event.title {
                            record("title", event.title.clone(), title.clone());
                            event.title = title;
                        }
                    }
                    if let Some(capacity) = changes.capacity {
                        if capacity != event.capacity {
                            record("capacity", event.capacity.to_string(), capacity.to_string());
                            event.capacity = capacity;
                        }
                    }
                    if let Some(start_date) = changes.start_date {
                        if start_date != event.start_date {
                            record("startDate", canonical_timestamp(event.start_date), canonical_timestamp(start_date));
                            event.start_date = start_date;
                        }
                    }
                    if let Some(end_date) = changes.end_date {
                        if end_date != event.end_date {
                            record("endDate", canonical_timestamp(event.end_date), canonical_timestamp(end_date));
                            event.end_date = end_date;
                        }
                    }
                    let mut new_status = None;
                    if let Some(status) = changes.status {
                        if status != event.stored_status() {
                            record("status", event.stored_status().to_string(), status.to_string());
                            event.status = Some(status);
                            new_status = Some(status);
                        }
                    }

                    validate_schedule(event)?;
                    if let Some(status) = new_status {
                        require_reason(status, reason.as_deref())?;
                    }
                    if entries.is_empty() {
                        return Ok(None);
                    }
                    event.updated_at = now;
                    Ok(Some(entries))
                }),
            )
            .await?;

        let change = self.finish(event_id, outcome, "super_admin_edit")?;
        if let Some(entry) = change.entries.first() {
            log_admin_action(
                entry.user_id,
                "super_admin_edit_event",
                Some(&event_id.to_string()),
                Some(&format!("{} field(s) changed", change.entries.len())),
            );
        }
        Ok(change)
    }

    /// Moderate several events at once. Each id is its own atomic unit;
    /// unknown ids, illegal transitions and no-ops are skipped.
    pub async fn bulk_update_event_status(
        &self,
        actor: &Actor,
        event_ids: &[Uuid],
        status: EventStatus,
        reason: Option<&str>,
    ) -> Result<BulkUpdateResult> {
        actor.require_admin()?;
        let audit_actor = actor.audit_actor()?;
        if !BULK_TARGETS.contains(&status) {
            return Err(CampusHubError::InvalidInput(format!(
                "Bulk status must be approved, cancelled or pending, got {}",
                status
            )));
        }
        let reason = non_blank(reason).map(str::to_string);
        require_reason(status, reason.as_deref())?;

        let mut updated = 0;
        for &event_id in event_ids {
            let now = Utc::now();
            let audit_actor = audit_actor.clone();
            let reason = reason.clone();
            let outcome = self
                .store
                .update_event(
                    event_id,
                    Box::new(move |event: &mut Event| {
                        if !check_transition(event, status, now)? {
                            return Ok(None);
                        }
                        let entry = status_entry(event, &audit_actor, AuditAction::BulkStatusChange, status, reason.as_deref(), now);
                        event.status = Some(status);
                        event.updated_at = now;
                        Ok(Some(vec![entry]))
                    }),
                )
                .await;

            match outcome {
                Ok(EventUpdateOutcome::Updated { .. }) => updated += 1,
                Ok(EventUpdateOutcome::Unchanged(_)) => {
                    warn!(event_id = %event_id, status = %status, "Bulk update skipped: already at target status");
                }
                Ok(EventUpdateOutcome::NotFound) => {
                    warn!(event_id = %event_id, "Bulk update skipped: event not found");
                }
                Err(err @ CampusHubError::InvalidStateTransition { .. }) => {
                    warn!(event_id = %event_id, error = %err, "Bulk update skipped: illegal transition");
                }
                Err(err) => return Err(err),
            }
        }

        log_admin_action(
            audit_actor.id,
            "bulk_update_event_status",
            None,
            Some(&format!("{} of {} event(s) set to {}", updated, event_ids.len(), status)),
        );
        Ok(BulkUpdateResult { updated })
    }

    pub async fn list_events(&self, actor: &Actor, filter: EventFilter) -> Result<Vec<EventSummary>> {
        actor.require_admin()?;
        let now = Utc::now();

        let search = non_blank(filter.search.as_deref()).map(str::to_lowercase);
        let status = match non_blank(filter.status.as_deref()) {
            None | Some("all") => None,
            Some(raw) => Some(raw.parse::<EventStatus>()?),
        };
        let category = non_blank(filter.category.as_deref())
            .filter(|c| *c != "all")
            .map(str::to_string);

        let registrations = self.store.list_registrations().await?;
        let mut by_event: HashMap<Uuid, Vec<Registration>> = HashMap::new();
        for registration in registrations {
            by_event.entry(registration.event_id).or_default().push(registration);
        }

        let summaries = self
            .store
            .list_events()
            .await?
            .into_iter()
            .filter(|e| search.as_ref().map_or(true, |s| e.title.to_lowercase().contains(s)))
            .filter(|e| category.as_ref().map_or(true, |c| &e.category == c))
            .map(|event| {
                let stats = EventStats::compute(&event, by_event.get(&event.id).map(Vec::as_slice).unwrap_or(&[]));
                EventSummary {
                    effective_status: effective_status(&event, now),
                    total_registrations: stats.total_registrations,
                    total_checked_in: stats.total_checked_in,
                    revenue: stats.revenue,
                    event,
                }
            })
            .filter(|s| status.map_or(true, |st| s.effective_status == st))
            .collect();

        Ok(summaries)
    }

    pub async fn get_event_with_stats(&self, actor: &Actor, event_id: Uuid) -> Result<EventDetail> {
        actor.require_admin()?;
        let event = self.find(event_id).await?;
        let registrations = self.store.list_event_registrations(event_id).await?;
        let audit_log = self.store.list_audit_entries(event_id).await?;

        Ok(EventDetail {
            effective_status: effective_status(&event, Utc::now()),
            stats: EventStats::compute(&event, &registrations),
            registrations: registrations.into_iter().filter(Registration::is_confirmed).collect(),
            audit_log,
            event,
        })
    }

    /// Audit trail, newest first
    pub async fn get_event_audit_log(&self, actor: &Actor, event_id: Uuid) -> Result<Vec<AuditLogEntry>> {
        actor.require_admin()?;
        self.find(event_id).await?;
        self.store.list_audit_entries(event_id).await
    }

    fn finish(&self, event_id: Uuid, outcome: EventUpdateOutcome, action: &str) -> Result<AuditedChange> {
        match outcome {
            EventUpdateOutcome::NotFound => Err(CampusHubError::EventNotFound { event_id }),
            EventUpdateOutcome::Unchanged(event) => {
                debug!(event_id = %event_id, action = action, "Nothing to change");
                Ok(AuditedChange { event, entries: Vec::new() })
            }
            EventUpdateOutcome::Updated { event, entries } => {
                for entry in &entries {
                    info!(
                        event_id = %event_id,
                        action = %entry.action,
                        field = entry.field.as_deref(),
                        old_value = entry.old_value.as_deref(),
                        new_value = entry.new_value.as_deref(),
                        "Audited event change"
                    );
                }
                if let Some(entry) = entries.first() {
                    log_event_action(event_id, action, entry.user_id, entry.reason.as_deref());
                }
                Ok(AuditedChange { event, entries })
            }
        }
    }
}
