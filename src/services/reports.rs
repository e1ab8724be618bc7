//! Event report assembly
//!
//! Builds the data behind the downloadable per-event compliance report.
//! Rendering to a concrete document format sits behind [`ReportRenderer`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::database::store::CampusStore;
use crate::models::audit::{AuditAction, AuditLogEntry};
use crate::models::event::{effective_status, Event, EventStatus, LocationType, TicketType};
use crate::models::registration::Registration;
use crate::models::user::{Role, User};
use crate::services::analytics::EventStats;
use crate::services::identity::Actor;
use crate::utils::errors::{CampusHubError, Result};
use crate::utils::helpers::{format_duration, slugify};

const NOT_AVAILABLE: &str = "N/A";

/// Display label for a category slug
pub fn category_label(category: &str) -> String {
    let label = match category.to_lowercase().as_str() {
        "tech" => "Technology / Workshop",
        "cultural" => "Cultural Event",
        "sports" => "Sports Event",
        "academic" => "Academic / Seminar",
        "workshop" => "Workshop",
        "seminar" => "Seminar",
        "webinar" => "Webinar",
        "hackathon" => "Hackathon",
        "conference" => "Conference",
        "social" => "Social Event",
        "" => "General",
        _ => return category.to_string(),
    };
    label.to_string()
}

/// Sustainable Development Goals an event of this category contributes to
pub fn infer_sdgs(category: &str) -> Vec<&'static str> {
    match category.to_lowercase().as_str() {
        "tech" | "hackathon" => vec!["SDG 4: Quality Education", "SDG 9: Industry, Innovation and Infrastructure"],
        "academic" => vec!["SDG 4: Quality Education"],
        "seminar" | "webinar" | "conference" => {
            vec!["SDG 4: Quality Education", "SDG 17: Partnerships for the Goals"]
        }
        "workshop" => vec!["SDG 4: Quality Education", "SDG 8: Decent Work and Economic Growth"],
        "cultural" => vec!["SDG 4: Quality Education", "SDG 11: Sustainable Cities and Communities"],
        "sports" => vec!["SDG 3: Good Health and Well-Being", "SDG 4: Quality Education"],
        "social" => vec!["SDG 10: Reduced Inequalities", "SDG 11: Sustainable Cities and Communities"],
        _ => vec!["SDG 4: Quality Education"],
    }
}

/// Programme outcomes mapped from the category
pub fn infer_programme_outcomes(category: &str) -> Vec<&'static str> {
    match category.to_lowercase().as_str() {
        "tech" => vec![
            "PO1: Engineering Knowledge",
            "PO2: Problem Analysis",
            "PO5: Modern Tool Usage",
            "PO12: Life-long Learning",
        ],
        "academic" | "seminar" | "webinar" => vec!["PO1: Engineering Knowledge", "PO12: Life-long Learning"],
        "hackathon" => vec![
            "PO1: Engineering Knowledge",
            "PO2: Problem Analysis",
            "PO3: Design/Development of Solutions",
            "PO5: Modern Tool Usage",
        ],
        "workshop" => vec!["PO2: Problem Analysis", "PO5: Modern Tool Usage", "PO12: Life-long Learning"],
        "cultural" => vec!["PO8: Ethics", "PO9: Individual and Team Work", "PO10: Communication"],
        "sports" => vec!["PO9: Individual and Team Work", "PO10: Communication"],
        "social" => vec!["PO6: The Engineer and Society", "PO8: Ethics"],
        _ => vec!["PO12: Life-long Learning"],
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEvent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub timezone: String,
    pub location_type: LocationType,
    pub venue: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub capacity: i32,
    pub ticket_type: TicketType,
    pub ticket_price: f64,
    pub status: EventStatus,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportEvent {
    fn from_event(event: &Event, now: DateTime<Utc>) -> Self {
        let or_na = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(NOT_AVAILABLE)
                .to_string()
        };
        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            category: event.category.clone(),
            tags: event.tags.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
            timezone: event.timezone.clone(),
            location_type: event.location_type,
            venue: or_na(&event.venue),
            address: or_na(&event.address),
            city: event.city.clone(),
            state: event.state.clone().unwrap_or_default(),
            country: event.country.clone(),
            capacity: event.capacity,
            ticket_type: event.ticket_type,
            ticket_price: event.ticket_price.unwrap_or(0.0),
            status: effective_status(event, now),
            cover_image: event.cover_image.clone(),
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOrganiser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl ReportOrganiser {
    fn resolve(event: &Event, organiser: Option<&User>) -> Self {
        match organiser {
            Some(user) => Self {
                name: user.name.clone(),
                email: user.email.clone(),
                role: user.role,
            },
            None => Self {
                name: if event.organizer_name.is_empty() {
                    "Unknown".to_string()
                } else {
                    event.organizer_name.clone()
                },
                email: NOT_AVAILABLE.to_string(),
                role: Role::Organiser,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportAttendee {
    pub name: String,
    pub email: String,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
}

impl From<&Registration> for ReportAttendee {
    fn from(r: &Registration) -> Self {
        Self {
            name: r.attendee_name.clone(),
            email: r.attendee_email.clone(),
            checked_in: r.checked_in,
            checked_in_at: r.checked_in_at,
            registered_at: r.registered_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportAuditEntry {
    pub action: AuditAction,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub user_name: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl From<AuditLogEntry> for ReportAuditEntry {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            action: entry.action,
            field: entry.field.unwrap_or_default(),
            old_value: entry.old_value.unwrap_or_default(),
            new_value: entry.new_value.unwrap_or_default(),
            user_name: entry.user_name,
            reason: entry.reason.unwrap_or_default(),
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceSection {
    pub category_label: String,
    pub duration: String,
    pub sdgs: Vec<&'static str>,
    pub programme_outcomes: Vec<&'static str>,
}

impl ComplianceSection {
    fn for_event(event: &Event) -> Self {
        Self {
            category_label: category_label(&event.category),
            duration: format_duration(event.start_date, event.end_date),
            sdgs: infer_sdgs(&event.category),
            programme_outcomes: infer_programme_outcomes(&event.category),
        }
    }
}

/// Everything needed to render one event's report
#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    pub event: ReportEvent,
    pub organizer: ReportOrganiser,
    pub stats: EventStats,
    /// Confirmed registrations only
    pub attendees: Vec<ReportAttendee>,
    /// Newest first
    pub audit_log: Vec<ReportAuditEntry>,
    pub compliance: ComplianceSection,
    pub generated_at: DateTime<Utc>,
}

impl EventReport {
    pub fn assemble(
        event: &Event,
        organiser: Option<&User>,
        registrations: &[Registration],
        audit_log: Vec<AuditLogEntry>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            event: ReportEvent::from_event(event, now),
            organizer: ReportOrganiser::resolve(event, organiser),
            stats: EventStats::compute(event, registrations),
            attendees: registrations
                .iter()
                .filter(|r| r.event_id == event.id && r.is_confirmed())
                .map(ReportAttendee::from)
                .collect(),
            audit_log: audit_log.into_iter().map(ReportAuditEntry::from).collect(),
            compliance: ComplianceSection::for_event(event),
            generated_at: now,
        }
    }
}

/// Row in the report picker
#[derive(Debug, Clone, Serialize)]
pub struct ReportSelectorItem {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub start_date: DateTime<Utc>,
    pub status: EventStatus,
    pub organizer_name: String,
}

/// Turns an assembled report into a downloadable document
pub trait ReportRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    fn render(&self, report: &EventReport) -> Result<Vec<u8>>;

    fn file_name(&self, report: &EventReport) -> String {
        format!("{}-report.{}", slugify(&report.event.title), self.file_extension())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportRenderer;

impl ReportRenderer for JsonReportRenderer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, report: &EventReport) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(report)?)
    }
}

/// Report service for admin compliance exports
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn CampusStore>,
    renderer: Arc<dyn ReportRenderer>,
}

impl ReportService {
    pub fn new(store: Arc<dyn CampusStore>) -> Self {
        Self::with_renderer(store, Arc::new(JsonReportRenderer))
    }

    pub fn with_renderer(store: Arc<dyn CampusStore>, renderer: Arc<dyn ReportRenderer>) -> Self {
        Self { store, renderer }
    }

    pub async fn get_event_report_data(&self, actor: &Actor, event_id: Uuid) -> Result<EventReport> {
        actor.require_admin()?;
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(CampusHubError::EventNotFound { event_id })?;
        let organiser = self.store.find_user(event.organizer_id).await?;
        let registrations = self.store.list_event_registrations(event_id).await?;
        let audit_log = self.store.list_audit_entries(event_id).await?;

        Ok(EventReport::assemble(&event, organiser.as_ref(), &registrations, audit_log, Utc::now()))
    }

    /// All events, newest first, with their stored status
    pub async fn events_for_report_selector(&self, actor: &Actor) -> Result<Vec<ReportSelectorItem>> {
        actor.require_admin()?;
        Ok(self
            .store
            .list_events()
            .await?
            .into_iter()
            .map(|e| ReportSelectorItem {
                id: e.id,
                status: e.stored_status(),
                title: e.title,
                category: e.category,
                start_date: e.start_date,
                organizer_name: e.organizer_name,
            })
            .collect())
    }

    /// Assemble and render a report. Returns content type, file name and body.
    pub async fn render_event_report(&self, actor: &Actor, event_id: Uuid) -> Result<(&'static str, String, Vec<u8>)> {
        let report = self.get_event_report_data(actor, event_id).await?;
        let body = self.renderer.render(&report)?;
        let file_name = self.renderer.file_name(&report);
        if let Some(admin) = actor.user() {
            info!(admin_id = %admin.id, event_id = %event_id, bytes = body.len(), "Event report rendered");
        }
        Ok((self.renderer.content_type(), file_name, body))
    }
}
