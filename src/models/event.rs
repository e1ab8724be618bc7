//! Event model
//!
//! The event aggregate, its lifecycle states and the pure rules that govern
//! them. Nothing here touches storage.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::{CampusHubError, Result};

/// Stored lifecycle status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Pending,
    Approved,
    Live,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 6] = [
        EventStatus::Draft,
        EventStatus::Pending,
        EventStatus::Approved,
        EventStatus::Live,
        EventStatus::Completed,
        EventStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Live => "live",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses reachable from `self` through an administrative transition
    pub fn allowed_targets(&self) -> &'static [EventStatus] {
        match self {
            EventStatus::Draft => &[EventStatus::Pending, EventStatus::Approved, EventStatus::Cancelled],
            EventStatus::Pending => &[EventStatus::Draft, EventStatus::Approved, EventStatus::Cancelled],
            EventStatus::Approved => &[
                EventStatus::Pending,
                EventStatus::Live,
                EventStatus::Completed,
                EventStatus::Cancelled,
            ],
            EventStatus::Live => &[EventStatus::Completed, EventStatus::Cancelled],
            EventStatus::Completed | EventStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: EventStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Whether attendees may still register
    pub fn accepts_registrations(&self) -> bool {
        !matches!(self, EventStatus::Cancelled | EventStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_targets().is_empty()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = CampusHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(EventStatus::Draft),
            "pending" => Ok(EventStatus::Pending),
            "approved" => Ok(EventStatus::Approved),
            "live" => Ok(EventStatus::Live),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(CampusHubError::InvalidInput(format!("Unknown event status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    Free,
    Paid,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Free => "free",
            TicketType::Paid => "paid",
        }
    }
}

impl FromStr for TicketType {
    type Err = CampusHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "free" => Ok(TicketType::Free),
            "paid" => Ok(TicketType::Paid),
            other => Err(CampusHubError::InvalidInput(format!("Unknown ticket type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Physical,
    Online,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Physical => "physical",
            LocationType::Online => "online",
        }
    }
}

impl FromStr for LocationType {
    type Err = CampusHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "physical" => Ok(LocationType::Physical),
            "online" => Ok(LocationType::Online),
            other => Err(CampusHubError::InvalidInput(format!("Unknown location type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub organizer_id: Uuid,
    pub organizer_name: String,
    pub category: String,
    pub tags: Vec<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub timezone: String,
    pub location_type: LocationType,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub capacity: i32,
    pub ticket_type: TicketType,
    pub ticket_price: Option<f64>,
    pub registration_count: i32,
    /// Absent on rows that predate the lifecycle; reads as approved
    pub status: Option<EventStatus>,
    pub cover_image: Option<String>,
    pub theme_color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Persisted status with the backward-compatible default applied
    pub fn stored_status(&self) -> EventStatus {
        self.status.unwrap_or(EventStatus::Approved)
    }

    /// Price charged per checked-in attendee, or `None` for free events
    pub fn paid_price(&self) -> Option<f64> {
        match (self.ticket_type, self.ticket_price) {
            (TicketType::Paid, Some(price)) if price > 0.0 => Some(price),
            _ => None,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.organizer_id == user_id
    }
}

/// Status shown to users, derived from the stored status and the clock.
///
/// Only `approved` is time-dependent: inside `[start_date, end_date]` it reads
/// `live`, after `end_date` it reads `completed`. Never persist the result.
pub fn effective_status(event: &Event, now: DateTime<Utc>) -> EventStatus {
    let stored = event.stored_status();
    if stored != EventStatus::Approved {
        return stored;
    }

    if event.start_date <= now && now <= event.end_date {
        EventStatus::Live
    } else if now > event.end_date {
        EventStatus::Completed
    } else {
        EventStatus::Approved
    }
}

/// Check an administrative status change against the lifecycle.
///
/// Returns `Ok(false)` when the stored status already equals `target`
/// (nothing to write). Persisting the currently derived status is allowed.
pub fn check_transition(event: &Event, target: EventStatus, now: DateTime<Utc>) -> Result<bool> {
    let stored = event.stored_status();
    if stored == target {
        return Ok(false);
    }

    let effective = effective_status(event, now);
    if effective == target || effective.can_transition_to(target) {
        Ok(true)
    } else {
        Err(CampusHubError::InvalidStateTransition {
            from: effective.to_string(),
            to: target.to_string(),
        })
    }
}

/// A cancellation must carry a non-blank reason
pub fn require_reason(target: EventStatus, reason: Option<&str>) -> Result<()> {
    if target == EventStatus::Cancelled && reason.map_or(true, |r| r.trim().is_empty()) {
        return Err(CampusHubError::ReasonRequired);
    }
    Ok(())
}

/// Canonical string form used for audited timestamps
pub fn canonical_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub timezone: String,
    pub location_type: LocationType,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub capacity: i32,
    pub ticket_type: TicketType,
    pub ticket_price: Option<f64>,
    pub cover_image: Option<String>,
    pub theme_color: Option<String>,
    /// Save without submitting for review
    #[serde(default)]
    pub as_draft: bool,
}

/// Organiser-editable content fields. Protected fields are not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDetailsUpdate {
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub timezone: Option<String>,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub ticket_price: Option<f64>,
    pub cover_image: Option<String>,
    pub theme_color: Option<String>,
}

impl EventDetailsUpdate {
    pub fn apply(self, event: &mut Event) {
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(category) = self.category {
            event.category = category;
        }
        if let Some(tags) = self.tags {
            event.tags = tags;
        }
        if let Some(timezone) = self.timezone {
            event.timezone = timezone;
        }
        if let Some(venue) = self.venue {
            event.venue = Some(venue);
        }
        if let Some(address) = self.address {
            event.address = Some(address);
        }
        if let Some(city) = self.city {
            event.city = city;
        }
        if let Some(state) = self.state {
            event.state = Some(state);
        }
        if let Some(country) = self.country {
            event.country = country;
        }
        if let Some(price) = self.ticket_price {
            event.ticket_price = Some(price);
        }
        if let Some(cover_image) = self.cover_image {
            event.cover_image = Some(cover_image);
        }
        if let Some(theme_color) = self.theme_color {
            event.theme_color = Some(theme_color);
        }
    }
}

/// Privileged edit of protected fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtectedFieldChanges {
    pub title: Option<String>,
    pub capacity: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<EventStatus>,
}

/// Admin-listing filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub search: Option<String>,
    /// Matches the effective status; `all` or absent disables the filter
    pub status: Option<String>,
    pub category: Option<String>,
}
