//! Event repository implementation

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::event::{Event, EventStatus, LocationType, TicketType};
use crate::utils::errors::{CampusHubError, Result};

#[derive(Debug, FromRow)]
pub struct EventRow {
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
    pub location_type: String,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub capacity: i32,
    pub ticket_type: String,
    pub ticket_price: Option<f64>,
    pub registration_count: i32,
    pub status: Option<String>,
    pub cover_image: Option<String>,
    pub theme_color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = CampusHubError;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(Event {
            id: row.id,
            title: row.title,
            description: row.description,
            slug: row.slug,
            organizer_id: row.organizer_id,
            organizer_name: row.organizer_name,
            category: row.category,
            tags: row.tags,
            start_date: row.start_date,
            end_date: row.end_date,
            timezone: row.timezone,
            location_type: row.location_type.parse::<LocationType>()?,
            venue: row.venue,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            capacity: row.capacity,
            ticket_type: row.ticket_type.parse::<TicketType>()?,
            ticket_price: row.ticket_price,
            registration_count: row.registration_count,
            status: row.status.as_deref().map(str::parse::<EventStatus>).transpose()?,
            cover_image: row.cover_image,
            theme_color: row.theme_color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const EVENT_COLUMNS: &str = "id, title, description, slug, organizer_id, organizer_name, category, tags, start_date, end_date, timezone, location_type, venue, address, city, state, country, capacity, ticket_type, ticket_price, registration_count, status, cover_image, theme_color, created_at, updated_at";

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Event::try_from).transpose()
    }

    /// List all events, newest first
    pub async fn list(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!("SELECT {} FROM events ORDER BY created_at DESC", EVENT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM events WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }

    /// Create a new event
    pub async fn insert(conn: &mut PgConnection, event: &Event) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
            RETURNING {}
            "#,
            EVENT_COLUMNS, EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.slug)
        .bind(event.organizer_id)
        .bind(&event.organizer_name)
        .bind(&event.category)
        .bind(&event.tags)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.timezone)
        .bind(event.location_type.as_str())
        .bind(&event.venue)
        .bind(&event.address)
        .bind(&event.city)
        .bind(&event.state)
        .bind(&event.country)
        .bind(event.capacity)
        .bind(event.ticket_type.as_str())
        .bind(event.ticket_price)
        .bind(event.registration_count)
        .bind(event.status.map(|s| s.as_str()))
        .bind(&event.cover_image)
        .bind(&event.theme_color)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&mut *conn)
        .await?;

        Event::try_from(row)
    }

    /// Load an event and hold its row lock until the transaction ends
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {} FROM events WHERE id = $1 FOR UPDATE", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(Event::try_from).transpose()
    }

    /// Write every editable column. `registration_count` is left alone.
    pub async fn save(conn: &mut PgConnection, event: &Event) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET title = $2,
                description = $3,
                category = $4,
                tags = $5,
                start_date = $6,
                end_date = $7,
                timezone = $8,
                location_type = $9,
                venue = $10,
                address = $11,
                city = $12,
                state = $13,
                country = $14,
                capacity = $15,
                ticket_type = $16,
                ticket_price = $17,
                status = $18,
                cover_image = $19,
                theme_color = $20,
                updated_at = $21
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(&event.tags)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.timezone)
        .bind(event.location_type.as_str())
        .bind(&event.venue)
        .bind(&event.address)
        .bind(&event.city)
        .bind(&event.state)
        .bind(&event.country)
        .bind(event.capacity)
        .bind(event.ticket_type.as_str())
        .bind(event.ticket_price)
        .bind(event.status.map(|s| s.as_str()))
        .bind(&event.cover_image)
        .bind(&event.theme_color)
        .bind(event.updated_at)
        .fetch_one(&mut *conn)
        .await?;

        Event::try_from(row)
    }

    /// Shift the denormalized confirmed-registration counter, floored at zero
    pub async fn adjust_registration_count(conn: &mut PgConnection, id: Uuid, delta: i32) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET registration_count = GREATEST(registration_count + $2, 0) WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(delta)
        .fetch_one(&mut *conn)
        .await?;

        Event::try_from(row)
    }
}
