//! Registration repository implementation

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::database::store::{RegistrationLookup, SeatUsage};
use crate::models::registration::{Registration, RegistrationStatus};
use crate::utils::errors::{CampusHubError, Result};

/// Partial unique index over confirmed (event_id, user_id)
pub const CONFIRMED_REGISTRATION_INDEX: &str = "uq_registrations_confirmed";

#[derive(Debug, FromRow)]
pub struct RegistrationRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub attendee_name: String,
    pub attendee_email: String,
    pub check_in_token: String,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub status: String,
    pub registered_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = CampusHubError;

    fn try_from(row: RegistrationRow) -> Result<Self> {
        Ok(Registration {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            attendee_name: row.attendee_name,
            attendee_email: row.attendee_email,
            check_in_token: row.check_in_token,
            checked_in: row.checked_in,
            checked_in_at: row.checked_in_at,
            status: row.status.parse::<RegistrationStatus>()?,
            registered_at: row.registered_at,
        })
    }
}

fn into_registrations(rows: Vec<RegistrationRow>) -> Result<Vec<Registration>> {
    rows.into_iter().map(Registration::try_from).collect()
}

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, lookup: &RegistrationLookup) -> Result<Option<Registration>> {
        let row = match lookup {
            RegistrationLookup::Id(id) => {
                sqlx::query_as::<_, RegistrationRow>(
                    "SELECT id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at FROM registrations WHERE id = $1"
                )
                .bind(*id)
                .fetch_optional(&self.pool)
                .await?
            }
            RegistrationLookup::Token(token) => {
                sqlx::query_as::<_, RegistrationRow>(
                    "SELECT id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at FROM registrations WHERE check_in_token = $1"
                )
                .bind(token)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.map(Registration::try_from).transpose()
    }

    /// List all registrations, newest first
    pub async fn list(&self) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            "SELECT id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at FROM registrations ORDER BY registered_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        into_registrations(rows)
    }

    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            "SELECT id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at FROM registrations WHERE event_id = $1 ORDER BY registered_at DESC"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        into_registrations(rows)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            "SELECT id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at FROM registrations WHERE user_id = $1 ORDER BY registered_at DESC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_registrations(rows)
    }

    /// Event a registration belongs to, without locking
    pub async fn event_id_for(conn: &mut PgConnection, lookup: &RegistrationLookup) -> Result<Option<Uuid>> {
        let row: Option<(Uuid,)> = match lookup {
            RegistrationLookup::Id(id) => {
                sqlx::query_as("SELECT event_id FROM registrations WHERE id = $1")
                    .bind(*id)
                    .fetch_optional(&mut *conn)
                    .await?
            }
            RegistrationLookup::Token(token) => {
                sqlx::query_as("SELECT event_id FROM registrations WHERE check_in_token = $1")
                    .bind(token)
                    .fetch_optional(&mut *conn)
                    .await?
            }
        };

        Ok(row.map(|(event_id,)| event_id))
    }

    /// Load a registration and hold its row lock until the transaction ends
    pub async fn lock(conn: &mut PgConnection, lookup: &RegistrationLookup) -> Result<Option<Registration>> {
        let row = match lookup {
            RegistrationLookup::Id(id) => {
                sqlx::query_as::<_, RegistrationRow>(
                    "SELECT id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at FROM registrations WHERE id = $1 FOR UPDATE"
                )
                .bind(*id)
                .fetch_optional(&mut *conn)
                .await?
            }
            RegistrationLookup::Token(token) => {
                sqlx::query_as::<_, RegistrationRow>(
                    "SELECT id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at FROM registrations WHERE check_in_token = $1 FOR UPDATE"
                )
                .bind(token)
                .fetch_optional(&mut *conn)
                .await?
            }
        };

        row.map(Registration::try_from).transpose()
    }

    /// Confirmed seats for an event as seen inside the current transaction
    pub async fn seat_usage(conn: &mut PgConnection, event_id: Uuid, user_id: Uuid) -> Result<SeatUsage> {
        let (confirmed, already_registered): (i64, bool) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(BOOL_OR(user_id = $2), FALSE)
            FROM registrations
            WHERE event_id = $1 AND status = 'confirmed'
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(SeatUsage { confirmed, already_registered })
    }

    /// Create a new registration
    pub async fn insert(conn: &mut PgConnection, registration: &Registration) -> Result<Registration> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            INSERT INTO registrations (id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at
            "#
        )
        .bind(registration.id)
        .bind(registration.event_id)
        .bind(registration.user_id)
        .bind(&registration.attendee_name)
        .bind(&registration.attendee_email)
        .bind(&registration.check_in_token)
        .bind(registration.checked_in)
        .bind(registration.checked_in_at)
        .bind(registration.status.as_str())
        .bind(registration.registered_at)
        .fetch_one(&mut *conn)
        .await?;

        Registration::try_from(row)
    }

    /// Persist status and check-in state
    pub async fn save(conn: &mut PgConnection, registration: &Registration) -> Result<Registration> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            UPDATE registrations
            SET checked_in = $2,
                checked_in_at = $3,
                status = $4
            WHERE id = $1
            RETURNING id, event_id, user_id, attendee_name, attendee_email, check_in_token, checked_in, checked_in_at, status, registered_at
            "#
        )
        .bind(registration.id)
        .bind(registration.checked_in)
        .bind(registration.checked_in_at)
        .bind(registration.status.as_str())
        .fetch_one(&mut *conn)
        .await?;

        Registration::try_from(row)
    }
}
