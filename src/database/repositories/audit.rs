//! Audit log repository implementation
//!
//! Insert and read only; there is no update or delete path.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::audit::{AuditAction, AuditLogEntry};
use crate::utils::errors::Result;

#[derive(Debug, FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub action: String,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<AuditRow> for AuditLogEntry {
    fn from(row: AuditRow) -> Self {
        AuditLogEntry {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            user_name: row.user_name,
            action: AuditAction::parse(&row.action),
            field: row.field,
            old_value: row.old_value,
            new_value: row.new_value,
            reason: row.reason,
            timestamp: row.timestamp,
        }
    }
}

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Entries for one event, newest first
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT id, event_id, user_id, user_name, action, field, old_value, new_value, reason, timestamp FROM event_audit_log WHERE event_id = $1 ORDER BY timestamp DESC, seq DESC"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }

    pub async fn insert(conn: &mut PgConnection, entry: &AuditLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO event_audit_log (id, event_id, user_id, user_name, action, field, old_value, new_value, reason, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#
        )
        .bind(entry.id)
        .bind(entry.event_id)
        .bind(entry.user_id)
        .bind(&entry.user_name)
        .bind(entry.action.as_str())
        .bind(&entry.field)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(&entry.reason)
        .bind(entry.timestamp)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
