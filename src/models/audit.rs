//! Audit log model
//!
//! Entries are append-only: created inside the same atomic unit as the
//! mutation they describe, never updated or deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    StatusChange,
    BulkStatusChange,
    DateEdit,
    Other(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::StatusChange => "status_change",
            AuditAction::BulkStatusChange => "bulk_status_change",
            AuditAction::DateEdit => "date_edit",
            AuditAction::Other(action) => action.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "status_change" => AuditAction::StatusChange,
            "bulk_status_change" => AuditAction::BulkStatusChange,
            "date_edit" => AuditAction::DateEdit,
            other => AuditAction::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AuditAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuditAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(AuditAction::parse(&raw))
    }
}

/// Who performed an audited mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditActor {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub action: AuditAction,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(event_id: Uuid, actor: &AuditActor, action: AuditAction, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id: actor.id,
            user_name: actor.name.clone(),
            action,
            field: None,
            old_value: None,
            new_value: None,
            reason: None,
            timestamp,
        }
    }

    pub fn field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn values(mut self, old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        self.old_value = Some(old_value.into());
        self.new_value = Some(new_value.into());
        self
    }

    pub fn reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        assert_eq!(serde_json::to_string(&AuditAction::DateEdit).unwrap(), "\"date_edit\"");
        let parsed: AuditAction = serde_json::from_str("\"price_override\"").unwrap();
        assert_eq!(parsed, AuditAction::Other("price_override".to_string()));
        assert_eq!(AuditAction::parse("bulk_status_change"), AuditAction::BulkStatusChange);
    }

    #[test]
    fn test_entry_builder() {
        let actor = AuditActor { id: Uuid::new_v4(), name: "Root".to_string() };
        let entry = AuditLogEntry::new(Uuid::new_v4(), &actor, AuditAction::DateEdit, Utc::now())
            .field("capacity")
            .values("50", "30")
            .reason(Some("venue change"));
        assert_eq!(entry.field.as_deref(), Some("capacity"));
        assert_eq!(entry.old_value.as_deref(), Some("50"));
        assert_eq!(entry.new_value.as_deref(), Some("30"));
        assert_eq!(entry.reason.as_deref(), Some("venue change"));
        assert_eq!(entry.user_name, "Root");
    }
}
