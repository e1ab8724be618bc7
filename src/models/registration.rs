//! Registration model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::{CampusHubError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = CampusHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            other => Err(CampusHubError::InvalidInput(format!("Unknown registration status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub attendee_name: String,
    pub attendee_email: String,
    /// Opaque value encoded into the attendee's QR code
    pub check_in_token: String,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    pub fn is_confirmed(&self) -> bool {
        self.status == RegistrationStatus::Confirmed
    }

    /// Counts towards attendance and revenue
    pub fn attended(&self) -> bool {
        self.is_confirmed() && self.checked_in
    }

    /// Mark the attendee as present. Only a confirmed, not yet checked-in
    /// registration may move forward.
    pub fn check_in(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.is_confirmed() {
            return Err(CampusHubError::RegistrationCancelled { action: "check in" });
        }
        if self.checked_in {
            return Err(CampusHubError::AlreadyCheckedIn);
        }
        self.checked_in = true;
        self.checked_in_at = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        if !self.is_confirmed() {
            return Err(CampusHubError::AlreadyCancelled);
        }
        if self.checked_in {
            return Err(CampusHubError::CheckedInRegistration);
        }
        self.status = RegistrationStatus::Cancelled;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendeeDetails {
    pub name: String,
    pub email: String,
}
