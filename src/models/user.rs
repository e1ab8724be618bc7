//! User model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::{CampusHubError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "user")]
    Student,
    Teacher,
    #[serde(alias = "organizer")]
    Organiser,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Organiser => "organiser",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }

    /// Sort key for team listings, most privileged first
    pub fn rank(&self) -> u8 {
        match self {
            Role::SuperAdmin => 0,
            Role::Admin => 1,
            Role::Organiser => 2,
            Role::Teacher => 3,
            Role::Student => 4,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CampusHubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            // legacy rows
            "student" | "user" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "organiser" | "organizer" => Ok(Role::Organiser),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::SuperAdmin),
            other => Err(CampusHubError::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Capability flags derived from a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    pub is_student: bool,
    pub is_teacher: bool,
    pub is_organiser: bool,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub can_access_admin_panel: bool,
    pub can_create_events: bool,
}

impl Permissions {
    pub fn for_role(role: Role) -> Self {
        let is_admin = matches!(role, Role::Admin | Role::SuperAdmin);
        Self {
            is_student: role == Role::Student,
            is_teacher: role == Role::Teacher,
            is_organiser: role == Role::Organiser,
            is_admin,
            is_super_admin: role == Role::SuperAdmin,
            can_access_admin_panel: is_admin,
            can_create_events: role == Role::Organiser || is_admin,
        }
    }

    /// Permissions of an identity with no user record
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub city: String,
    pub state: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Subject issued by the authentication provider
    pub identity_token: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    pub role: Role,
    pub onboarding_completed: bool,
    pub location: Option<UserLocation>,
    pub interests: Vec<String>,
    pub free_events_created: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn permissions(&self) -> Permissions {
        Permissions::for_role(self.role)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingRequest {
    pub location: UserLocation,
    #[serde(default)]
    pub interests: Vec<String>,
}
