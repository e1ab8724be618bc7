//! Identity and role resolution
//!
//! Maps the opaque identity token presented by a caller onto a stored user
//! and the capability flags of its role. Every service operation receives
//! the resulting [`Actor`] explicitly.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::database::store::{CampusStore, PromoteOutcome};
use crate::models::audit::AuditActor;
use crate::models::user::{OnboardingRequest, Permissions, Role, SignInRequest, User};
use crate::utils::errors::{CampusHubError, Result};
use crate::utils::helpers::is_valid_email;
use crate::utils::logging::log_admin_action;

/// Resolved caller of a service operation
#[derive(Debug, Clone)]
pub struct Actor {
    identity_token: String,
    user: Option<User>,
    permissions: Permissions,
}

impl Actor {
    pub fn for_user(user: User) -> Self {
        Self {
            identity_token: user.identity_token.clone(),
            permissions: user.permissions(),
            user: Some(user),
        }
    }

    /// Authenticated identity that has no user record yet
    pub fn unregistered(identity_token: impl Into<String>) -> Self {
        Self {
            identity_token: identity_token.into(),
            user: None,
            permissions: Permissions::none(),
        }
    }

    pub fn identity_token(&self) -> &str {
        &self.identity_token
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn require_user(&self) -> Result<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| CampusHubError::UserNotFound("no user for this identity".to_string()))
    }

    pub fn require_admin(&self) -> Result<&User> {
        match &self.user {
            Some(user) if self.permissions.is_admin => Ok(user),
            _ => Err(CampusHubError::PermissionDenied("Admin access required".to_string())),
        }
    }

    pub fn require_super_admin(&self) -> Result<&User> {
        match &self.user {
            Some(user) if self.permissions.is_super_admin => Ok(user),
            _ => Err(CampusHubError::PermissionDenied("SuperAdmin access required".to_string())),
        }
    }

    pub fn require_event_creator(&self) -> Result<&User> {
        match &self.user {
            Some(user) if self.permissions.can_create_events => Ok(user),
            _ => Err(CampusHubError::PermissionDenied(
                "Organiser access required to create events".to_string(),
            )),
        }
    }

    /// Identity recorded on audit entries
    pub fn audit_actor(&self) -> Result<AuditActor> {
        let user = self.require_user()?;
        Ok(AuditActor {
            id: user.id,
            name: user.name.clone(),
        })
    }
}

/// Identity service for sign-in, onboarding and role management
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn CampusStore>,
    settings: Settings,
}

impl IdentityService {
    pub fn new(store: Arc<dyn CampusStore>, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// Resolve a presented identity token. No token is an authentication
    /// failure; a token without a user row resolves with no permissions.
    pub async fn resolve_identity(&self, token: Option<&str>) -> Result<Actor> {
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(CampusHubError::Unauthenticated)?;

        match self.store.find_user_by_token(token).await? {
            Some(user) => {
                debug!(user_id = %user.id, role = %user.role, "Identity resolved");
                Ok(Actor::for_user(user))
            }
            None => {
                debug!("Identity has no user record");
                Ok(Actor::unregistered(token))
            }
        }
    }

    /// Return the user for `identity_token`, creating a student on first sign-in
    pub async fn sign_in(&self, identity_token: &str, request: SignInRequest) -> Result<User> {
        let identity_token = identity_token.trim();
        if identity_token.is_empty() {
            return Err(CampusHubError::Unauthenticated);
        }

        if let Some(existing) = self.store.find_user_by_token(identity_token).await? {
            debug!(user_id = %existing.id, "User already exists, returning existing user");
            return Ok(existing);
        }

        if !is_valid_email(&request.email) {
            return Err(CampusHubError::InvalidInput(format!("Invalid email: {}", request.email)));
        }
        let name = request.name.trim();
        if name.is_empty() {
            return Err(CampusHubError::InvalidInput("Name is required".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            identity_token: identity_token.to_string(),
            email: request.email.trim().to_lowercase(),
            name: name.to_string(),
            image_url: request.image_url,
            role: Role::Student,
            onboarding_completed: false,
            location: None,
            interests: Vec::new(),
            free_events_created: 0,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_user(user).await {
            Ok(user) => {
                info!(user_id = %user.id, "New user registered successfully");
                Ok(user)
            }
            // concurrent first sign-in with the same token
            Err(err) => match self.store.find_user_by_token(identity_token).await? {
                Some(existing) => Ok(existing),
                None => Err(err),
            },
        }
    }

    pub async fn complete_onboarding(&self, actor: &Actor, request: OnboardingRequest) -> Result<User> {
        let user = actor.require_user()?;
        if request.location.city.trim().is_empty() || request.location.country.trim().is_empty() {
            return Err(CampusHubError::InvalidInput("City and country are required".to_string()));
        }

        let now = Utc::now();
        let updated = self
            .store
            .update_user(
                user.id,
                Box::new(move |user: &mut User| {
                    user.location = Some(request.location);
                    user.interests = request.interests;
                    user.onboarding_completed = true;
                    user.updated_at = now;
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| CampusHubError::UserNotFound(user.id.to_string()))?;

        info!(user_id = %updated.id, "Onboarding completed");
        Ok(updated)
    }

    /// Development-only self role switch between student and organiser
    pub async fn set_my_role(&self, actor: &Actor, role: Role) -> Result<User> {
        if !self.settings.features.dev_role_switch {
            return Err(CampusHubError::PermissionDenied("Role switching is disabled".to_string()));
        }
        if !matches!(role, Role::Student | Role::Organiser) {
            return Err(CampusHubError::InvalidInput(format!(
                "Self role switch only allows student or organiser, got {}",
                role
            )));
        }
        let user = actor.require_user()?;
        if user.permissions().is_admin {
            return Err(CampusHubError::PermissionDenied(
                "Administrators cannot switch their own role".to_string(),
            ));
        }

        let now = Utc::now();
        let updated = self
            .store
            .update_user(
                user.id,
                Box::new(move |user: &mut User| {
                    user.role = role;
                    user.updated_at = now;
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| CampusHubError::UserNotFound(user.id.to_string()))?;

        warn!(user_id = %updated.id, role = %role, "Development role switch used");
        Ok(updated)
    }

    pub async fn set_user_role(&self, actor: &Actor, user_id: Uuid, role: Role) -> Result<User> {
        let admin = actor.require_super_admin()?;

        let now = Utc::now();
        let updated = self
            .store
            .update_user(
                user_id,
                Box::new(move |user: &mut User| {
                    user.role = role;
                    user.updated_at = now;
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| CampusHubError::UserNotFound(user_id.to_string()))?;

        log_admin_action(admin.id, "set_user_role", Some(&user_id.to_string()), Some(role.as_str()));
        Ok(updated)
    }

    /// One-time bootstrap of the first superadmin
    pub async fn init_super_admin(&self, email: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        match self.store.promote_first_superadmin(&email, Utc::now()).await? {
            PromoteOutcome::Promoted(user) => {
                warn!(user_id = %user.id, "First SuperAdmin initialized");
                Ok(user)
            }
            PromoteOutcome::AlreadyExists => Err(CampusHubError::Conflict(
                "A SuperAdmin already exists. Use set_user_role instead.".to_string(),
            )),
            PromoteOutcome::UserNotFound => {
                Err(CampusHubError::UserNotFound(format!("no user with email {}", email)))
            }
        }
    }

    /// All non-student users, most privileged first
    pub async fn list_team(&self, actor: &Actor) -> Result<Vec<User>> {
        actor.require_admin()?;

        let mut team: Vec<User> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .filter(|u| u.role != Role::Student)
            .collect();
        team.sort_by(|a, b| a.role.rank().cmp(&b.role.rank()).then_with(|| a.name.cmp(&b.name)));
        Ok(team)
    }
}
