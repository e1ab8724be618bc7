//! Handlers for the caller's own identity and registrations

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::handlers::error::ApiResult;
use crate::models::user::{OnboardingRequest, Permissions, Role, SignInRequest, User};
use crate::services::{Actor, MyRegistration};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<User>,
    pub permissions: Permissions,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

pub async fn get_me(Extension(actor): Extension<Actor>) -> Json<MeResponse> {
    Json(MeResponse {
        permissions: actor.permissions(),
        user: actor.user().cloned(),
    })
}

pub async fn sign_in(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<SignInRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .services
        .identity_service
        .sign_in(actor.identity_token(), payload)
        .await?;
    Ok(Json(user))
}

pub async fn complete_onboarding(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<OnboardingRequest>,
) -> ApiResult<Json<User>> {
    let user = state.services.identity_service.complete_onboarding(&actor, payload).await?;
    Ok(Json(user))
}

pub async fn set_my_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<SetRoleRequest>,
) -> ApiResult<Json<User>> {
    let user = state.services.identity_service.set_my_role(&actor, payload.role).await?;
    Ok(Json(user))
}

pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<MyRegistration>>> {
    let registrations = state.services.registration_service.my_registrations(&actor).await?;
    Ok(Json(registrations))
}
