//! Check-in and cancellation handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::error::ApiResult;
use crate::models::registration::Registration;
use crate::services::Actor;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub token: String,
}

pub async fn check_in(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CheckInRequest>,
) -> ApiResult<Json<Registration>> {
    let registration = state
        .services
        .registration_service
        .check_in_by_token(&actor, &payload.token)
        .await?;
    Ok(Json(registration))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Registration>> {
    let registration = state.services.registration_service.cancel_registration(&actor, id).await?;
    Ok(Json(registration))
}
