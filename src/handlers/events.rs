//! Public and organiser event handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::handlers::error::ApiResult;
use crate::models::event::{CreateEventRequest, Event, EventDetailsUpdate};
use crate::models::registration::{AttendeeDetails, Registration};
use crate::services::{Actor, AuditedChange, EventView};
use crate::state::AppState;

pub async fn create_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event = state.services.event_service.create_event(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<EventView>> {
    let event = state.services.event_service.get_event(id).await?;
    Ok(Json(event))
}

pub async fn update_event_details(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventDetailsUpdate>,
) -> ApiResult<Json<Event>> {
    let event = state
        .services
        .event_service
        .update_event_details(&actor, id, payload)
        .await?;
    Ok(Json(event))
}

pub async fn submit_for_review(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AuditedChange>> {
    let change = state.services.event_service.submit_for_review(&actor, id).await?;
    Ok(Json(change))
}

pub async fn register(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttendeeDetails>,
) -> ApiResult<(StatusCode, Json<Registration>)> {
    let registration = state.services.registration_service.register(&actor, id, payload).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}
