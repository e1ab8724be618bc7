//! Admin console handlers: moderation, ledger, analytics, reports and team

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::error::ApiResult;
use crate::models::audit::AuditLogEntry;
use crate::models::event::{EventFilter, EventStatus, ProtectedFieldChanges};
use crate::models::registration::Registration;
use crate::models::user::{Role, User};
use crate::services::{
    Actor, AggregatedAnalytics, AuditedChange, BulkUpdateResult, DashboardStats, EventAnalytics, EventDetail,
    EventReport, EventSummary, RegistrationListing, ReportSelectorItem,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: EventStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuperAdminEditRequest {
    #[serde(flatten)]
    pub changes: ProtectedFieldChanges,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub event_ids: Vec<Uuid>,
    pub status: EventStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetUserRoleRequest {
    pub role: Role,
}

// events

pub async fn list_events(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<EventFilter>,
) -> ApiResult<Json<Vec<EventSummary>>> {
    Ok(Json(state.services.event_service.list_events(&actor, filter).await?))
}

pub async fn get_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EventDetail>> {
    Ok(Json(state.services.event_service.get_event_with_stats(&actor, id).await?))
}

pub async fn get_audit_log(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<AuditLogEntry>>> {
    Ok(Json(state.services.event_service.get_event_audit_log(&actor, id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeRequest>,
) -> ApiResult<Json<AuditedChange>> {
    let change = state
        .services
        .event_service
        .update_event_status(&actor, id, payload.status, payload.reason.as_deref())
        .await?;
    Ok(Json(change))
}

pub async fn super_admin_edit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SuperAdminEditRequest>,
) -> ApiResult<Json<AuditedChange>> {
    let change = state
        .services
        .event_service
        .super_admin_edit_event(&actor, id, payload.changes, payload.reason.as_deref())
        .await?;
    Ok(Json(change))
}

pub async fn bulk_update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<BulkStatusRequest>,
) -> ApiResult<Json<BulkUpdateResult>> {
    let result = state
        .services
        .event_service
        .bulk_update_event_status(&actor, &payload.event_ids, payload.status, payload.reason.as_deref())
        .await?;
    Ok(Json(result))
}

// registrations

pub async fn list_registrations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<RegistrationListing>> {
    Ok(Json(state.services.registration_service.list_registrations(&actor).await?))
}

pub async fn check_in(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Registration>> {
    Ok(Json(state.services.registration_service.admin_check_in(&actor, id).await?))
}

pub async fn cancel_registration(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Registration>> {
    Ok(Json(
        state
            .services
            .registration_service
            .admin_cancel_registration(&actor, id)
            .await?,
    ))
}

// analytics

pub async fn analytics(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<AggregatedAnalytics>> {
    Ok(Json(state.services.analytics_service.get_aggregated_analytics(&actor).await?))
}

pub async fn event_analytics(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EventAnalytics>> {
    Ok(Json(state.services.analytics_service.get_event_analytics(&actor, id).await?))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.services.analytics_service.get_dashboard_stats(&actor).await?))
}

// reports

pub async fn report_selector(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<ReportSelectorItem>>> {
    Ok(Json(state.services.report_service.events_for_report_selector(&actor).await?))
}

pub async fn report_data(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EventReport>> {
    Ok(Json(state.services.report_service.get_event_report_data(&actor, id).await?))
}

pub async fn report_download(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (content_type, file_name, body) = state.services.report_service.render_event_report(&actor, id).await?;
    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
    ];
    Ok((headers, body))
}

// team

pub async fn list_team(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.services.identity_service.list_team(&actor).await?))
}

pub async fn set_user_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetUserRoleRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state
            .services
            .identity_service
            .set_user_role(&actor, id, payload.role)
            .await?,
    ))
}
