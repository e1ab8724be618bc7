//! HTTP handlers module
//!
//! This module contains the axum router and its handlers organized by area:
//! - `me` for the caller's identity and registrations
//! - `events` and `registrations` for organisers and attendees
//! - `admin` for moderation, analytics, reports and team management

pub mod admin;
pub mod error;
pub mod events;
pub mod me;
pub mod registrations;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use crate::handlers::error::ApiResult;
use crate::middleware::{auth_middleware, request_logging};
use crate::models::user::User;
use crate::services::ServiceHealthStatus;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitSuperAdminRequest {
    pub email: String,
}

/// Create the router for the API
pub fn create_router(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let protected_routes = Router::new()
        .route("/api/me", get(me::get_me))
        .route("/api/auth/sign-in", post(me::sign_in))
        .route("/api/me/onboarding", post(me::complete_onboarding))
        .route("/api/me/role", post(me::set_my_role))
        .route("/api/me/registrations", get(me::my_registrations))
        .route("/api/events", post(events::create_event))
        .route("/api/events/:id/submit", post(events::submit_for_review))
        .route("/api/events/:id/registrations", post(events::register))
        .route("/api/registrations/check-in", post(registrations::check_in))
        .route("/api/registrations/:id/cancel", post(registrations::cancel))
        .route("/api/admin/events", get(admin::list_events))
        .route("/api/admin/events/bulk-status", post(admin::bulk_update_status))
        .route("/api/admin/events/:id", get(admin::get_event))
        .route("/api/admin/events/:id/audit", get(admin::get_audit_log))
        .route("/api/admin/events/:id/status", post(admin::update_status))
        .route("/api/admin/events/:id/edit", post(admin::super_admin_edit))
        .route("/api/admin/registrations", get(admin::list_registrations))
        .route("/api/admin/registrations/:id/check-in", post(admin::check_in))
        .route("/api/admin/registrations/:id/cancel", post(admin::cancel_registration))
        .route("/api/admin/analytics", get(admin::analytics))
        .route("/api/admin/analytics/events/:id", get(admin::event_analytics))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/reports/events", get(admin::report_selector))
        .route("/api/admin/reports/events/:id", get(admin::report_data))
        .route("/api/admin/reports/events/:id/download", get(admin::report_download))
        .route("/api/admin/team", get(admin::list_team))
        .route("/api/admin/users/:id/role", post(admin::set_user_role))
        .route_layer(auth.clone());

    Router::new()
        .route("/health", get(health_check))
        .route("/api/setup/superadmin", post(init_super_admin))
        .route(
            "/api/events/:id",
            get(events::get_event).merge(patch(events::update_event_details).route_layer(auth)),
        )
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<ServiceHealthStatus>) {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// One-time bootstrap of the first superadmin
pub async fn init_super_admin(
    State(state): State<AppState>,
    Json(payload): Json<InitSuperAdminRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.services.identity_service.init_super_admin(&payload.email).await?))
}
