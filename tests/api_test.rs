//! HTTP router tests over the in-memory store

mod helpers;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use helpers::*;
use CampusHub::models::{EventStatus, Role};
use CampusHub::services::Actor;
use CampusHub::{create_router, AppState};

fn app(ctx: &TestContext) -> Router {
    create_router(AppState::new(ctx.store.clone(), ctx.settings.clone()))
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn token(actor: &Actor) -> &str {
    actor.identity_token()
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();
    let (status, body) = send(app(&ctx), request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store_healthy"], true);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let ctx = TestContext::new();
    let (status, body) = send(app(&ctx), request(Method::GET, "/api/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn test_sign_in_flow() {
    let ctx = TestContext::new();

    let (status, body) = send(app(&ctx), request(Method::GET, "/api/me", Some("new-subject"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"].is_null());

    let payload = json!({ "email": "kiran@campus.edu", "name": "Kiran", "image_url": null });
    let (status, body) = send(
        app(&ctx),
        request(Method::POST, "/api/auth/sign-in", Some("new-subject"), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "student");

    let (_, body) = send(app(&ctx), request(Method::GET, "/api/me", Some("new-subject"), None)).await;
    assert_eq!(body["user"]["email"], "kiran@campus.edu");
    assert_eq!(body["permissions"]["is_admin"], false);
}

#[tokio::test]
async fn test_public_event_lookup() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;

    let uri = format!("/api/events/{}", event.id);
    let (status, body) = send(app(&ctx), request(Method::GET, &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["effective_status"], "approved");
    assert_eq!(body["title"], event.title);

    // editing the same path still needs an identity
    let (status, _) = send(
        app(&ctx),
        request(Method::PATCH, &uri, None, Some(json!({ "venue": "Library" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        app(&ctx),
        request(Method::PATCH, &uri, Some(token(&organiser)), Some(json!({ "venue": "Library" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["venue"], "Library");
}

#[tokio::test]
async fn test_register_and_check_in_over_http() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let student = ctx.actor(Role::Student).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 1).await;

    let uri = format!("/api/events/{}/registrations", event.id);
    let payload = json!({ "name": "Anu", "email": "anu@campus.edu" });
    let (status, body) = send(
        app(&ctx),
        request(Method::POST, &uri, Some(token(&student)), Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let check_in_token = body["check_in_token"].as_str().unwrap().to_string();

    let (status, body) = send(
        app(&ctx),
        request(Method::POST, &uri, Some(token(&student)), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You are already registered for this event");

    let (status, body) = send(
        app(&ctx),
        request(
            Method::POST,
            "/api/registrations/check-in",
            Some(token(&organiser)),
            Some(json!({ "token": check_in_token })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checked_in"], true);
}

#[tokio::test]
async fn test_admin_routes() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Pending), 10).await;

    let (status, _) = send(
        app(&ctx),
        request(Method::GET, "/api/admin/events", Some(token(&organiser)), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let status_uri = format!("/api/admin/events/{}/status", event.id);
    let (status, body) = send(
        app(&ctx),
        request(
            Method::POST,
            &status_uri,
            Some(token(&admin)),
            Some(json!({ "status": "cancelled" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "A reason is required when cancelling an event");

    let (status, body) = send(
        app(&ctx),
        request(
            Method::POST,
            "/api/admin/events/bulk-status",
            Some(token(&admin)),
            Some(json!({ "event_ids": [event.id, uuid::Uuid::new_v4()], "status": "approved" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);

    let audit_uri = format!("/api/admin/events/{}/audit", event.id);
    let (status, body) = send(app(&ctx), request(Method::GET, &audit_uri, Some(token(&admin)), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["action"], "bulk_status_change");

    let missing = format!("/api/admin/events/{}", uuid::Uuid::new_v4());
    let (status, _) = send(app(&ctx), request(Method::GET, &missing, Some(token(&admin)), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_download() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;

    let uri = format!("/api/admin/reports/events/{}/download", event.id);
    let response = app(&ctx)
        .oneshot(request(Method::GET, &uri, Some(token(&admin)), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("intro-to-rust-report.json"));
}

#[tokio::test]
async fn test_superadmin_setup_runs_once() {
    let ctx = TestContext::new();
    let first = ctx.actor(Role::Student).await;
    let email = first.user().unwrap().email.clone();

    let (status, body) = send(
        app(&ctx),
        request(Method::POST, "/api/setup/superadmin", None, Some(json!({ "email": email }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "superadmin");

    let (status, _) = send(
        app(&ctx),
        request(Method::POST, "/api/setup/superadmin", None, Some(json!({ "email": email }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
