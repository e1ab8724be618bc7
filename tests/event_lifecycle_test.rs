//! Event lifecycle, moderation and audit trail tests

mod helpers;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use uuid::Uuid;

use helpers::*;
use CampusHub::models::{
    AuditAction, CreateEventRequest, EventDetailsUpdate, EventFilter, EventStatus, LocationType,
    ProtectedFieldChanges, Role, TicketType,
};
use CampusHub::CampusHubError;

fn create_request(title: &str) -> CreateEventRequest {
    let start = Utc::now() + Duration::days(10);
    CreateEventRequest {
        title: title.to_string(),
        description: "Talks and demos".to_string(),
        category: "tech".to_string(),
        tags: vec!["ai".to_string()],
        start_date: start,
        end_date: start + Duration::hours(4),
        timezone: "Asia/Kolkata".to_string(),
        location_type: LocationType::Physical,
        venue: Some("Auditorium".to_string()),
        address: None,
        city: "Chennai".to_string(),
        state: None,
        country: "India".to_string(),
        capacity: 100,
        ticket_type: TicketType::Free,
        ticket_price: None,
        cover_image: None,
        theme_color: None,
        as_draft: false,
    }
}

#[tokio::test]
async fn test_organiser_creates_pending_event() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;

    let event = ctx
        .services
        .event_service
        .create_event(&organiser, create_request("AI Day 2026"))
        .await
        .expect("create event");

    assert_eq!(event.status, Some(EventStatus::Pending));
    assert_eq!(event.registration_count, 0);
    assert!(event.slug.starts_with("ai-day-2026-"));

    let organiser_id = organiser.user().unwrap().id;
    let stored = ctx.store.find_user(organiser_id).await.unwrap().unwrap();
    assert_eq!(stored.free_events_created, 1);
}

#[tokio::test]
async fn test_event_creation_rules() {
    let ctx = TestContext::new();
    let student = ctx.actor(Role::Student).await;
    let organiser = ctx.actor(Role::Organiser).await;
    let events = &ctx.services.event_service;

    assert_matches!(
        events.create_event(&student, create_request("Nope")).await,
        Err(CampusHubError::PermissionDenied(_))
    );

    let mut draft = create_request("Draft Night");
    draft.as_draft = true;
    let event = events.create_event(&organiser, draft).await.unwrap();
    assert_eq!(event.status, Some(EventStatus::Draft));

    let mut backwards = create_request("Backwards");
    backwards.end_date = backwards.start_date - Duration::hours(1);
    assert_matches!(
        events.create_event(&organiser, backwards).await,
        Err(CampusHubError::InvalidDateRange)
    );

    let mut unpriced = create_request("Paid Without Price");
    unpriced.ticket_type = TicketType::Paid;
    assert_matches!(
        events.create_event(&organiser, unpriced).await,
        Err(CampusHubError::InvalidInput(_))
    );

    let mut empty = create_request("No Seats");
    empty.capacity = 0;
    assert_matches!(
        events.create_event(&organiser, empty).await,
        Err(CampusHubError::InvalidInput(_))
    );
}

#[tokio::test]
async fn test_effective_status_is_derived_not_stored() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let mut event = test_event(organiser.user().unwrap(), Some(EventStatus::Approved), Utc::now());
    event.start_date = Utc::now() - Duration::hours(1);
    event.end_date = Utc::now() + Duration::hours(1);
    let event = ctx.store.insert_event(event).await.unwrap();

    let view = ctx.services.event_service.get_event(event.id).await.unwrap();
    assert_eq!(view.effective_status, EventStatus::Live);
    assert_eq!(view.event.status, Some(EventStatus::Approved));
    assert_eq!(ctx.reload(event.id).await.status, Some(EventStatus::Approved));
}

#[tokio::test]
async fn test_super_admin_capacity_edit_is_audited() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let root = ctx.actor(Role::SuperAdmin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 50).await;

    let changes = ProtectedFieldChanges {
        capacity: Some(30),
        ..Default::default()
    };
    let change = ctx
        .services
        .event_service
        .super_admin_edit_event(&root, event.id, changes, Some("venue change"))
        .await
        .expect("edit");

    assert_eq!(change.event.capacity, 30);
    assert_eq!(change.entries.len(), 1);

    let log = ctx.services.event_service.get_event_audit_log(&root, event.id).await.unwrap();
    assert_eq!(log.len(), 1);
    let entry = &log[0];
    assert_eq!(entry.action, AuditAction::DateEdit);
    assert_eq!(entry.field.as_deref(), Some("capacity"));
    assert_eq!(entry.old_value.as_deref(), Some("50"));
    assert_eq!(entry.new_value.as_deref(), Some("30"));
    assert_eq!(entry.reason.as_deref(), Some("venue change"));
    assert_eq!(entry.user_id, root.user().unwrap().id);
}

#[tokio::test]
async fn test_super_admin_edit_records_each_changed_field() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let root = ctx.actor(Role::SuperAdmin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 50).await;

    let new_start = event.start_date + Duration::days(1);
    let changes = ProtectedFieldChanges {
        title: Some(event.title.clone()),
        start_date: Some(new_start),
        end_date: Some(new_start + Duration::hours(2)),
        status: Some(EventStatus::Pending),
        ..Default::default()
    };
    let change = ctx
        .services
        .event_service
        .super_admin_edit_event(&root, event.id, changes, Some("rescheduled"))
        .await
        .unwrap();

    // unchanged title is not recorded
    let fields: Vec<&str> = change.entries.iter().filter_map(|e| e.field.as_deref()).collect();
    assert_eq!(fields, vec!["startDate", "endDate", "status"]);
    assert!(change.entries.iter().all(|e| e.action == AuditAction::DateEdit));
    assert!(change.entries[0].new_value.as_deref().unwrap().ends_with('Z'));
    assert_eq!(change.event.status, Some(EventStatus::Pending));
}

#[tokio::test]
async fn test_super_admin_edit_requires_super_admin() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 50).await;

    let result = ctx
        .services
        .event_service
        .super_admin_edit_event(&admin, event.id, ProtectedFieldChanges::default(), None)
        .await;
    assert_matches!(result, Err(CampusHubError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_rejected_super_admin_edit_leaves_event_untouched() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let root = ctx.actor(Role::SuperAdmin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 50).await;
    let events = &ctx.services.event_service;

    let backwards = ProtectedFieldChanges {
        capacity: Some(30),
        end_date: Some(event.start_date - Duration::hours(1)),
        ..Default::default()
    };
    assert_matches!(
        events.super_admin_edit_event(&root, event.id, backwards, Some("room swap")).await,
        Err(CampusHubError::InvalidDateRange)
    );

    let cancel_silently = ProtectedFieldChanges {
        capacity: Some(30),
        status: Some(EventStatus::Cancelled),
        ..Default::default()
    };
    assert_matches!(
        events.super_admin_edit_event(&root, event.id, cancel_silently, Some("  ")).await,
        Err(CampusHubError::ReasonRequired)
    );

    let stored = ctx.reload(event.id).await;
    assert_eq!(stored.capacity, 50);
    assert_eq!(stored.start_date, event.start_date);
    assert_eq!(stored.end_date, event.end_date);
    assert_eq!(stored.status, Some(EventStatus::Approved));
    assert!(events.get_event_audit_log(&root, event.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_update_skips_missing_events() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let first = ctx.event(&organiser, Some(EventStatus::Pending), 50).await;
    let second = ctx.event(&organiser, Some(EventStatus::Pending), 50).await;

    let result = ctx
        .services
        .event_service
        .bulk_update_event_status(&admin, &[first.id, Uuid::new_v4(), second.id], EventStatus::Approved, None)
        .await
        .unwrap();
    assert_eq!(result.updated, 2);

    for id in [first.id, second.id] {
        assert_eq!(ctx.reload(id).await.status, Some(EventStatus::Approved));
        let log = ctx.services.event_service.get_event_audit_log(&admin, id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, AuditAction::BulkStatusChange);
        assert_eq!(log[0].old_value.as_deref(), Some("pending"));
        assert_eq!(log[0].new_value.as_deref(), Some("approved"));
    }
}

#[tokio::test]
async fn test_bulk_update_skips_illegal_and_noop_transitions() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let done = ctx.event(&organiser, Some(EventStatus::Completed), 50).await;
    let already = ctx.event(&organiser, Some(EventStatus::Approved), 50).await;

    let result = ctx
        .services
        .event_service
        .bulk_update_event_status(&admin, &[done.id, already.id], EventStatus::Approved, None)
        .await
        .unwrap();
    assert_eq!(result.updated, 0);
    assert_eq!(ctx.reload(done.id).await.status, Some(EventStatus::Completed));

    let live = ctx
        .services
        .event_service
        .bulk_update_event_status(&admin, &[already.id], EventStatus::Live, None)
        .await;
    assert_matches!(live, Err(CampusHubError::InvalidInput(_)));
}

#[tokio::test]
async fn test_cancellation_requires_reason() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 50).await;
    let events = &ctx.services.event_service;

    for reason in [None, Some(""), Some("   ")] {
        assert_matches!(
            events.update_event_status(&admin, event.id, EventStatus::Cancelled, reason).await,
            Err(CampusHubError::ReasonRequired)
        );
    }
    assert_matches!(
        events.bulk_update_event_status(&admin, &[event.id], EventStatus::Cancelled, None).await,
        Err(CampusHubError::ReasonRequired)
    );

    assert_eq!(ctx.reload(event.id).await.status, Some(EventStatus::Approved));
    assert!(events.get_event_audit_log(&admin, event.id).await.unwrap().is_empty());

    let change = events
        .update_event_status(&admin, event.id, EventStatus::Cancelled, Some("speaker unavailable"))
        .await
        .unwrap();
    assert_eq!(change.event.status, Some(EventStatus::Cancelled));
    assert_eq!(change.entries[0].action, AuditAction::StatusChange);
    assert_eq!(change.entries[0].reason.as_deref(), Some("speaker unavailable"));
}

#[tokio::test]
async fn test_status_changes_follow_effective_status() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let mut past = test_event(organiser.user().unwrap(), Some(EventStatus::Approved), Utc::now());
    past.start_date = Utc::now() - Duration::days(3);
    past.end_date = Utc::now() - Duration::days(2);
    let past = ctx.store.insert_event(past).await.unwrap();
    let events = &ctx.services.event_service;

    // effectively completed
    assert_matches!(
        events.update_event_status(&admin, past.id, EventStatus::Cancelled, Some("late")).await,
        Err(CampusHubError::InvalidStateTransition { .. })
    );

    let change = events
        .update_event_status(&admin, past.id, EventStatus::Completed, None)
        .await
        .unwrap();
    assert_eq!(change.event.status, Some(EventStatus::Completed));
    assert_eq!(change.entries.len(), 1);
}

#[tokio::test]
async fn test_same_status_is_a_noop() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Pending), 50).await;

    let change = ctx
        .services
        .event_service
        .update_event_status(&admin, event.id, EventStatus::Pending, None)
        .await
        .unwrap();
    assert!(change.entries.is_empty());
    assert!(ctx
        .services
        .event_service
        .get_event_audit_log(&admin, event.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_status_change_needs_admin() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let event = ctx.event(&organiser, Some(EventStatus::Pending), 50).await;

    let result = ctx
        .services
        .event_service
        .update_event_status(&organiser, event.id, EventStatus::Approved, None)
        .await;
    assert_matches!(result, Err(CampusHubError::PermissionDenied(_)));

    let missing = ctx
        .services
        .event_service
        .update_event_status(&ctx.actor(Role::Admin).await, Uuid::new_v4(), EventStatus::Approved, None)
        .await;
    assert_matches!(missing, Err(CampusHubError::EventNotFound { .. }));
}

#[tokio::test]
async fn test_submit_for_review() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let other = ctx.actor(Role::Organiser).await;
    let event = ctx.event(&organiser, Some(EventStatus::Draft), 50).await;
    let events = &ctx.services.event_service;

    assert_matches!(
        events.submit_for_review(&other, event.id).await,
        Err(CampusHubError::PermissionDenied(_))
    );

    let change = events.submit_for_review(&organiser, event.id).await.unwrap();
    assert_eq!(change.event.status, Some(EventStatus::Pending));
    assert_eq!(change.entries.len(), 1);

    assert_matches!(
        events.submit_for_review(&organiser, event.id).await,
        Err(CampusHubError::InvalidStateTransition { .. })
    );
}

#[tokio::test]
async fn test_update_event_details() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let stranger = ctx.actor(Role::Student).await;
    let admin = ctx.actor(Role::Admin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 50).await;
    let events = &ctx.services.event_service;

    let details = EventDetailsUpdate {
        venue: Some("Main Lawn".to_string()),
        ..Default::default()
    };
    assert_matches!(
        events.update_event_details(&stranger, event.id, details.clone()).await,
        Err(CampusHubError::PermissionDenied(_))
    );

    let updated = events.update_event_details(&organiser, event.id, details).await.unwrap();
    assert_eq!(updated.venue.as_deref(), Some("Main Lawn"));
    assert_eq!(updated.capacity, 50);
    // content edits are not audited
    assert!(events.get_event_audit_log(&admin, event.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_events_filters_by_effective_status() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;

    let mut live = test_event(organiser.user().unwrap(), Some(EventStatus::Approved), Utc::now());
    live.title = "Live Coding Jam".to_string();
    live.start_date = Utc::now() - Duration::hours(1);
    live.end_date = Utc::now() + Duration::hours(1);
    ctx.store.insert_event(live).await.unwrap();
    ctx.event(&organiser, Some(EventStatus::Pending), 20).await;

    let events = &ctx.services.event_service;
    let all = events.list_events(&admin, EventFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let filter = EventFilter {
        status: Some("live".to_string()),
        ..Default::default()
    };
    let live_only = events.list_events(&admin, filter).await.unwrap();
    assert_eq!(live_only.len(), 1);
    assert_eq!(live_only[0].effective_status, EventStatus::Live);

    let filter = EventFilter {
        search: Some("coding".to_string()),
        status: Some("all".to_string()),
        ..Default::default()
    };
    assert_eq!(events.list_events(&admin, filter).await.unwrap().len(), 1);

    assert_matches!(
        events.list_events(&organiser, EventFilter::default()).await,
        Err(CampusHubError::PermissionDenied(_))
    );
}

#[tokio::test]
async fn test_event_detail_includes_stats_and_audit() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let student = ctx.actor(Role::Student).await;
    let event = ctx.event(&organiser, Some(EventStatus::Pending), 10).await;
    let events = &ctx.services.event_service;

    events
        .update_event_status(&admin, event.id, EventStatus::Approved, None)
        .await
        .unwrap();
    ctx.services
        .registration_service
        .register(&student, event.id, attendee())
        .await
        .unwrap();

    let detail = events.get_event_with_stats(&admin, event.id).await.unwrap();
    assert_eq!(detail.stats.total_registrations, 1);
    assert_eq!(detail.stats.capacity_utilization, 10);
    assert_eq!(detail.registrations.len(), 1);
    assert_eq!(detail.audit_log.len(), 1);
    assert_eq!(detail.effective_status, EventStatus::Approved);
}
