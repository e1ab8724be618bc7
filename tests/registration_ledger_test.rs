//! Registration ledger tests: capacity, counters, check-in and cancellation

mod helpers;

use std::sync::Arc;

use assert_matches::assert_matches;
use proptest::prelude::*;

use helpers::*;
use CampusHub::models::{EventStatus, RegistrationStatus, Role};
use CampusHub::services::Actor;
use CampusHub::CampusHubError;

async fn confirmed_count(ctx: &TestContext, event_id: uuid::Uuid) -> usize {
    ctx.store
        .list_event_registrations(event_id)
        .await
        .unwrap()
        .iter()
        .filter(|r| r.is_confirmed())
        .count()
}

#[tokio::test]
async fn test_capacity_two_admits_two() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 2).await;
    let ledger = &ctx.services.registration_service;

    let a = ctx.actor(Role::Student).await;
    let b = ctx.actor(Role::Student).await;
    let c = ctx.actor(Role::Student).await;

    ledger.register(&a, event.id, attendee()).await.expect("first seat");
    ledger.register(&b, event.id, attendee()).await.expect("second seat");
    assert_matches!(
        ledger.register(&c, event.id, attendee()).await,
        Err(CampusHubError::CapacityReached { capacity: 2 })
    );

    assert_eq!(ctx.reload(event.id).await.registration_count, 2);
    assert_eq!(confirmed_count(&ctx, event.id).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_respect_capacity() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 2).await;

    let mut actors = Vec::new();
    for _ in 0..10 {
        actors.push(ctx.actor(Role::Student).await);
    }

    let ledger = Arc::new(ctx.services.registration_service.clone());
    let handles: Vec<_> = actors
        .into_iter()
        .map(|actor| {
            let ledger = ledger.clone();
            let event_id = event.id;
            tokio::spawn(async move { ledger.register(&actor, event_id, attendee()).await })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(err) => assert_matches!(err, CampusHubError::CapacityReached { .. }),
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(ctx.reload(event.id).await.registration_count, 2);
}

#[tokio::test]
async fn test_register_rules() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let student = ctx.actor(Role::Student).await;
    let ledger = &ctx.services.registration_service;

    let cancelled = ctx.event(&organiser, Some(EventStatus::Cancelled), 10).await;
    assert_matches!(
        ledger.register(&student, cancelled.id, attendee()).await,
        Err(CampusHubError::RegistrationClosed { .. })
    );

    assert_matches!(
        ledger.register(&student, uuid::Uuid::new_v4(), attendee()).await,
        Err(CampusHubError::EventNotFound { .. })
    );

    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;
    let first = ledger.register(&student, event.id, attendee()).await.unwrap();
    assert_eq!(first.status, RegistrationStatus::Confirmed);
    assert_eq!(first.check_in_token.len(), ctx.settings.events.check_in_token_length);
    assert_matches!(
        ledger.register(&student, event.id, attendee()).await,
        Err(CampusHubError::AlreadyRegistered)
    );

    // a cancelled seat can be taken again
    ledger.cancel_registration(&student, first.id).await.unwrap();
    let again = ledger.register(&student, event.id, attendee()).await.unwrap();
    assert_ne!(again.id, first.id);
    assert_eq!(ctx.reload(event.id).await.registration_count, 1);
}

#[tokio::test]
async fn test_unregistered_identity_cannot_register() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;

    let ghost = Actor::unregistered("no-such-user");
    assert_matches!(
        ctx.services.registration_service.register(&ghost, event.id, attendee()).await,
        Err(CampusHubError::UserNotFound(_))
    );
}

#[tokio::test]
async fn test_double_cancel_is_rejected() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let student = ctx.actor(Role::Student).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;
    let ledger = &ctx.services.registration_service;

    let registration = ledger.register(&student, event.id, attendee()).await.unwrap();
    assert_eq!(ctx.reload(event.id).await.registration_count, 1);

    let cancelled = ledger.cancel_registration(&student, registration.id).await.unwrap();
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
    assert_eq!(ctx.reload(event.id).await.registration_count, 0);

    assert_matches!(
        ledger.cancel_registration(&student, registration.id).await,
        Err(CampusHubError::AlreadyCancelled)
    );
    assert_eq!(ctx.reload(event.id).await.registration_count, 0);
}

#[tokio::test]
async fn test_only_owner_or_admin_cancels() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let owner = ctx.actor(Role::Student).await;
    let other = ctx.actor(Role::Student).await;
    let admin = ctx.actor(Role::Admin).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;
    let ledger = &ctx.services.registration_service;

    let registration = ledger.register(&owner, event.id, attendee()).await.unwrap();
    assert_matches!(
        ledger.cancel_registration(&other, registration.id).await,
        Err(CampusHubError::PermissionDenied(_))
    );
    assert_matches!(
        ledger.admin_cancel_registration(&owner, registration.id).await,
        Err(CampusHubError::PermissionDenied(_))
    );

    ledger.admin_cancel_registration(&admin, registration.id).await.unwrap();
    assert_eq!(ctx.reload(event.id).await.registration_count, 0);
}

#[tokio::test]
async fn test_check_in_is_monotonic() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let student = ctx.actor(Role::Student).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;
    let ledger = &ctx.services.registration_service;

    let registration = ledger.register(&student, event.id, attendee()).await.unwrap();
    let checked = ledger
        .check_in_by_token(&organiser, &registration.check_in_token)
        .await
        .unwrap();
    assert!(checked.checked_in);
    let first_time = checked.checked_in_at.expect("timestamp set");

    assert_matches!(
        ledger.check_in_by_token(&organiser, &registration.check_in_token).await,
        Err(CampusHubError::AlreadyCheckedIn)
    );
    let stored = ctx
        .store
        .list_event_registrations(event.id)
        .await
        .unwrap()
        .remove(0);
    assert_eq!(stored.checked_in_at, Some(first_time));

    // checked-in seats are not released
    assert_matches!(
        ledger.cancel_registration(&student, registration.id).await,
        Err(CampusHubError::CheckedInRegistration)
    );
    assert_eq!(ctx.reload(event.id).await.registration_count, 1);
}

#[tokio::test]
async fn test_check_in_permissions() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let rival = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let student = ctx.actor(Role::Student).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;
    let ledger = &ctx.services.registration_service;

    let registration = ledger.register(&student, event.id, attendee()).await.unwrap();
    assert_matches!(
        ledger.check_in_by_token(&rival, &registration.check_in_token).await,
        Err(CampusHubError::PermissionDenied(_))
    );
    assert_matches!(
        ledger.check_in_by_token(&admin, "not-a-token").await,
        Err(CampusHubError::RegistrationNotFound(_))
    );
    assert_matches!(
        ledger.admin_check_in(&organiser, registration.id).await,
        Err(CampusHubError::PermissionDenied(_))
    );

    let checked = ledger.admin_check_in(&admin, registration.id).await.unwrap();
    assert!(checked.checked_in);
}

#[tokio::test]
async fn test_cancelled_registration_cannot_check_in() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let student = ctx.actor(Role::Student).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;
    let ledger = &ctx.services.registration_service;

    let registration = ledger.register(&student, event.id, attendee()).await.unwrap();
    ledger.cancel_registration(&student, registration.id).await.unwrap();
    assert_matches!(
        ledger.check_in_by_token(&organiser, &registration.check_in_token).await,
        Err(CampusHubError::RegistrationCancelled { .. })
    );
}

#[tokio::test]
async fn test_registration_listings() {
    let ctx = TestContext::new();
    let organiser = ctx.actor(Role::Organiser).await;
    let admin = ctx.actor(Role::Admin).await;
    let student = ctx.actor(Role::Student).await;
    let friend = ctx.actor(Role::Student).await;
    let event = ctx.event(&organiser, Some(EventStatus::Approved), 10).await;
    let ledger = &ctx.services.registration_service;

    let mine = ledger.register(&student, event.id, attendee()).await.unwrap();
    let theirs = ledger.register(&friend, event.id, attendee()).await.unwrap();
    ledger.cancel_registration(&friend, theirs.id).await.unwrap();
    ledger.admin_check_in(&admin, mine.id).await.unwrap();

    let my = ledger.my_registrations(&student).await.unwrap();
    assert_eq!(my.len(), 1);
    assert_eq!(my[0].event_title.as_deref(), Some(event.title.as_str()));

    let listing = ledger.list_registrations(&admin).await.unwrap();
    assert_eq!(listing.registrations.len(), 2);
    assert_eq!(listing.stats.total, 2);
    assert_eq!(listing.stats.confirmed, 1);
    assert_eq!(listing.stats.cancelled, 1);
    assert_eq!(listing.stats.checked_in, 1);
    assert!(listing.registrations.iter().all(|r| r.event_title == event.title));

    assert_matches!(
        ledger.list_registrations(&student).await,
        Err(CampusHubError::PermissionDenied(_))
    );
}

#[derive(Debug, Clone)]
enum LedgerOp {
    Register(usize),
    Cancel(usize),
    CheckIn(usize),
}

fn ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        (0..6usize).prop_map(LedgerOp::Register),
        (0..6usize).prop_map(LedgerOp::Cancel),
        (0..6usize).prop_map(LedgerOp::CheckIn),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_counter_matches_confirmed_registrations(ops in proptest::collection::vec(ledger_op(), 1..40)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new();
            let organiser = ctx.actor(Role::Organiser).await;
            let admin = ctx.actor(Role::Admin).await;
            let event = ctx.event(&organiser, Some(EventStatus::Approved), 3).await;
            let ledger = &ctx.services.registration_service;

            let mut students = Vec::new();
            for _ in 0..6 {
                students.push(ctx.actor(Role::Student).await);
            }
            let mut registrations = Vec::new();

            for op in ops {
                match op {
                    LedgerOp::Register(i) => {
                        if let Ok(r) = ledger.register(&students[i], event.id, attendee()).await {
                            registrations.push(r.id);
                        }
                    }
                    LedgerOp::Cancel(i) => {
                        if let Some(id) = registrations.get(i) {
                            let _ = ledger.admin_cancel_registration(&admin, *id).await;
                        }
                    }
                    LedgerOp::CheckIn(i) => {
                        if let Some(id) = registrations.get(i) {
                            let _ = ledger.admin_check_in(&admin, *id).await;
                        }
                    }
                }

                let stored = ctx.reload(event.id).await;
                let confirmed = confirmed_count(&ctx, event.id).await;
                assert_eq!(stored.registration_count as usize, confirmed);
                assert!(confirmed <= stored.capacity as usize);
            }
        });
    }
}
