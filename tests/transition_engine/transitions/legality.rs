//! Legality Tests
//!
//! Idempotent requests, illegal edges, mandatory payloads and actor
//! constraints. None of these may reach the backend.

use crate::*;
use proptest::prelude::*;

// =============================================================================
// IDEMPOTENCE
// =============================================================================

#[tokio::test]
async fn test_request_current_status_is_noop_for_every_kind_and_status() {
    let (pitlane, transport) = open(Role::Manager);

    for kind in EntityKind::ALL {
        let seeded = one_per_status(kind);
        transport.seed(seeded.clone());
        pitlane.load_page(kind, 0).await.unwrap();

        for entity in &seeded {
            let result = pitlane
                .request_transition(kind, entity.id.clone(), entity.status, None)
                .await
                .unwrap();
            assert_eq!(result.status, entity.status);
            assert!(!result.pending);
        }
    }

    assert_eq!(transport.mutate_count(), 0);
    assert_eq!(pitlane.metrics().noop, 15);
}

// =============================================================================
// ILLEGAL EDGES
// =============================================================================

#[tokio::test]
async fn test_illegal_edges_never_reach_backend() {
    let (pitlane, transport) = open(Role::Manager);
    let registry = Registry::standard();
    let mut rejected = 0;

    for kind in EntityKind::ALL {
        let seeded = one_per_status(kind);
        transport.seed(seeded.clone());
        pitlane.load_page(kind, 0).await.unwrap();

        for entity in &seeded {
            for target in Status::all(kind) {
                if target == entity.status || registry.is_allowed(kind, entity.status, target) {
                    continue;
                }
                let err = pitlane
                    .request_transition(kind, entity.id.clone(), target, Some(reason("x")))
                    .await
                    .unwrap_err();
                assert!(
                    matches!(err, Error::Transition(TransitionError::InvalidTransition { .. })),
                    "{} {} -> {} should be invalid, got {:?}",
                    kind,
                    entity.status,
                    target,
                    err
                );
                assert_eq!(pitlane.get(kind, &entity.id).unwrap().status, entity.status);
                rejected += 1;
            }
        }
    }

    assert!(rejected > 0);
    assert_eq!(transport.mutate_count(), 0);
}

#[tokio::test]
async fn test_completed_ticket_is_terminal() {
    let (pitlane, transport) = open(Role::Receptionist);
    transport.seed([Entity::new("st-1", ServiceTicketStatus::Completed)]);
    pitlane.service_tickets.load_page(0).await.unwrap();

    let err = pitlane.service_tickets.cancel("st-1").await.unwrap_err();
    assert_eq!(err.error_code(), "InvalidTransition");
    assert_eq!(
        pitlane.service_tickets.status_of(&EntityId::from("st-1")),
        Some(ServiceTicketStatus::Completed)
    );
    assert_eq!(transport.mutate_count(), 0);
}

#[tokio::test]
async fn test_unknown_entity_is_not_found() {
    let (pitlane, transport) = open(Role::Receptionist);
    let err = pitlane.appointments.cancel("a-404").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(transport.mutate_count(), 0);
}

// =============================================================================
// MANDATORY PAYLOAD
// =============================================================================

#[tokio::test]
async fn test_reject_requires_reason() {
    let (pitlane, transport) = open(Role::Manager);
    transport.seed([Entity::new("pr-1", PurchaseRequestStatus::Pending)]);
    pitlane.purchase_requests.load_page(0).await.unwrap();

    let missing = pitlane
        .request_transition(
            EntityKind::PurchaseRequest,
            "pr-1",
            PurchaseRequestStatus::Rejected,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(missing.error_code(), "ValidationError");

    let blank = pitlane.purchase_requests.reject("pr-1", "   ").await.unwrap_err();
    assert!(matches!(
        blank,
        Error::Transition(TransitionError::Validation { ref field, .. }) if field == "reason"
    ));

    let mut not_text = Payload::new();
    not_text.insert("reason".into(), json!(42));
    let err = pitlane
        .purchase_requests
        .transition_with("pr-1", PurchaseRequestStatus::Rejected, not_text)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ValidationError");
    assert_eq!(transport.mutate_count(), 0);

    let rejected = pitlane
        .purchase_requests
        .reject("pr-1", "quoted price above supplier list")
        .await
        .unwrap();
    assert_eq!(rejected.status, Status::from(PurchaseRequestStatus::Rejected));
    assert_eq!(transport.mutate_count(), 1);
    assert_eq!(
        transport
            .record(EntityKind::PurchaseRequest, &EntityId::from("pr-1"))
            .unwrap()
            .text("reason"),
        Some("quoted price above supplier list")
    );
}

#[tokio::test]
async fn test_approve_needs_no_payload() {
    let (pitlane, transport) = open(Role::Manager);
    transport.seed([Entity::new("pr-1", PurchaseRequestStatus::Pending)]);
    pitlane.purchase_requests.load_page(0).await.unwrap();

    let approved = pitlane.purchase_requests.approve("pr-1").await.unwrap();
    assert_eq!(approved.status, Status::from(PurchaseRequestStatus::Approved));
}

// =============================================================================
// ACTOR CONSTRAINT
// =============================================================================

#[tokio::test]
async fn test_payroll_decisions_need_manager() {
    for actor in [Role::Admin, Role::Accountant, Role::Receptionist, Role::Mechanic] {
        let (pitlane, transport) = open(actor);
        transport.seed([Entity::new("pay-1", PayrollStatus::Pending)]);
        pitlane.payroll.load_page(0).await.unwrap();

        let err = pitlane.payroll.approve("pay-1").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transition(TransitionError::Forbidden {
                required: Role::Manager,
                ..
            })
        ));
        let err = pitlane.payroll.reject("pay-1", "hours disputed").await.unwrap_err();
        assert_eq!(err.error_code(), "Forbidden");
        assert_eq!(transport.mutate_count(), 0);
        assert_eq!(
            pitlane.payroll.status_of(&EntityId::from("pay-1")),
            Some(PayrollStatus::Pending)
        );
    }
}

#[tokio::test]
async fn test_payroll_payload_checked_before_actor() {
    let (pitlane, transport) = open(Role::Accountant);
    transport.seed([Entity::new("pay-1", PayrollStatus::Pending)]);
    pitlane.payroll.load_page(0).await.unwrap();

    let err = pitlane
        .payroll
        .transition("pay-1", PayrollStatus::Rejected)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ValidationError");
}

#[tokio::test]
async fn test_manager_settles_payroll() {
    let (pitlane, transport) = open(Role::Manager);
    transport.seed([
        Entity::new("pay-1", PayrollStatus::Pending),
        Entity::new("pay-2", PayrollStatus::Pending),
    ]);
    pitlane.payroll.load_page(0).await.unwrap();

    pitlane.payroll.approve("pay-1").await.unwrap();
    pitlane.payroll.reject("pay-2", "overtime not signed off").await.unwrap();
    assert_eq!(
        transport.status_of(EntityKind::PayrollRecord, &EntityId::from("pay-1")),
        Some(Status::from(PayrollStatus::Approved))
    );
    assert_eq!(
        transport.status_of(EntityKind::PayrollRecord, &EntityId::from("pay-2")),
        Some(Status::from(PayrollStatus::Rejected))
    );
    assert_eq!(pitlane.metrics().committed, 2);
}

// =============================================================================
// PROPERTY: OUTCOME FOLLOWS THE REGISTRY
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_outcome_follows_registry(kind_idx in 0usize..4, from_idx in 0usize..5, to_idx in 0usize..5) {
        let kind = EntityKind::ALL[kind_idx];
        let statuses = Status::all(kind);
        let from = statuses[from_idx % statuses.len()];
        let to = statuses[to_idx % statuses.len()];
        let allowed = Registry::standard().is_allowed(kind, from, to);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (result, entity, calls) = runtime.block_on(async {
            let (pitlane, transport) = open(Role::Manager);
            transport.seed([Entity::new("e-1", from)]);
            pitlane.load_page(kind, 0).await.unwrap();
            let result = pitlane
                .request_transition(kind, "e-1", to, Some(reason("property check")))
                .await;
            let entity = pitlane.get(kind, &EntityId::from("e-1")).unwrap();
            (result, entity, transport.mutate_count())
        });

        prop_assert!(!entity.pending);
        if from == to {
            prop_assert!(result.is_ok());
            prop_assert_eq!(calls, 0);
            prop_assert_eq!(entity.status, from);
        } else if allowed {
            prop_assert!(result.is_ok());
            prop_assert_eq!(calls, 1);
            prop_assert_eq!(entity.status, to);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(calls, 0);
            prop_assert_eq!(entity.status, from);
        }
    }
}
