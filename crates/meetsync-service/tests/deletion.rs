mod common;

use common::{Harness, request};
use meetsync_core::{
    AppointmentId,
    ProviderKind::{Google, Microsoft},
    UserId,
};
use meetsync_service::{
    ErrorKind, Orchestrator, OrchestratorConfig, PairStage, RequestAction, RespondOutcome,
    ServiceError,
};

/// Confirms a request from user 1 to user 2 and returns the appointment id.
async fn confirmed_appointment(h: &Harness, orchestrator: &Orchestrator) -> AppointmentId {
    h.create_succeeds(1, Google, "ev_a").await;
    h.create_succeeds(2, Google, "ev_b").await;
    h.create_succeeds(2, Microsoft, "ev_c").await;

    let pending = orchestrator.submit_request(request(1, 2)).await.unwrap();
    match orchestrator
        .respond(pending.id, UserId(2), RequestAction::Confirm)
        .await
        .unwrap()
    {
        RespondOutcome::Confirmed(report) => report.appointment.id,
        other => panic!("expected confirmation, got {other:?}"),
    }
}

const LINKS: [(i64, meetsync_core::ProviderKind); 3] = [(1, Google), (2, Google), (2, Microsoft)];

#[tokio::test]
async fn delete_removes_every_remote_event() {
    let h = Harness::new(&LINKS).await;
    let orchestrator = h.orchestrator();
    let appointment = confirmed_appointment(&h, &orchestrator).await;
    h.delete_answers(Google, "ev_a", 204, 1).await;
    h.delete_answers(Google, "ev_b", 204, 1).await;
    h.delete_answers(Microsoft, "ev_c", 204, 1).await;

    let report = orchestrator
        .delete_appointment(appointment, UserId(1))
        .await
        .unwrap();

    assert_eq!(report.removed, 3);
    assert_eq!(h.store.appointment_count().await, 0);
    assert!(h.store.all_appointment_events().await.is_empty());
    assert!(orchestrator.appointments_for(UserId(2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn outsider_cannot_delete() {
    let h = Harness::new(&LINKS).await;
    let orchestrator = h.orchestrator();
    let appointment = confirmed_appointment(&h, &orchestrator).await;
    h.delete_answers(Google, "ev_a", 204, 0).await;
    h.delete_answers(Google, "ev_b", 204, 0).await;
    h.delete_answers(Microsoft, "ev_c", 204, 0).await;

    let err = orchestrator
        .delete_appointment(appointment, UserId(3))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(h.store.appointment_count().await, 1);
    assert_eq!(h.store.all_appointment_events().await.len(), 3);
}

#[tokio::test]
async fn already_deleted_remote_event_counts_as_removed() {
    let h = Harness::new(&LINKS).await;
    let orchestrator = h.orchestrator();
    let appointment = confirmed_appointment(&h, &orchestrator).await;
    h.delete_answers(Google, "ev_a", 404, 1).await;
    h.delete_answers(Google, "ev_b", 410, 1).await;
    h.delete_answers(Microsoft, "ev_c", 204, 1).await;

    let report = orchestrator
        .delete_appointment(appointment, UserId(2))
        .await
        .unwrap();
    assert_eq!(report.removed, 3);
}

#[tokio::test]
async fn missing_remote_event_fails_when_not_tolerated() {
    let h = Harness::new(&LINKS).await;
    let strict = Orchestrator::new(
        h.registry.clone(),
        h.stores(),
        OrchestratorConfig::default().with_tolerate_missing_remote(false),
    );
    let appointment = confirmed_appointment(&h, &strict).await;
    h.delete_answers(Google, "ev_a", 204, 1).await;
    h.delete_answers(Google, "ev_b", 404, 1).await;
    h.delete_answers(Microsoft, "ev_c", 204, 1).await;

    let err = strict
        .delete_appointment(appointment, UserId(2))
        .await
        .unwrap_err();
    let failure = &err.failures()[0];
    assert_eq!(failure.stage, PairStage::DeleteEvent);
    assert_eq!(failure.error.kind(), ErrorKind::ProviderRejected);
}

#[tokio::test]
async fn failed_delete_keeps_remaining_rows_for_retry() {
    let h = Harness::new(&LINKS).await;
    let orchestrator = h.orchestrator();
    let appointment = confirmed_appointment(&h, &orchestrator).await;
    h.delete_answers(Google, "ev_a", 204, 1).await;
    h.delete_answers(Google, "ev_b", 204, 1).await;

    // Graph throttles the first attempt only
    wiremock::Mock::given(wiremock::matchers::method("DELETE"))
        .and(wiremock::matchers::path(format!("{}/ev_c", common::GRAPH_EVENTS)))
        .respond_with(wiremock::ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&h.server)
        .await;
    h.delete_answers(Microsoft, "ev_c", 204, 1).await;

    let err = orchestrator
        .delete_appointment(appointment, UserId(1))
        .await
        .unwrap_err();
    match &err {
        ServiceError::DeletionIncomplete { removed, failures, .. } => {
            assert_eq!(*removed, 2);
            assert_eq!((failures[0].user_id, failures[0].provider), (UserId(2), Microsoft));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::Incomplete);

    let remaining = h.store.all_appointment_events().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].provider_event_id, "ev_c");
    assert_eq!(h.store.appointment_count().await, 1);

    let report = orchestrator
        .delete_appointment(appointment, UserId(1))
        .await
        .unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(h.store.appointment_count().await, 0);
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let h = Harness::new(&[]).await;
    let err = h
        .orchestrator()
        .delete_appointment(AppointmentId(5), UserId(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
