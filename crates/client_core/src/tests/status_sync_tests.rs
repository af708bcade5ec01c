use serde_json::json;
use shared::domain::ServiceState;

use super::*;
use crate::{
    state::AppStateStore,
    test_support::{distribution, network_failure, online_status, FakeRemote},
    types::ClassCount,
};

fn controller(remote: Arc<FakeRemote>) -> (StatusSyncController, AppStateStore) {
    let store = AppStateStore::new();
    let controller = StatusSyncController::new(remote, store.status_slice());
    (controller, store)
}

fn cat_dog() -> shared::protocol::VisualizationPayload {
    distribution(json!({"cat": 120, "dog": 95, "message": "ok"}))
}

#[tokio::test]
async fn refresh_populates_snapshot_and_series() {
    let remote = FakeRemote::new();
    remote.push_status(Ok(online_status()));
    remote.push_visualizations(Ok(cat_dog()));
    let (controller, store) = controller(remote);

    let report = controller.refresh().await;
    assert!(report.status.is_applied());
    assert!(report.visualizations.is_applied());

    let state = store.snapshot();
    assert!(!state.flags.loading);
    assert_eq!(state.status.service_state, ServiceState::Online);
    assert_eq!(state.status.model_name.as_deref(), Some("resnet18"));
    assert_eq!(state.status.accuracy_label(), "93.0%");
    assert_eq!(
        state.class_distribution,
        vec![ClassCount::new("cat", 120), ClassCount::new("dog", 95)]
    );
}

#[tokio::test]
async fn second_identical_refresh_leaves_state_unchanged() {
    let remote = FakeRemote::new();
    for _ in 0..2 {
        remote.push_status(Ok(online_status()));
        remote.push_visualizations(Ok(cat_dog()));
    }
    let (controller, store) = controller(remote);

    controller.refresh().await;
    let first = store.snapshot();

    controller.refresh().await;
    let second = store.snapshot();
    assert_eq!(first.status, second.status);
    assert_eq!(first.class_distribution, second.class_distribution);
    assert_eq!(first, second);
}

#[tokio::test]
async fn status_failure_does_not_block_series() {
    let remote = FakeRemote::new();
    remote.push_status(Err(network_failure()));
    remote.push_visualizations(Ok(cat_dog()));
    let (controller, store) = controller(remote);

    let report = controller.refresh().await;
    assert_eq!(report.status, FieldOutcome::Failed(network_failure()));
    assert!(report.visualizations.is_applied());

    let state = store.snapshot();
    assert_eq!(state.status.service_state, ServiceState::Unknown);
    assert_eq!(state.class_distribution.len(), 2);
    assert!(!state.flags.loading);
}

#[tokio::test]
async fn failures_keep_previous_values() {
    let remote = FakeRemote::new();
    remote.push_status(Ok(online_status()));
    remote.push_visualizations(Ok(cat_dog()));
    remote.push_status(Err(ServiceFailure::Response {
        status: 503,
        message: "Service Unavailable".into(),
    }));
    remote.push_visualizations(Err(network_failure()));
    let (controller, store) = controller(Arc::clone(&remote));

    controller.refresh().await;
    let before = store.snapshot();
    let report = controller.refresh().await;
    assert!(matches!(report.status, FieldOutcome::Failed(_)));
    assert!(matches!(report.visualizations, FieldOutcome::Failed(_)));

    let after = store.snapshot();
    assert_eq!(after.status, before.status);
    assert_eq!(after.class_distribution, before.class_distribution);
    assert_eq!(remote.pending_status_answers(), 0);
}

#[tokio::test]
async fn each_result_applies_as_soon_as_it_lands() {
    let remote = FakeRemote::new();
    let release_status = remote.push_status_gated(Err(network_failure()));
    remote.push_visualizations(Ok(cat_dog()));
    let (controller, store) = controller(remote);
    let mut rx = store.subscribe();

    let refresh = tokio::spawn({
        let controller = controller.clone();
        async move { controller.refresh().await }
    });

    // Series shows up while the status call is still outstanding.
    rx.wait_for(|state| !state.class_distribution.is_empty())
        .await
        .expect("series applied");
    assert!(store.snapshot().flags.loading);

    release_status.send(()).expect("release status");
    refresh.await.expect("refresh task");
    assert!(!store.snapshot().flags.loading);
}

#[tokio::test]
async fn stale_response_from_superseded_refresh_is_discarded() {
    let remote = FakeRemote::new();
    let mut old_status = online_status();
    old_status.model_name = Some("old-model".into());
    let release_old_status = remote.push_status_gated(Ok(old_status));
    let release_old_series =
        remote.push_visualizations_gated(Ok(distribution(json!({"old": 1}))));
    remote.push_status(Ok(online_status()));
    remote.push_visualizations(Ok(cat_dog()));
    let (controller, store) = controller(remote);
    let mut rx = store.subscribe();

    let stale = tokio::spawn({
        let controller = controller.clone();
        async move { controller.refresh().await }
    });
    rx.wait_for(|state| state.flags.loading)
        .await
        .expect("older refresh started");

    let fresh = controller.refresh().await;
    assert!(fresh.status.is_applied());
    assert!(store.snapshot().flags.loading, "older refresh still in flight");

    release_old_status.send(()).expect("release");
    release_old_series.send(()).expect("release");
    let stale = stale.await.expect("stale refresh");
    assert_eq!(stale.status, FieldOutcome::Superseded);
    assert_eq!(stale.visualizations, FieldOutcome::Superseded);

    let state = store.snapshot();
    assert_eq!(state.status.model_name.as_deref(), Some("resnet18"));
    assert_eq!(state.class_distribution.len(), 2);
    assert!(!state.flags.loading);
}
