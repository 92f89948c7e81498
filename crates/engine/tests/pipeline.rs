//! End-to-end pipeline scenarios, asserting on the exact sequence of store
//! calls a reconciliation makes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use serde_json::json;

use converge_engine::{
    Action, Annotator, ClientCommand, CreateOptions, Error, PatchChecker, ReconcileContext,
    Result, ResultSlot, ResultStatus,
};
use converge_store::{
    Condition, ConditionStatus, MemoryStore, Object, ObjectKey, RecordingStore, StoreClient,
    StoreOp,
};

type TestStore = Arc<RecordingStore<MemoryStore>>;

fn harness() -> (ClientCommand<RecordingStore<MemoryStore>>, TestStore) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(RecordingStore::new(MemoryStore::new()));
    (ClientCommand::new(store.clone()), store)
}

fn installing_condition() -> Condition {
    Condition::new(
        "Installing",
        ConditionStatus::True,
        "StartInstall",
        "created",
    )
}

/// Seed an owner object carrying the Installing condition, returning the
/// stored copy (with uid and resource version) and the number of store ops
/// the seeding consumed.
async fn seed_owner(store: &TestStore) -> Result<(Object, usize)> {
    let mut owner = Object::new("MeterBase", "ns", "meterbase");
    owner.status.conditions.set(installing_condition());
    let stored = store.create(&owner).await.map_err(Error::from)?;
    Ok((stored, store.ops().len()))
}

fn ops_after(store: &TestStore, seeded: usize) -> Vec<StoreOp> {
    store.ops().into_iter().skip(seeded).collect()
}

// Scenario A: the object is missing, so the Call branch creates it.
#[tokio::test]
async fn missing_object_is_created_exactly_once() -> Result<()> {
    let (cc, store) = harness();
    let (owner, seeded) = seed_owner(&store).await?;

    let pod = Object::new("Pod", "ns", "meterbase-pod").with_spec(json!({"image": "v1"}));
    let key = pod.key();
    let get_result = ResultSlot::new();

    let branch_slot = get_result.clone();
    let result = cc
        .execute(
            &ReconcileContext::new(),
            vec![
                Action::store_result(get_result.clone(), Action::get("Pod", key.clone())),
                Action::call(move || {
                    if branch_slot.is(ResultStatus::NotFound) {
                        return Ok(Some(Action::create_with(
                            pod,
                            CreateOptions::new().annotate().owned_by(&owner),
                        )));
                    }
                    Ok(None)
                }),
                // Halted before this point; must never run.
                Action::delete(Object::new("Pod", "ns", "meterbase-pod")),
            ],
        )
        .await;

    assert!(result.is(ResultStatus::Requeue));
    assert_eq!(
        ops_after(&store, seeded),
        vec![StoreOp::Get(key.clone()), StoreOp::Create(key.clone())]
    );

    let stored = store.get("Pod", &key).await.map_err(Error::from)?;
    assert!(stored.metadata.annotations.contains_key("converge.io/last-applied"));
    assert_eq!(
        stored.controller_ref().map(|r| r.kind.clone()),
        Some("MeterBase".to_string())
    );
    Ok(())
}

// Scenario B: everything already converged — the only write is the delete.
#[tokio::test]
async fn converged_pipeline_makes_no_spurious_writes() -> Result<()> {
    let (cc, store) = harness();
    let (owner, _) = seed_owner(&store).await?;

    // A pod this engine previously applied, unchanged since.
    let annotator = Annotator::default();
    let mut pod = Object::new("Pod", "ns", "meterbase-pod").with_spec(json!({"image": "v1"}));
    annotator.set_last_applied(&mut pod)?;
    let pod = store.create(&pod).await.map_err(Error::from)?;
    let seeded = store.ops().len();

    let key = pod.key();
    let get_result = ResultSlot::new();

    let checker = PatchChecker::default();
    let branch_slot = get_result.clone();
    let branch_owner = owner.clone();
    let result = cc
        .execute(
            &ReconcileContext::new(),
            vec![
                Action::store_result(get_result.clone(), Action::get("Pod", key.clone())),
                Action::update_status_condition(owner.clone(), installing_condition()),
                Action::call(move || {
                    let current = branch_slot
                        .value()
                        .ok_or_else(|| Error::decision("get result missing"))?;
                    let desired = current.clone();
                    if checker.check_patch(&current, &desired)? {
                        return Ok(Some(Action::update(desired)));
                    }
                    Ok(Some(Action::update_status_condition(
                        branch_owner,
                        installing_condition(),
                    )))
                }),
                Action::delete(pod.clone()),
                Action::update_status_condition(owner, installing_condition()),
            ],
        )
        .await;

    assert!(result.is(ResultStatus::Continue));
    // One read, one delete; no creates, updates, or status writes.
    assert_eq!(
        ops_after(&store, seeded),
        vec![StoreOp::Get(key.clone()), StoreOp::Delete(key)]
    );
    Ok(())
}

// Scenario C: a new condition triggers exactly one status write and halts.
#[tokio::test]
async fn new_condition_writes_status_once_and_halts() -> Result<()> {
    let (cc, store) = harness();
    let owner = store
        .create(&Object::new("MeterBase", "ns", "meterbase"))
        .await
        .map_err(Error::from)?;
    let seeded = store.ops().len();

    let result = cc
        .execute(
            &ReconcileContext::new(),
            vec![
                Action::store_result(
                    ResultSlot::new(),
                    Action::get("MeterBase", owner.key()),
                ),
                Action::update_status_condition(owner.clone(), installing_condition()),
                // Never reached: the status write requeues.
                Action::delete(owner.clone()),
            ],
        )
        .await;

    assert!(result.is(ResultStatus::Requeue));
    assert_eq!(
        ops_after(&store, seeded),
        vec![
            StoreOp::Get(owner.key()),
            StoreOp::UpdateStatus(owner.key())
        ]
    );

    let fetched = store.get("MeterBase", &owner.key()).await.map_err(Error::from)?;
    assert!(fetched.status.conditions.is_true("Installing"));
    Ok(())
}

// The Go suite's "should get and update": drift detected by the patch
// checker leads to exactly one update.
#[tokio::test]
async fn detected_drift_updates_exactly_once() -> Result<()> {
    let (cc, store) = harness();

    let annotator = Annotator::default();
    let mut pod = Object::new("Pod", "ns", "meterbase-pod").with_spec(json!({"image": "v1"}));
    annotator.set_last_applied(&mut pod)?;
    let pod = store.create(&pod).await.map_err(Error::from)?;
    let seeded = store.ops().len();

    let key = pod.key();
    let get_result = ResultSlot::new();
    let checker = PatchChecker::default();
    let branch_slot = get_result.clone();

    let result = cc
        .execute(
            &ReconcileContext::new(),
            vec![
                Action::store_result(get_result.clone(), Action::get("Pod", key.clone())),
                Action::call(move || {
                    let current = branch_slot
                        .value()
                        .ok_or_else(|| Error::decision("get result missing"))?;
                    let mut desired = current.clone();
                    desired = desired.with_annotation("foo", "bar");
                    if checker.check_patch(&current, &desired)? {
                        return Ok(Some(Action::update(desired)));
                    }
                    Ok(None)
                }),
            ],
        )
        .await;

    assert!(result.is(ResultStatus::Requeue));
    assert_eq!(
        ops_after(&store, seeded),
        vec![StoreOp::Get(key.clone()), StoreOp::Update(key.clone())]
    );

    let fetched = store.get("Pod", &key).await.map_err(Error::from)?;
    assert_eq!(
        fetched.metadata.annotations.get("foo"),
        Some(&"bar".to_string())
    );
    Ok(())
}

// An erroring action stops the pipeline; nothing after it executes.
#[tokio::test]
async fn error_short_circuits_remaining_actions() {
    let (cc, store) = harness();

    let result = cc
        .execute(
            &ReconcileContext::new(),
            vec![
                Action::update(Object::new("Pod", "ns", "ghost")),
                Action::create(Object::new("Pod", "ns", "never-created")),
                Action::delete(Object::new("Pod", "ns", "never-deleted")),
            ],
        )
        .await;

    assert!(result.is(ResultStatus::Error));
    assert!(result.err.is_some());
    assert_eq!(store.ops(), vec![StoreOp::Update(ObjectKey::new("ns", "ghost"))]);
}

// Cancelling mid-pipeline halts before the next store call.
#[tokio::test]
async fn cancellation_mid_pipeline_halts_with_cancelled_error() {
    let (cc, store) = harness();
    let ctx = ReconcileContext::new();

    let cancel_handle = ctx.clone();
    let result = cc
        .execute(
            &ctx,
            vec![
                Action::call(move || {
                    cancel_handle.cancel();
                    Ok(None)
                }),
                Action::create(Object::new("Pod", "ns", "never")),
            ],
        )
        .await;

    assert!(result.is(ResultStatus::Error));
    assert_eq!(result.err, Some(Error::Cancelled));
    assert!(store.ops().is_empty());
}

// Concurrent reconciliations for different resources share only the client.
#[tokio::test]
async fn concurrent_invocations_do_not_interfere() -> Result<()> {
    let store = Arc::new(RecordingStore::new(MemoryStore::new()));
    let cc = Arc::new(ClientCommand::new(store.clone()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let cc = cc.clone();
        handles.push(tokio::spawn(async move {
            let pod = Object::new("Pod", "ns", format!("pod-{i}"));
            cc.execute(&ReconcileContext::new(), vec![Action::create(pod)])
                .await
        }));
    }

    for handle in handles {
        let result = handle.await.map_err(|e| Error::decision(e.to_string()))?;
        assert!(result.is(ResultStatus::Requeue));
    }
    assert_eq!(store.ops().len(), 8);
    Ok(())
}
