mod common;

use std::sync::Arc;

use tokio::task::JoinSet;

use common::harness_with_file_db;
use engine::{CancelCaseCmd, CreateCaseCmd, EngineError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_revokes_never_overdraw() {
    let (h, path) = harness_with_file_db().await;
    h.engine.allocate(5).await.unwrap();

    let engine = Arc::new(h.engine.clone());
    let mut set = JoinSet::new();
    for _ in 0..10 {
        let engine = engine.clone();
        set.spawn(async move { engine.revoke(1).await });
    }

    let mut ok = 0;
    let mut rejected = 0;
    while let Some(joined) = set.join_next().await {
        match joined.unwrap() {
            Ok(_) => ok += 1,
            Err(EngineError::InvariantViolation(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ok, 5);
    assert_eq!(rejected, 5);
    assert_eq!(h.engine.balance().await.unwrap(), 0);

    drop(engine);
    drop(h);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancels_refund_once() {
    let (h, path) = harness_with_file_db().await;
    h.engine.allocate(3).await.unwrap();
    let unit = h.unit("U-race").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();

    let mut set = JoinSet::new();
    for i in 0..6 {
        let engine = h.engine.clone();
        let case_id = created.case.id;
        let owner_id = h.owner.id;
        set.spawn(async move {
            let cmd = if i % 2 == 0 {
                CancelCaseCmd::by_user(case_id, owner_id)
            } else {
                CancelCaseCmd::by_system(case_id)
            };
            engine.cancel_case(cmd).await
        });
    }

    let mut ok = 0;
    while let Some(joined) = set.join_next().await {
        match joined.unwrap() {
            Ok(_) => ok += 1,
            Err(EngineError::StateConflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(h.ledger_rows_of("cancel").await, 1);
    assert_eq!(h.engine.balance().await.unwrap(), 3);

    drop(h);
    let _ = std::fs::remove_file(path);
}
