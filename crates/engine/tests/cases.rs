mod common;

use sea_orm::{ConnectionTrait, Statement};

use common::harness;
use engine::{
    CancelCaseCmd, CaseStatus, CreateCaseCmd, EngineError, FileCleanup, LedgerCategory,
    LedgerQuery, NotificationCategory, Page, RemoteError, RemoteOutcome, StatusUpdate,
    UpdateCaseStatusCmd,
};

#[tokio::test]
async fn create_debits_one_credit_and_registers_downstream() {
    let h = harness().await;
    h.engine.allocate(50).await.unwrap();
    let unit = h.unit("U-100").await;

    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();
    assert!(created.completed());
    assert_eq!(created.balance, 49);
    assert_eq!(created.case.status, CaseStatus::Todo);
    assert_eq!(created.case.owner_user_id, Some(h.owner.id));
    assert_eq!(h.ledger_rows_of("use").await, 1);

    let sent = h.notifier.registrations();
    assert_eq!(sent.len(), 1);
    let (registration, file_path) = &sent[0];
    assert_eq!(registration.unit_key, "U-100");
    assert_eq!(registration.credit_balance, 49);
    assert_eq!(registration.owner_email.as_deref(), Some("ada@example.com"));
    assert_eq!(file_path, "/data/U-100.dcm");

    assert!(h.engine.unit(&unit).await.unwrap().unwrap().registered);
}

#[tokio::test]
async fn downstream_failure_keeps_case_and_debit() {
    let h = harness().await;
    h.engine.allocate(50).await.unwrap();
    h.notifier
        .fail_with(RemoteError::Unavailable("connection refused".to_string()));
    let unit = h.unit("U-101").await;

    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();
    assert!(!created.completed());
    assert!(matches!(
        created.remote,
        RemoteOutcome::Failed(RemoteError::Unavailable(_))
    ));
    assert_eq!(h.engine.balance().await.unwrap(), 49);
    let case = h.engine.case(created.case.id).await.unwrap().unwrap();
    assert_eq!(case.status, CaseStatus::Todo);
}

#[tokio::test]
async fn create_without_credit_is_rejected_with_no_case() {
    let h = harness().await;
    let unit = h.unit("U-102").await;

    let err = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvariantViolation(_)));
    assert!(h.engine.case_by_unit_key(&unit).await.unwrap().is_none());
    assert!(!h.engine.unit(&unit).await.unwrap().unwrap().registered);
    assert!(h.notifier.registrations().is_empty());
}

#[tokio::test]
async fn create_checks_owner_unit_and_file() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-103").await;

    assert!(matches!(
        h.engine.create_case(CreateCaseCmd::new(&unit, 999)).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        h.engine
            .create_case(CreateCaseCmd::new("missing", h.owner.id))
            .await,
        Err(EngineError::NotFound(_))
    ));

    h.engine
        .register_unit(engine::NewUnit::new("U-bare", serde_json::json!({})))
        .await
        .unwrap();
    assert!(matches!(
        h.engine
            .create_case(CreateCaseCmd::new("U-bare", h.owner.id))
            .await,
        Err(EngineError::NotFound(_))
    ));
    assert_eq!(h.engine.balance().await.unwrap(), 5);
}

#[tokio::test]
async fn a_unit_is_registered_once() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-104").await;
    h.engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();

    let err = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "STATE_CONFLICT");
    assert_eq!(h.engine.balance().await.unwrap(), 4);
}

#[tokio::test]
async fn user_cancel_refunds_and_notifies() {
    let h = harness().await;
    h.engine.allocate(50).await.unwrap();
    let unit = h.unit("U-200").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();
    assert_eq!(h.engine.balance().await.unwrap(), 49);

    let canceled = h
        .engine
        .cancel_case(CancelCaseCmd::by_user(created.case.id, h.owner.id))
        .await
        .unwrap();
    assert_eq!(canceled.balance, 50);
    assert_eq!(canceled.case.status, CaseStatus::Reject);
    assert_eq!(canceled.notifications.len(), 2);
    assert_eq!(canceled.remote, RemoteOutcome::Delivered);
    assert_eq!(canceled.file_cleanup, FileCleanup::Removed);
    assert_eq!(h.ledger_rows_of("cancel").await, 1);

    let refund = h.engine.latest_entry().await.unwrap();
    let refund = refund.unwrap();
    assert_eq!(refund.category, LedgerCategory::Cancel);
    assert_eq!(refund.quantity, 1);
    assert!(refund.is_user_initiated);
    assert_eq!(refund.owner_user_id, Some(h.owner.id));

    let rejections = h.notifier.rejections();
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].case_key, "U-200");
    assert_eq!(rejections[0].owner_email.as_deref(), Some("ada@example.com"));

    assert_eq!(h.files.deleted(), vec!["/data/U-200.dcm".to_string()]);
    assert_eq!(h.engine.unit(&unit).await.unwrap().unwrap().file_path, None);

    let (owner_notes, _) = h
        .engine
        .notifications(h.owner.id, Page::default())
        .await
        .unwrap();
    let categories: Vec<_> = owner_notes.iter().map(|n| n.category).collect();
    assert!(categories.contains(&NotificationCategory::CaseCanceled));
    assert!(categories.contains(&NotificationCategory::FileDeleted));
}

#[tokio::test]
async fn cancel_by_house_owner_notifies_once() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-201").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.house.id))
        .await
        .unwrap();

    let canceled = h
        .engine
        .cancel_case(CancelCaseCmd::by_user(created.case.id, h.house.id))
        .await
        .unwrap();
    assert_eq!(canceled.notifications.len(), 1);
}

#[tokio::test]
async fn users_cannot_cancel_a_case_in_progress() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-202").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();
    h.engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::InProgress))
        .await
        .unwrap();

    let err = h
        .engine
        .cancel_case(CancelCaseCmd::by_user(created.case.id, h.owner.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
    assert_eq!(h.engine.balance().await.unwrap(), 4);
    assert_eq!(h.ledger_rows_of("cancel").await, 0);
}

#[tokio::test]
async fn system_cancel_from_in_progress_refunds_without_callback() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-203").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();
    h.engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::InProgress))
        .await
        .unwrap();

    let canceled = h
        .engine
        .cancel_case(CancelCaseCmd::by_system(created.case.id))
        .await
        .unwrap();
    assert_eq!(canceled.case.status, CaseStatus::Reject);
    assert_eq!(canceled.balance, 5);
    assert_eq!(canceled.remote, RemoteOutcome::NotRequired);
    assert!(h.notifier.rejections().is_empty());

    let refund = h.engine.latest_entry().await.unwrap().unwrap();
    assert!(!refund.is_user_initiated);
    assert_eq!(refund.owner_user_id, None);
    assert_eq!(refund.employee_id, h.house.employee_id);
}

#[tokio::test]
async fn done_case_cannot_be_canceled() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-300").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();
    h.engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::InProgress))
        .await
        .unwrap();
    h.engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::Done))
        .await
        .unwrap();

    let rows = h.ledger_rows().await;
    let notes = h.notification_rows().await;
    for cmd in [
        CancelCaseCmd::by_user(created.case.id, h.owner.id),
        CancelCaseCmd::by_system(created.case.id),
    ] {
        let err = h.engine.cancel_case(cmd).await.unwrap_err();
        assert!(matches!(err, EngineError::StateConflict(_)));
    }
    let err = h
        .engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::Reject))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));

    assert_eq!(h.ledger_rows().await, rows);
    assert_eq!(h.notification_rows().await, notes);
    assert_eq!(h.engine.balance().await.unwrap(), 4);
    assert_eq!(
        h.engine.case(created.case.id).await.unwrap().unwrap().status,
        CaseStatus::Done
    );
}

#[tokio::test]
async fn rejected_case_is_refunded_exactly_once() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-301").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();

    h.engine
        .cancel_case(CancelCaseCmd::by_user(created.case.id, h.owner.id))
        .await
        .unwrap();
    assert!(matches!(
        h.engine
            .cancel_case(CancelCaseCmd::by_system(created.case.id))
            .await,
        Err(EngineError::StateConflict(_))
    ));

    let (refunds, total) = h
        .engine
        .credit_history(&LedgerQuery::new().category(LedgerCategory::Cancel))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(refunds[0].entry.related_case_key.as_deref(), Some("U-301"));
    assert_eq!(h.engine.balance().await.unwrap(), 5);
}

#[tokio::test]
async fn cancel_of_unknown_case_or_removed_owner_is_not_found() {
    let h = harness().await;
    assert!(matches!(
        h.engine.cancel_case(CancelCaseCmd::by_system(404)).await,
        Err(EngineError::NotFound(_))
    ));

    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-302").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();
    let backend = h.db.get_database_backend();
    h.db.execute(Statement::from_string(
        backend,
        format!("DELETE FROM users WHERE id = {}", h.owner.id),
    ))
    .await
    .unwrap();

    let err = h
        .engine
        .cancel_case(CancelCaseCmd::by_system(created.case.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let (uses, _) = h
        .engine
        .credit_history(&LedgerQuery::new().category(LedgerCategory::Use))
        .await
        .unwrap();
    assert_eq!(uses[0].entry.owner_user_id, None);
    assert_eq!(uses[0].entry.employee_id, "EMP-001");
}

#[tokio::test]
async fn file_cleanup_failure_does_not_undo_the_cancel() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    h.files.fail();
    let unit = h.unit("U-400").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();

    let canceled = h
        .engine
        .cancel_case(CancelCaseCmd::by_user(created.case.id, h.owner.id))
        .await
        .unwrap();
    assert!(matches!(canceled.file_cleanup, FileCleanup::Failed(_)));
    assert_eq!(canceled.case.status, CaseStatus::Reject);
    assert_eq!(h.engine.balance().await.unwrap(), 5);
}

#[tokio::test]
async fn downstream_failure_on_user_cancel_is_surfaced_after_commit() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-401").await;
    let created = h
        .engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();
    h.notifier.fail_with(RemoteError::NotFound);

    let err = h
        .engine
        .cancel_case(CancelCaseCmd::by_user(created.case.id, h.owner.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Remote {
            case_id: created.case.id,
            source: RemoteError::NotFound,
        }
    );
    assert_eq!(err.code(), "REMOTE_NOT_FOUND");

    let case = h.engine.case(created.case.id).await.unwrap().unwrap();
    assert_eq!(case.status, CaseStatus::Reject);
    assert_eq!(h.engine.balance().await.unwrap(), 5);
}

#[tokio::test]
async fn update_status_walks_forward_edges_only() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-500").await;
    h.engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();

    let err = h
        .engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::Done))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
    let err = h
        .engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::Todo))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));

    let update = h
        .engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::InProgress))
        .await
        .unwrap();
    assert!(matches!(update, StatusUpdate::Updated(_)));
    assert_eq!(update.case().status, CaseStatus::InProgress);

    let update = h
        .engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::Done))
        .await
        .unwrap();
    assert_eq!(update.case().status, CaseStatus::Done);
    assert_eq!(h.ledger_rows_of("cancel").await, 0);
    assert_eq!(h.engine.balance().await.unwrap(), 4);

    let err = h
        .engine
        .update_case_status(UpdateCaseStatusCmd::new(&unit, CaseStatus::InProgress))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)));
}

#[tokio::test]
async fn update_to_reject_with_requestor_is_a_user_cancel() {
    let h = harness().await;
    h.engine.allocate(5).await.unwrap();
    let unit = h.unit("U-501").await;
    h.engine
        .create_case(CreateCaseCmd::new(&unit, h.owner.id))
        .await
        .unwrap();

    let update = h
        .engine
        .update_case_status(
            UpdateCaseStatusCmd::new(&unit, CaseStatus::Reject).requestor(h.owner.id),
        )
        .await
        .unwrap();
    let StatusUpdate::Canceled(canceled) = update else {
        panic!("expected a cancellation");
    };
    assert_eq!(canceled.balance, 5);
    assert_eq!(canceled.remote, RemoteOutcome::Delivered);
    assert_eq!(h.notifier.rejections().len(), 1);
}

#[tokio::test]
async fn update_status_of_unknown_unit_is_not_found() {
    let h = harness().await;
    let err = h
        .engine
        .update_case_status(UpdateCaseStatusCmd::new("nope", CaseStatus::InProgress))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}
