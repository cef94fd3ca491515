use crate::{
    ActorSnapshot, CancelCaseCmd, CancelInitiator, Case, CaseCanceled, CaseCreated,
    CaseRegistration, CaseRejection, CaseStatus, CreateCaseCmd, EngineError, FileCleanup,
    LedgerCategory, NewLedgerEntry, NotificationKind, RemoteOutcome, ResultEngine, StatusUpdate,
    UpdateCaseStatusCmd, User, coordinator::with_uow, store,
};

use super::Engine;

const USER_CANCELABLE: &[CaseStatus] = &[CaseStatus::Todo];
const SYSTEM_CANCELABLE: &[CaseStatus] = &[CaseStatus::Todo, CaseStatus::InProgress];

/// Local state of a cancellation once its unit of work committed.
struct CommittedCancel {
    case: Case,
    owner: User,
    entry_id: i32,
    balance: i64,
    notifications: Vec<i32>,
    file_path: Option<String>,
}

impl Engine {
    pub async fn case(&self, case_id: i32) -> ResultEngine<Option<Case>> {
        with_uow!(self, |uow| store::cases::find_by_id(&uow, case_id).await)
    }

    pub async fn case_by_unit_key(&self, unit_key: &str) -> ResultEngine<Option<Case>> {
        with_uow!(self, |uow| store::cases::find_by_unit_key(&uow, unit_key).await)
    }

    /// Registers a `TODO` case for a unit and debits one credit.
    ///
    /// After commit the case is sent downstream. A downstream failure leaves
    /// the case and its debit in place and is reported through
    /// [`CaseCreated::remote`].
    pub async fn create_case(&self, cmd: CreateCaseCmd) -> ResultEngine<CaseCreated> {
        let CreateCaseCmd {
            unit_key,
            owner_user_id,
        } = cmd;

        let (case, entry_id, balance, registration, file_path) = with_uow!(self, |uow| {
            uow.lock_ledger().await?;
            let owner = store::users::find_by_id(&uow, owner_user_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("user {owner_user_id}")))?;
            let unit = store::units::find(&uow, &unit_key)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("unit {unit_key}")))?;
            let file_path = unit
                .file_path
                .clone()
                .ok_or_else(|| EngineError::NotFound(format!("file of unit {unit_key}")))?;
            if unit.registered || store::cases::find_by_unit_key(&uow, &unit_key).await?.is_some()
            {
                return Err(EngineError::StateConflict(format!(
                    "unit {unit_key} is already registered"
                )));
            }

            let case = store::cases::insert(&uow, &unit_key, owner.id).await?;
            store::units::mark_registered(&uow, &unit_key).await?;
            let entry = NewLedgerEntry::new(ActorSnapshot::user(&owner), LedgerCategory::Use, -1)
                .related_case_key(&unit_key)
                .user_initiated(true);
            let (entry_id, balance) = self.apply_ledger_delta(&uow, &entry).await?;

            let registration = CaseRegistration {
                unit_key: unit_key.clone(),
                payload: unit.payload,
                credit_balance: balance,
                owner_email: owner.email,
            };
            Ok((case, entry_id, balance, registration, file_path))
        })?;
        tracing::info!(case_id = case.id, unit_key = %case.unit_key, balance, "case created");

        let remote = RemoteOutcome::from_result(
            self.notifier.register_case(&registration, &file_path).await,
        );
        if let RemoteOutcome::Failed(err) = &remote {
            tracing::warn!(
                case_id = case.id,
                error = %err,
                "downstream registration failed; case and debit stay committed"
            );
        }

        Ok(CaseCreated {
            case,
            balance,
            entry_id,
            remote,
        })
    }

    /// Rejects a case and refunds its credit.
    ///
    /// Users may cancel only `TODO` cases; the downstream system may cancel
    /// any case that has not completed. After commit the attached file is
    /// removed in a separate unit of work, then user cancellations are sent
    /// downstream. A downstream failure returns [`EngineError::Remote`] while
    /// the local rejection stays committed.
    pub async fn cancel_case(&self, cmd: CancelCaseCmd) -> ResultEngine<CaseCanceled> {
        let CancelCaseCmd { case_id, initiator } = cmd;

        let committed = with_uow!(self, |uow| {
            uow.lock_ledger().await?;
            let case = store::cases::find_by_id(&uow, case_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("case {case_id}")))?;
            let owner = match case.owner_user_id {
                Some(owner_id) => store::users::find_by_id(&uow, owner_id).await?,
                None => None,
            }
            .ok_or_else(|| EngineError::NotFound(format!("owner of case {case_id}")))?;

            case.status.ensure_transition(CaseStatus::Reject)?;
            let (actor, from): (ActorSnapshot, &[CaseStatus]) = match initiator {
                CancelInitiator::User { requestor_id } => {
                    let requestor = store::users::find_by_id(&uow, requestor_id)
                        .await?
                        .ok_or_else(|| EngineError::NotFound(format!("user {requestor_id}")))?;
                    if case.status != CaseStatus::Todo {
                        return Err(EngineError::StateConflict(format!(
                            "case {case_id} is {}; users can only cancel {} cases",
                            case.status,
                            CaseStatus::Todo
                        )));
                    }
                    (ActorSnapshot::user(&requestor), USER_CANCELABLE)
                }
                CancelInitiator::System => {
                    let house = store::users::find_house(&uow).await?;
                    (ActorSnapshot::house(house.as_ref()), SYSTEM_CANCELABLE)
                }
            };

            if !store::cases::transition(&uow, case_id, from, CaseStatus::Reject).await? {
                return Err(EngineError::StateConflict(format!(
                    "case {case_id} changed while being canceled"
                )));
            }
            let entry = NewLedgerEntry::new(actor, LedgerCategory::Cancel, 1)
                .related_case_key(&case.unit_key)
                .user_initiated(initiator.is_user());
            let (entry_id, balance) = self.apply_ledger_delta(&uow, &entry).await?;

            let mut notifications = Vec::new();
            let house = store::users::find_house(&uow).await?;
            if let Some(house) = &house {
                notifications.push(
                    store::notifications::create(&uow, house.id, &NotificationKind::CaseCanceled)
                        .await?,
                );
            }
            if house.as_ref().map(|h| h.id) != Some(owner.id) {
                notifications.push(
                    store::notifications::create(&uow, owner.id, &NotificationKind::CaseCanceled)
                        .await?,
                );
            }

            let case = store::cases::find_by_id(&uow, case_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("case {case_id}")))?;
            let file_path = store::units::find(&uow, &case.unit_key)
                .await?
                .and_then(|unit| unit.file_path);
            Ok(CommittedCancel {
                case,
                owner,
                entry_id,
                balance,
                notifications,
                file_path,
            })
        })?;
        tracing::info!(
            case_id,
            user_initiated = initiator.is_user(),
            balance = committed.balance,
            "case canceled"
        );

        let CommittedCancel {
            case,
            owner,
            entry_id,
            balance,
            notifications,
            file_path,
        } = committed;

        let file_cleanup = match &file_path {
            Some(path) => self.cleanup_unit_file(&case.unit_key, path, owner.id).await,
            None => FileCleanup::NotAttached,
        };

        let remote = match initiator {
            CancelInitiator::User { .. } => {
                let rejection = CaseRejection {
                    case_key: case.unit_key.clone(),
                    owner_email: owner.email.clone(),
                };
                if let Err(source) = self.notifier.reject_case(&rejection).await {
                    tracing::warn!(
                        case_id,
                        error = %source,
                        "case rejected locally but downstream was not told"
                    );
                    return Err(EngineError::Remote { case_id, source });
                }
                RemoteOutcome::Delivered
            }
            CancelInitiator::System => RemoteOutcome::NotRequired,
        };

        Ok(CaseCanceled {
            case,
            balance,
            entry_id,
            notifications,
            file_cleanup,
            remote,
        })
    }

    /// Moves the case of a unit to `cmd.status`.
    ///
    /// `REJECT` is a cancellation: with a requestor it is a user cancellation,
    /// without one a system cancellation. Other statuses are plain writes with
    /// no ledger effect.
    pub async fn update_case_status(&self, cmd: UpdateCaseStatusCmd) -> ResultEngine<StatusUpdate> {
        let UpdateCaseStatusCmd {
            unit_key,
            status,
            requestor_id,
        } = cmd;

        let case = self
            .case_by_unit_key(&unit_key)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("case for unit {unit_key}")))?;
        if case.status.is_terminal() {
            return Err(EngineError::StateConflict(format!(
                "case {} is already {}",
                case.id, case.status
            )));
        }

        if status == CaseStatus::Reject {
            let cancel = match requestor_id {
                Some(requestor_id) => CancelCaseCmd::by_user(case.id, requestor_id),
                None => CancelCaseCmd::by_system(case.id),
            };
            return self.cancel_case(cancel).await.map(StatusUpdate::Canceled);
        }

        case.status.ensure_transition(status)?;
        let updated = with_uow!(self, |uow| {
            if !store::cases::transition(&uow, case.id, &[case.status], status).await? {
                return Err(EngineError::StateConflict(format!(
                    "case {} changed while being updated",
                    case.id
                )));
            }
            store::cases::find_by_id(&uow, case.id)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("case {}", case.id)))
        })?;
        tracing::info!(case_id = updated.id, status = %updated.status, "case status updated");
        Ok(StatusUpdate::Updated(updated))
    }

    /// Deletes the attached file, then detaches it from the unit and tells the
    /// owner in a unit of work of its own. Failures are logged only.
    async fn cleanup_unit_file(&self, unit_key: &str, path: &str, owner_id: i32) -> FileCleanup {
        let removed = self.files.delete(path).await;
        if let Err(err) = &removed {
            tracing::warn!(unit_key, error = %err, "failed to delete attached file");
        }
        if let Err(err) = self.detach_unit_file(unit_key, owner_id).await {
            tracing::warn!(unit_key, error = %err, "failed to detach file record");
        }
        match removed {
            Ok(()) => FileCleanup::Removed,
            Err(err) => FileCleanup::Failed(err.to_string()),
        }
    }

    async fn detach_unit_file(&self, unit_key: &str, owner_id: i32) -> ResultEngine<()> {
        with_uow!(self, |uow| {
            store::units::clear_file(&uow, unit_key).await?;
            store::notifications::create(
                &uow,
                owner_id,
                &NotificationKind::FileDeleted {
                    unit_key: unit_key.to_string(),
                },
            )
            .await?;
            Ok(())
        })
    }
}
