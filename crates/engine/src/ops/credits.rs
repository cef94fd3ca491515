use crate::{
    ActorSnapshot, CreditChange, EngineError, HistoryRow, LedgerCategory, LedgerEntry,
    LedgerQuery, MAX_ADJUSTMENT, MAX_BALANCE, NewLedgerEntry, NotificationKind, ResultEngine,
    UnitOfWork, coordinator::with_uow, store,
};

use super::Engine;

impl Engine {
    /// Current balance, read in its own unit of work.
    pub async fn balance(&self) -> ResultEngine<i64> {
        with_uow!(self, |uow| store::balance::get_balance(&uow).await)
    }

    /// Most recent active ledger entry, if any.
    pub async fn latest_entry(&self) -> ResultEngine<Option<LedgerEntry>> {
        with_uow!(self, |uow| store::ledger::find_latest(&uow).await)
    }

    /// Adds `quantity` credits to the tenant balance.
    ///
    /// The entry and the house notification commit together or not at all.
    pub async fn allocate(&self, quantity: i64) -> ResultEngine<CreditChange> {
        validate_adjustment(quantity)?;
        let change = with_uow!(self, |uow| {
            uow.lock_ledger().await?;
            let house = store::users::find_house(&uow)
                .await?
                .ok_or_else(|| EngineError::NotFound("house account".to_string()))?;
            let entry = NewLedgerEntry::new(
                ActorSnapshot::house(Some(&house)),
                LedgerCategory::Allocate,
                quantity,
            );
            let (entry_id, balance) = self.apply_ledger_delta(&uow, &entry).await?;
            store::notifications::create(
                &uow,
                house.id,
                &NotificationKind::CreditAllocated { credits: quantity },
            )
            .await?;
            Ok(CreditChange { entry_id, balance })
        })?;
        tracing::info!(quantity, balance = change.balance, "credits allocated");
        Ok(change)
    }

    /// Removes `quantity` credits from the tenant balance.
    pub async fn revoke(&self, quantity: i64) -> ResultEngine<CreditChange> {
        validate_adjustment(quantity)?;
        let change = with_uow!(self, |uow| {
            uow.lock_ledger().await?;
            let house = store::users::find_house(&uow)
                .await?
                .ok_or_else(|| EngineError::NotFound("house account".to_string()))?;
            let entry = NewLedgerEntry::new(
                ActorSnapshot::house(Some(&house)),
                LedgerCategory::Revoke,
                -quantity,
            );
            let (entry_id, balance) = self.apply_ledger_delta(&uow, &entry).await?;
            store::notifications::create(
                &uow,
                house.id,
                &NotificationKind::CreditRevoked { credits: quantity },
            )
            .await?;
            Ok(CreditChange { entry_id, balance })
        })?;
        tracing::info!(quantity, balance = change.balance, "credits revoked");
        Ok(change)
    }

    /// Active entries matching `query`, each with the running balance after
    /// it, plus the number of matching entries before paging.
    pub async fn credit_history(
        &self,
        query: &LedgerQuery,
    ) -> ResultEngine<(Vec<HistoryRow>, u64)> {
        with_uow!(self, |uow| store::ledger::history(&uow, query).await)
    }

    /// Appends `entry` if the resulting balance stays within bounds.
    ///
    /// The caller must hold the ledger lock in `uow`. Returns the entry id and
    /// the balance after it. A debit landing exactly on the low-credit
    /// threshold also warns the house account.
    pub(crate) async fn apply_ledger_delta(
        &self,
        uow: &UnitOfWork,
        entry: &NewLedgerEntry,
    ) -> ResultEngine<(i32, i64)> {
        let before = store::balance::get_balance(uow).await?;
        let after = before + entry.quantity;
        if after < 0 {
            return Err(EngineError::InvariantViolation(format!(
                "insufficient credit: balance {before}, change {}",
                entry.quantity
            )));
        }
        if after > MAX_BALANCE {
            return Err(EngineError::InvariantViolation(format!(
                "balance would exceed {MAX_BALANCE}: balance {before}, change {}",
                entry.quantity
            )));
        }

        let entry_id = store::ledger::append(uow, entry).await?;

        if entry.quantity < 0 && after == self.low_credit_threshold {
            match store::users::find_house(uow).await? {
                Some(house) => {
                    store::notifications::create(
                        uow,
                        house.id,
                        &NotificationKind::CreditShortage { credits: after },
                    )
                    .await?;
                }
                None => tracing::info!(balance = after, "low credit; no house account to warn"),
            }
        }
        Ok((entry_id, after))
    }
}

fn validate_adjustment(quantity: i64) -> ResultEngine<()> {
    if !(1..=MAX_ADJUSTMENT).contains(&quantity) {
        return Err(EngineError::Validation(format!(
            "quantity must be between 1 and {MAX_ADJUSTMENT}, got {quantity}"
        )));
    }
    Ok(())
}
