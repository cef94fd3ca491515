//! Units of work.
//!
//! A [`UnitOfWork`] owns one database transaction. Dropping a handle that was
//! neither committed nor rolled back rolls the transaction back, so every exit
//! path releases it.

use sea_orm::{
    DatabaseConnection, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{EngineError, ResultEngine, ledger_lock};

#[derive(Debug)]
pub struct UnitOfWork {
    tx: DatabaseTransaction,
}

impl UnitOfWork {
    pub async fn begin(db: &DatabaseConnection) -> ResultEngine<Self> {
        Ok(Self {
            tx: db.begin().await?,
        })
    }

    /// Connection to run statements on.
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.tx
    }

    /// Takes the ledger write lock for the rest of this unit of work.
    ///
    /// Must be the first write of any unit that reads the balance and then
    /// appends to the ledger.
    pub async fn lock_ledger(&self) -> ResultEngine<()> {
        let res = ledger_lock::Entity::update_many()
            .col_expr(
                ledger_lock::Column::Version,
                Expr::col(ledger_lock::Column::Version).add(1),
            )
            .filter(ledger_lock::Column::Id.eq(ledger_lock::LOCK_ROW_ID))
            .exec(&self.tx)
            .await?;
        if res.rows_affected != 1 {
            return Err(EngineError::Database(DbErr::RecordNotFound(
                "ledger lock row is missing".to_string(),
            )));
        }
        tracing::debug!("ledger lock acquired");
        Ok(())
    }

    pub async fn commit(self) -> ResultEngine<()> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> ResultEngine<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Run a block inside a unit of work, committing on success and rolling back on error.
macro_rules! with_uow {
    ($self:expr, |$uow:ident| $body:expr) => {{
        let $uow = $crate::coordinator::UnitOfWork::begin(&$self.database).await?;
        let result: $crate::ResultEngine<_> = async { $body }.await;
        match result {
            Ok(value) => {
                $uow.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = $uow.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }};
}

pub(crate) use with_uow;
