use sea_orm::{ConnectionTrait, Statement, prelude::*};

use crate::{EngineError, ResultEngine, UnitOfWork};

/// Live sum of every active ledger quantity.
pub async fn get_balance(uow: &UnitOfWork) -> ResultEngine<i64> {
    let backend = uow.conn().get_database_backend();
    let stmt = Statement::from_sql_and_values(
        backend,
        "SELECT COALESCE(SUM(quantity), 0) AS balance FROM credit_ledger WHERE active = ?",
        vec![true.into()],
    );
    let row = uow
        .conn()
        .query_one(stmt)
        .await?
        .ok_or_else(|| EngineError::Database(DbErr::RecordNotFound("balance".to_string())))?;
    Ok(row.try_get::<i64>("", "balance")?)
}
