use chrono::Utc;
use sea_orm::{QueryFilter, SqlErr, prelude::*, sea_query::Expr};

use crate::{Case, CaseStatus, EngineError, ResultEngine, UnitOfWork, cases};

pub async fn insert(uow: &UnitOfWork, unit_key: &str, owner_user_id: i32) -> ResultEngine<Case> {
    let model = cases::ActiveModel::todo(unit_key, owner_user_id)
        .insert(uow.conn())
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                EngineError::StateConflict(format!("a case for unit {unit_key} already exists"))
            }
            _ => EngineError::Database(err),
        })?;
    Case::try_from(model)
}

pub async fn find_by_id(uow: &UnitOfWork, id: i32) -> ResultEngine<Option<Case>> {
    cases::Entity::find_by_id(id)
        .one(uow.conn())
        .await?
        .map(Case::try_from)
        .transpose()
}

pub async fn find_by_unit_key(uow: &UnitOfWork, unit_key: &str) -> ResultEngine<Option<Case>> {
    cases::Entity::find()
        .filter(cases::Column::UnitKey.eq(unit_key))
        .one(uow.conn())
        .await?
        .map(Case::try_from)
        .transpose()
}

/// Moves case `id` to `to` only while its stored status is one of `from`.
///
/// Returns whether the row was written.
pub async fn transition(
    uow: &UnitOfWork,
    id: i32,
    from: &[CaseStatus],
    to: CaseStatus,
) -> ResultEngine<bool> {
    let res = cases::Entity::update_many()
        .col_expr(cases::Column::Status, Expr::value(to.as_str()))
        .col_expr(cases::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(cases::Column::Id.eq(id))
        .filter(cases::Column::Status.is_in(from.iter().map(|s| s.as_str())))
        .exec(uow.conn())
        .await?;
    Ok(res.rows_affected == 1)
}
