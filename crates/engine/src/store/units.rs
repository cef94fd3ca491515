use sea_orm::{ActiveValue, SqlErr, prelude::*};

use crate::{EngineError, NewUnit, ResultEngine, Unit, UnitOfWork, units};

pub async fn find(uow: &UnitOfWork, key: &str) -> ResultEngine<Option<Unit>> {
    Ok(units::Entity::find_by_id(key.to_string())
        .one(uow.conn())
        .await?
        .map(Unit::from))
}

pub async fn insert(uow: &UnitOfWork, unit: &NewUnit) -> ResultEngine<Unit> {
    let model = units::ActiveModel::from(unit)
        .insert(uow.conn())
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                EngineError::StateConflict(format!("unit {} already exists", unit.key))
            }
            _ => EngineError::Database(err),
        })?;
    Ok(Unit::from(model))
}

pub async fn mark_registered(uow: &UnitOfWork, key: &str) -> ResultEngine<()> {
    set(uow, key, |unit| unit.registered = ActiveValue::Set(true)).await
}

/// Detaches the unit's file.
pub async fn clear_file(uow: &UnitOfWork, key: &str) -> ResultEngine<()> {
    set(uow, key, |unit| unit.file_path = ActiveValue::Set(None)).await
}

async fn set(
    uow: &UnitOfWork,
    key: &str,
    apply: impl FnOnce(&mut units::ActiveModel),
) -> ResultEngine<()> {
    let model = units::Entity::find_by_id(key.to_string())
        .one(uow.conn())
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("unit {key} not found")))?;
    let mut active: units::ActiveModel = model.into();
    apply(&mut active);
    active.update(uow.conn()).await?;
    Ok(())
}
