use sea_orm::{QueryFilter, QueryOrder, SqlErr, prelude::*};

use crate::{EngineError, NewUser, ResultEngine, UnitOfWork, User, users};

pub async fn find_by_id(uow: &UnitOfWork, id: i32) -> ResultEngine<Option<User>> {
    Ok(users::Entity::find_by_id(id)
        .one(uow.conn())
        .await?
        .map(User::from))
}

pub async fn find_by_employee_id(uow: &UnitOfWork, employee_id: &str) -> ResultEngine<Option<User>> {
    Ok(users::Entity::find()
        .filter(users::Column::EmployeeId.eq(employee_id))
        .one(uow.conn())
        .await?
        .map(User::from))
}

/// The house account: lowest id flagged `is_house`.
pub async fn find_house(uow: &UnitOfWork) -> ResultEngine<Option<User>> {
    Ok(users::Entity::find()
        .filter(users::Column::IsHouse.eq(true))
        .order_by_asc(users::Column::Id)
        .one(uow.conn())
        .await?
        .map(User::from))
}

pub async fn insert(uow: &UnitOfWork, user: &NewUser) -> ResultEngine<User> {
    let model = users::ActiveModel::from(user)
        .insert(uow.conn())
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::StateConflict(format!(
                "employee id {} is already registered",
                user.employee_id
            )),
            _ => EngineError::Database(err),
        })?;
    Ok(User::from(model))
}
