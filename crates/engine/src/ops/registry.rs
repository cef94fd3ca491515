//! Seeding and lookup of the records cases refer to.

use crate::{
    EngineError, NewUnit, NewUser, ResultEngine, Unit, User, coordinator::with_uow, store,
};

use super::Engine;

impl Engine {
    pub async fn register_user(&self, user: NewUser) -> ResultEngine<User> {
        let employee_id = user.employee_id.trim();
        if employee_id.is_empty() {
            return Err(EngineError::Validation(
                "employee id must not be empty".to_string(),
            ));
        }
        let user = NewUser {
            employee_id: employee_id.to_string(),
            ..user
        };
        let created = with_uow!(self, |uow| store::users::insert(&uow, &user).await)?;
        tracing::info!(user_id = created.id, is_house = created.is_house, "user registered");
        Ok(created)
    }

    pub async fn user(&self, user_id: i32) -> ResultEngine<Option<User>> {
        with_uow!(self, |uow| store::users::find_by_id(&uow, user_id).await)
    }

    pub async fn user_by_employee_id(&self, employee_id: &str) -> ResultEngine<Option<User>> {
        with_uow!(self, |uow| {
            store::users::find_by_employee_id(&uow, employee_id).await
        })
    }

    pub async fn house_account(&self) -> ResultEngine<Option<User>> {
        with_uow!(self, |uow| store::users::find_house(&uow).await)
    }

    pub async fn register_unit(&self, unit: NewUnit) -> ResultEngine<Unit> {
        if unit.key.trim().is_empty() {
            return Err(EngineError::Validation(
                "unit key must not be empty".to_string(),
            ));
        }
        let created = with_uow!(self, |uow| store::units::insert(&uow, &unit).await)?;
        tracing::info!(unit_key = %created.key, "unit registered");
        Ok(created)
    }

    pub async fn unit(&self, key: &str) -> ResultEngine<Option<Unit>> {
        with_uow!(self, |uow| store::units::find(&uow, key).await)
    }
}
