//! Users table (minimal entity).
//!
//! Authentication lives outside the engine. It only needs a user's identity
//! snapshot for ledger rows, the email forwarded downstream, and which account
//! is the house account.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub employee_id: String,
    pub name: String,
    pub email: Option<String>,
    pub is_house: bool,
}

/// A user to register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub employee_id: String,
    pub name: String,
    pub email: Option<String>,
    pub is_house: bool,
}

impl NewUser {
    #[must_use]
    pub fn new(employee_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            name: name.into(),
            email: None,
            is_house: false,
        }
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn house(mut self) -> Self {
        self.is_house = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub employee_id: String,
    pub name: String,
    pub email: Option<String>,
    pub is_house: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewUser> for ActiveModel {
    fn from(user: &NewUser) -> Self {
        Self {
            id: ActiveValue::NotSet,
            employee_id: ActiveValue::Set(user.employee_id.clone()),
            name: ActiveValue::Set(user.name.clone()),
            email: ActiveValue::Set(user.email.clone()),
            is_house: ActiveValue::Set(user.is_house),
        }
    }
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            employee_id: model.employee_id,
            name: model.name,
            email: model.email,
            is_house: model.is_house,
        }
    }
}
