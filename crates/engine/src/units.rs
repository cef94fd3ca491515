//! Unit-of-work records.
//!
//! A unit is the external content object a [`Case`](crate::Case) wraps. The
//! engine treats its payload as opaque JSON and only cares about the attached
//! file path and whether a case was already registered for it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub key: String,
    pub payload: serde_json::Value,
    pub file_path: Option<String>,
    pub registered: bool,
    pub created_at: DateTime<Utc>,
}

/// A unit to record.
#[derive(Clone, Debug, PartialEq)]
pub struct NewUnit {
    pub key: String,
    pub payload: serde_json::Value,
    pub file_path: Option<String>,
}

impl NewUnit {
    #[must_use]
    pub fn new(key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            payload,
            file_path: None,
        }
    }

    #[must_use]
    pub fn file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "units")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub payload: Json,
    pub file_path: Option<String>,
    pub registered: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::cases::Entity")]
    Cases,
}

impl Related<super::cases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewUnit> for ActiveModel {
    fn from(unit: &NewUnit) -> Self {
        Self {
            key: ActiveValue::Set(unit.key.clone()),
            payload: ActiveValue::Set(unit.payload.clone()),
            file_path: ActiveValue::Set(unit.file_path.clone()),
            registered: ActiveValue::Set(false),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}

impl From<Model> for Unit {
    fn from(model: Model) -> Self {
        Self {
            key: model.key,
            payload: model.payload,
            file_path: model.file_path,
            registered: model.registered,
            created_at: model.created_at,
        }
    }
}
