//! Billable cases and their status machine.
//!
//! ```text
//! TODO ──► IN_PROGRESS ──► DONE
//!   │           │
//!   └───────────┴────────► REJECT
//! ```
//!
//! `DONE` and `REJECT` are absorbing: any transition out of them is a
//! [`EngineError::StateConflict`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Todo,
    InProgress,
    Done,
    Reject,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 4] = [Self::Todo, Self::InProgress, Self::Done, Self::Reject];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
            Self::Reject => "REJECT",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Reject)
    }

    pub fn can_transition_to(self, next: CaseStatus) -> bool {
        matches!(
            (self, next),
            (Self::Todo, Self::InProgress)
                | (Self::Todo, Self::Reject)
                | (Self::InProgress, Self::Done)
                | (Self::InProgress, Self::Reject)
        )
    }

    /// Returns an error unless `self -> next` is an edge of the machine.
    pub fn ensure_transition(self, next: CaseStatus) -> ResultEngine<()> {
        if self.is_terminal() {
            return Err(EngineError::StateConflict(format!(
                "case is already {self}; no further transition is allowed"
            )));
        }
        if !self.can_transition_to(next) {
            return Err(EngineError::StateConflict(format!(
                "invalid case transition {self} -> {next}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CaseStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            "REJECT" => Ok(Self::Reject),
            other => Err(EngineError::Validation(format!(
                "invalid case status: {other}"
            ))),
        }
    }
}

impl FromStr for CaseStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.trim().to_ascii_uppercase().as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: i32,
    pub status: CaseStatus,
    pub owner_user_id: Option<i32>,
    pub unit_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub status: String,
    pub owner_user_id: Option<i32>,
    #[sea_orm(unique)]
    pub unit_key: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerUserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::units::Entity",
        from = "Column::UnitKey",
        to = "super::units::Column::Key",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Units,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::units::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Units.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// A fresh `TODO` case for `unit_key`.
    pub(crate) fn todo(unit_key: &str, owner_user_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: ActiveValue::NotSet,
            status: ActiveValue::Set(CaseStatus::Todo.as_str().to_string()),
            owner_user_id: ActiveValue::Set(Some(owner_user_id)),
            unit_key: ActiveValue::Set(unit_key.to_string()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for Case {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            status: CaseStatus::try_from(model.status.as_str())?,
            owner_user_id: model.owner_user_id,
            unit_key: model.unit_key,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
