//! Audit notifications.
//!
//! The engine only creates notification rows; delivering them is up to a
//! subscriber outside this crate. Messages are rendered from the kind at
//! insert time.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationCategory {
    CreditAllocated,
    CreditRevoked,
    CreditShortage,
    CaseCanceled,
    FileDeleted,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreditAllocated => "credit-allocated",
            Self::CreditRevoked => "credit-revoked",
            Self::CreditShortage => "credit-shortage",
            Self::CaseCanceled => "case-canceled",
            Self::FileDeleted => "file-deleted",
        }
    }
}

impl TryFrom<&str> for NotificationCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit-allocated" => Ok(Self::CreditAllocated),
            "credit-revoked" => Ok(Self::CreditRevoked),
            "credit-shortage" => Ok(Self::CreditShortage),
            "case-canceled" => Ok(Self::CaseCanceled),
            "file-deleted" => Ok(Self::FileDeleted),
            other => Err(EngineError::Validation(format!(
                "invalid notification category: {other}"
            ))),
        }
    }
}

/// What happened, with the arguments its message needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    CreditAllocated { credits: i64 },
    CreditRevoked { credits: i64 },
    CreditShortage { credits: i64 },
    CaseCanceled,
    FileDeleted { unit_key: String },
}

impl NotificationKind {
    pub fn category(&self) -> NotificationCategory {
        match self {
            Self::CreditAllocated { .. } => NotificationCategory::CreditAllocated,
            Self::CreditRevoked { .. } => NotificationCategory::CreditRevoked,
            Self::CreditShortage { .. } => NotificationCategory::CreditShortage,
            Self::CaseCanceled => NotificationCategory::CaseCanceled,
            Self::FileDeleted { .. } => NotificationCategory::FileDeleted,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::CreditAllocated { credits } => format!("{credits} credits allocated."),
            Self::CreditRevoked { credits } => format!("{credits} credits revoked."),
            Self::CreditShortage { credits } => format!(
                "You have {credits} {} left. Please request credit allocation from the responsible distributor.",
                if *credits == 1 { "credit" } else { "credits" }
            ),
            Self::CaseCanceled => {
                "The case has been canceled, and 1 credit has been restored.".to_string()
            }
            Self::FileDeleted { unit_key } => format!("File of {unit_key} deleted."),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub category: NotificationCategory,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new(user_id: i32, kind: &NotificationKind) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            category: ActiveValue::Set(kind.category().as_str().to_string()),
            message: ActiveValue::Set(kind.message()),
            read: ActiveValue::Set(false),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}

impl TryFrom<Model> for Notification {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            category: NotificationCategory::try_from(model.category.as_str())?,
            message: model.message,
            read: model.read,
            created_at: model.created_at,
        })
    }
}
