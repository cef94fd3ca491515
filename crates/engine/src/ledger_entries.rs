//! Credit ledger entries.
//!
//! A [`LedgerEntry`] is a signed, immutable change of the tenant-wide credit
//! balance. The balance is never stored: it is the sum of the `quantity` of
//! every active entry.
//!
//! - positive quantities (allocations, refunds) increase the balance
//! - negative quantities (revocations, case registrations) decrease it
//!
//! Corrections are new rows; committed rows are never updated or deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, User};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerCategory {
    Allocate,
    Revoke,
    Use,
    Cancel,
}

impl LedgerCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allocate => "allocate",
            Self::Revoke => "revoke",
            Self::Use => "use",
            Self::Cancel => "cancel",
        }
    }

    /// Human label used by exports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Allocate => "Allocate",
            Self::Revoke => "Revoke",
            Self::Use => "Case Use",
            Self::Cancel => "Case Cancel",
        }
    }

    /// Whether entries of this category credit the balance.
    pub fn is_credit(self) -> bool {
        matches!(self, Self::Allocate | Self::Cancel)
    }
}

impl TryFrom<&str> for LedgerCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "allocate" => Ok(Self::Allocate),
            "revoke" => Ok(Self::Revoke),
            "use" => Ok(Self::Use),
            "cancel" => Ok(Self::Cancel),
            other => Err(EngineError::Validation(format!(
                "invalid ledger category: {other}"
            ))),
        }
    }
}

/// Point-in-time identity recorded on a ledger entry.
///
/// `user_id` is `None` for house-level entries; the employee id and name stay
/// readable even after the user is removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorSnapshot {
    pub user_id: Option<i32>,
    pub employee_id: String,
    pub display_name: String,
}

impl ActorSnapshot {
    /// Snapshot of a regular user.
    pub fn user(user: &User) -> Self {
        Self {
            user_id: Some(user.id),
            employee_id: user.employee_id.clone(),
            display_name: user.name.clone(),
        }
    }

    /// Unowned snapshot labelled after the house account, if any.
    pub fn house(house: Option<&User>) -> Self {
        match house {
            Some(house) => Self {
                user_id: None,
                employee_id: house.employee_id.clone(),
                display_name: house.name.clone(),
            },
            None => Self {
                user_id: None,
                employee_id: crate::SYSTEM_ACTOR.to_string(),
                display_name: crate::SYSTEM_ACTOR.to_string(),
            },
        }
    }
}

/// An entry that has not been appended yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub actor: ActorSnapshot,
    pub category: LedgerCategory,
    pub quantity: i64,
    pub related_case_key: Option<String>,
    pub is_user_initiated: bool,
}

impl NewLedgerEntry {
    pub fn new(actor: ActorSnapshot, category: LedgerCategory, quantity: i64) -> Self {
        Self {
            actor,
            category,
            quantity,
            related_case_key: None,
            is_user_initiated: false,
        }
    }

    #[must_use]
    pub fn related_case_key(mut self, key: impl Into<String>) -> Self {
        self.related_case_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn user_initiated(mut self, value: bool) -> Self {
        self.is_user_initiated = value;
        self
    }

    /// Rejects zero quantities and signs that disagree with the category.
    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if self.quantity == 0 {
            return Err(EngineError::Validation(
                "ledger quantity must not be 0".to_string(),
            ));
        }
        if self.category.is_credit() != (self.quantity > 0) {
            return Err(EngineError::Validation(format!(
                "quantity {} has the wrong sign for a {} entry",
                self.quantity,
                self.category.as_str()
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i32,
    pub owner_user_id: Option<i32>,
    pub employee_id: String,
    pub display_name: String,
    pub category: LedgerCategory,
    pub quantity: i64,
    pub related_case_key: Option<String>,
    pub is_user_initiated: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_ledger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_user_id: Option<i32>,
    pub employee_id: String,
    pub display_name: String,
    pub category: String,
    pub quantity: i64,
    pub related_case_key: Option<String>,
    pub is_user_initiated: bool,
    pub active: bool,
    pub created_at: DateTimeUtc,
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
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewLedgerEntry> for ActiveModel {
    fn from(entry: &NewLedgerEntry) -> Self {
        Self {
            id: ActiveValue::NotSet,
            owner_user_id: ActiveValue::Set(entry.actor.user_id),
            employee_id: ActiveValue::Set(entry.actor.employee_id.clone()),
            display_name: ActiveValue::Set(entry.actor.display_name.clone()),
            category: ActiveValue::Set(entry.category.as_str().to_string()),
            quantity: ActiveValue::Set(entry.quantity),
            related_case_key: ActiveValue::Set(entry.related_case_key.clone()),
            is_user_initiated: ActiveValue::Set(entry.is_user_initiated),
            active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner_user_id: model.owner_user_id,
            employee_id: model.employee_id,
            display_name: model.display_name,
            category: LedgerCategory::try_from(model.category.as_str())?,
            quantity: model.quantity,
            related_case_key: model.related_case_key,
            is_user_initiated: model.is_user_initiated,
            active: model.active,
            created_at: model.created_at,
        })
    }
}
