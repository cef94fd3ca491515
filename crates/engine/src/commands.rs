//! Command structs for engine operations.
//!
//! These types group parameters for case and ledger operations, keeping call
//! sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};

use crate::{CaseStatus, EngineError, LedgerCategory, ResultEngine};

/// Register a case for a unit and debit one credit.
#[derive(Clone, Debug)]
pub struct CreateCaseCmd {
    pub unit_key: String,
    pub owner_user_id: i32,
}

impl CreateCaseCmd {
    #[must_use]
    pub fn new(unit_key: impl Into<String>, owner_user_id: i32) -> Self {
        Self {
            unit_key: unit_key.into(),
            owner_user_id,
        }
    }
}

/// Who asked for a cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelInitiator {
    /// A user, allowed only before processing starts.
    User { requestor_id: i32 },
    /// The downstream system, allowed until the case completes.
    System,
}

impl CancelInitiator {
    pub fn is_user(self) -> bool {
        matches!(self, Self::User { .. })
    }
}

/// Reject a case and refund its credit.
#[derive(Clone, Debug)]
pub struct CancelCaseCmd {
    pub case_id: i32,
    pub initiator: CancelInitiator,
}

impl CancelCaseCmd {
    #[must_use]
    pub fn by_user(case_id: i32, requestor_id: i32) -> Self {
        Self {
            case_id,
            initiator: CancelInitiator::User { requestor_id },
        }
    }

    #[must_use]
    pub fn by_system(case_id: i32) -> Self {
        Self {
            case_id,
            initiator: CancelInitiator::System,
        }
    }
}

/// Move the case of a unit to a new status.
#[derive(Clone, Debug)]
pub struct UpdateCaseStatusCmd {
    pub unit_key: String,
    pub status: CaseStatus,
    pub requestor_id: Option<i32>,
}

impl UpdateCaseStatusCmd {
    #[must_use]
    pub fn new(unit_key: impl Into<String>, status: CaseStatus) -> Self {
        Self {
            unit_key: unit_key.into(),
            status,
            requestor_id: None,
        }
    }

    /// A rejection with a requestor is a user cancellation.
    #[must_use]
    pub fn requestor(mut self, user_id: i32) -> Self {
        self.requestor_id = Some(user_id);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Zero-based page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub index: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(index: u64, limit: u64) -> Self {
        Self { index, limit }
    }

    /// Rows to skip before this page.
    ///
    /// Fails when the offset or the page size does not fit a signed 64-bit
    /// SQL value.
    pub fn offset(self) -> ResultEngine<u64> {
        let in_range = |value: u64| i64::try_from(value).is_ok();
        self.index
            .checked_mul(self.limit)
            .filter(|offset| in_range(*offset) && in_range(self.limit))
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "page {} of size {} is out of range",
                    self.index, self.limit
                ))
            })
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            index: 0,
            limit: 20,
        }
    }
}

/// Filters for the credit history.
///
/// Text filters are case-insensitive substring matches. `page = None` returns
/// every matching row.
#[derive(Clone, Debug, Default)]
pub struct LedgerQuery {
    pub categories: Vec<LedgerCategory>,
    pub employee_id: Option<String>,
    pub display_name: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub order: SortOrder,
    pub page: Option<Page>,
}

impl LedgerQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(mut self, category: LedgerCategory) -> Self {
        self.categories.push(category);
        self
    }

    #[must_use]
    pub fn employee_id(mut self, value: impl Into<String>) -> Self {
        self.employee_id = Some(value.into());
        self
    }

    #[must_use]
    pub fn display_name(mut self, value: impl Into<String>) -> Self {
        self.display_name = Some(value.into());
        self
    }

    #[must_use]
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset() {
        assert_eq!(Page::new(0, 20).offset(), Ok(0));
        assert_eq!(Page::new(3, 20).offset(), Ok(60));
        assert!(matches!(
            Page::new(u64::MAX / 2, 4).offset(),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            Page::new(0, u64::MAX).offset(),
            Err(EngineError::Validation(_))
        ));
    }
}
