//! Results of engine operations.

use crate::{Case, LedgerEntry, RemoteError};

/// What happened to the downstream call made after commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteOutcome {
    Delivered,
    Failed(RemoteError),
    /// The flow does not call downstream.
    NotRequired,
}

impl RemoteOutcome {
    pub(crate) fn from_result(result: Result<(), RemoteError>) -> Self {
        match result {
            Ok(()) => Self::Delivered,
            Err(err) => Self::Failed(err),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseCreated {
    pub case: Case,
    pub balance: i64,
    pub entry_id: i32,
    pub remote: RemoteOutcome,
}

impl CaseCreated {
    /// Whether the downstream system accepted the case.
    pub fn completed(&self) -> bool {
        self.remote == RemoteOutcome::Delivered
    }
}

/// What happened to the unit's attached file after a cancellation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileCleanup {
    NotAttached,
    Removed,
    /// Logged and left behind; the cancellation still stands.
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseCanceled {
    pub case: Case,
    pub balance: i64,
    pub entry_id: i32,
    pub notifications: Vec<i32>,
    pub file_cleanup: FileCleanup,
    pub remote: RemoteOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusUpdate {
    Updated(Case),
    Canceled(CaseCanceled),
}

impl StatusUpdate {
    pub fn case(&self) -> &Case {
        match self {
            Self::Updated(case) => case,
            Self::Canceled(canceled) => &canceled.case,
        }
    }
}

/// Result of an allocation or revocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreditChange {
    pub entry_id: i32,
    pub balance: i64,
}

/// A ledger entry with the balance right after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRow {
    pub entry: LedgerEntry,
    pub balance_after: i64,
}
