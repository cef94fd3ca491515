pub use cases::{Case, CaseStatus};
pub use commands::{
    CancelCaseCmd, CancelInitiator, CreateCaseCmd, LedgerQuery, Page, SortOrder,
    UpdateCaseStatusCmd,
};
pub use coordinator::UnitOfWork;
pub use error::EngineError;
pub use files::{FileStore, FileStoreError, LocalFileStore};
pub use ledger_entries::{ActorSnapshot, LedgerCategory, LedgerEntry, NewLedgerEntry};
pub use notifications::{Notification, NotificationCategory, NotificationKind};
pub use notifier::{
    CaseRegistration, CaseRejection, DownstreamNotifier, HttpNotifier, NoopNotifier, RemoteError,
};
pub use ops::{Engine, EngineBuilder};
pub use outcome::{
    CaseCanceled, CaseCreated, CreditChange, FileCleanup, HistoryRow, RemoteOutcome, StatusUpdate,
};
pub use units::{NewUnit, Unit};
pub use users::{NewUser, User};

mod cases;
mod commands;
mod coordinator;
mod error;
mod files;
mod ledger_entries;
mod ledger_lock;
mod notifications;
mod notifier;
mod ops;
mod outcome;
pub mod store;
mod units;
mod users;

pub type ResultEngine<T> = Result<T, EngineError>;

/// Upper bound of the credit balance.
pub const MAX_BALANCE: i64 = 9999;
/// Largest quantity a single allocation or revocation may move.
pub const MAX_ADJUSTMENT: i64 = MAX_BALANCE - 1;
/// Balance at which the house account is warned about running low.
pub const DEFAULT_LOW_CREDIT_THRESHOLD: i64 = 9;
/// Actor label used for house entries when no house account exists.
pub const SYSTEM_ACTOR: &str = "system";
