//! The module contains the error the engine can throw.
//!
//! Every variant maps to a stable machine-readable code through
//! [`EngineError::code`]:
//!
//! - [`Validation`] bad quantity or status input.
//! - [`InvariantViolation`] the balance would leave `[0, 9999]`.
//! - [`NotFound`] a case, unit or user is missing.
//! - [`StateConflict`] a terminal or wrong-state transition was attempted.
//! - [`Remote`] the downstream call failed after the local commit.
//! - [`Database`] transaction or commit failure.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvariantViolation`]: EngineError::InvariantViolation
//!  [`NotFound`]: EngineError::NotFound
//!  [`StateConflict`]: EngineError::StateConflict
//!  [`Remote`]: EngineError::Remote
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

use crate::notifier::RemoteError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("State conflict: {0}")]
    StateConflict(String),
    #[error("case {case_id} committed locally but the downstream call failed: {source}")]
    Remote {
        case_id: i32,
        #[source]
        source: RemoteError,
    },
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Stable code exposed to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::StateConflict(_) => "STATE_CONFLICT",
            Self::Remote { source, .. } => source.code(),
            Self::Database(_) => "INTERNAL_STORAGE_ERROR",
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvariantViolation(a), Self::InvariantViolation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::StateConflict(a), Self::StateConflict(b)) => a == b,
            (
                Self::Remote {
                    case_id: a,
                    source: sa,
                },
                Self::Remote {
                    case_id: b,
                    source: sb,
                },
            ) => a == b && sa == sb,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
