//! Table-level reads and writes.
//!
//! Every function takes the [`UnitOfWork`](crate::UnitOfWork) it runs in.
//! Stores check shape, never cross-table invariants: the balance bounds and
//! the case status machine are enforced by the engine operations.

pub mod balance;
pub mod cases;
pub mod ledger;
pub mod notifications;
pub mod units;
pub mod users;
