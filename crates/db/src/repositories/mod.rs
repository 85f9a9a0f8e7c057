//! Repository abstractions for data access.
//!
//! Repositories load rows, hand them to the `bursar-core` rules, and persist
//! the result. Every financial write runs inside one database transaction.

pub mod account;
pub mod journal;
pub mod ledger;
pub mod period;

pub use account::AccountRepository;
pub use journal::{JournalRepository, ManualEntryInput, PostingOutcome};
pub use ledger::{LegacyPayment, StudentLedgerRepository};
pub use period::PeriodRepository;

use sea_orm::{DbErr, SqlErr};

/// Returns true if `err` is a unique violation of `constraint`.
pub(crate) fn violates_unique(err: &DbErr, constraint: &str) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(message)) if message.contains(constraint)
    )
}
