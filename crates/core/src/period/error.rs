//! Accounting period error types.

use bursar_shared::types::AccountingPeriodId;
use bursar_shared::{AppError, ErrorCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during period operations.
#[derive(Debug, Error)]
pub enum PeriodError {
    /// Month outside 1..=12 or a year chrono cannot represent.
    #[error("Invalid period {year}-{month}")]
    InvalidPeriod {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// Reopening needs a reason.
    #[error("A reason is required to reopen a period")]
    ReopenReasonRequired,

    /// Period not found.
    #[error("Accounting period not found: {0}")]
    NotFound(AccountingPeriodId),

    /// Period is already closed.
    #[error("Accounting period {0} is already closed")]
    AlreadyClosed(String),

    /// Period is not closed, so it cannot be reopened.
    #[error("Accounting period {0} is not closed")]
    NotClosed(String),

    /// Draft journal entries fall inside the period.
    #[error(
        "Cannot close period {period}: {count} draft journal entries between {start} and {end}"
    )]
    DraftEntriesInRange {
        /// Period name.
        period: String,
        /// Number of drafts.
        count: u64,
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// Trial balance as of the period end does not balance.
    #[error("Cannot close period {period}: trial balance as of {as_of} is off by {difference}")]
    TrialBalanceUnbalanced {
        /// Period name.
        period: String,
        /// Period end date.
        as_of: NaiveDate,
        /// Debits minus credits.
        difference: Decimal,
    },

    /// The trial balance calculator failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PeriodError {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPeriod { .. } | Self::ReopenReasonRequired => ErrorCategory::Validation,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::AlreadyClosed(_)
            | Self::NotClosed(_)
            | Self::DraftEntriesInRange { .. }
            | Self::TrialBalanceUnbalanced { .. } => ErrorCategory::Conflict,
            Self::Collaborator(_) => ErrorCategory::ExternalService,
            Self::Database(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::ReopenReasonRequired => "REOPEN_REASON_REQUIRED",
            Self::NotFound(_) => "PERIOD_NOT_FOUND",
            Self::AlreadyClosed(_) => "PERIOD_ALREADY_CLOSED",
            Self::NotClosed(_) => "PERIOD_NOT_CLOSED",
            Self::DraftEntriesInRange { .. } => "DRAFT_ENTRIES_IN_PERIOD",
            Self::TrialBalanceUnbalanced { .. } => "TRIAL_BALANCE_UNBALANCED",
            Self::Collaborator(_) => "COLLABORATOR_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<PeriodError> for AppError {
    fn from(err: PeriodError) -> Self {
        Self::from_category(err.category(), err.to_string())
    }
}
