//! Journal error types for validation, workflow and posting errors.
//!
//! This module defines all errors that can occur while building, validating,
//! approving or rejecting journal entries.

use bursar_shared::types::{AccountId, ExpenseId, JournalEntryId, PayrollId};
use bursar_shared::{AppError, ErrorCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::{EntryStatus, ReferenceType};

/// Errors that can occur during journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines, got {0}")]
    InsufficientLines(usize),

    /// Entry is not balanced (debits != credits).
    #[error(
        "Journal entry is not balanced. Debit: {debit}, Credit: {credit}, Difference: {difference}"
    )]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
        /// Debit minus credit.
        difference: Decimal,
    },

    /// Line amounts cannot be negative.
    #[error("Line {0} has a negative amount")]
    NegativeAmount(usize),

    /// A line may carry a debit or a credit, not both.
    #[error("Line {0} specifies both a debit and a credit")]
    BothSidesOnLine(usize),

    /// Entry moves no money.
    #[error("Journal entry has no amounts")]
    ZeroAmountEntry,

    /// Amounts are stored in whole cents.
    #[error("Amount {0} has more than two decimal places")]
    ExcessPrecision(Decimal),

    /// Event amount must be greater than zero.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Referenced account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Referenced account is inactive.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Description is required.
    #[error("Description is required")]
    DescriptionRequired,

    /// Status transition not permitted.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: EntryStatus,
        /// Attempted status.
        to: EntryStatus,
    },

    /// Rejection reason is required.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Expense must be approved before it is journalized.
    #[error("Expense {0} is not approved")]
    ExpenseNotApproved(ExpenseId),

    /// Payroll must be paid before it is journalized.
    #[error("Payroll transaction {0} is not paid")]
    PayrollNotPaid(PayrollId),

    /// Batch payroll posting needs at least one transaction.
    #[error("Payroll batch is empty")]
    EmptyPayrollBatch,

    // ========== Lookup Errors ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    // ========== Integrity Conflicts ==========
    /// Entry number already taken.
    #[error("Journal entry number '{0}' already exists")]
    DuplicateEntryNumber(String),

    /// An entry already exists for this business event.
    #[error("A journal entry already exists for {reference_type} {reference_id}")]
    DuplicateReference {
        /// Event type.
        reference_type: ReferenceType,
        /// Event id.
        reference_id: Uuid,
    },

    /// The entry date falls in a closed accounting period.
    #[error("Accounting period containing {0} is closed")]
    PeriodClosed(NaiveDate),

    // ========== Configuration Errors ==========
    /// A well-known account is missing from the chart.
    #[error("Required {role} account '{code}' is not configured")]
    MissingAccount {
        /// What the account is used for.
        role: &'static str,
        /// Configured chart code.
        code: String,
    },

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl JournalError {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InsufficientLines(_)
            | Self::Unbalanced { .. }
            | Self::NegativeAmount(_)
            | Self::BothSidesOnLine(_)
            | Self::ZeroAmountEntry
            | Self::NonPositiveAmount(_)
            | Self::ExcessPrecision(_)
            | Self::AccountNotFound(_)
            | Self::AccountInactive(_)
            | Self::DescriptionRequired
            | Self::InvalidTransition { .. }
            | Self::RejectionReasonRequired
            | Self::ExpenseNotApproved(_)
            | Self::PayrollNotPaid(_)
            | Self::EmptyPayrollBatch => ErrorCategory::Validation,

            Self::EntryNotFound(_) => ErrorCategory::NotFound,

            Self::DuplicateEntryNumber(_)
            | Self::DuplicateReference { .. }
            | Self::PeriodClosed(_) => ErrorCategory::Conflict,

            Self::MissingAccount { .. } => ErrorCategory::Configuration,

            Self::Database(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines(_) => "INSUFFICIENT_LINES",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::BothSidesOnLine(_) => "BOTH_SIDES_ON_LINE",
            Self::ZeroAmountEntry => "ZERO_AMOUNT_ENTRY",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::ExcessPrecision(_) => "EXCESS_PRECISION",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::DescriptionRequired => "DESCRIPTION_REQUIRED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::ExpenseNotApproved(_) => "EXPENSE_NOT_APPROVED",
            Self::PayrollNotPaid(_) => "PAYROLL_NOT_PAID",
            Self::EmptyPayrollBatch => "EMPTY_PAYROLL_BATCH",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::DuplicateEntryNumber(_) => "DUPLICATE_ENTRY_NUMBER",
            Self::DuplicateReference { .. } => "DUPLICATE_REFERENCE",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::MissingAccount { .. } => "MISSING_ACCOUNT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if a concurrent writer may have caused this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DuplicateEntryNumber(_))
    }
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        Self::from_category(err.category(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(JournalError::InsufficientLines(1).error_code(), "INSUFFICIENT_LINES");
        assert_eq!(
            JournalError::Unbalanced {
                debit: dec!(500),
                credit: dec!(300),
                difference: dec!(200),
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(
            JournalError::MissingAccount {
                role: "cash",
                code: "1010".into()
            }
            .error_code(),
            "MISSING_ACCOUNT"
        );
    }

    #[test]
    fn test_categories_separate_validation_from_conflicts() {
        assert_eq!(
            JournalError::ZeroAmountEntry.category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            JournalError::DuplicateEntryNumber("JE-2026-001".into()).category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            JournalError::MissingAccount {
                role: "revenue",
                code: "4010".into()
            }
            .category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            JournalError::EntryNotFound(JournalEntryId::new()).category(),
            ErrorCategory::NotFound
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(JournalError::DuplicateEntryNumber("JE-2026-004".into()).is_retryable());
        assert!(!JournalError::EmptyPayrollBatch.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = JournalError::Unbalanced {
            debit: dec!(500),
            credit: dec!(300),
            difference: dec!(200),
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is not balanced. Debit: 500, Credit: 300, Difference: 200"
        );

        let err = JournalError::InvalidTransition {
            from: EntryStatus::Posted,
            to: EntryStatus::Rejected,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition from posted to rejected"
        );
    }
}
