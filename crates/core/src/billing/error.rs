//! Student ledger error types.

use bursar_shared::types::{DiscountId, StudentId, StudentLedgerId};
use bursar_shared::{AppError, ErrorCategory};
use rust_decimal::Decimal;
use thiserror::Error;

use super::grade::GradeLevel;

/// Errors that can occur during student ledger operations.
#[derive(Debug, Error)]
pub enum BillingError {
    // ========== Validation Errors ==========
    /// Charge, discount and payment amounts must be positive.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amounts are stored in whole cents.
    #[error("Amount {0} has more than two decimal places")]
    ExcessPrecision(Decimal),

    /// Payment needs an official receipt number.
    #[error("OR number is required")]
    OrNumberRequired,

    /// The ledger has no grade level, so no fee schedule applies.
    #[error("Ledger {0} has no grade level")]
    GradeLevelRequired(StudentLedgerId),

    /// Discount configuration is switched off.
    #[error("Discount '{0}' is inactive")]
    DiscountInactive(String),

    /// No school year is currently open.
    #[error("No school year is currently open")]
    NoOpenSchoolYear,

    // ========== Lookup Errors ==========
    /// Ledger not found.
    #[error("Student ledger not found: {0}")]
    LedgerNotFound(StudentLedgerId),

    /// No ledger for the student in the given school year.
    #[error("No ledger for student {student_id} in school year {school_year}")]
    LedgerNotFoundForStudent {
        /// Student.
        student_id: StudentId,
        /// School year name.
        school_year: String,
    },

    /// Discount configuration not found.
    #[error("Discount configuration not found: {0}")]
    DiscountNotFound(DiscountId),

    /// No fee schedule configured for the grade level.
    #[error("No fee schedule configured for {0}")]
    FeeScheduleNotFound(GradeLevel),

    // ========== Integrity Conflicts ==========
    /// The discount is already applied to this ledger.
    #[error("Discount {discount_id} has already been applied to ledger {ledger_id}")]
    DuplicateDiscount {
        /// Ledger.
        ledger_id: StudentLedgerId,
        /// Discount configuration.
        discount_id: DiscountId,
    },

    /// OR number already used by another payment.
    #[error("OR number '{0}' has already been used")]
    DuplicateOrNumber(String),

    /// Payment larger than the live outstanding balance.
    #[error("Payment amount {amount} exceeds outstanding balance {balance}")]
    PaymentExceedsBalance {
        /// Attempted payment.
        amount: Decimal,
        /// Live balance at the time of the attempt.
        balance: Decimal,
    },

    // ========== External Errors ==========
    /// A collaborator (fee schedule, discount store, school year) failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl BillingError {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NonPositiveAmount(_)
            | Self::ExcessPrecision(_)
            | Self::OrNumberRequired
            | Self::GradeLevelRequired(_)
            | Self::DiscountInactive(_)
            | Self::NoOpenSchoolYear => ErrorCategory::Validation,

            Self::LedgerNotFound(_)
            | Self::LedgerNotFoundForStudent { .. }
            | Self::DiscountNotFound(_)
            | Self::FeeScheduleNotFound(_) => ErrorCategory::NotFound,

            Self::DuplicateDiscount { .. }
            | Self::DuplicateOrNumber(_)
            | Self::PaymentExceedsBalance { .. } => ErrorCategory::Conflict,

            Self::Collaborator(_) => ErrorCategory::ExternalService,

            Self::Database(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::ExcessPrecision(_) => "EXCESS_PRECISION",
            Self::OrNumberRequired => "OR_NUMBER_REQUIRED",
            Self::GradeLevelRequired(_) => "GRADE_LEVEL_REQUIRED",
            Self::DiscountInactive(_) => "DISCOUNT_INACTIVE",
            Self::NoOpenSchoolYear => "NO_OPEN_SCHOOL_YEAR",
            Self::LedgerNotFound(_) | Self::LedgerNotFoundForStudent { .. } => "LEDGER_NOT_FOUND",
            Self::DiscountNotFound(_) => "DISCOUNT_NOT_FOUND",
            Self::FeeScheduleNotFound(_) => "FEE_SCHEDULE_NOT_FOUND",
            Self::DuplicateDiscount { .. } => "DUPLICATE_DISCOUNT",
            Self::DuplicateOrNumber(_) => "DUPLICATE_OR_NUMBER",
            Self::PaymentExceedsBalance { .. } => "PAYMENT_EXCEEDS_BALANCE",
            Self::Collaborator(_) => "COLLABORATOR_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        Self::from_category(err.category(), err.to_string())
    }
}
