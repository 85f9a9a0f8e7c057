//! Account registry error types.

use bursar_shared::types::AccountId;
use bursar_shared::{AppError, ErrorCategory};
use thiserror::Error;

/// Errors that can occur during chart of accounts operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// No account carries the given code.
    #[error("Account with code '{0}' not found")]
    CodeNotFound(String),

    /// Account code already exists.
    #[error("Account code '{0}' already exists")]
    DuplicateCode(String),

    /// Parent account not found.
    #[error("Parent account not found: {0}")]
    ParentNotFound(AccountId),

    /// Missing or malformed input.
    #[error("Invalid account input: {0}")]
    InvalidInput(String),

    /// The normal balance side cannot change once lines reference the account.
    #[error("Normal balance of account {account_id} is locked: {line_count} lines reference it")]
    NormalBalanceLocked {
        /// The account ID.
        account_id: AccountId,
        /// Number of referencing lines.
        line_count: u64,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AccountError {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::DuplicateCode(_) | Self::NormalBalanceLocked { .. } => ErrorCategory::Conflict,
            Self::NotFound(_) | Self::CodeNotFound(_) | Self::ParentNotFound(_) => {
                ErrorCategory::NotFound
            }
            Self::Database(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CodeNotFound(_) => "ACCOUNT_CODE_NOT_FOUND",
            Self::DuplicateCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::ParentNotFound(_) => "PARENT_ACCOUNT_NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_ACCOUNT_INPUT",
            Self::NormalBalanceLocked { .. } => "NORMAL_BALANCE_LOCKED",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        Self::from_category(err.category(), err.to_string())
    }
}
