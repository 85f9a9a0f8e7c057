//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Broad classification shared by every domain error.
///
/// Callers use this to present expected business rejections (`Validation`,
/// `Conflict`) differently from setup problems and bugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or an invalid state transition.
    Validation,
    /// Integrity conflict: duplicates, over-payment, closing gate failures.
    Conflict,
    /// A referenced record does not exist.
    NotFound,
    /// Missing setup, such as a well-known account.
    Configuration,
    /// A collaborator outside the core failed.
    ExternalService,
    /// Storage or unexpected failure.
    Internal,
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (e.g., duplicate entry, balance exceeded).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Required configuration or seed data is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds an `AppError` from a domain error's category and message.
    #[must_use]
    pub fn from_category(category: ErrorCategory, message: String) -> Self {
        match category {
            ErrorCategory::Validation => Self::Validation(message),
            ErrorCategory::Conflict => Self::Conflict(message),
            ErrorCategory::NotFound => Self::NotFound(message),
            ErrorCategory::Configuration => Self::Configuration(message),
            ErrorCategory::ExternalService => Self::ExternalService(message),
            ErrorCategory::Internal => Self::Internal(message),
        }
    }

    /// Returns a stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true for expected business rejections rather than faults.
    #[must_use]
    pub const fn is_business_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Conflict(_))
    }
}
