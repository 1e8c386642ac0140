//! Error types for the circulation core

use thiserror::Error;

/// Stable error codes, exposed so an outer layer can map failures without
/// matching on message text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    OutOfStock = 5,
    BadValue = 6,
    InvalidTransition = 7,
    Duplicate = 8,
    ImportFailure = 9,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Out of stock: {0}")]
    OutOfStock(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Authorization(_) => ErrorCode::NotAuthorized,
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::OutOfStock(_) => ErrorCode::OutOfStock,
            AppError::InvalidTransition(_) => ErrorCode::InvalidTransition,
            AppError::Conflict(_) => ErrorCode::Duplicate,
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ErrorCode::DbFailure
            }
            AppError::Csv(_) => ErrorCode::ImportFailure,
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorCode::Failure
            }
        }
    }

    /// Guard violations are the caller's fault and safe to show to end users
    pub fn is_guard_violation(&self) -> bool {
        matches!(
            self,
            AppError::OutOfStock(_) | AppError::Validation(_) | AppError::InvalidTransition(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
