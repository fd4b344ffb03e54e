//! Application error types
//!
//! Unified error handling for callers that sit above the hierarchy engine
//! (HTTP handlers, bots, the admin binary).

use chan_core::{DomainError, ErrorKind};

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Cache(_) | Self::Internal(_) => 500,

            // Map domain errors by taxonomy tag
            Self::Domain(e) => match e.kind() {
                ErrorKind::NilId
                | ErrorKind::ArgumentInvalid
                | ErrorKind::ChannelDepthLimitation => 400,
                ErrorKind::Forbidden => 403,
                ErrorKind::NotFound => 404,
                ErrorKind::AlreadyExists => 409,
                // Transient; callers should retry
                ErrorKind::Conflict => 503,
                ErrorKind::Internal => 500,
            },
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
