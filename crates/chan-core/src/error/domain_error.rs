//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Taxonomy tag used by callers to branch on an error without string matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NilId,
    ArgumentInvalid,
    AlreadyExists,
    ChannelDepthLimitation,
    Forbidden,
    /// Transaction serialization failure; safe to retry
    Conflict,
    Internal,
}

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Nil identifier: {0}")]
    NilId(&'static str),

    #[error("Invalid argument: {0}")]
    ArgumentInvalid(String),

    #[error("Channel name already exists under this parent: {0}")]
    AlreadyExists(String),

    #[error("Channel depth limit exceeded: {depth} > {max}")]
    ChannelDepthLimitation { depth: usize, max: usize },

    // =========================================================================
    // Structural Rule Violations
    // =========================================================================
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // =========================================================================
    // Infrastructure
    // =========================================================================
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Create a forbidden error
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    /// Create a conflict error
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }

    /// Taxonomy tag of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ChannelNotFound(_) | Self::MessageNotFound(_) => ErrorKind::NotFound,
            Self::NilId(_) => ErrorKind::NilId,
            Self::ArgumentInvalid(_) => ErrorKind::ArgumentInvalid,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::ChannelDepthLimitation { .. } => ErrorKind::ChannelDepthLimitation,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::DatabaseError(_) | Self::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Get the error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::NilId(_) => "NIL_ID",
            Self::ArgumentInvalid(_) => "ARGUMENT_INVALID",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::ChannelDepthLimitation { .. } => "CHANNEL_DEPTH_LIMITATION",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Only transaction conflicts are worth retrying
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NilId | ErrorKind::ArgumentInvalid | ErrorKind::ChannelDepthLimitation
        )
    }

    /// Check if this is an authorization-style refusal
    pub fn is_authorization(&self) -> bool {
        self.kind() == ErrorKind::Forbidden
    }

    /// Check if this is a conflict error (name collision or serialization failure)
    pub fn is_conflict(&self) -> bool {
        matches!(self.kind(), ErrorKind::AlreadyExists | ErrorKind::Conflict)
    }
}
