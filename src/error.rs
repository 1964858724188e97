//! Error types for libgate

use crate::model::PermissionId;

/// The main error type for libgate operations
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Rejected input (empty permission name, empty or over-long key part, ...)
    #[error("{0}")]
    Validation(String),

    #[error("permission {0} not found")]
    PermissionNotFound(PermissionId),

    #[error("user {0:?} not found")]
    UserNotFound(String),

    /// LMDB failure, passed through untouched
    #[error("storage error: {0}")]
    Storage(#[from] heed::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid directory document: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure reported by an external user or library source
    #[error("collaborator error: {0}")]
    Collaborator(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AccessError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        AccessError::Validation(msg.into())
    }

    /// True for the not-found family (permission or user)
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::PermissionNotFound(_) | AccessError::UserNotFound(_))
    }
}

/// Result type alias for libgate operations
pub type Result<T> = std::result::Result<T, AccessError>;
