//! # Directory Errors

use thiserror::Error;

/// Result type for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Cluster directory errors
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// Membership could not be enumerated at all
    #[error("Cluster directory unavailable: {0}")]
    Unavailable(String),

    /// A single member's state could not be determined
    #[error("Health check failed for '{member}': {reason}")]
    HealthCheck { member: String, reason: String },
}

impl DirectoryError {
    pub fn health_check(member: impl Into<String>, reason: impl Into<String>) -> Self {
        DirectoryError::HealthCheck {
            member: member.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error prevents enumerating the cluster
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DirectoryError::Unavailable(_))
    }
}
