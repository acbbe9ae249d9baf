//! # Apply Errors

use thiserror::Error;

/// Result type for policy applier steps
pub type ApplyResult<T> = Result<T, ApplyError>;

/// A policy step that could not be carried out.
///
/// Step errors are data: the engine records them and moves on to the next
/// step.
#[derive(Debug, Clone, Error)]
pub enum ApplyError {
    #[error("Policy store error at {path}: {reason}")]
    PolicyStore { path: String, reason: String },

    #[error("Service '{service}' control failed: {reason}")]
    ServiceControl { service: String, reason: String },

    #[error("Service '{service}' did not reach {target} within {waited_secs}s")]
    ServiceTimeout {
        service: String,
        target: String,
        waited_secs: u64,
    },

    #[error("Maintenance rescan failed: {0}")]
    Rescan(String),

    /// Injected failure from a test double
    #[error("{0}")]
    Injected(String),
}

impl ApplyError {
    pub fn policy_store(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ApplyError::PolicyStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn service_control(service: impl Into<String>, reason: impl Into<String>) -> Self {
        ApplyError::ServiceControl {
            service: service.into(),
            reason: reason.into(),
        }
    }
}
