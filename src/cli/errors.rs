//! CLI-specific error types
//!
//! Only failures that prevent a pass from starting end up here. Anything
//! that happens inside a pass is recorded on the audit trail instead.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::observability::ObservabilityError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing or invalid
    ConfigError,
    /// Audit channel could not be opened
    AuditUnavailable,
    /// stdout write failed
    IoError,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "QG_CLI_CONFIG_ERROR",
            Self::AuditUnavailable => "QG_CLI_AUDIT_UNAVAILABLE",
            Self::IoError => "QG_CLI_IO_ERROR",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn audit_unavailable(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::AuditUnavailable, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<ObservabilityError> for CliError {
    fn from(e: ObservabilityError) -> Self {
        Self::audit_unavailable(e.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err: CliError = ConfigError::Invalid("online_threshold must be > 0".into()).into();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert_eq!(
            err.to_string(),
            "QG_CLI_CONFIG_ERROR: Invalid config: online_threshold must be > 0"
        );
    }

    #[test]
    fn test_audit_error_conversion() {
        let err: CliError = ObservabilityError::new("cannot open audit channel").into();
        assert_eq!(err.code_str(), "QG_CLI_AUDIT_UNAVAILABLE");
    }
}
