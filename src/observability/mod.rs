//! Observability for quorum-guard
//!
//! Two channels:
//! - [`Logger`]: structured JSON lines for process lifecycle events
//! - [`AuditSink`]: the operator-facing audit trail of each pass
//!
//! Neither may fail a pass. Logger drops write errors; audit sinks fall back
//! to the logger.

mod audit;
mod events;
mod logger;

pub use audit::{
    write_fallback, AuditRecord, AuditSeverity, AuditSink, ConsoleAuditSink, FileAuditSink,
    MemoryAuditSink, RunScope,
};
pub use events::Event;
pub use logger::{Logger, Severity};

use std::fmt;
use std::io;

/// Observability error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservabilityErrorCode {
    /// Observability operation failed
    ObservabilityFailed,
}

impl ObservabilityErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservabilityErrorCode::ObservabilityFailed => "QG_OBSERVABILITY_FAILED",
        }
    }
}

impl fmt::Display for ObservabilityErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observability error
///
/// Never fatal once a pass is running; only fatal when the audit channel
/// cannot be opened at startup.
#[derive(Debug)]
pub struct ObservabilityError {
    code: ObservabilityErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl ObservabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: ObservabilityErrorCode::ObservabilityFailed,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: ObservabilityErrorCode::ObservabilityFailed,
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn code(&self) -> ObservabilityErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ObservabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ObservabilityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Log a lifecycle event with fields
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_code_and_source() {
        let err = ObservabilityError::with_source(
            "cannot open audit channel",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let display = err.to_string();
        assert!(display.contains("QG_OBSERVABILITY_FAILED"));
        assert!(display.contains("cannot open audit channel"));
        assert!(display.contains("denied"));
        assert_eq!(err.code(), ObservabilityErrorCode::ObservabilityFailed);
    }

    #[test]
    fn test_log_event() {
        log_event(Event::RunStart, &[("mode", "simulate")]);
    }
}
