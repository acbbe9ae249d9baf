//! Process lifecycle events
//!
//! These are the events written through [`Logger`](super::Logger) by the
//! entry controller. What a pass observed and decided goes to the audit
//! trail instead.

use std::fmt;

/// Observable lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Invocation begins
    RunStart,
    /// Configuration loaded (or defaults chosen)
    ConfigLoaded,
    /// Audit channel file did not exist and was created
    AuditChannelCreated,
    /// Audit sink rejected a record; the record is carried on this line
    AuditSinkFailed,
    /// Reconciliation pass finished, regardless of step outcomes
    RunComplete,
    /// Pass could not start
    RunAborted,
    /// Outcome could not be written after the pass ran
    OutputFailed,
    /// Panic caught at the top level (FATAL)
    UnexpectedFailure,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RunStart => "RUN_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::AuditChannelCreated => "AUDIT_CHANNEL_CREATED",
            Event::AuditSinkFailed => "AUDIT_SINK_FAILED",
            Event::RunComplete => "RUN_COMPLETE",
            Event::RunAborted => "RUN_ABORTED",
            Event::OutputFailed => "OUTPUT_FAILED",
            Event::UnexpectedFailure => "UNEXPECTED_FAILURE",
        }
    }

    /// Whether this event ends the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::UnexpectedFailure)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
