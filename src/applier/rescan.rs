//! Maintenance rescan trigger

use crate::exec::CommandSpec;

use super::errors::{ApplyError, ApplyResult};

/// Extract the pending item count from the first token of the output.
///
/// Accepts `"4"`, `"4 updates"` and `"4;0"` style outputs.
pub fn parse_pending_count(raw: &str) -> Option<usize> {
    raw.split(|c: char| c.is_whitespace() || c == ';' || c == ',')
        .find(|token| !token.is_empty())
        .and_then(|token| token.parse().ok())
}

/// Runs the configured rescan command synchronously.
#[derive(Debug, Clone)]
pub struct RescanTrigger {
    command: CommandSpec,
}

impl RescanTrigger {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }

    pub fn trigger(&self) -> ApplyResult<usize> {
        let output = self
            .command
            .run()
            .map_err(|e| ApplyError::Rescan(format!("cannot run '{}': {}", self.command, e)))?;

        if !output.success {
            return Err(ApplyError::Rescan(output.failure_summary()));
        }

        parse_pending_count(&output.stdout).ok_or_else(|| {
            ApplyError::Rescan(format!(
                "unrecognized output '{}'",
                output.stdout.trim()
            ))
        })
    }
}
