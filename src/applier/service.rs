//! Maintenance service control
//!
//! Talks to the host service manager through a `systemctl`-style command:
//! `<command> is-active <svc>`, `<command> start <svc>`, `<command> stop <svc>`.
//! Start/stop is only issued when the current status differs from the
//! target, then the status is polled until it matches or the wait ceiling
//! is reached.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use crate::exec::CommandSpec;

use super::errors::{ApplyError, ApplyResult};
use super::StepChange;

/// Run status of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Running,
    Stopped,
    /// Starting, stopping or reloading.
    Pending,
    /// Anything the service manager reported that is not recognized.
    Other(String),
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Running => write!(f, "running"),
            ServiceStatus::Stopped => write!(f, "stopped"),
            ServiceStatus::Pending => write!(f, "pending"),
            ServiceStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Parse the first line printed by `is-active`.
pub fn parse_service_status(raw: &str) -> ServiceStatus {
    let word = raw.lines().next().unwrap_or("").trim().to_ascii_lowercase();
    match word.as_str() {
        "active" | "running" => ServiceStatus::Running,
        "inactive" | "failed" | "dead" | "stopped" => ServiceStatus::Stopped,
        "activating" | "deactivating" | "reloading" | "refreshing" => ServiceStatus::Pending,
        _ => ServiceStatus::Other(word),
    }
}

#[derive(Debug, Clone)]
pub struct ServiceController {
    command: CommandSpec,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl ServiceController {
    pub fn new(command: CommandSpec, wait_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            command,
            wait_timeout,
            poll_interval,
        }
    }

    /// Query the current status.
    pub fn status(&self, service: &str) -> ApplyResult<ServiceStatus> {
        // `is-active` exits non-zero for stopped units; only stdout matters.
        let output = self
            .command
            .with_args(&["is-active", service])
            .run()
            .map_err(|e| ApplyError::service_control(service, e.to_string()))?;

        if output.stdout.trim().is_empty() {
            return Err(ApplyError::service_control(
                service,
                format!("no status reported ({})", output.failure_summary()),
            ));
        }
        Ok(parse_service_status(&output.stdout))
    }

    pub fn ensure_running(&self, service: &str) -> ApplyResult<StepChange> {
        self.ensure(service, ServiceStatus::Running, "start")
    }

    pub fn ensure_stopped(&self, service: &str) -> ApplyResult<StepChange> {
        self.ensure(service, ServiceStatus::Stopped, "stop")
    }

    fn ensure(&self, service: &str, target: ServiceStatus, verb: &str) -> ApplyResult<StepChange> {
        if self.status(service)? == target {
            return Ok(StepChange::Unchanged);
        }

        let output = self
            .command
            .with_args(&[verb, service])
            .run()
            .map_err(|e| ApplyError::service_control(service, e.to_string()))?;
        if !output.success {
            return Err(ApplyError::service_control(
                service,
                format!("{} failed: {}", verb, output.failure_summary()),
            ));
        }

        self.wait_for(service, &target)?;
        Ok(StepChange::Changed)
    }

    fn wait_for(&self, service: &str, target: &ServiceStatus) -> ApplyResult<()> {
        let started = Instant::now();
        loop {
            if self.status(service)? == *target {
                return Ok(());
            }
            if started.elapsed() >= self.wait_timeout {
                return Err(ApplyError::ServiceTimeout {
                    service: service.to_string(),
                    target: target.to_string(),
                    waited_secs: self.wait_timeout.as_secs(),
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}
