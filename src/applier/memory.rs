//! In-memory policy applier for testing

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};

use crate::engine::StepKind;

use super::errors::{ApplyError, ApplyResult};
use super::{PermissionFlag, PolicyApplier, StepChange};

#[derive(Debug, Default)]
struct State {
    flag: Option<PermissionFlag>,
    running: BTreeSet<String>,
    pending: usize,
    calls: Vec<String>,
}

/// Records every call and keeps flag/service state in memory.
#[derive(Debug, Default)]
pub struct MemoryApplier {
    state: RefCell<State>,
    failures: HashSet<StepKind>,
}

impl MemoryApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(self, flag: PermissionFlag) -> Self {
        self.state.borrow_mut().flag = Some(flag);
        self
    }

    pub fn with_running(self, service: &str) -> Self {
        self.state.borrow_mut().running.insert(service.to_string());
        self
    }

    pub fn with_pending(self, count: usize) -> Self {
        self.state.borrow_mut().pending = count;
        self
    }

    /// Make every call of the given step fail.
    pub fn failing(mut self, step: StepKind) -> Self {
        self.failures.insert(step);
        self
    }

    pub fn flag(&self) -> Option<PermissionFlag> {
        self.state.borrow().flag
    }

    pub fn is_running(&self, service: &str) -> bool {
        self.state.borrow().running.contains(service)
    }

    /// Calls received, oldest first, e.g. `set_permission_flag(allowed)`.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn enter(&self, step: StepKind, call: String) -> ApplyResult<()> {
        self.state.borrow_mut().calls.push(call.clone());
        if self.failures.contains(&step) {
            return Err(ApplyError::Injected(format!("{} failed", call)));
        }
        Ok(())
    }
}

impl PolicyApplier for MemoryApplier {
    fn set_permission_flag(&self, flag: PermissionFlag) -> ApplyResult<StepChange> {
        self.enter(StepKind::SetPermissionFlag, format!("set_permission_flag({})", flag))?;
        let mut state = self.state.borrow_mut();
        if state.flag == Some(flag) {
            return Ok(StepChange::Unchanged);
        }
        state.flag = Some(flag);
        Ok(StepChange::Changed)
    }

    fn ensure_service_stopped(&self, service: &str) -> ApplyResult<StepChange> {
        self.enter(
            StepKind::StopMaintenanceService,
            format!("ensure_service_stopped({})", service),
        )?;
        if self.state.borrow_mut().running.remove(service) {
            Ok(StepChange::Changed)
        } else {
            Ok(StepChange::Unchanged)
        }
    }

    fn ensure_service_running(&self, service: &str) -> ApplyResult<StepChange> {
        self.enter(
            StepKind::StartMaintenanceService,
            format!("ensure_service_running({})", service),
        )?;
        if self.state.borrow_mut().running.insert(service.to_string()) {
            Ok(StepChange::Changed)
        } else {
            Ok(StepChange::Unchanged)
        }
    }

    fn trigger_rescan(&self) -> ApplyResult<usize> {
        self.enter(StepKind::TriggerRescan, "trigger_rescan()".to_string())?;
        Ok(self.state.borrow().pending)
    }
}
