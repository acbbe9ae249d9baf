//! Host-backed policy applier

use std::time::Duration;

use crate::config::Config;

use super::errors::ApplyResult;
use super::policy_store::PolicyStore;
use super::rescan::RescanTrigger;
use super::service::ServiceController;
use super::{PermissionFlag, PolicyApplier, StepChange};

/// Applies decisions to the local host: policy file, service manager and
/// rescan command.
#[derive(Debug, Clone)]
pub struct SystemApplier {
    store: PolicyStore,
    services: ServiceController,
    rescan: RescanTrigger,
}

impl SystemApplier {
    pub fn new(store: PolicyStore, services: ServiceController, rescan: RescanTrigger) -> Self {
        Self {
            store,
            services,
            rescan,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let control = &config.service_control;
        Self::new(
            PolicyStore::new(&config.policy_store.path, config.policy_store.key.clone()),
            ServiceController::new(
                control.command.clone(),
                Duration::from_secs(control.wait_timeout_secs),
                Duration::from_millis(control.poll_interval_ms),
            ),
            RescanTrigger::new(config.rescan_command.clone()),
        )
    }

    pub fn store(&self) -> &PolicyStore {
        &self.store
    }
}

impl PolicyApplier for SystemApplier {
    fn set_permission_flag(&self, flag: PermissionFlag) -> ApplyResult<StepChange> {
        self.store.write(flag)
    }

    fn ensure_service_stopped(&self, service: &str) -> ApplyResult<StepChange> {
        self.services.ensure_stopped(service)
    }

    fn ensure_service_running(&self, service: &str) -> ApplyResult<StepChange> {
        self.services.ensure_running(service)
    }

    fn trigger_rescan(&self) -> ApplyResult<usize> {
        self.rescan.trigger()
    }
}
