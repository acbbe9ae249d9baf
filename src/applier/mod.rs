//! Policy applier
//!
//! Drives the host toward a policy decision through three idempotent steps:
//! persist the maintenance-permission flag, put the maintenance service in
//! the matching run state, and ask the maintenance agent to rescan for
//! pending work. A step whose target already holds is a no-op success.

mod errors;
mod memory;
mod policy_store;
mod rescan;
mod service;
mod system;

pub use errors::{ApplyError, ApplyResult};
pub use memory::MemoryApplier;
pub use policy_store::PolicyStore;
pub use rescan::{parse_pending_count, RescanTrigger};
pub use service::{parse_service_status, ServiceController, ServiceStatus};
pub use system::SystemApplier;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value of the maintenance-permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionFlag {
    /// Unattended reboots are blocked.
    Restricted,
    /// Unattended reboots are permitted.
    Allowed,
}

impl PermissionFlag {
    /// Integer written to the policy store.
    pub fn stored_value(&self) -> u64 {
        match self {
            PermissionFlag::Restricted => 1,
            PermissionFlag::Allowed => 0,
        }
    }

    pub fn from_stored(value: u64) -> Option<Self> {
        match value {
            1 => Some(PermissionFlag::Restricted),
            0 => Some(PermissionFlag::Allowed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionFlag::Restricted => "restricted",
            PermissionFlag::Allowed => "allowed",
        }
    }
}

impl fmt::Display for PermissionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an idempotent step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepChange {
    /// The target state was reached by this call.
    Changed,
    /// The target state already held.
    Unchanged,
}

/// Host operations the engine drives.
pub trait PolicyApplier {
    fn set_permission_flag(&self, flag: PermissionFlag) -> ApplyResult<StepChange>;

    fn ensure_service_stopped(&self, service: &str) -> ApplyResult<StepChange>;

    fn ensure_service_running(&self, service: &str) -> ApplyResult<StepChange>;

    /// Trigger a rescan for pending maintenance work, returning the number
    /// of pending items found.
    fn trigger_rescan(&self) -> ApplyResult<usize>;
}
