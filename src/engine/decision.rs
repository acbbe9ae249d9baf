//! Policy decision
//!
//! The decision is a pure function of the online count against an absolute
//! floor. The floor does not scale with cluster size: a 12-node cluster
//! with 3 members up is allowed to patch exactly like a 3-node cluster with
//! every member up.

use std::fmt;

use serde::Serialize;

use crate::applier::PermissionFlag;

use super::assessment::QuorumAssessment;
use super::outcome::StepKind;

/// Default minimum number of online members for maintenance to be allowed.
pub const DEFAULT_ONLINE_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    RestrictMaintenance,
    AllowMaintenance,
}

impl PolicyDecision {
    pub fn from_assessment(assessment: &QuorumAssessment, threshold: usize) -> Self {
        if assessment.online_count() >= threshold {
            PolicyDecision::AllowMaintenance
        } else {
            PolicyDecision::RestrictMaintenance
        }
    }

    pub fn permission_flag(&self) -> PermissionFlag {
        match self {
            PolicyDecision::RestrictMaintenance => PermissionFlag::Restricted,
            PolicyDecision::AllowMaintenance => PermissionFlag::Allowed,
        }
    }

    /// Steps that bring the host in line with this decision, in order.
    pub fn planned_steps(&self) -> Vec<PlannedStep> {
        let flag = PlannedStep::SetPermissionFlag(self.permission_flag());
        match self {
            PolicyDecision::RestrictMaintenance => vec![flag, PlannedStep::EnsureServiceStopped],
            PolicyDecision::AllowMaintenance => vec![
                flag,
                PlannedStep::EnsureServiceRunning,
                PlannedStep::TriggerRescan,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyDecision::RestrictMaintenance => "restrict_maintenance",
            PolicyDecision::AllowMaintenance => "allow_maintenance",
        }
    }
}

impl fmt::Display for PolicyDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of a decision's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedStep {
    SetPermissionFlag(PermissionFlag),
    EnsureServiceStopped,
    EnsureServiceRunning,
    TriggerRescan,
}

impl PlannedStep {
    pub fn kind(&self) -> StepKind {
        match self {
            PlannedStep::SetPermissionFlag(_) => StepKind::SetPermissionFlag,
            PlannedStep::EnsureServiceStopped => StepKind::StopMaintenanceService,
            PlannedStep::EnsureServiceRunning => StepKind::StartMaintenanceService,
            PlannedStep::TriggerRescan => StepKind::TriggerRescan,
        }
    }

    /// What the step would do, for simulated passes.
    pub fn describe(&self, service: &str) -> String {
        match self {
            PlannedStep::SetPermissionFlag(flag) => {
                format!("would set maintenance permission flag to {}", flag)
            }
            PlannedStep::EnsureServiceStopped => format!("would ensure service '{}' is stopped", service),
            PlannedStep::EnsureServiceRunning => format!("would ensure service '{}' is running", service),
            PlannedStep::TriggerRescan => "would trigger a maintenance rescan".to_string(),
        }
    }
}
