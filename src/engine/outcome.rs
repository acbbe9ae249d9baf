//! Results of a reconciliation pass

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::assessment::QuorumAssessment;
use super::decision::PolicyDecision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    SetPermissionFlag,
    StopMaintenanceService,
    StartMaintenanceService,
    TriggerRescan,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::SetPermissionFlag => "set_permission_flag",
            StepKind::StopMaintenanceService => "stop_maintenance_service",
            StepKind::StartMaintenanceService => "start_maintenance_service",
            StepKind::TriggerRescan => "trigger_rescan",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one step. `success` is `None` when the step was only
/// simulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub step: StepKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub detail: String,
}

impl StepResult {
    pub fn succeeded(step: StepKind, detail: impl Into<String>) -> Self {
        Self {
            step,
            success: Some(true),
            detail: detail.into(),
        }
    }

    pub fn failed(step: StepKind, detail: impl Into<String>) -> Self {
        Self {
            step,
            success: Some(false),
            detail: detail.into(),
        }
    }

    pub fn simulated(step: StepKind, detail: impl Into<String>) -> Self {
        Self {
            step,
            success: None,
            detail: detail.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.success == Some(false)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationOutcome {
    pub run_id: Uuid,
    pub decision: PolicyDecision,
    pub simulated: bool,
    pub assessment: QuorumAssessment,
    pub step_results: Vec<StepResult>,
}

impl ReconciliationOutcome {
    /// Steps, in execution order.
    pub fn steps(&self) -> Vec<StepKind> {
        self.step_results.iter().map(|r| r.step).collect()
    }

    pub fn failed_steps(&self) -> Vec<&StepResult> {
        self.step_results.iter().filter(|r| r.is_failure()).collect()
    }

    /// True when every step ran and succeeded. Always false for a
    /// simulated pass.
    pub fn all_succeeded(&self) -> bool {
        self.step_results.iter().all(|r| r.success == Some(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_step_omits_success() {
        let json = serde_json::to_value(StepResult::simulated(
            StepKind::TriggerRescan,
            "would trigger a maintenance rescan",
        ))
        .unwrap();
        assert!(json.get("success").is_none());
        assert_eq!(json["step"], "trigger_rescan");
    }

    #[test]
    fn test_failed_steps() {
        let outcome = ReconciliationOutcome {
            run_id: Uuid::new_v4(),
            decision: PolicyDecision::RestrictMaintenance,
            simulated: false,
            assessment: QuorumAssessment::empty(),
            step_results: vec![
                StepResult::succeeded(StepKind::SetPermissionFlag, "set"),
                StepResult::failed(StepKind::StopMaintenanceService, "timeout"),
            ],
        };
        assert_eq!(outcome.failed_steps().len(), 1);
        assert!(!outcome.all_succeeded());
        assert_eq!(
            outcome.steps(),
            vec![StepKind::SetPermissionFlag, StepKind::StopMaintenanceService]
        );
    }
}
