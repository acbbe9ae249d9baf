//! Quorum policy engine
//!
//! One pass: enumerate members, check each member's health in turn, tally,
//! decide, record the decision, then run (or simulate) the decision's steps.
//! Nothing in a pass returns an error. Enumeration failure yields an empty
//! assessment and therefore `RestrictMaintenance`; health query failures
//! count as not online; step failures become `StepResult`s and the next
//! step still runs.

use uuid::Uuid;

use crate::applier::{PolicyApplier, StepChange};
use crate::directory::{ClusterDirectory, ClusterMember, MemberHealth};
use crate::observability::{AuditSeverity, AuditSink, RunScope};

use super::assessment::QuorumAssessment;
use super::decision::{PlannedStep, PolicyDecision, DEFAULT_ONLINE_THRESHOLD};
use super::outcome::{ReconciliationOutcome, StepResult};

/// Whether steps are executed or only described.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Apply,
    Simulate,
}

impl RunMode {
    pub fn is_simulated(&self) -> bool {
        matches!(self, RunMode::Simulate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Apply => "apply",
            RunMode::Simulate => "simulate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Minimum online members for maintenance to be allowed.
    pub online_threshold: usize,
    /// Service that applies maintenance.
    pub maintenance_service: String,
}

impl EngineSettings {
    pub fn new(online_threshold: usize, maintenance_service: impl Into<String>) -> Self {
        Self {
            online_threshold,
            maintenance_service: maintenance_service.into(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new(DEFAULT_ONLINE_THRESHOLD, "unattended-upgrades")
    }
}

pub struct QuorumPolicyEngine<'a> {
    directory: &'a dyn ClusterDirectory,
    applier: &'a dyn PolicyApplier,
    audit: &'a dyn AuditSink,
    settings: EngineSettings,
}

impl<'a> QuorumPolicyEngine<'a> {
    pub fn new(
        directory: &'a dyn ClusterDirectory,
        applier: &'a dyn PolicyApplier,
        audit: &'a dyn AuditSink,
        settings: EngineSettings,
    ) -> Self {
        Self {
            directory,
            applier,
            audit,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one full pass, starting with member enumeration.
    pub fn reconcile(&self, mode: RunMode) -> ReconciliationOutcome {
        let run_id = Uuid::new_v4();
        let audit = RunScope::new(self.audit, run_id);

        let members = match self.directory.list_members() {
            Ok(members) => {
                audit.record(
                    &format!("Retrieved {} cluster members.", members.len()),
                    AuditSeverity::Info,
                );
                members
            }
            Err(err) => {
                audit.record(
                    &format!("Error retrieving cluster members: {}", err),
                    AuditSeverity::Error,
                );
                Vec::new()
            }
        };

        self.evaluate_scoped(&audit, &members, mode)
    }

    /// Assess an already enumerated member list, decide, and apply.
    pub fn evaluate(&self, members: &[ClusterMember], mode: RunMode) -> ReconciliationOutcome {
        let audit = RunScope::new(self.audit, Uuid::new_v4());
        self.evaluate_scoped(&audit, members, mode)
    }

    /// Check every member's health in order.
    pub fn assess(&self, members: &[ClusterMember], audit: &dyn AuditSink) -> QuorumAssessment {
        let health: Vec<MemberHealth> = members
            .iter()
            .map(|member| self.directory.get_health(member, audit))
            .collect();
        QuorumAssessment::from_health(&health)
    }

    fn evaluate_scoped(
        &self,
        audit: &RunScope<'_>,
        members: &[ClusterMember],
        mode: RunMode,
    ) -> ReconciliationOutcome {
        if members.is_empty() {
            audit.record(
                "Cluster membership could not be established; treating online count as 0.",
                AuditSeverity::Warning,
            );
        }

        let assessment = self.assess(members, audit);
        audit.record(
            &format!(
                "{} of {} members are online ({} offline, {} unknown).",
                assessment.online_count(),
                assessment.total_members(),
                assessment.offline_count(),
                assessment.unknown_count()
            ),
            AuditSeverity::Info,
        );

        let threshold = self.settings.online_threshold;
        let decision = PolicyDecision::from_assessment(&assessment, threshold);
        match decision {
            PolicyDecision::RestrictMaintenance => audit.record(
                &format!(
                    "Fewer than {} members are online. Preventing automatic maintenance reboots.",
                    threshold
                ),
                AuditSeverity::Warning,
            ),
            PolicyDecision::AllowMaintenance => audit.record(
                &format!(
                    "{} or more members are online. Allowing automatic maintenance reboots if needed.",
                    threshold
                ),
                AuditSeverity::Info,
            ),
        }

        let plan = decision.planned_steps();
        let step_results = match mode {
            RunMode::Apply => plan.iter().map(|step| self.apply_step(audit, step)).collect(),
            RunMode::Simulate => self.simulate(audit, &plan),
        };

        ReconciliationOutcome {
            run_id: audit.run_id(),
            decision,
            simulated: mode.is_simulated(),
            assessment,
            step_results,
        }
    }

    fn simulate(&self, audit: &dyn AuditSink, plan: &[PlannedStep]) -> Vec<StepResult> {
        let service = &self.settings.maintenance_service;
        let results: Vec<StepResult> = plan
            .iter()
            .map(|step| StepResult::simulated(step.kind(), step.describe(service)))
            .collect();

        let summary: Vec<&str> = results.iter().map(|r| r.detail.as_str()).collect();
        audit.record(
            &format!("Dry run: {}.", summary.join("; ")),
            AuditSeverity::Info,
        );
        results
    }

    fn apply_step(&self, audit: &dyn AuditSink, step: &PlannedStep) -> StepResult {
        let service = self.settings.maintenance_service.as_str();
        let kind = step.kind();

        let result = match step {
            PlannedStep::SetPermissionFlag(flag) => {
                self.applier.set_permission_flag(*flag).map(|change| match change {
                    StepChange::Changed => format!("maintenance permission flag set to {}", flag),
                    StepChange::Unchanged => format!("maintenance permission flag already {}", flag),
                })
            }
            PlannedStep::EnsureServiceStopped => {
                self.applier.ensure_service_stopped(service).map(|change| match change {
                    StepChange::Changed => format!("service '{}' stopped", service),
                    StepChange::Unchanged => format!("service '{}' already stopped", service),
                })
            }
            PlannedStep::EnsureServiceRunning => {
                self.applier.ensure_service_running(service).map(|change| match change {
                    StepChange::Changed => format!("service '{}' started", service),
                    StepChange::Unchanged => format!("service '{}' already running", service),
                })
            }
            PlannedStep::TriggerRescan => {
                audit.record("Starting maintenance rescan...", AuditSeverity::Info);
                self.applier.trigger_rescan().map(|pending| {
                    let detail = match pending {
                        0 => "No pending maintenance items detected.".to_string(),
                        n => format!("{} pending maintenance items detected.", n),
                    };
                    audit.record(&detail, AuditSeverity::Info);
                    detail
                })
            }
        };

        match result {
            Ok(detail) => StepResult::succeeded(kind, detail),
            Err(err) => {
                audit.record(&format!("Step {} failed: {}", kind, err), AuditSeverity::Error);
                StepResult::failed(kind, err.to_string())
            }
        }
    }
}
