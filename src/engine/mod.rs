//! Quorum policy engine
//!
//! Turns a cluster health tally into a maintenance policy decision and
//! drives the host toward it.

mod assessment;
mod decision;
mod outcome;
mod reconciler;

pub use assessment::QuorumAssessment;
pub use decision::{PlannedStep, PolicyDecision, DEFAULT_ONLINE_THRESHOLD};
pub use outcome::{ReconciliationOutcome, StepKind, StepResult};
pub use reconciler::{EngineSettings, QuorumPolicyEngine, RunMode};
