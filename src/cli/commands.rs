//! CLI command implementation
//!
//! Boot sequence for one invocation:
//! 1. Configuration load (file or defaults)
//! 2. Audit channel open (created once if absent)
//! 3. Directory construction and one-time capability check
//! 4. One reconciliation pass
//! 5. Outcome printed to stdout
//!
//! Failures in steps 1-2 abort with a non-zero exit. From step 3 on every
//! failure is recorded and the pass completes, including a failure to print
//! the outcome in step 5.

use std::io::{self, Write};

use crate::applier::SystemApplier;
use crate::config::{AuditConfig, Config};
use crate::directory;
use crate::engine::{QuorumPolicyEngine, ReconciliationOutcome, RunMode};
use crate::observability::{
    log_event, AuditSink, ConsoleAuditSink, Event, FileAuditSink, Logger,
};

use super::args::Cli;
use super::errors::{CliError, CliResult};
use super::io::write_response_to;

/// Main CLI entry point
///
/// Parses arguments and runs one pass. This is the only function that
/// main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_with(&cli)
}

/// Run one invocation for already parsed arguments
pub fn run_with(cli: &Cli) -> CliResult<()> {
    run_to(cli, &mut io::stdout())
}

/// Run one invocation, writing the outcome to `out`
pub fn run_to<W: Write>(cli: &Cli, out: &mut W) -> CliResult<()> {
    let mode = cli.mode();
    log_event(Event::RunStart, &[("mode", mode.as_str())]);

    let config = match &cli.config {
        Some(path) => Config::load(path).map_err(|e| {
            let reason = e.to_string();
            Logger::error(Event::RunAborted.as_str(), &[("error", reason.as_str())]);
            e
        })?,
        None => Config::default(),
    };
    let source = cli
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    log_event(Event::ConfigLoaded, &[("source", source.as_str())]);

    let outcome = reconcile_once(&config, mode)?;

    report_outcome(&outcome, out);

    let failed = outcome.failed_steps().len().to_string();
    let run_id = outcome.run_id.to_string();
    log_event(
        Event::RunComplete,
        &[
            ("decision", outcome.decision.as_str()),
            ("failed_steps", failed.as_str()),
            ("run_id", run_id.as_str()),
        ],
    );
    Ok(())
}

/// Print the outcome. The pass has already run, so a failed write is logged
/// and does not fail the invocation.
pub fn report_outcome<W: Write>(outcome: &ReconciliationOutcome, out: &mut W) -> bool {
    let written = serde_json::to_value(outcome)
        .map_err(CliError::from)
        .and_then(|data| write_response_to(data, out));
    match written {
        Ok(()) => true,
        Err(e) => {
            let reason = e.to_string();
            let run_id = outcome.run_id.to_string();
            Logger::error(
                Event::OutputFailed.as_str(),
                &[("error", reason.as_str()), ("run_id", run_id.as_str())],
            );
            false
        }
    }
}

/// Build the collaborators described by `config` and run a single pass.
///
/// Only audit channel construction can fail; the pass itself always
/// produces an outcome.
pub fn reconcile_once(config: &Config, mode: RunMode) -> CliResult<ReconciliationOutcome> {
    let audit = open_audit_sink(&config.audit).map_err(|e| {
        let reason = e.to_string();
        Logger::error(Event::RunAborted.as_str(), &[("error", reason.as_str())]);
        e
    })?;

    let directory = directory::from_config(&config.directory);
    directory.ensure_capability(audit.as_ref());

    let applier = SystemApplier::from_config(config);
    let engine = QuorumPolicyEngine::new(
        directory.as_ref(),
        &applier,
        audit.as_ref(),
        config.engine_settings(),
    );

    Ok(engine.reconcile(mode))
}

/// Open the configured audit channel: a file when a path is set, the
/// console logger otherwise.
pub fn open_audit_sink(config: &AuditConfig) -> CliResult<Box<dyn AuditSink>> {
    match &config.path {
        Some(path) => Ok(Box::new(FileAuditSink::open(config.channel.clone(), path)?)),
        None => Ok(Box::new(ConsoleAuditSink::new(config.channel.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectoryConfig;
    use crate::engine::PolicyDecision;
    use crate::exec::CommandSpec;
    use std::fs;
    use tempfile::tempdir;

    struct FullWriter;

    impl Write for FullWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "No space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "No space left on device"))
        }
    }

    fn config_in(dir: &std::path::Path, members: &str) -> Config {
        let snapshot = dir.join("members.json");
        fs::write(&snapshot, members).unwrap();

        let mut config = Config::default();
        config.directory = DirectoryConfig::File { path: snapshot };
        config.audit.path = Some(dir.join("audit").join("quorum-guard.jsonl"));
        config.policy_store.path = dir.join("policy.json");
        config.service_control.command = CommandSpec::new(["/nonexistent/systemctl"]);
        config.rescan_command = CommandSpec::new(["sh", "-c", "echo 0"]);
        config
    }

    #[test]
    fn test_reconcile_once_restricts_and_records() {
        let dir = tempdir().unwrap();
        let config = config_in(
            dir.path(),
            r#"{"members":[{"name":"a","state":"0"},{"name":"b","state":"1"}]}"#,
        );

        let outcome = reconcile_once(&config, RunMode::Apply).unwrap();

        assert_eq!(outcome.decision, PolicyDecision::RestrictMaintenance);
        // Flag written, service step failed against the missing manager.
        assert_eq!(outcome.failed_steps().len(), 1);
        let policy = fs::read_to_string(dir.path().join("policy.json")).unwrap();
        assert!(policy.contains("\"NoAutoRebootWithLoggedOnUsers\": 1"));

        let trail = fs::read_to_string(dir.path().join("audit").join("quorum-guard.jsonl")).unwrap();
        assert!(trail.contains("Retrieved 2 cluster members."));
        assert!(trail.contains("Preventing automatic maintenance reboots"));
    }

    #[test]
    fn test_dry_run_leaves_policy_store_alone() {
        let dir = tempdir().unwrap();
        let config = config_in(
            dir.path(),
            r#"{"members":[{"name":"a","state":"0"},{"name":"b","state":"0"},{"name":"c","state":"0"}]}"#,
        );

        let outcome = reconcile_once(&config, RunMode::Simulate).unwrap();

        assert_eq!(outcome.decision, PolicyDecision::AllowMaintenance);
        assert!(outcome.simulated);
        assert!(!dir.path().join("policy.json").exists());
    }

    #[test]
    fn test_unwritable_output_still_completes() {
        let dir = tempdir().unwrap();
        let config = config_in(
            dir.path(),
            r#"{"members":[{"name":"a","state":"0"},{"name":"b","state":"1"}]}"#,
        );
        let config_path = dir.path().join("quorum-guard.json");
        fs::write(&config_path, serde_json::to_string(&config).unwrap()).unwrap();

        let cli = Cli {
            dry_run: false,
            config: Some(config_path),
        };
        assert!(run_to(&cli, &mut FullWriter).is_ok());

        let policy = fs::read_to_string(dir.path().join("policy.json")).unwrap();
        assert!(policy.contains("\"NoAutoRebootWithLoggedOnUsers\": 1"));
    }

    #[test]
    fn test_report_outcome_to_buffer() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path(), r#"{"members":[]}"#);
        let outcome = reconcile_once(&config, RunMode::Simulate).unwrap();

        let mut buf = Vec::new();
        assert!(report_outcome(&outcome, &mut buf));
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["data"]["decision"], "restrict_maintenance");

        assert!(!report_outcome(&outcome, &mut FullWriter));
    }

    #[test]
    fn test_console_sink_without_path() {
        let sink = open_audit_sink(&AuditConfig::default()).unwrap();
        assert_eq!(sink.channel(), "quorum-guard");
    }

    #[test]
    fn test_unopenable_audit_channel_aborts() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let mut config = Config::default();
        config.audit.path = Some(blocker.join("audit.jsonl"));

        assert!(reconcile_once(&config, RunMode::Simulate).is_err());
    }
}
