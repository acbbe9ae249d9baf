//! Directory backed by an external cluster query tool
//!
//! - `list_command` prints one member name per line
//! - `health_command` is run once per member with `{member}` substituted and
//!   prints that member's state, one line per matching entry. Substitution
//!   happens inside each argv element; no shell is involved unless the
//!   command itself runs one. Inside a `sh -c` script, pass the name as a
//!   positional parameter (`["sh", "-c", "query \"$1\"", "sh", "{member}"]`).
//!   Names other than plain host names are never substituted.
//! - `probe_command` exits non-zero when the query capability is missing
//! - `provision_command` installs or registers the missing capability

use crate::exec::{CommandSpec, MEMBER_PLACEHOLDER};
use crate::observability::{AuditSeverity, AuditSink};

use super::errors::{DirectoryError, DirectoryResult};
use super::member::{parse_state, ClusterMember, MemberHealth};
use super::ClusterDirectory;

#[derive(Debug, Clone)]
pub struct CommandDirectory {
    list_command: CommandSpec,
    health_command: CommandSpec,
    probe_command: Option<CommandSpec>,
    provision_command: Option<CommandSpec>,
}

impl CommandDirectory {
    pub fn new(
        list_command: CommandSpec,
        health_command: CommandSpec,
        probe_command: Option<CommandSpec>,
        provision_command: Option<CommandSpec>,
    ) -> Self {
        Self {
            list_command,
            health_command,
            probe_command,
            provision_command,
        }
    }

    fn provision(&self, audit: &dyn AuditSink) {
        let Some(provision) = &self.provision_command else {
            audit.record(
                "Cluster query capability is missing and no provisioning command is configured.",
                AuditSeverity::Error,
            );
            return;
        };

        match provision.run() {
            Ok(output) if output.success => audit.record(
                "Successfully provisioned cluster query capability.",
                AuditSeverity::Info,
            ),
            Ok(output) => audit.record(
                &format!(
                    "Failed to provision cluster query capability: {}",
                    output.failure_summary()
                ),
                AuditSeverity::Error,
            ),
            Err(e) => audit.record(
                &format!("Error provisioning cluster query capability: {}", e),
                AuditSeverity::Error,
            ),
        }
    }
}

/// Host-style name: ASCII letters, digits, `.`, `_` and `-`.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

impl ClusterDirectory for CommandDirectory {
    fn list_members(&self) -> DirectoryResult<Vec<ClusterMember>> {
        let output = self.list_command.run().map_err(|e| {
            DirectoryError::Unavailable(format!(
                "cannot run '{}': {}. Ensure the cluster feature is installed and the cluster service is running",
                self.list_command, e
            ))
        })?;

        if !output.success {
            return Err(DirectoryError::Unavailable(format!(
                "'{}' failed: {}",
                self.list_command,
                output.failure_summary()
            )));
        }

        Ok(output.lines().map(ClusterMember::new).collect())
    }

    fn probe_health(&self, member: &ClusterMember) -> DirectoryResult<MemberHealth> {
        if !is_plain_name(member.name()) {
            return Err(DirectoryError::health_check(
                member.name(),
                "member name contains characters outside [A-Za-z0-9._-]",
            ));
        }
        let command = self.health_command.render(MEMBER_PLACEHOLDER, member.name());
        let output = command
            .run()
            .map_err(|e| DirectoryError::health_check(member.name(), e.to_string()))?;

        if !output.success {
            return Err(DirectoryError::health_check(
                member.name(),
                output.failure_summary(),
            ));
        }

        // No entry for the member means it is not up.
        let mut health = MemberHealth::Offline;
        for line in output.lines() {
            match parse_state(line) {
                Some(MemberHealth::Online) => health = MemberHealth::Online,
                Some(_) => {}
                None => {
                    return Err(DirectoryError::health_check(
                        member.name(),
                        format!("unrecognized state '{}'", line),
                    ))
                }
            }
        }
        Ok(health)
    }

    fn ensure_capability(&self, audit: &dyn AuditSink) {
        let Some(probe) = &self.probe_command else {
            return;
        };

        match probe.run() {
            Ok(output) if output.success => {}
            Ok(_) => {
                audit.record(
                    "Cluster query capability not found. Running provisioning command...",
                    AuditSeverity::Warning,
                );
                self.provision(audit);
            }
            Err(e) => audit.record(
                &format!(
                    "Unexpected error while ensuring cluster query capability: {}",
                    e
                ),
                AuditSeverity::Error,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemoryAuditSink;
    use tempfile::tempdir;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new(["sh", "-c", script])
    }

    fn directory(list: &str, health: &str) -> CommandDirectory {
        CommandDirectory::new(sh(list), sh(health), None, None)
    }

    #[test]
    fn test_list_members_one_per_line() {
        let dir = directory("printf 'node-a\\n\\nnode-b\\n node-c \\n'", "echo 0");
        let members = dir.list_members().unwrap();
        let names: Vec<&str> = members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["node-a", "node-b", "node-c"]);
    }

    #[test]
    fn test_list_failure_is_unavailable() {
        let dir = directory("echo 'cluster service not running' >&2; exit 1", "echo 0");
        let err = dir.list_members().unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("cluster service not running"));
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let dir = CommandDirectory::new(
            CommandSpec::new(["/nonexistent/cluster-query"]),
            sh("echo 0"),
            None,
            None,
        );
        assert!(dir.list_members().unwrap_err().is_unavailable());
    }

    #[test]
    fn test_health_per_member() {
        let dir = directory(
            "true",
            "case {member} in a) echo 0;; b) echo 1;; c) ;; d) echo Up;; esac",
        );
        assert_eq!(dir.probe_health(&ClusterMember::new("a")).unwrap(), MemberHealth::Online);
        assert_eq!(dir.probe_health(&ClusterMember::new("b")).unwrap(), MemberHealth::Offline);
        assert_eq!(dir.probe_health(&ClusterMember::new("c")).unwrap(), MemberHealth::Offline);
        assert_eq!(dir.probe_health(&ClusterMember::new("d")).unwrap(), MemberHealth::Online);
    }

    #[test]
    fn test_any_online_entry_wins() {
        let dir = directory("true", "printf '2\\n0\\n'");
        assert_eq!(dir.probe_health(&ClusterMember::new("dup")).unwrap(), MemberHealth::Online);
    }

    #[test]
    fn test_health_errors() {
        let failing = directory("true", "exit 5");
        assert!(failing.probe_health(&ClusterMember::new("a")).is_err());

        let garbled = directory("true", "echo '???'");
        let err = garbled.probe_health(&ClusterMember::new("a")).unwrap_err();
        assert!(err.to_string().contains("unrecognized state"));
    }

    #[test]
    fn test_unsafe_member_name_is_not_substituted() {
        let tmp = tempdir().unwrap();
        let marker = tmp.path().join("injected");
        let dir = directory("true", "echo 0; echo {member} >/dev/null");
        let hostile = ClusterMember::new(format!("a; touch '{}'", marker.display()));

        let err = dir.probe_health(&hostile).unwrap_err();
        assert!(err.to_string().contains("characters outside"));
        assert!(!marker.exists());

        assert!(dir.probe_health(&ClusterMember::new("-rf")).is_err());
        assert_eq!(
            dir.probe_health(&ClusterMember::new("node-01.dc_2")).unwrap(),
            MemberHealth::Online
        );
    }

    #[test]
    fn test_capability_present_records_nothing() {
        let dir = CommandDirectory::new(sh("true"), sh("echo 0"), Some(sh("true")), None);
        let audit = MemoryAuditSink::new();
        dir.ensure_capability(&audit);
        assert!(audit.is_empty());
    }

    #[test]
    fn test_capability_missing_runs_provisioning_once() {
        let tmp = tempdir().unwrap();
        let marker = tmp.path().join("provisioned");
        let provision = format!("echo x >> '{}'", marker.display());

        let dir = CommandDirectory::new(sh("true"), sh("echo 0"), Some(sh("exit 1")), Some(sh(&provision)));
        let audit = MemoryAuditSink::new();
        dir.ensure_capability(&audit);

        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "x\n");
        assert_eq!(audit.count(AuditSeverity::Warning), 1);
        assert!(audit.contains("Successfully provisioned"));
    }

    #[test]
    fn test_capability_provisioning_failure_is_recorded() {
        let dir = CommandDirectory::new(
            sh("true"),
            sh("echo 0"),
            Some(sh("exit 1")),
            Some(sh("echo 'compiler missing' >&2; exit 2")),
        );
        let audit = MemoryAuditSink::new();
        dir.ensure_capability(&audit);

        assert_eq!(audit.count(AuditSeverity::Error), 1);
        assert!(audit.contains("compiler missing"));
    }

    #[test]
    fn test_capability_missing_without_provisioner() {
        let dir = CommandDirectory::new(sh("true"), sh("echo 0"), Some(sh("exit 1")), None);
        let audit = MemoryAuditSink::new();
        dir.ensure_capability(&audit);
        assert!(audit.contains("no provisioning command"));
    }
}
