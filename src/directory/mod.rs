//! Cluster directory
//!
//! Enumerates cluster members and reports each member's health. Read-only.
//!
//! A failed health query is never an error for the caller: [`ClusterDirectory::get_health`]
//! records the failure on the audit trail and reports [`MemberHealth::Unknown`],
//! so one unreachable member cannot stop the rest of the cluster from being
//! assessed.

mod command;
mod errors;
mod member;
mod memory;
mod snapshot;

pub use command::CommandDirectory;
pub use errors::{DirectoryError, DirectoryResult};
pub use member::{parse_state, ClusterMember, MemberHealth};
pub use memory::MemoryDirectory;
pub use snapshot::{FileDirectory, MemberSnapshot, MembershipSnapshot};

use crate::config::DirectoryConfig;
use crate::observability::{AuditSeverity, AuditSink};

/// Source of cluster membership and member health.
pub trait ClusterDirectory {
    /// Enumerate current members.
    fn list_members(&self) -> DirectoryResult<Vec<ClusterMember>>;

    /// Query one member's health, reporting query failures as errors.
    fn probe_health(&self, member: &ClusterMember) -> DirectoryResult<MemberHealth>;

    /// One-time prerequisite check, run before the first enumeration.
    /// Backends that need no setup keep the default.
    fn ensure_capability(&self, _audit: &dyn AuditSink) {}

    /// Health of one member. Never fails: query errors are recorded and
    /// downgraded to `Unknown`.
    fn get_health(&self, member: &ClusterMember, audit: &dyn AuditSink) -> MemberHealth {
        match self.probe_health(member) {
            Ok(health) => health,
            Err(err) => {
                audit.record(
                    &format!("Error checking member status for '{}': {}", member, err),
                    AuditSeverity::Error,
                );
                MemberHealth::Unknown
            }
        }
    }
}

/// Build the directory backend selected by configuration.
pub fn from_config(config: &DirectoryConfig) -> Box<dyn ClusterDirectory> {
    match config {
        DirectoryConfig::Command {
            list_command,
            health_command,
            probe_command,
            provision_command,
        } => Box::new(CommandDirectory::new(
            list_command.clone(),
            health_command.clone(),
            probe_command.clone(),
            provision_command.clone(),
        )),
        DirectoryConfig::File { path } => Box::new(FileDirectory::new(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemoryAuditSink;

    #[test]
    fn test_get_health_downgrades_failure() {
        let directory = MemoryDirectory::new()
            .online("node-a")
            .failing("node-b", "RPC server unavailable");
        let audit = MemoryAuditSink::new();

        let a = directory.get_health(&ClusterMember::new("node-a"), &audit);
        let b = directory.get_health(&ClusterMember::new("node-b"), &audit);

        assert_eq!(a, MemberHealth::Online);
        assert_eq!(b, MemberHealth::Unknown);
        assert_eq!(audit.count(AuditSeverity::Error), 1);
        assert!(audit.contains("node-b"));
        assert!(audit.contains("RPC server unavailable"));
    }

    #[test]
    fn test_from_config_file_backend() {
        let directory = from_config(&DirectoryConfig::File {
            path: "/nonexistent/quorum-guard/members.json".into(),
        });
        let err = directory.list_members().unwrap_err();
        assert!(err.is_unavailable());
    }
}
