//! Directory backed by a membership snapshot file
//!
//! For hosts without a live cluster query tool: some other agent keeps a
//! JSON snapshot of the cluster up to date and this backend reads it.
//!
//! ```json
//! { "members": [ { "name": "node-a", "state": "0" }, { "name": "node-b", "state": "down" } ] }
//! ```
//!
//! The file is re-read on every query so health reflects the latest write.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{DirectoryError, DirectoryResult};
use super::member::{parse_state, ClusterMember, MemberHealth};
use super::ClusterDirectory;

/// On-disk snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    #[serde(default)]
    pub members: Vec<MemberSnapshot>,
}

/// One member entry in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub name: String,
    /// Reported state, numeric or word; see [`parse_state`].
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<MembershipSnapshot, String> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| format!("cannot read {}: {}", self.path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("invalid snapshot {}: {}", self.path.display(), e))
    }
}

impl ClusterDirectory for FileDirectory {
    fn list_members(&self) -> DirectoryResult<Vec<ClusterMember>> {
        let snapshot = self.load().map_err(DirectoryError::Unavailable)?;
        Ok(snapshot
            .members
            .into_iter()
            .map(|entry| ClusterMember::new(entry.name))
            .collect())
    }

    fn probe_health(&self, member: &ClusterMember) -> DirectoryResult<MemberHealth> {
        let snapshot = self
            .load()
            .map_err(|reason| DirectoryError::health_check(member.name(), reason))?;

        let mut health = MemberHealth::Offline;
        for entry in snapshot.members.iter().filter(|e| e.name == member.name()) {
            match parse_state(&entry.state) {
                Some(MemberHealth::Online) => health = MemberHealth::Online,
                Some(_) => {}
                None => {
                    return Err(DirectoryError::health_check(
                        member.name(),
                        format!("unrecognized state '{}'", entry.state),
                    ))
                }
            }
        }
        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_reads_members_and_states() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.json");
        fs::write(
            &path,
            r#"{"members":[
                {"name":"node-a","state":"0"},
                {"name":"node-b","state":"Down"},
                {"name":"node-c","state":"paused"}
            ]}"#,
        )
        .unwrap();

        let directory = FileDirectory::new(&path);
        let members = directory.list_members().unwrap();
        assert_eq!(members.len(), 3);

        assert_eq!(directory.probe_health(&members[0]).unwrap(), MemberHealth::Online);
        assert_eq!(directory.probe_health(&members[1]).unwrap(), MemberHealth::Offline);
        assert_eq!(directory.probe_health(&members[2]).unwrap(), MemberHealth::Offline);
        assert_eq!(
            directory.probe_health(&ClusterMember::new("gone")).unwrap(),
            MemberHealth::Offline
        );
    }

    #[test]
    fn test_duplicate_names_are_listed_twice() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.json");
        fs::write(
            &path,
            r#"{"members":[{"name":"node-a","state":"0"},{"name":"node-a","state":"1"}]}"#,
        )
        .unwrap();

        let directory = FileDirectory::new(&path);
        assert_eq!(directory.list_members().unwrap().len(), 2);
        assert_eq!(
            directory.probe_health(&ClusterMember::new("node-a")).unwrap(),
            MemberHealth::Online
        );
    }

    #[test]
    fn test_missing_or_corrupt_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.json");

        let directory = FileDirectory::new(&path);
        assert!(directory.list_members().unwrap_err().is_unavailable());

        fs::write(&path, "{not json").unwrap();
        assert!(directory.list_members().unwrap_err().is_unavailable());
        assert!(directory.probe_health(&ClusterMember::new("node-a")).is_err());
    }

    #[test]
    fn test_bad_state_is_health_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.json");
        fs::write(&path, r#"{"members":[{"name":"node-a","state":"???"}]}"#).unwrap();

        let err = FileDirectory::new(&path)
            .probe_health(&ClusterMember::new("node-a"))
            .unwrap_err();
        assert!(!err.is_unavailable());
    }
}
