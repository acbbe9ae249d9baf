//! In-memory directory for testing

use std::cell::Cell;

use super::errors::{DirectoryError, DirectoryResult};
use super::member::{ClusterMember, MemberHealth};
use super::ClusterDirectory;

/// Fixed membership with scripted health answers.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: Vec<(ClusterMember, Result<MemberHealth, String>)>,
    unavailable: Option<String>,
    probes: Cell<usize>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn online(self, name: &str) -> Self {
        self.with(name, Ok(MemberHealth::Online))
    }

    pub fn offline(self, name: &str) -> Self {
        self.with(name, Ok(MemberHealth::Offline))
    }

    /// Member whose health query fails with `reason`.
    pub fn failing(self, name: &str, reason: &str) -> Self {
        self.with(name, Err(reason.to_string()))
    }

    /// Enumeration fails with `reason`.
    pub fn unavailable(mut self, reason: &str) -> Self {
        self.unavailable = Some(reason.to_string());
        self
    }

    fn with(mut self, name: &str, health: Result<MemberHealth, String>) -> Self {
        self.entries.push((ClusterMember::new(name), health));
        self
    }

    /// Number of health queries served.
    pub fn probe_count(&self) -> usize {
        self.probes.get()
    }
}

impl ClusterDirectory for MemoryDirectory {
    fn list_members(&self) -> DirectoryResult<Vec<ClusterMember>> {
        if let Some(reason) = &self.unavailable {
            return Err(DirectoryError::Unavailable(reason.clone()));
        }
        Ok(self.entries.iter().map(|(m, _)| m.clone()).collect())
    }

    fn probe_health(&self, member: &ClusterMember) -> DirectoryResult<MemberHealth> {
        self.probes.set(self.probes.get() + 1);
        match self.entries.iter().find(|(m, _)| m == member) {
            Some((_, Ok(health))) => Ok(*health),
            Some((_, Err(reason))) => Err(DirectoryError::health_check(member.name(), reason.clone())),
            None => Ok(MemberHealth::Offline),
        }
    }
}
