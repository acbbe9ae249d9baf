//! Quorum assessment

use serde::Serialize;

use crate::directory::MemberHealth;

/// Health tally for one pass. Built once, never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuorumAssessment {
    total_members: usize,
    online_count: usize,
    offline_count: usize,
    unknown_count: usize,
}

impl QuorumAssessment {
    /// Tally member health. Every entry counts, duplicates included.
    pub fn from_health(health: &[MemberHealth]) -> Self {
        let count = |wanted: MemberHealth| health.iter().filter(|h| **h == wanted).count();
        Self {
            total_members: health.len(),
            online_count: count(MemberHealth::Online),
            offline_count: count(MemberHealth::Offline),
            unknown_count: count(MemberHealth::Unknown),
        }
    }

    /// Assessment used when membership could not be established.
    pub fn empty() -> Self {
        Self::from_health(&[])
    }

    pub fn total_members(&self) -> usize {
        self.total_members
    }

    pub fn online_count(&self) -> usize {
        self.online_count
    }

    pub fn offline_count(&self) -> usize {
        self.offline_count
    }

    pub fn unknown_count(&self) -> usize {
        self.unknown_count
    }
}
