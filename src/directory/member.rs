//! Cluster members and their health

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cluster member, identified by name.
///
/// Names are not checked for uniqueness: a name listed twice by the
/// directory is two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterMember {
    name: String,
}

impl ClusterMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ClusterMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Health of one member as seen by this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberHealth {
    /// Member reports up.
    Online,
    /// Member reports any state other than up, or is not reported at all.
    Offline,
    /// The health query itself failed.
    Unknown,
}

impl MemberHealth {
    /// Only `Online` counts toward quorum.
    pub fn is_online(&self) -> bool {
        matches!(self, MemberHealth::Online)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberHealth::Online => "online",
            MemberHealth::Offline => "offline",
            MemberHealth::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MemberHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a node state reported by a cluster query tool.
///
/// Numeric states follow the failover-cluster convention where `0` is up
/// and every other value (down, paused, joining) is not. Returns `None` for
/// output that is neither a number nor a known state word.
pub fn parse_state(raw: &str) -> Option<MemberHealth> {
    let raw = raw.trim();
    if let Ok(code) = raw.parse::<i64>() {
        return Some(if code == 0 {
            MemberHealth::Online
        } else {
            MemberHealth::Offline
        });
    }
    match raw.to_ascii_lowercase().as_str() {
        "up" | "online" | "member" | "active" => Some(MemberHealth::Online),
        "down" | "offline" | "paused" | "joining" | "lost" | "inactive" => {
            Some(MemberHealth::Offline)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_states() {
        assert_eq!(parse_state("0"), Some(MemberHealth::Online));
        assert_eq!(parse_state(" 1\n"), Some(MemberHealth::Offline));
        assert_eq!(parse_state("2"), Some(MemberHealth::Offline));
        assert_eq!(parse_state("-1"), Some(MemberHealth::Offline));
    }

    #[test]
    fn test_word_states() {
        assert_eq!(parse_state("Up"), Some(MemberHealth::Online));
        assert_eq!(parse_state("online"), Some(MemberHealth::Online));
        assert_eq!(parse_state("Paused"), Some(MemberHealth::Offline));
        assert_eq!(parse_state("DOWN"), Some(MemberHealth::Offline));
        assert_eq!(parse_state("garbled"), None);
        assert_eq!(parse_state(""), None);
    }

    #[test]
    fn test_only_online_counts() {
        assert!(MemberHealth::Online.is_online());
        assert!(!MemberHealth::Offline.is_online());
        assert!(!MemberHealth::Unknown.is_online());
    }
}
