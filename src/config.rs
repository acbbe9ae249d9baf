//! Configuration
//!
//! A single JSON file. Every field has a default, so `{}` is a valid
//! configuration and running without `--config` uses the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{EngineSettings, DEFAULT_ONLINE_THRESHOLD};
use crate::exec::{CommandSpec, MEMBER_PLACEHOLDER};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minimum online members for maintenance to be allowed (default: 3)
    #[serde(default = "default_online_threshold")]
    pub online_threshold: usize,

    /// Service that applies maintenance (default: "unattended-upgrades")
    #[serde(default = "default_maintenance_service")]
    pub maintenance_service: String,

    #[serde(default)]
    pub audit: AuditConfig,

    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub policy_store: PolicyStoreConfig,

    #[serde(default)]
    pub service_control: ServiceControlConfig,

    /// Prints the number of pending maintenance items
    #[serde(default = "default_rescan_command")]
    pub rescan_command: CommandSpec,
}

/// Audit channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Channel name stamped on every record (default: "quorum-guard")
    #[serde(default = "default_audit_channel")]
    pub channel: String,

    /// Audit file; records go to the console logger when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Where cluster membership comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DirectoryConfig {
    Command {
        list_command: CommandSpec,
        /// Must contain `{member}`
        health_command: CommandSpec,
        #[serde(default)]
        probe_command: Option<CommandSpec>,
        #[serde(default)]
        provision_command: Option<CommandSpec>,
    },
    File {
        path: PathBuf,
    },
}

/// Location of the persisted permission flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyStoreConfig {
    #[serde(default = "default_policy_path")]
    pub path: PathBuf,

    #[serde(default = "default_policy_key")]
    pub key: String,
}

/// Service manager invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceControlConfig {
    /// `systemctl`-compatible command (default: ["systemctl"])
    #[serde(default = "default_service_command")]
    pub command: CommandSpec,

    /// Ceiling on waiting for a start/stop to take effect
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_online_threshold() -> usize {
    DEFAULT_ONLINE_THRESHOLD
}
fn default_maintenance_service() -> String {
    "unattended-upgrades".to_string()
}
fn default_audit_channel() -> String {
    "quorum-guard".to_string()
}
fn default_policy_path() -> PathBuf {
    PathBuf::from("/var/lib/quorum-guard/policy.json")
}
fn default_policy_key() -> String {
    "NoAutoRebootWithLoggedOnUsers".to_string()
}
fn default_service_command() -> CommandSpec {
    CommandSpec::new(["systemctl"])
}
fn default_wait_timeout_secs() -> u64 {
    60
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_rescan_command() -> CommandSpec {
    CommandSpec::new([
        "sh",
        "-c",
        "apt list --upgradable 2>/dev/null | tail -n +2 | wc -l",
    ])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            online_threshold: default_online_threshold(),
            maintenance_service: default_maintenance_service(),
            audit: AuditConfig::default(),
            directory: DirectoryConfig::default(),
            policy_store: PolicyStoreConfig::default(),
            service_control: ServiceControlConfig::default(),
            rescan_command: default_rescan_command(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            channel: default_audit_channel(),
            path: None,
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig::File {
            path: PathBuf::from("/etc/quorum-guard/members.json"),
        }
    }
}

impl Default for PolicyStoreConfig {
    fn default() -> Self {
        Self {
            path: default_policy_path(),
            key: default_policy_key(),
        }
    }
}

impl Default for ServiceControlConfig {
    fn default() -> Self {
        Self {
            command: default_service_command(),
            wait_timeout_secs: default_wait_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.online_threshold == 0 {
            return Err(ConfigError::Invalid("online_threshold must be > 0".into()));
        }
        if self.maintenance_service.trim().is_empty() {
            return Err(ConfigError::Invalid("maintenance_service must not be empty".into()));
        }
        if self.audit.channel.trim().is_empty() {
            return Err(ConfigError::Invalid("audit.channel must not be empty".into()));
        }
        if self.policy_store.key.trim().is_empty() {
            return Err(ConfigError::Invalid("policy_store.key must not be empty".into()));
        }
        if self.service_control.command.is_empty() {
            return Err(ConfigError::Invalid("service_control.command must not be empty".into()));
        }
        if self.service_control.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "service_control.poll_interval_ms must be > 0".into(),
            ));
        }
        if self.rescan_command.is_empty() {
            return Err(ConfigError::Invalid("rescan_command must not be empty".into()));
        }

        if let DirectoryConfig::Command {
            list_command,
            health_command,
            probe_command,
            provision_command,
        } = &self.directory
        {
            if list_command.is_empty() {
                return Err(ConfigError::Invalid("directory.list_command must not be empty".into()));
            }
            if !health_command.mentions(MEMBER_PLACEHOLDER) {
                return Err(ConfigError::Invalid(format!(
                    "directory.health_command must contain '{}'",
                    MEMBER_PLACEHOLDER
                )));
            }
            let empty_optional = [probe_command, provision_command]
                .into_iter()
                .flatten()
                .any(CommandSpec::is_empty);
            if empty_optional {
                return Err(ConfigError::Invalid(
                    "directory.probe_command and provision_command must not be empty when set"
                        .into(),
                ));
            }
        }

        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::new(self.online_threshold, self.maintenance_service.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.online_threshold, 3);
        assert_eq!(config.maintenance_service, "unattended-upgrades");
        assert_eq!(config.audit.channel, "quorum-guard");
        assert!(config.audit.path.is_none());
        assert_eq!(config.policy_store.key, "NoAutoRebootWithLoggedOnUsers");
        assert!(matches!(config.directory, DirectoryConfig::File { .. }));
        assert_eq!(config.engine_settings(), EngineSettings::default());
    }

    #[test]
    fn test_command_directory() {
        let config = Config::from_json(
            r#"{
                "online_threshold": 2,
                "directory": {
                    "kind": "command",
                    "list_command": ["cluster-query", "nodes"],
                    "health_command": ["cluster-query", "state", "{member}"],
                    "provision_command": ["cluster-query", "--register"]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.online_threshold, 2);
        match config.directory {
            DirectoryConfig::Command {
                probe_command,
                provision_command,
                ..
            } => {
                assert!(probe_command.is_none());
                assert!(provision_command.is_some());
            }
            other => panic!("unexpected directory {:?}", other),
        }
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(
            Config::from_json(r#"{"online_threshold": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"maintenance_service": " "}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json(
                r#"{"directory": {"kind": "command", "list_command": ["q"], "health_command": ["q", "state"]}}"#
            ),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"rescan_command": []}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"directory": {"kind": "ldap"}}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quorum-guard.json");
        fs::write(&path, r#"{"maintenance_service": "packagekit"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.maintenance_service, "packagekit");

        let missing = Config::load(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
