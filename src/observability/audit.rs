//! Audit trail
//!
//! The audit trail is the operator-facing record of every pass: member
//! count, online count, the decision and each step's outcome. It is written
//! to a named channel that is created once and appended to afterwards.
//!
//! Recording never fails from the caller's point of view. If a sink rejects
//! a record, the record is written to stdout through [`Logger`] instead and
//! the pass carries on.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::events::Event;
use super::logger::{Logger, Severity};
use super::{ObservabilityError, ObservabilityResult};

/// Severity of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "INFO",
            AuditSeverity::Warning => "WARNING",
            AuditSeverity::Error => "ERROR",
        }
    }

    /// Logger severity used when the record is echoed to the console.
    pub fn log_severity(&self) -> Severity {
        match self {
            AuditSeverity::Info => Severity::Info,
            AuditSeverity::Warning => Severity::Warn,
            AuditSeverity::Error => Severity::Error,
        }
    }
}

impl fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Unique record ID.
    pub id: Uuid,

    /// When the record was created.
    pub timestamp: DateTime<Utc>,

    /// Channel the record belongs to.
    pub channel: String,

    /// Pass that produced the record, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,

    pub severity: AuditSeverity,

    pub message: String,
}

impl AuditRecord {
    /// Create a new record stamped with the current time.
    pub fn new(
        channel: impl Into<String>,
        severity: AuditSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            channel: channel.into(),
            run_id: None,
            severity,
            message: message.into(),
        }
    }

    /// Attach the pass that produced this record.
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Serialize to a single JSON line (without newline).
    pub fn to_json(&self) -> ObservabilityResult<String> {
        serde_json::to_string(self)
            .map_err(|e| ObservabilityError::new(format!("cannot encode audit record: {}", e)))
    }
}

/// Destination for audit records.
pub trait AuditSink {
    /// Name of the channel records are written to.
    fn channel(&self) -> &str;

    /// Append a record. Implementations report their own failures here;
    /// callers normally go through [`AuditSink::record`] instead.
    fn append(&self, record: AuditRecord) -> ObservabilityResult<()>;

    /// Record a message. Never fails: a rejected record is handed to
    /// [`AuditSink::fallback`].
    fn record(&self, message: &str, severity: AuditSeverity) {
        let record = AuditRecord::new(self.channel(), severity, message);
        let copy = record.clone();
        if let Err(err) = self.append(record) {
            self.fallback(&copy, &err);
        }
    }

    /// Where a rejected record goes. Defaults to a WARN line on stdout.
    fn fallback(&self, record: &AuditRecord, err: &ObservabilityError) {
        write_fallback(record, err);
    }
}

/// Write a rejected record to stdout so it is not lost entirely.
pub fn write_fallback(record: &AuditRecord, err: &ObservabilityError) {
    let run_id = record.run_id.map(|id| id.to_string()).unwrap_or_default();
    Logger::log(
        Severity::Warn,
        Event::AuditSinkFailed.as_str(),
        &[
            ("channel", record.channel.as_str()),
            ("error", err.message()),
            ("message", record.message.as_str()),
            ("record_severity", record.severity.as_str()),
            ("run_id", run_id.as_str()),
        ],
    );
}

/// Stamps every record with the ID of the current pass.
pub struct RunScope<'a> {
    inner: &'a dyn AuditSink,
    run_id: Uuid,
}

impl<'a> RunScope<'a> {
    pub fn new(inner: &'a dyn AuditSink, run_id: Uuid) -> Self {
        Self { inner, run_id }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl AuditSink for RunScope<'_> {
    fn channel(&self) -> &str {
        self.inner.channel()
    }

    fn append(&self, record: AuditRecord) -> ObservabilityResult<()> {
        self.inner.append(record.with_run_id(self.run_id))
    }

    fn record(&self, message: &str, severity: AuditSeverity) {
        let record = AuditRecord::new(self.channel(), severity, message).with_run_id(self.run_id);
        let copy = record.clone();
        if let Err(err) = self.inner.append(record) {
            self.inner.fallback(&copy, &err);
        }
    }

    fn fallback(&self, record: &AuditRecord, err: &ObservabilityError) {
        self.inner.fallback(record, err);
    }
}

/// Append-only JSON-lines audit file.
///
/// The file (and its parent directory) is created on first open; later
/// opens append. Each record is flushed and synced before `append` returns.
pub struct FileAuditSink {
    channel: String,
    path: PathBuf,
    created: bool,
    writer: Mutex<BufWriter<File>>,
}

impl FileAuditSink {
    /// Open the channel file, creating it if absent.
    pub fn open(channel: impl Into<String>, path: impl AsRef<Path>) -> ObservabilityResult<Self> {
        let channel = channel.into();
        let path = path.as_ref().to_path_buf();
        let created = !path.exists();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ObservabilityError::with_source(
                        format!("cannot create audit directory {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                ObservabilityError::with_source(
                    format!("cannot open audit channel {}", path.display()),
                    e,
                )
            })?;

        if created {
            let display = path.display().to_string();
            Logger::info(
                Event::AuditChannelCreated.as_str(),
                &[("channel", channel.as_str()), ("path", display.as_str())],
            );
        }

        Ok(Self {
            channel,
            path,
            created,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this open created the channel file.
    pub fn was_created(&self) -> bool {
        self.created
    }
}

impl AuditSink for FileAuditSink {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn append(&self, record: AuditRecord) -> ObservabilityResult<()> {
        let json = record.to_json()?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ObservabilityError::new("audit writer lock poisoned"))?;
        writeln!(writer, "{}", json)
            .and_then(|_| writer.flush())
            .and_then(|_| writer.get_ref().sync_all())
            .map_err(|e| ObservabilityError::with_source("cannot append audit record", e))
    }
}

/// Audit sink that echoes records through the structured logger.
///
/// Used when no audit file is configured.
pub struct ConsoleAuditSink {
    channel: String,
}

impl ConsoleAuditSink {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl AuditSink for ConsoleAuditSink {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn append(&self, record: AuditRecord) -> ObservabilityResult<()> {
        let run_id = record.run_id.map(|id| id.to_string()).unwrap_or_default();
        Logger::log(
            record.severity.log_severity(),
            "AUDIT",
            &[
                ("channel", record.channel.as_str()),
                ("message", record.message.as_str()),
                ("run_id", run_id.as_str()),
            ],
        );
        Ok(())
    }
}

/// In-memory audit sink for testing.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Recorded messages, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    /// Number of records at the given severity.
    pub fn count(&self, severity: AuditSeverity) -> usize {
        self.records()
            .iter()
            .filter(|r| r.severity == severity)
            .count()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|r| r.message.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn channel(&self) -> &str {
        "memory"
    }

    fn append(&self, record: AuditRecord) -> ObservabilityResult<()> {
        self.records
            .lock()
            .map_err(|_| ObservabilityError::new("memory audit lock poisoned"))?
            .push(record);
        Ok(())
    }
}
