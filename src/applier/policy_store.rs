//! Persisted maintenance-permission flag
//!
//! The store is a JSON object of named settings; this module owns a single
//! key in it and leaves every other key untouched. Writes go to a sibling
//! temporary file which is then renamed over the store, so readers never
//! see a half-written document.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::errors::{ApplyError, ApplyResult};
use super::{PermissionFlag, StepChange};

#[derive(Debug, Clone)]
pub struct PolicyStore {
    path: PathBuf,
    key: String,
}

impl PolicyStore {
    pub fn new(path: impl AsRef<Path>, key: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current flag, or `None` when the store or key is absent or holds a
    /// value other than 0/1.
    pub fn read(&self) -> ApplyResult<Option<PermissionFlag>> {
        let settings = self.load()?;
        Ok(settings
            .get(&self.key)
            .and_then(Value::as_u64)
            .and_then(PermissionFlag::from_stored))
    }

    /// Persist `flag`. Writing the value already stored is a no-op.
    pub fn write(&self, flag: PermissionFlag) -> ApplyResult<StepChange> {
        let mut settings = self.load()?;
        let current = settings
            .get(&self.key)
            .and_then(Value::as_u64)
            .and_then(PermissionFlag::from_stored);
        if current == Some(flag) {
            return Ok(StepChange::Unchanged);
        }

        settings.insert(self.key.clone(), Value::from(flag.stored_value()));
        self.save(&settings).map_err(|e| self.error(e.to_string()))?;
        Ok(StepChange::Changed)
    }

    fn load(&self) -> ApplyResult<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.error(e.to_string())),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(self.error("store is not a JSON object")),
            Err(e) => Err(self.error(format!("invalid JSON: {}", e))),
        }
    }

    fn save(&self, settings: &Map<String, Value>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_vec_pretty(settings)?;
        let tmp = self.path.with_extension("tmp");

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(&body)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;

        // Make the rename itself durable.
        if let Some(parent) = self.path.parent() {
            let dir = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    fn error(&self, reason: impl Into<String>) -> ApplyError {
        ApplyError::policy_store(self.path.display().to_string(), reason)
    }
}
