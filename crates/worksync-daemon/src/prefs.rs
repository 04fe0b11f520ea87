//! Durable key-value preferences.
//!
//! A small JSON file holds the settings that survive process restarts;
//! currently that is the real-time sync flag. Writes go through a
//! temp-file rename so a crash cannot leave a torn file behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};

/// The persisted preference values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct PrefValues {
    /// Whether real-time sync was enabled when the process last ran.
    realtime_sync: bool,
}

/// File-backed preference storage.
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    values: RwLock<PrefValues>,
}

impl Preferences {
    /// Creates preference storage at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: RwLock::new(PrefValues::default()),
        }
    }

    /// Returns the default path (`~/.local/share/worksync/prefs.json`).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".local").join("share"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("worksync")
            .join("prefs.json")
    }

    /// Loads values from disk. A missing file leaves the defaults.
    pub fn load(&self) -> ServiceResult<()> {
        if !self.path.exists() {
            debug!("no preference file at {:?}", self.path);
            return Ok(());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| ServiceError::preferences(format!("failed to read preferences: {e}")))?;
        let values: PrefValues = serde_json::from_str(&content)
            .map_err(|e| ServiceError::preferences(format!("failed to parse preferences: {e}")))?;

        *self.values.write().unwrap() = values;
        Ok(())
    }

    /// Returns the persisted real-time sync flag.
    pub fn realtime_sync(&self) -> bool {
        self.values.read().unwrap().realtime_sync
    }

    /// Sets and persists the real-time sync flag.
    pub fn set_realtime_sync(&self, enabled: bool) -> ServiceResult<()> {
        self.values.write().unwrap().realtime_sync = enabled;
        self.save()
    }

    /// Returns the storage path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> ServiceResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ServiceError::preferences(format!("failed to create preference directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(&*self.values.read().unwrap())
            .map_err(|e| ServiceError::preferences(format!("failed to serialize: {e}")))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .map_err(|e| ServiceError::preferences(format!("failed to write preferences: {e}")))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| ServiceError::preferences(format!("failed to rename preferences: {e}")))?;

        debug!("saved preferences to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::new(dir.path().join("prefs.json"));
        prefs.load().unwrap();
        assert!(!prefs.realtime_sync());
    }

    #[test]
    fn flag_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let prefs = Preferences::new(&path);
        prefs.set_realtime_sync(true).unwrap();

        let reopened = Preferences::new(&path);
        reopened.load().unwrap();
        assert!(reopened.realtime_sync());

        reopened.set_realtime_sync(false).unwrap();
        let again = Preferences::new(&path);
        again.load().unwrap();
        assert!(!again.realtime_sync());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();

        let prefs = Preferences::new(&path);
        assert!(prefs.load().is_err());
    }
}
