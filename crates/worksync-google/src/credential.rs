//! Durable cached-credential storage for session restoration.
//!
//! The Google identity token obtained at sign-in is kept as a JSON file
//! so the next process start can attempt a silent sign-in. Restoration
//! is strictly best-effort: a failed replay clears the cache and the
//! process stays signed out.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};

/// The persisted credential blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCredential {
    /// The Google identity token from the last successful sign-in.
    pub google_id_token: String,

    /// When the credential was cached.
    pub saved_at: DateTime<Utc>,
}

impl CachedCredential {
    /// Creates a credential blob stamped with the current time.
    pub fn new(google_id_token: impl Into<String>) -> Self {
        Self {
            google_id_token: google_id_token.into(),
            saved_at: Utc::now(),
        }
    }
}

/// File-backed credential storage.
#[derive(Debug)]
pub struct CredentialStorage {
    path: PathBuf,
    cached: RwLock<Option<CachedCredential>>,
}

impl CredentialStorage {
    /// Creates storage at the given path. Nothing is read until
    /// [`load`](Self::load) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: RwLock::new(None),
        }
    }

    /// Loads the credential from disk into memory.
    ///
    /// Returns `Ok(true)` if a credential was loaded, `Ok(false)` if the
    /// file does not exist.
    pub fn load(&self) -> AuthResult<bool> {
        if !self.path.exists() {
            debug!("no cached credential at {:?}", self.path);
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            AuthError::configuration(format!("failed to read credential file: {e}"))
        })?;

        let credential: CachedCredential = serde_json::from_str(&content).map_err(|e| {
            AuthError::configuration(format!("failed to parse credential file: {e}"))
        })?;

        debug!("loaded cached credential from {:?}", self.path);
        *self.cached.write().unwrap() = Some(credential);
        Ok(true)
    }

    /// Returns a clone of the in-memory credential, if any.
    pub fn get(&self) -> Option<CachedCredential> {
        self.cached.read().unwrap().clone()
    }

    /// Sets a new credential and writes it to disk.
    pub fn set(&self, credential: CachedCredential) -> AuthResult<()> {
        *self.cached.write().unwrap() = Some(credential);
        self.save()
    }

    /// Clears the credential, both in memory and on disk.
    pub fn clear(&self) -> AuthResult<()> {
        *self.cached.write().unwrap() = None;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                AuthError::configuration(format!("failed to remove credential file: {e}"))
            })?;
            info!("cleared cached credential at {:?}", self.path);
        }
        Ok(())
    }

    /// Returns the storage path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the in-memory credential to disk, atomically, with
    /// restrictive permissions.
    fn save(&self) -> AuthResult<()> {
        let cached = self.cached.read().unwrap();
        let credential = cached
            .as_ref()
            .ok_or_else(|| AuthError::internal("no credential to save"))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::configuration(format!("failed to create credential directory: {e}"))
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(credential)
            .map_err(|e| AuthError::internal(format!("failed to serialize credential: {e}")))?;

        fs::write(&temp_path, &content).map_err(|e| {
            AuthError::configuration(format!("failed to write credential file: {e}"))
        })?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            AuthError::configuration(format!("failed to rename credential file: {e}"))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(&self.path, perms);
        }

        debug!("saved credential to {:?}", self.path);
        Ok(())
    }
}
