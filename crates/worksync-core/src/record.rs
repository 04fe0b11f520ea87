//! Project records mirrored to the remote document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote project document: the workspace's file listing plus the
/// server-assigned write timestamp.
///
/// The record is keyed by the workspace's display name, assumed unique
/// per user. The file list reflects the workspace as of the last
/// save/update/reconcile; staleness between syncs is tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Project name (the workspace display name).
    pub name: String,

    /// Ordered list of absolute file paths.
    pub file_names: Vec<String>,

    /// Server-generated time of the last write. `None` until the store
    /// has stamped the record.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectRecord {
    /// Creates an unstamped record with the given file list.
    pub fn new(name: impl Into<String>, file_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            file_names,
            updated_at: None,
        }
    }

    /// Builder method to set the server timestamp.
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Returns true if the record already lists the given path.
    pub fn contains(&self, path: &str) -> bool {
        self.file_names.iter().any(|f| f == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_matches_exact_paths() {
        let record = ProjectRecord::new("Alpha", vec!["/w/a.ts".into(), "/w/b.ts".into()]);
        assert!(record.contains("/w/a.ts"));
        assert!(!record.contains("/w/c.ts"));
        assert!(!record.contains("a.ts"));
    }

    #[test]
    fn serde_round_trip() {
        let record = ProjectRecord::new("Alpha", vec!["/w/a.ts".into()])
            .with_updated_at(Utc::now());
        let json = serde_json::to_string(&record).unwrap();
        let back: ProjectRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
