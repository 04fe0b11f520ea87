//! The `ProjectStore` trait and an in-process implementation.
//!
//! All operations are scoped to the signed-in user's namespace; gating
//! on sign-in state is the caller's responsibility. Every write is
//! stamped by the store, never by the caller.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use chrono::Utc;

use worksync_core::ProjectRecord;

use crate::error::{StoreError, StoreResult};

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// CRUD over the per-user collection of project records.
///
/// `create` fails with `AlreadyExists` when a record of that name is
/// present; `update` and `delete` fail with `NotFound` when it is not.
/// `list` returns records in the store's native order, which is not
/// guaranteed to be chronological.
pub trait ProjectStore: Send + Sync {
    /// Creates a new record with the given file list.
    fn create(&self, name: &str, file_names: Vec<String>)
    -> BoxFuture<'_, StoreResult<ProjectRecord>>;

    /// Fetches a record, or `None` if absent.
    fn fetch(&self, name: &str) -> BoxFuture<'_, StoreResult<Option<ProjectRecord>>>;

    /// Replaces a record's file list.
    fn update(&self, name: &str, file_names: Vec<String>)
    -> BoxFuture<'_, StoreResult<ProjectRecord>>;

    /// Deletes a record.
    fn delete(&self, name: &str) -> BoxFuture<'_, StoreResult<()>>;

    /// Lists all records in the user's namespace.
    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<ProjectRecord>>>;
}

/// An in-process store with the same contract as the remote one.
///
/// Used by tests and useful as a stand-in when composing the service
/// without network access. Records keep insertion order, which doubles
/// as the store's native listing order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ProjectRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryStore {
    fn create(
        &self,
        name: &str,
        file_names: Vec<String>,
    ) -> BoxFuture<'_, StoreResult<ProjectRecord>> {
        let name = name.to_string();
        Box::pin(async move {
            let mut records = self.records.lock().unwrap();
            if records.iter().any(|r| r.name == name) {
                return Err(StoreError::already_exists(&name));
            }
            let record = ProjectRecord::new(name.as_str(), file_names).with_updated_at(Utc::now());
            records.push(record.clone());
            Ok(record)
        })
    }

    fn fetch(&self, name: &str) -> BoxFuture<'_, StoreResult<Option<ProjectRecord>>> {
        let name = name.to_string();
        Box::pin(async move {
            let records = self.records.lock().unwrap();
            Ok(records.iter().find(|r| r.name == name).cloned())
        })
    }

    fn update(
        &self,
        name: &str,
        file_names: Vec<String>,
    ) -> BoxFuture<'_, StoreResult<ProjectRecord>> {
        let name = name.to_string();
        Box::pin(async move {
            let mut records = self.records.lock().unwrap();
            match records.iter_mut().find(|r| r.name == name) {
                Some(record) => {
                    record.file_names = file_names;
                    record.updated_at = Some(Utc::now());
                    Ok(record.clone())
                }
                None => Err(StoreError::not_found(&name)),
            }
        })
    }

    fn delete(&self, name: &str) -> BoxFuture<'_, StoreResult<()>> {
        let name = name.to_string();
        Box::pin(async move {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.name != name);
            if records.len() == before {
                return Err(StoreError::not_found(&name));
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<ProjectRecord>>> {
        Box::pin(async move { Ok(self.records.lock().unwrap().clone()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorCode;

    #[tokio::test]
    async fn create_then_list_round_trip() {
        let store = MemoryStore::new();
        let files = vec!["a.ts".to_string(), "b.ts".to_string()];
        store.create("Alpha", files.clone()).await.unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alpha");
        assert_eq!(records[0].file_names, files);
        assert!(records[0].updated_at.is_some());
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected_and_leaves_record_intact() {
        let store = MemoryStore::new();
        store
            .create("Alpha", vec!["a.ts".to_string()])
            .await
            .unwrap();

        let err = store
            .create("Alpha", vec!["other.ts".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::AlreadyExists);

        let record = store.fetch("Alpha").await.unwrap().unwrap();
        assert_eq!(record.file_names, vec!["a.ts".to_string()]);
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update("Ghost", vec!["a.ts".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::NotFound);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = store.delete("Ghost").await.unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::NotFound);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = MemoryStore::new();
        store.create("Alpha", vec![]).await.unwrap();
        store.delete("Alpha").await.unwrap();
        assert!(store.fetch("Alpha").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = MemoryStore::new();
        store.create("Beta", vec![]).await.unwrap();
        store.create("Alpha", vec![]).await.unwrap();

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
    }
}
