//! Firestore-backed project store.
//!
//! Project records are documents at
//! `users/{uid}/projects/{name}` inside the configured Firestore
//! project, with a single `fileNames` array field. Timestamps come from
//! the server-assigned `createTime`/`updateTime` on the document; the
//! client never supplies its own clock.
//!
//! The store is "bound" to an identity by the session owner: binding
//! supplies the uid that scopes the collection and the bearer token for
//! requests. Operations on an unbound store fail; callers are expected
//! to gate on sign-in state before reaching this layer.

use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use worksync_core::ProjectRecord;

use crate::error::{StoreError, StoreResult};
use crate::store::{BoxFuture, ProjectStore};

/// Base URL for the Firestore REST API v1.
const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";

/// Identity binding: the uid scoping the collection plus the bearer
/// token authorizing requests.
#[derive(Debug, Clone)]
struct Binding {
    uid: String,
    id_token: String,
}

/// Project store backed by the Firestore REST API.
#[derive(Debug)]
pub struct FirestoreStore {
    http_client: reqwest::Client,
    project_id: String,
    binding: RwLock<Option<Binding>>,
}

impl FirestoreStore {
    /// Creates a new, unbound store for the given Firestore project.
    pub fn new(project_id: impl Into<String>, timeout: Duration) -> StoreResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            project_id: project_id.into(),
            binding: RwLock::new(None),
        })
    }

    /// Binds the store to a signed-in identity.
    ///
    /// Called on sign-in and again whenever the session token is
    /// renewed.
    pub fn bind(&self, uid: impl Into<String>, id_token: impl Into<String>) {
        *self.binding.write().unwrap() = Some(Binding {
            uid: uid.into(),
            id_token: id_token.into(),
        });
    }

    /// Removes the identity binding (sign-out).
    pub fn clear_binding(&self) {
        *self.binding.write().unwrap() = None;
    }

    /// Returns true if the store is bound to an identity.
    pub fn is_bound(&self) -> bool {
        self.binding.read().unwrap().is_some()
    }

    fn binding(&self) -> StoreResult<Binding> {
        self.binding
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| StoreError::transport("store is not bound to a signed-in identity"))
    }

    fn collection_url(&self, uid: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/users/{}/projects",
            FIRESTORE_API_BASE, self.project_id, uid
        )
    }

    fn document_url(&self, uid: &str, name: &str) -> String {
        format!("{}/{}", self.collection_url(uid), urlencoding::encode(name))
    }

    async fn read_error(name: &str, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            reqwest::StatusCode::NOT_FOUND => StoreError::not_found(name),
            reqwest::StatusCode::CONFLICT => StoreError::already_exists(name),
            _ => StoreError::transport(format!("store returned {status}: {body}")),
        }
    }

    async fn fetch_impl(&self, name: &str) -> StoreResult<Option<ProjectRecord>> {
        let binding = self.binding()?;
        let url = self.document_url(&binding.uid, name);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&binding.id_token)
            .send()
            .await
            .map_err(|e| StoreError::transport(format!("fetch request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::read_error(name, response).await);
        }

        let document: Document = response
            .json()
            .await
            .map_err(|e| StoreError::invalid_response(format!("invalid document: {e}")))?;

        Ok(Some(document.into_record(name)?))
    }

    async fn create_impl(&self, name: &str, file_names: Vec<String>) -> StoreResult<ProjectRecord> {
        // Check-then-set, as the store contract describes; the race
        // between the check and the write is an accepted limitation and
        // is additionally backstopped by the store's own 409.
        if self.fetch_impl(name).await?.is_some() {
            return Err(StoreError::already_exists(name));
        }

        let binding = self.binding()?;
        let url = self.collection_url(&binding.uid);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&binding.id_token)
            .query(&[("documentId", name)])
            .json(&Document::from_files(&file_names))
            .send()
            .await
            .map_err(|e| StoreError::transport(format!("create request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_error(name, response).await);
        }

        let document: Document = response
            .json()
            .await
            .map_err(|e| StoreError::invalid_response(format!("invalid document: {e}")))?;

        debug!(project = name, "created remote record");
        document.into_record(name)
    }

    async fn update_impl(&self, name: &str, file_names: Vec<String>) -> StoreResult<ProjectRecord> {
        let binding = self.binding()?;
        let url = self.document_url(&binding.uid, name);

        let response = self
            .http_client
            .patch(&url)
            .bearer_auth(&binding.id_token)
            .query(&[
                ("updateMask.fieldPaths", "fileNames"),
                ("currentDocument.exists", "true"),
            ])
            .json(&Document::from_files(&file_names))
            .send()
            .await
            .map_err(|e| StoreError::transport(format!("update request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_error(name, response).await);
        }

        let document: Document = response
            .json()
            .await
            .map_err(|e| StoreError::invalid_response(format!("invalid document: {e}")))?;

        debug!(project = name, files = file_names.len(), "updated remote record");
        document.into_record(name)
    }

    async fn delete_impl(&self, name: &str) -> StoreResult<()> {
        let binding = self.binding()?;
        let url = self.document_url(&binding.uid, name);

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(&binding.id_token)
            .query(&[("currentDocument.exists", "true")])
            .send()
            .await
            .map_err(|e| StoreError::transport(format!("delete request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::read_error(name, response).await);
        }

        debug!(project = name, "deleted remote record");
        Ok(())
    }

    async fn list_impl(&self) -> StoreResult<Vec<ProjectRecord>> {
        let binding = self.binding()?;
        let url = self.collection_url(&binding.uid);

        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http_client.get(&url).bearer_auth(&binding.id_token);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StoreError::transport(format!("list request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(Self::read_error("<list>", response).await);
            }

            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| StoreError::invalid_response(format!("invalid list response: {e}")))?;

            for document in page.documents {
                let name = document.document_id()?;
                records.push(document.into_record(&name)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = records.len(), "listed remote records");
        Ok(records)
    }
}

impl ProjectStore for FirestoreStore {
    fn create(
        &self,
        name: &str,
        file_names: Vec<String>,
    ) -> BoxFuture<'_, StoreResult<ProjectRecord>> {
        let name = name.to_string();
        Box::pin(async move { self.create_impl(&name, file_names).await })
    }

    fn fetch(&self, name: &str) -> BoxFuture<'_, StoreResult<Option<ProjectRecord>>> {
        let name = name.to_string();
        Box::pin(async move { self.fetch_impl(&name).await })
    }

    fn update(
        &self,
        name: &str,
        file_names: Vec<String>,
    ) -> BoxFuture<'_, StoreResult<ProjectRecord>> {
        let name = name.to_string();
        Box::pin(async move { self.update_impl(&name, file_names).await })
    }

    fn delete(&self, name: &str) -> BoxFuture<'_, StoreResult<()>> {
        let name = name.to_string();
        Box::pin(async move { self.delete_impl(&name).await })
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<ProjectRecord>>> {
        Box::pin(async move { self.list_impl().await })
    }
}

/// A Firestore document on the wire.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    /// Full resource name; absent in request bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default)]
    fields: DocumentFields,

    /// Server-assigned creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    create_time: Option<DateTime<Utc>>,

    /// Server-assigned time of the last write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_names: Option<ArrayField>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArrayField {
    array_value: ArrayValue,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ArrayValue {
    #[serde(default)]
    values: Vec<StringField>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StringField {
    string_value: String,
}

impl Document {
    /// Builds a request body carrying the given file list.
    fn from_files(file_names: &[String]) -> Self {
        Self {
            name: None,
            fields: DocumentFields {
                file_names: Some(ArrayField {
                    array_value: ArrayValue {
                        values: file_names
                            .iter()
                            .map(|f| StringField {
                                string_value: f.clone(),
                            })
                            .collect(),
                    },
                }),
            },
            create_time: None,
            update_time: None,
        }
    }

    /// Extracts the document ID (the record name) from the resource
    /// name.
    fn document_id(&self) -> StoreResult<String> {
        let resource = self
            .name
            .as_deref()
            .ok_or_else(|| StoreError::invalid_response("document has no resource name"))?;
        let segment = resource
            .rsplit('/')
            .next()
            .ok_or_else(|| StoreError::invalid_response("document has an empty resource name"))?;
        Ok(urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string()))
    }

    /// Converts the wire document into a [`ProjectRecord`].
    fn into_record(self, name: &str) -> StoreResult<ProjectRecord> {
        let file_names = self
            .fields
            .file_names
            .map(|f| {
                f.array_value
                    .values
                    .into_iter()
                    .map(|v| v.string_value)
                    .collect()
            })
            .unwrap_or_default();

        let updated_at = self.update_time.or(self.create_time);

        let mut record = ProjectRecord::new(name, file_names);
        record.updated_at = updated_at;
        Ok(record)
    }
}

/// Response from a collection list request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT_JSON: &str = r#"{
        "name": "projects/p/databases/(default)/documents/users/u1/projects/Alpha",
        "fields": {
            "fileNames": {
                "arrayValue": {
                    "values": [
                        { "stringValue": "/w/a.ts" },
                        { "stringValue": "/w/b.ts" }
                    ]
                }
            }
        },
        "createTime": "2024-03-15T10:00:00.000000Z",
        "updateTime": "2024-03-15T11:30:00.000000Z"
    }"#;

    #[test]
    fn document_parses_into_record() {
        let document: Document = serde_json::from_str(DOCUMENT_JSON).unwrap();
        assert_eq!(document.document_id().unwrap(), "Alpha");

        let record = document.into_record("Alpha").unwrap();
        assert_eq!(record.name, "Alpha");
        assert_eq!(record.file_names, vec!["/w/a.ts", "/w/b.ts"]);
        let updated = record.updated_at.unwrap();
        assert_eq!(updated.to_rfc3339(), "2024-03-15T11:30:00+00:00");
    }

    #[test]
    fn document_without_fields_yields_empty_list() {
        let json = r#"{
            "name": "projects/p/databases/(default)/documents/users/u1/projects/Empty",
            "createTime": "2024-03-15T10:00:00Z"
        }"#;

        let document: Document = serde_json::from_str(json).unwrap();
        let record = document.into_record("Empty").unwrap();
        assert!(record.file_names.is_empty());
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn request_body_shape() {
        let document = Document::from_files(&["/w/a.ts".to_string()]);
        let json = serde_json::to_value(&document).unwrap();

        assert!(json.get("name").is_none());
        assert!(json.get("createTime").is_none());
        assert!(json.get("updateTime").is_none());
        assert_eq!(
            json["fields"]["fileNames"]["arrayValue"]["values"][0]["stringValue"],
            "/w/a.ts"
        );
    }

    #[test]
    fn list_response_parsing() {
        let json = format!(r#"{{ "documents": [{DOCUMENT_JSON}] }}"#);
        let page: ListResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(page.documents.len(), 1);
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn unbound_store_rejects_operations() {
        let store = FirestoreStore::new("test-project", Duration::from_secs(5)).unwrap();
        assert!(!store.is_bound());
        assert!(store.binding().is_err());

        store.bind("u1", "token");
        assert!(store.is_bound());

        store.clear_binding();
        assert!(!store.is_bound());
    }
}
