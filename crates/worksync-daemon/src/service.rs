//! The sync service facade.
//!
//! This is the boundary the presentation shell talks to: sign-in and
//! sign-out, the project CRUD operations, and the real-time sync
//! toggle. Status changes are pushed over a broadcast channel so a
//! shell can render without polling.
//!
//! Every operation maps its failure to a single [`ServiceError`]; there
//! are no automatic retries and no panics on the happy-path-adjacent
//! failures (a missing record, an expired token, a dead network).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use worksync_core::{Identity, ProjectRecord, StatusEvent, enumerate_files, workspace_name};
use worksync_google::{
    AuthError, CachedCredential, CredentialStorage, FirebaseAuthClient, FirebaseSession,
    FirestoreStore, GoogleConfig, OAuthClient, ProjectStore,
};

use crate::error::{ServiceError, ServiceResult};
use crate::prefs::Preferences;
use crate::reconciler::Reconciler;
use crate::session::Session;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Composes the credential exchange, the session slot, the project
/// store, and the reconciler into one facade.
pub struct SyncService {
    workspace_root: PathBuf,
    oauth: OAuthClient,
    auth: FirebaseAuthClient,
    credentials: CredentialStorage,
    prefs: Preferences,
    store: Arc<dyn ProjectStore>,
    /// Concrete handle for identity binding; `None` when composed over
    /// a non-Firestore store.
    firestore: Option<Arc<FirestoreStore>>,
    reconciler: Reconciler,
    session: Session,
    firebase: Mutex<Option<FirebaseSession>>,
    events: broadcast::Sender<StatusEvent>,
}

impl SyncService {
    /// Creates a service backed by Firestore, with preferences at the
    /// default location.
    pub fn new(config: GoogleConfig, workspace_root: impl Into<PathBuf>) -> ServiceResult<Self> {
        let firestore = Arc::new(FirestoreStore::new(&config.project_id, config.timeout)?);
        Self::assemble(
            config,
            workspace_root.into(),
            firestore.clone(),
            Some(firestore),
            Preferences::new(Preferences::default_path()),
        )
    }

    /// Creates a service over an arbitrary store implementation.
    ///
    /// Used by tests and in-process compositions; identity binding is
    /// skipped since only the Firestore store needs it.
    pub fn with_store(
        config: GoogleConfig,
        workspace_root: impl Into<PathBuf>,
        store: Arc<dyn ProjectStore>,
        prefs: Preferences,
    ) -> ServiceResult<Self> {
        Self::assemble(config, workspace_root.into(), store, None, prefs)
    }

    fn assemble(
        config: GoogleConfig,
        workspace_root: PathBuf,
        store: Arc<dyn ProjectStore>,
        firestore: Option<Arc<FirestoreStore>>,
        prefs: Preferences,
    ) -> ServiceResult<Self> {
        config
            .validate()
            .map_err(|e| ServiceError::Auth(AuthError::configuration(e)))?;

        let credentials = CredentialStorage::new(&config.credential_path);
        let auth = FirebaseAuthClient::new(&config.api_key, config.timeout)?;
        let oauth = OAuthClient::new(config)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            workspace_root,
            oauth,
            auth,
            credentials,
            prefs,
            reconciler: Reconciler::new(store.clone()),
            store,
            firestore,
            session: Session::new(),
            firebase: Mutex::new(None),
            events,
        })
    }

    /// Subscribes to status events.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    /// Returns the current identity, if signed in.
    pub fn identity(&self) -> Option<Identity> {
        self.session.identity()
    }

    /// Returns true if a user is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.session.is_signed_in()
    }

    /// Returns true while real-time sync is enabled.
    pub fn realtime_enabled(&self) -> bool {
        self.reconciler.is_enabled()
    }

    /// The workspace this service operates on.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// The project name derived from the workspace root.
    pub fn project_name(&self) -> ServiceResult<String> {
        Ok(workspace_name(&self.workspace_root)?)
    }

    /// Runs the full sign-in flow: browser round trip, credential
    /// exchange, session establishment, credential caching.
    pub async fn begin_sign_in(&self) -> ServiceResult<Identity> {
        let google_token = self.oauth.authorize().await?;
        let session = self.auth.sign_in_with_id_token(&google_token).await?;
        let identity = session.identity.clone();
        self.complete_sign_in(session, Some(google_token)).await;
        Ok(identity)
    }

    /// Attempts to restore the previous session from the cached
    /// credential. Best-effort: any failure clears the cache and leaves
    /// the process signed out. Returns true if a session was restored.
    pub async fn restore_session(&self) -> bool {
        if let Err(e) = self.prefs.load() {
            debug!("failed to load preferences: {e}");
        }

        let loaded = match self.credentials.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                debug!("cached credential unreadable, clearing: {e}");
                let _ = self.credentials.clear();
                return false;
            }
        };
        if !loaded {
            return false;
        }
        let Some(credential) = self.credentials.get() else {
            return false;
        };

        match self
            .auth
            .sign_in_with_id_token(&credential.google_id_token)
            .await
        {
            Ok(session) => {
                self.complete_sign_in(session, None).await;
                if self.prefs.realtime_sync() {
                    match self.enable_realtime() {
                        Ok(()) => self.session.set_realtime_enabled(true),
                        Err(e) => debug!("could not re-enable real-time sync: {e}"),
                    }
                }
                true
            }
            Err(e) => {
                debug!("session restore failed, clearing cached credential: {e}");
                let _ = self.credentials.clear();
                false
            }
        }
    }

    /// Signs out: tears down real-time sync, drops the session tokens,
    /// clears the cached credential, and notifies subscribers.
    pub async fn sign_out(&self) -> ServiceResult<()> {
        if self.reconciler.is_enabled() {
            self.reconciler.disable();
            self.session.set_realtime_enabled(false);
        }

        *self.firebase.lock().await = None;
        if let Some(ref firestore) = self.firestore {
            firestore.clear_binding();
        }
        self.credentials.clear()?;

        let was_signed_in = self.session.is_signed_in();
        self.session.clear_identity();
        if was_signed_in {
            self.emit(StatusEvent::signed_out());
            info!("signed out");
        }
        Ok(())
    }

    /// Saves the workspace as a new project record.
    pub async fn create_project(&self) -> ServiceResult<ProjectRecord> {
        self.require_identity()?;
        let (name, files) = self.scan_workspace()?;
        if files.is_empty() {
            return Err(ServiceError::EmptyWorkspace);
        }

        self.ensure_fresh_session().await?;
        let record = self.store.create(&name, files).await?;
        info!(project = %record.name, files = record.file_names.len(), "project saved");
        Ok(record)
    }

    /// Refreshes the existing project record from the workspace.
    pub async fn update_project(&self) -> ServiceResult<ProjectRecord> {
        self.require_identity()?;
        let (name, files) = self.scan_workspace()?;

        self.ensure_fresh_session().await?;
        let record = self.store.update(&name, files).await?;
        info!(project = %record.name, files = record.file_names.len(), "project updated");
        Ok(record)
    }

    /// Deletes the workspace's project record.
    pub async fn delete_project(&self) -> ServiceResult<()> {
        self.require_identity()?;
        let name = self.project_name()?;

        self.ensure_fresh_session().await?;
        self.store.delete(&name).await?;
        info!(project = %name, "project deleted");
        Ok(())
    }

    /// Lists the user's project records and notifies subscribers.
    pub async fn list_projects(&self) -> ServiceResult<Vec<ProjectRecord>> {
        self.require_identity()?;
        self.ensure_fresh_session().await?;

        let records = self.store.list().await?;
        self.emit(StatusEvent::ProjectsLoaded {
            records: records.clone(),
        });
        Ok(records)
    }

    /// Flips real-time sync, returning the new state.
    ///
    /// Enabling requires a signed-in identity and an existing
    /// workspace; either precondition failing leaves sync disabled.
    pub fn toggle_realtime_sync(&self) -> ServiceResult<bool> {
        if self.reconciler.is_enabled() {
            self.reconciler.disable();
            self.session.set_realtime_enabled(false);
            self.prefs.set_realtime_sync(false)?;
            return Ok(false);
        }

        self.enable_realtime()?;
        self.session.set_realtime_enabled(true);
        self.prefs.set_realtime_sync(true)?;
        Ok(true)
    }

    fn enable_realtime(&self) -> ServiceResult<()> {
        self.require_identity()?;
        if !self.workspace_root.is_dir() {
            return Err(ServiceError::NoWorkspace);
        }
        let name = workspace_name(&self.workspace_root)?;
        self.reconciler.enable(&self.workspace_root, &name)
    }

    async fn complete_sign_in(&self, session: FirebaseSession, cache_token: Option<String>) {
        let identity = session.identity.clone();

        if let Some(ref firestore) = self.firestore {
            firestore.bind(&identity.uid, &session.id_token);
        }
        *self.firebase.lock().await = Some(session);

        if let Some(token) = cache_token {
            if let Err(e) = self.credentials.set(CachedCredential::new(token)) {
                warn!("failed to cache credential: {e}");
            }
        }

        self.session.set_identity(identity.clone());
        self.emit(StatusEvent::signed_in(identity.label()));
        info!(user = %identity.label(), "session established");
    }

    /// Renews the session token when it has expired, rebinding the
    /// store with the fresh token.
    async fn ensure_fresh_session(&self) -> ServiceResult<()> {
        let mut guard = self.firebase.lock().await;
        let session = guard.as_ref().ok_or(ServiceError::NotSignedIn)?;
        if !session.is_expired() {
            return Ok(());
        }

        debug!("session token expired, renewing");
        let renewed = self.auth.refresh(session).await?;
        if let Some(ref firestore) = self.firestore {
            firestore.bind(&renewed.identity.uid, &renewed.id_token);
        }
        *guard = Some(renewed);
        Ok(())
    }

    fn require_identity(&self) -> ServiceResult<Identity> {
        self.session.identity().ok_or(ServiceError::NotSignedIn)
    }

    fn scan_workspace(&self) -> ServiceResult<(String, Vec<String>)> {
        if !self.workspace_root.is_dir() {
            return Err(ServiceError::NoWorkspace);
        }
        let name = workspace_name(&self.workspace_root)?;
        let files = enumerate_files(&self.workspace_root)?;
        Ok((name, files))
    }

    fn emit(&self, event: StatusEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use worksync_google::{MemoryStore, OAuthCredentials};

    struct Fixture {
        _dir: tempfile::TempDir,
        workspace: PathBuf,
        store: Arc<MemoryStore>,
        service: SyncService,
    }

    fn fixture() -> Fixture {
        fixture_named("Alpha", &["a.ts", "b.ts"])
    }

    fn fixture_named(name: &str, files: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().join(name);
        fs::create_dir(&workspace).unwrap();
        for file in files {
            fs::write(workspace.join(file), "").unwrap();
        }

        let config = GoogleConfig::new(
            OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret"),
            "test-api-key",
            "test-project",
        )
        .with_credential_path(dir.path().join("credential.json"));

        let store = Arc::new(MemoryStore::new());
        let prefs = Preferences::new(dir.path().join("prefs.json"));
        let service =
            SyncService::with_store(config, &workspace, store.clone(), prefs).unwrap();

        Fixture {
            _dir: dir,
            workspace,
            store,
            service,
        }
    }

    fn test_session() -> FirebaseSession {
        FirebaseSession {
            identity: Identity::new("uid-1").with_display_name("Ada"),
            id_token: "session-token".into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn project_operations_require_sign_in() {
        let f = fixture();

        assert!(matches!(
            f.service.create_project().await,
            Err(ServiceError::NotSignedIn)
        ));
        assert!(matches!(
            f.service.list_projects().await,
            Err(ServiceError::NotSignedIn)
        ));
        assert!(matches!(
            f.service.delete_project().await,
            Err(ServiceError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn toggle_while_signed_out_is_rejected() {
        let f = fixture();

        let err = f.service.toggle_realtime_sync().unwrap_err();
        assert!(matches!(err, ServiceError::NotSignedIn));
        assert!(!f.service.realtime_enabled());
    }

    #[tokio::test]
    async fn toggle_without_workspace_is_rejected() {
        let f = fixture();
        f.service.complete_sign_in(test_session(), None).await;

        fs::remove_dir_all(&f.workspace).unwrap();
        let err = f.service.toggle_realtime_sync().unwrap_err();
        assert!(matches!(err, ServiceError::NoWorkspace));
        assert!(!f.service.realtime_enabled());
    }

    #[tokio::test]
    async fn sign_in_emits_status_event() {
        let f = fixture();
        let mut rx = f.service.subscribe();

        f.service.complete_sign_in(test_session(), None).await;

        assert!(f.service.is_signed_in());
        assert_eq!(f.service.identity().unwrap().uid, "uid-1");
        assert_eq!(rx.recv().await.unwrap(), StatusEvent::signed_in("Ada"));
    }

    #[tokio::test]
    async fn save_then_list_round_trip() {
        let f = fixture();
        f.service.complete_sign_in(test_session(), None).await;

        let record = f.service.create_project().await.unwrap();
        assert_eq!(record.name, "Alpha");
        assert_eq!(record.file_names.len(), 2);
        assert!(record.file_names[0].ends_with("a.ts"));
        assert!(record.file_names[1].ends_with("b.ts"));

        let records = f.service.list_projects().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alpha");
        assert_eq!(records[0].file_names, record.file_names);
    }

    #[tokio::test]
    async fn list_emits_projects_loaded() {
        let f = fixture();
        f.service.complete_sign_in(test_session(), None).await;
        f.service.create_project().await.unwrap();

        let mut rx = f.service.subscribe();
        f.service.list_projects().await.unwrap();

        match rx.recv().await.unwrap() {
            StatusEvent::ProjectsLoaded { records } => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].name, "Alpha");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_workspace_aborts_save() {
        let f = fixture_named("Empty", &[]);
        f.service.complete_sign_in(test_session(), None).await;

        assert!(matches!(
            f.service.create_project().await,
            Err(ServiceError::EmptyWorkspace)
        ));
        assert!(f.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_passthrough() {
        let f = fixture();
        f.service.complete_sign_in(test_session(), None).await;
        f.service.create_project().await.unwrap();

        fs::write(f.workspace.join("c.ts"), "").unwrap();
        let record = f.service.update_project().await.unwrap();
        assert_eq!(record.file_names.len(), 3);

        f.service.delete_project().await.unwrap();
        assert!(f.store.fetch("Alpha").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn toggle_round_trip_persists_flag() {
        let f = fixture();
        f.service.complete_sign_in(test_session(), None).await;

        assert!(f.service.toggle_realtime_sync().unwrap());
        assert!(f.service.realtime_enabled());
        assert!(f.service.prefs.realtime_sync());

        assert!(!f.service.toggle_realtime_sync().unwrap());
        assert!(!f.service.realtime_enabled());
        assert!(!f.service.prefs.realtime_sync());
    }

    #[tokio::test]
    async fn sign_out_cascades_reconciler_teardown() {
        let f = fixture();
        let mut rx = f.service.subscribe();
        f.service.complete_sign_in(test_session(), None).await;
        f.service.toggle_realtime_sync().unwrap();
        assert!(f.service.realtime_enabled());

        f.service.sign_out().await.unwrap();

        assert!(!f.service.realtime_enabled());
        assert!(!f.service.is_signed_in());
        assert_eq!(rx.recv().await.unwrap(), StatusEvent::signed_in("Ada"));
        assert_eq!(rx.recv().await.unwrap(), StatusEvent::signed_out());
    }

    #[tokio::test]
    async fn realtime_sync_mirrors_file_events() {
        let f = fixture();
        f.service.complete_sign_in(test_session(), None).await;
        f.service.create_project().await.unwrap();
        f.service.toggle_realtime_sync().unwrap();

        let created = f.workspace.join("c.ts");
        fs::write(&created, "").unwrap();
        let created_str = created.to_string_lossy().into_owned();
        assert!(
            wait_until(&f.store, |r| r.contains(&created_str)).await,
            "create event did not reach the record"
        );

        let removed = f.workspace.join("a.ts");
        let removed_str = removed.to_string_lossy().into_owned();
        fs::remove_file(&removed).unwrap();
        assert!(
            wait_until(&f.store, |r| !r.contains(&removed_str)).await,
            "delete event did not reach the record"
        );
    }

    async fn wait_until(
        store: &Arc<MemoryStore>,
        predicate: impl Fn(&ProjectRecord) -> bool,
    ) -> bool {
        for _ in 0..100 {
            if let Ok(Some(record)) = store.fetch("Alpha").await {
                if predicate(&record) {
                    return true;
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }
}
