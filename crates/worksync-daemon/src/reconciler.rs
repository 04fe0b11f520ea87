//! Real-time reconciliation of file events into the project record.
//!
//! The reconciler is a two-state machine: `Disabled` (initial) and
//! `Enabled`. While enabled it owns exactly one workspace watcher and
//! one worker task. The worker drains the event channel **serially**:
//! each create/delete performs its full fetch/modify/update round trip
//! before the next event is looked at, so two near-simultaneous events
//! cannot race on the record's file list.
//!
//! Individual event failures are logged and dropped; the watcher stays
//! alive across transient store errors.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use worksync_google::ProjectStore;

use crate::error::{ServiceError, ServiceResult};
use crate::watcher::{FsEvent, WorkspaceWatcher};

enum State {
    Disabled,
    Enabled {
        _watcher: WorkspaceWatcher,
        worker: JoinHandle<()>,
    },
}

/// Mirrors workspace create/delete events into the remote record.
pub struct Reconciler {
    store: Arc<dyn ProjectStore>,
    state: Mutex<State>,
}

impl Reconciler {
    /// Creates a disabled reconciler over the given store.
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            store,
            state: Mutex::new(State::Disabled),
        }
    }

    /// Returns true while the watcher is active.
    pub fn is_enabled(&self) -> bool {
        matches!(*self.state.lock().unwrap(), State::Enabled { .. })
    }

    /// Starts watching the workspace and reconciling into the record
    /// named `project`.
    ///
    /// The caller is responsible for the sign-in precondition; this
    /// checks only that the workspace root exists. Enabling an already
    /// enabled reconciler is a no-op.
    pub fn enable(&self, workspace_root: &Path, project: &str) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        if matches!(*state, State::Enabled { .. }) {
            return Ok(());
        }

        if !workspace_root.is_dir() {
            return Err(ServiceError::NoWorkspace);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = WorkspaceWatcher::spawn(workspace_root, tx)?;

        let store = self.store.clone();
        let project = project.to_string();
        let worker = tokio::spawn(run_loop(store, project, rx));

        *state = State::Enabled {
            _watcher: watcher,
            worker,
        };
        info!(root = %workspace_root.display(), "real-time sync enabled");
        Ok(())
    }

    /// Stops watching and aborts the worker.
    ///
    /// Events already queued are discarded; nothing is processed after
    /// this returns.
    pub fn disable(&self) {
        let mut state = self.state.lock().unwrap();
        if let State::Enabled { worker, .. } = &*state {
            worker.abort();
            info!("real-time sync disabled");
        }
        *state = State::Disabled;
    }
}

impl Drop for Reconciler {
    fn drop(&mut self) {
        self.disable();
    }
}

/// Serial reconcile loop: one event at a time, full round trip each.
async fn run_loop(
    store: Arc<dyn ProjectStore>,
    project: String,
    mut rx: mpsc::UnboundedReceiver<FsEvent>,
) {
    while let Some(event) = rx.recv().await {
        apply_event(store.as_ref(), &project, event).await;
    }
}

/// Applies one file event to the remote record.
///
/// Failures are terminal for the event: a failed fetch or update is
/// logged and the event is dropped, with no retry and no queue.
async fn apply_event(store: &dyn ProjectStore, project: &str, event: FsEvent) {
    let record = match store.fetch(project).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!(project, ?event, "no remote record; event dropped");
            return;
        }
        Err(e) => {
            warn!(project, ?event, "fetch failed, event dropped: {e}");
            return;
        }
    };

    let mut file_names = record.file_names;
    let changed = match &event {
        FsEvent::Created(path) => {
            let path = path.to_string_lossy().into_owned();
            if file_names.iter().any(|f| *f == path) {
                false
            } else {
                file_names.push(path);
                true
            }
        }
        FsEvent::Removed(path) => {
            let path = path.to_string_lossy().into_owned();
            let before = file_names.len();
            file_names.retain(|f| *f != path);
            file_names.len() != before
        }
    };

    if !changed {
        debug!(project, ?event, "record already up to date");
        return;
    }

    if let Err(e) = store.update(project, file_names).await {
        warn!(project, ?event, "update failed, event dropped: {e}");
    }
}
