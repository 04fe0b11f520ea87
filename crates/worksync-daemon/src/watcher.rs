//! Workspace file watching.
//!
//! One recursive watcher per enabled workspace, forwarding only
//! create/delete activity. Content modifications are ignored; renames
//! are decomposed into a delete of the old path and a create of the new
//! one, matching how the rest of the system models moves.

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecursiveMode, Watcher as _};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A file-system transition relevant to reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    /// A file appeared at the path.
    Created(PathBuf),
    /// A file disappeared from the path.
    Removed(PathBuf),
}

/// Handle to an active workspace watcher.
///
/// Dropping the handle disposes the underlying watcher; no further
/// events are delivered afterwards.
#[derive(Debug)]
pub struct WorkspaceWatcher {
    _watcher: notify::RecommendedWatcher,
}

impl WorkspaceWatcher {
    /// Starts watching the workspace root, sending mapped events into
    /// the channel.
    pub fn spawn(
        root: &Path,
        tx: mpsc::UnboundedSender<FsEvent>,
    ) -> Result<Self, notify::Error> {
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        for fs_event in map_event(event) {
                            let _ = tx.send(fs_event);
                        }
                    }
                    Err(e) => warn!("watcher error: {e}"),
                }
            })?;

        watcher.watch(root, RecursiveMode::Recursive)?;
        debug!(root = %root.display(), "workspace watcher started");

        Ok(Self { _watcher: watcher })
    }
}

/// Maps a raw watcher event to the create/delete transitions the
/// reconciler consumes. Everything else is dropped.
fn map_event(event: notify::Event) -> Vec<FsEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.into_iter().map(FsEvent::Created).collect(),
        EventKind::Remove(_) => event.paths.into_iter().map(FsEvent::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => event.paths.into_iter().map(FsEvent::Removed).collect(),
            RenameMode::To => event.paths.into_iter().map(FsEvent::Created).collect(),
            RenameMode::Both => {
                let mut paths = event.paths.into_iter();
                let mut out = Vec::new();
                if let Some(from) = paths.next() {
                    out.push(FsEvent::Removed(from));
                }
                if let Some(to) = paths.next() {
                    out.push(FsEvent::Created(to));
                }
                out
            }
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use std::time::Duration;

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        let mut e = notify::Event::new(kind);
        for p in paths {
            e = e.add_path(PathBuf::from(p));
        }
        e
    }

    #[test]
    fn create_and_remove_are_forwarded() {
        let created = map_event(event(EventKind::Create(CreateKind::File), &["/w/a.ts"]));
        assert_eq!(created, vec![FsEvent::Created(PathBuf::from("/w/a.ts"))]);

        let removed = map_event(event(EventKind::Remove(RemoveKind::File), &["/w/a.ts"]));
        assert_eq!(removed, vec![FsEvent::Removed(PathBuf::from("/w/a.ts"))]);
    }

    #[test]
    fn modifications_are_ignored() {
        let events = map_event(event(
            EventKind::Modify(ModifyKind::Data(notify::event::DataChange::Content)),
            &["/w/a.ts"],
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn rename_decomposes_into_delete_and_create() {
        let events = map_event(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/w/old.ts", "/w/new.ts"],
        ));
        assert_eq!(
            events,
            vec![
                FsEvent::Removed(PathBuf::from("/w/old.ts")),
                FsEvent::Created(PathBuf::from("/w/new.ts")),
            ]
        );
    }

    #[tokio::test]
    async fn watcher_reports_file_creation_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _watcher = WorkspaceWatcher::spawn(dir.path(), tx).unwrap();

        let file = dir.path().join("a.ts");
        std::fs::write(&file, "content").unwrap();

        let created = wait_for(&mut rx, |e| matches!(e, FsEvent::Created(p) if *p == file)).await;
        assert!(created, "expected a create event for {file:?}");

        std::fs::remove_file(&file).unwrap();
        let removed = wait_for(&mut rx, |e| matches!(e, FsEvent::Removed(p) if *p == file)).await;
        assert!(removed, "expected a remove event for {file:?}");
    }

    async fn wait_for(
        rx: &mut mpsc::UnboundedReceiver<FsEvent>,
        predicate: impl Fn(&FsEvent) -> bool,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(event)) if predicate(&event) => return true,
                Ok(Some(_)) => continue,
                _ => return false,
            }
        }
    }
}
