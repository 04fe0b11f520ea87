//! Session state, real-time reconciliation, and the sync service.
//!
//! This crate composes the provider pieces from `worksync-google` into
//! the service a shell talks to:
//!
//! - [`Session`] - the process-wide identity slot with a push-based
//!   subscription
//! - [`Preferences`] - durable key-value settings (the real-time flag)
//! - [`Reconciler`] - mirrors workspace create/delete events into the
//!   project record through a serialized worker
//! - [`SyncService`] - the facade: sign-in/out, project CRUD, and the
//!   real-time toggle

mod error;
mod prefs;
mod reconciler;
mod service;
mod session;
mod watcher;

pub use error::{ServiceError, ServiceResult};
pub use prefs::Preferences;
pub use reconciler::Reconciler;
pub use service::SyncService;
pub use session::Session;
pub use watcher::{FsEvent, WorkspaceWatcher};
