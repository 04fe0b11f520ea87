//! Service error types.

use thiserror::Error;

use worksync_core::WorkspaceError;
use worksync_google::{AuthError, StoreError};

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the sync service.
///
/// Every public operation converts its failure into exactly one of
/// these; nothing is retried automatically and nothing crashes the
/// host process.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The operation requires a signed-in identity.
    #[error("not signed in")]
    NotSignedIn,

    /// The operation requires an open workspace.
    #[error("no workspace is open")]
    NoWorkspace,

    /// The workspace has no files to sync.
    #[error("no files found in the current workspace")]
    EmptyWorkspace,

    /// Sign-in flow failure.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Remote store failure.
    #[error("project store error: {0}")]
    Store(#[from] StoreError),

    /// Workspace scanning failure.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// File watcher failure.
    #[error("file watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// Preference storage failure.
    #[error("preferences error: {message}")]
    Preferences {
        /// What went wrong.
        message: String,
    },
}

impl ServiceError {
    /// Creates a preferences error.
    pub fn preferences(message: impl Into<String>) -> Self {
        Self::Preferences {
            message: message.into(),
        }
    }
}
