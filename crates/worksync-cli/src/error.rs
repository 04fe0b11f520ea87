//! CLI error types.

use std::io;

use thiserror::Error;

use worksync_daemon::ServiceError;

/// Result type for CLI operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration file problems.
    #[error("configuration error: {0}")]
    Config(String),

    /// Service operation failure.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Terminal / filesystem IO failure.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The command needs a signed-in session and none could be
    /// restored.
    #[error("not signed in - run `worksync login` first")]
    NotSignedIn,
}
