//! Core types: identity, project records, status events, workspace scanning

pub mod event;
pub mod identity;
pub mod record;
pub mod tracing;
pub mod workspace;

pub use event::StatusEvent;
pub use identity::Identity;
pub use record::ProjectRecord;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use workspace::{WorkspaceError, enumerate_files, workspace_name};
