//! CLI shell for worksync: argument parsing, configuration, and the
//! command handlers wired to the sync service.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command, ConfigAction};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
