//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// worksync - mirror a workspace's file listing to your project store
#[derive(Debug, Parser)]
#[command(name = "worksync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "WORKSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workspace root (defaults to the configured or current directory)
    #[arg(long, short)]
    pub workspace: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with Google
    Login,

    /// Sign out and clear the cached credential
    Logout,

    /// Save the workspace as a new project
    Save,

    /// Refresh the existing project from the workspace
    Update,

    /// Delete the workspace's project
    Delete {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// List your projects
    List,

    /// Run with real-time sync enabled until interrupted
    Watch,

    /// Show sign-in and workspace status
    Status,

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,

    /// Print the loaded configuration
    Dump,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["worksync", "login"]);
        assert!(matches!(cli.command, Command::Login));

        let cli = Cli::parse_from(["worksync", "-v", "delete", "--yes"]);
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Delete { yes: true }));

        let cli = Cli::parse_from(["worksync", "--workspace", "/w", "save"]);
        assert_eq!(cli.workspace.as_deref(), Some(std::path::Path::new("/w")));
    }
}
