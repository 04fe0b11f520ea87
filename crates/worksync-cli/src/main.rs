//! worksync CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use worksync_cli::cli::{Cli, Command, ConfigAction};
use worksync_cli::commands;
use worksync_cli::config::ClientConfig;
use worksync_cli::error::ClientResult;
use worksync_core::{TracingConfig, init_tracing};
use worksync_daemon::SyncService;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };

    // The config-only commands work without provider credentials.
    match cli.command {
        Command::Config {
            action: ConfigAction::Path,
        } => return commands::config_path(),
        Command::Config {
            action: ConfigAction::Dump,
        } => return commands::config_dump(&config),
        _ => {}
    }

    let workspace_root = config.workspace_root(cli.workspace.as_deref())?;
    let service = SyncService::new(config.google_config()?, workspace_root)?;

    match cli.command {
        Command::Login => commands::login(&service).await,
        Command::Logout => commands::logout(&service).await,
        Command::Save => commands::save(&service).await,
        Command::Update => commands::update(&service).await,
        Command::Delete { yes } => commands::delete(&service, yes).await,
        Command::List => commands::list(&service).await,
        Command::Watch => commands::watch(&service).await,
        Command::Status => commands::status(&service).await,
        Command::Config { .. } => unreachable!("handled above"),
    }
}
