//! Command handlers.

use std::io::{self, Write as _};

use tracing::debug;

use worksync_core::ProjectRecord;
use worksync_daemon::SyncService;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// `worksync login` - run the browser sign-in flow.
pub async fn login(service: &SyncService) -> ClientResult<()> {
    println!("Waiting for authentication in browser...");
    let identity = service.begin_sign_in().await?;
    println!("Signed in as {}", identity.label());
    Ok(())
}

/// `worksync logout` - sign out and clear the cached credential.
pub async fn logout(service: &SyncService) -> ClientResult<()> {
    // Restore first so sign-out tears down whatever the cached
    // credential would have re-established.
    let _ = service.restore_session().await;
    service.sign_out().await?;
    println!("Signed out");
    Ok(())
}

/// `worksync save` - create the project record.
pub async fn save(service: &SyncService) -> ClientResult<()> {
    require_session(service).await?;
    let record = service.create_project().await?;
    println!(
        "Project \"{}\" saved ({} files)",
        record.name,
        record.file_names.len()
    );
    Ok(())
}

/// `worksync update` - refresh the project record.
pub async fn update(service: &SyncService) -> ClientResult<()> {
    require_session(service).await?;
    let record = service.update_project().await?;
    println!(
        "Project \"{}\" updated ({} files)",
        record.name,
        record.file_names.len()
    );
    Ok(())
}

/// `worksync delete` - delete the project record.
pub async fn delete(service: &SyncService, yes: bool) -> ClientResult<()> {
    require_session(service).await?;
    let name = service.project_name()?;

    if !yes && !confirm(&format!("Delete project \"{name}\"?"))? {
        println!("Project deletion canceled");
        return Ok(());
    }

    service.delete_project().await?;
    println!("Project \"{name}\" deleted");
    Ok(())
}

/// `worksync list` - print the user's projects.
pub async fn list(service: &SyncService) -> ClientResult<()> {
    require_session(service).await?;
    let records = service.list_projects().await?;

    if records.is_empty() {
        println!("No projects found");
        return Ok(());
    }

    for record in &records {
        print_record(record);
    }
    Ok(())
}

/// `worksync watch` - keep real-time sync enabled until Ctrl-C.
pub async fn watch(service: &SyncService) -> ClientResult<()> {
    require_session(service).await?;

    if !service.realtime_enabled() {
        service.toggle_realtime_sync()?;
    }
    println!(
        "Real-time sync enabled for {} - press Ctrl-C to stop",
        service.workspace_root().display()
    );

    tokio::signal::ctrl_c().await?;

    if service.realtime_enabled() {
        service.toggle_realtime_sync()?;
    }
    println!("\nReal-time sync disabled");
    Ok(())
}

/// `worksync status` - print session and workspace state.
pub async fn status(service: &SyncService) -> ClientResult<()> {
    let restored = service.restore_session().await;
    debug!(restored, "session restore attempted");

    match service.identity() {
        Some(identity) => println!("Signed in as {}", identity.label()),
        None => println!("Not signed in"),
    }
    println!("Workspace: {}", service.workspace_root().display());
    if let Ok(name) = service.project_name() {
        println!("Project name: {name}");
    }
    println!(
        "Real-time sync: {}",
        if service.realtime_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );
    Ok(())
}

/// `worksync config path`
pub fn config_path() -> ClientResult<()> {
    println!("{}", ClientConfig::default_path().display());
    Ok(())
}

/// `worksync config dump`
pub fn config_dump(config: &ClientConfig) -> ClientResult<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to render configuration: {e}")))?;
    print!("{rendered}");
    Ok(())
}

async fn require_session(service: &SyncService) -> ClientResult<()> {
    if service.is_signed_in() {
        return Ok(());
    }
    if service.restore_session().await {
        return Ok(());
    }
    Err(ClientError::NotSignedIn)
}

fn confirm(prompt: &str) -> ClientResult<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_record(record: &ProjectRecord) {
    match record.updated_at {
        Some(at) => println!("{} (updated {})", record.name, at.to_rfc3339()),
        None => println!("{}", record.name),
    }
    for file in &record.file_names {
        println!("  {file}");
    }
}
