//! Client configuration.
//!
//! All settings live in a single `config.toml` at
//! `~/.config/worksync/config.toml` by default:
//!
//! ```toml
//! [google]
//! client_id = "....apps.googleusercontent.com"
//! client_secret = "..."
//! api_key = "..."
//! project_id = "..."
//! redirect_port = 3000
//!
//! [sync]
//! workspace = "/path/to/workspace"
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use worksync_google::{GoogleConfig, OAuthCredentials};

use crate::error::{ClientError, ClientResult};

/// Configuration for the worksync client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google / Firebase settings.
    pub google: GoogleSettings,

    /// Sync settings.
    pub sync: SyncSettings,

    /// Debug mode.
    pub debug: bool,
}

/// Google OAuth and Firebase project settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth 2.0 client ID.
    pub client_id: String,

    /// OAuth 2.0 client secret.
    pub client_secret: String,

    /// Firebase web API key.
    pub api_key: String,

    /// Firestore project identifier.
    pub project_id: String,

    /// Port of the local OAuth callback listener.
    pub redirect_port: Option<u16>,
}

/// Workspace selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Workspace root. Defaults to the current directory.
    pub workspace: Option<PathBuf>,
}

impl ClientConfig {
    /// Returns the default config path
    /// (`~/.config/worksync/config.toml`).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("worksync")
            .join("config.toml")
    }

    /// Loads configuration from the default path. A missing file yields
    /// the defaults.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| ClientError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Builds the provider configuration, validating required fields.
    pub fn google_config(&self) -> ClientResult<GoogleConfig> {
        let credentials =
            OAuthCredentials::new(&self.google.client_id, &self.google.client_secret);
        let mut config = GoogleConfig::new(
            credentials,
            &self.google.api_key,
            &self.google.project_id,
        );
        if let Some(port) = self.google.redirect_port {
            config = config.with_redirect_port(port);
        }
        config.validate().map_err(ClientError::Config)?;
        Ok(config)
    }

    /// Resolves the workspace root: the configured path, or the current
    /// directory.
    pub fn workspace_root(&self, override_path: Option<&Path>) -> ClientResult<PathBuf> {
        if let Some(path) = override_path {
            return Ok(path.to_path_buf());
        }
        if let Some(ref path) = self.sync.workspace {
            return Ok(path.clone());
        }
        Ok(env::current_dir()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml = r#"
            debug = true

            [google]
            client_id = "id.apps.googleusercontent.com"
            client_secret = "secret"
            api_key = "key"
            project_id = "proj"
            redirect_port = 8123

            [sync]
            workspace = "/srv/workspace"
        "#;

        let config: ClientConfig = toml::from_str(toml).unwrap();
        assert!(config.debug);
        assert_eq!(config.google.redirect_port, Some(8123));
        assert_eq!(
            config.sync.workspace.as_deref(),
            Some(Path::new("/srv/workspace"))
        );

        let google = config.google_config().unwrap();
        assert_eq!(google.redirect_port, 8123);
        assert_eq!(google.project_id, "proj");
    }

    #[test]
    fn defaults_are_empty() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert!(!config.debug);
        assert!(config.sync.workspace.is_none());
        // Empty credentials do not validate.
        assert!(config.google_config().is_err());
    }

    #[test]
    fn workspace_override_wins() {
        let config = ClientConfig {
            sync: SyncSettings {
                workspace: Some(PathBuf::from("/configured")),
            },
            ..Default::default()
        };

        let root = config.workspace_root(Some(Path::new("/override"))).unwrap();
        assert_eq!(root, PathBuf::from("/override"));

        let root = config.workspace_root(None).unwrap();
        assert_eq!(root, PathBuf::from("/configured"));
    }

    #[test]
    fn load_from_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.toml");
        assert!(ClientConfig::load_from(&missing).is_err());
    }
}
