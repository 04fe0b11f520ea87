//! Google integration configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// OAuth 2.0 client credentials from the Google Cloud Console.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Validates that the credentials appear correctly formatted.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Configuration for sign-in and the Firestore-backed project store.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client credentials.
    pub credentials: OAuthCredentials,

    /// Firebase web API key, used for the Identity Toolkit endpoints.
    pub api_key: String,

    /// Firestore project identifier.
    pub project_id: String,

    /// Port of the local OAuth callback listener. The redirect URI
    /// registered with the provider must be
    /// `http://localhost:{port}/callback`.
    pub redirect_port: u16,

    /// OAuth scopes to request.
    pub scopes: Vec<String>,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Bounded wait for the browser round trip.
    pub callback_timeout: Duration,

    /// Path of the cached credential file.
    pub credential_path: PathBuf,
}

impl GoogleConfig {
    /// Default callback listener port.
    pub const DEFAULT_REDIRECT_PORT: u16 = 3000;

    /// Default HTTP timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default bounded wait for the OAuth callback, in seconds.
    pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

    /// Default OAuth scopes.
    pub const DEFAULT_SCOPES: [&'static str; 3] = ["email", "profile", "openid"];

    /// Creates a new configuration with defaults.
    pub fn new(
        credentials: OAuthCredentials,
        api_key: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            api_key: api_key.into(),
            project_id: project_id.into(),
            redirect_port: Self::DEFAULT_REDIRECT_PORT,
            scopes: Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            callback_timeout: Duration::from_secs(Self::DEFAULT_CALLBACK_TIMEOUT_SECS),
            credential_path: Self::default_credential_path(),
        }
    }

    /// Returns the default cached-credential path
    /// (`~/.local/share/worksync/credential.json`).
    pub fn default_credential_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".local").join("share"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("worksync")
            .join("credential.json")
    }

    /// The redirect URI matching the callback listener.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.redirect_port)
    }

    /// Builder method to set the callback listener port.
    pub fn with_redirect_port(mut self, port: u16) -> Self {
        self.redirect_port = port;
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method to set the callback wait deadline.
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Builder method to set the cached-credential path.
    pub fn with_credential_path(mut self, path: impl AsRef<Path>) -> Self {
        self.credential_path = path.as_ref().to_path_buf();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {e}"))?;
        if self.api_key.is_empty() {
            return Err("api_key is required".to_string());
        }
        if self.project_id.is_empty() {
            return Err("project_id is required".to_string());
        }
        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GoogleConfig {
        GoogleConfig::new(
            OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret"),
            "test-api-key",
            "test-project",
        )
    }

    #[test]
    fn credentials_validation() {
        assert!(
            OAuthCredentials::new("id.apps.googleusercontent.com", "s")
                .validate()
                .is_ok()
        );
        assert!(OAuthCredentials::new("", "s").validate().is_err());
        assert!(OAuthCredentials::new("bad-id", "s").validate().is_err());
        assert!(
            OAuthCredentials::new("id.apps.googleusercontent.com", "")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn defaults() {
        let config = test_config();
        assert_eq!(config.redirect_port, 3000);
        assert_eq!(config.redirect_uri(), "http://localhost:3000/callback");
        assert_eq!(config.scopes, vec!["email", "profile", "openid"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn redirect_uri_follows_port() {
        let config = test_config().with_redirect_port(8123);
        assert_eq!(config.redirect_uri(), "http://localhost:8123/callback");
    }

    #[test]
    fn validation_rejects_missing_fields() {
        let mut config = test_config();
        config.api_key.clear();
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.scopes.clear();
        assert!(config.validate().is_err());
    }
}
