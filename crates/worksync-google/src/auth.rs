//! Firebase Identity Toolkit sign-in.
//!
//! The Google identity token from the OAuth flow is exchanged against
//! the Identity Toolkit `signInWithIdp` endpoint, which yields the
//! user's identity plus the session tokens used for store access. The
//! session token expires and is renewed through the secure-token
//! endpoint with the refresh token.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use worksync_core::Identity;

use crate::error::{AuthError, AuthResult};

/// Identity Toolkit endpoints.
const SIGN_IN_WITH_IDP_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithIdp";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Buffer subtracted from the reported expiry so tokens are renewed
/// before they actually lapse.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// An authenticated session with the backing auth service.
#[derive(Debug, Clone)]
pub struct FirebaseSession {
    /// The signed-in user.
    pub identity: Identity,
    /// Bearer token for store requests.
    pub id_token: String,
    /// Token used to renew `id_token`.
    pub refresh_token: Option<String>,
    /// When `id_token` should be considered expired.
    pub expires_at: Option<DateTime<Utc>>,
}

impl FirebaseSession {
    /// Returns true if the session token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }
}

fn expiry_from_now(expires_in_secs: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in_secs
        .map(|secs| Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_BUFFER_SECS))
}

/// Client for the Identity Toolkit endpoints.
#[derive(Debug)]
pub struct FirebaseAuthClient {
    api_key: String,
    http_client: reqwest::Client,
}

impl FirebaseAuthClient {
    /// Creates a new client with the given web API key.
    pub fn new(api_key: impl Into<String>, timeout: std::time::Duration) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            http_client,
        })
    }

    /// Exchanges a Google identity token for a signed-in session.
    pub async fn sign_in_with_id_token(
        &self,
        google_id_token: &str,
    ) -> AuthResult<FirebaseSession> {
        let body = serde_json::json!({
            "postBody": format!("id_token={google_id_token}&providerId=google.com"),
            "requestUri": "http://localhost",
            "returnSecureToken": true,
        });

        let response = self
            .http_client
            .post(SIGN_IN_WITH_IDP_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::credential_rejected(format!("sign-in request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AuthError::credential_rejected(format!("failed to read sign-in response: {e}"))
        })?;

        if !status.is_success() {
            return Err(AuthError::credential_rejected(format!(
                "auth service rejected the credential ({status}): {body}"
            )));
        }

        let parsed: SignInResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::credential_rejected(format!("invalid sign-in response: {e}"))
        })?;

        let session = parsed.into_session()?;
        info!(user = %session.identity.label(), "signed in");
        Ok(session)
    }

    /// Renews the session token using the refresh token.
    ///
    /// The identity is carried over unchanged.
    pub async fn refresh(&self, session: &FirebaseSession) -> AuthResult<FirebaseSession> {
        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::credential_rejected("session has no refresh token"))?;

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http_client
            .post(SECURE_TOKEN_URL)
            .query(&[("key", self.api_key.as_str())])
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::credential_rejected(format!("refresh request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AuthError::credential_rejected(format!("failed to read refresh response: {e}"))
        })?;

        if !status.is_success() {
            return Err(AuthError::credential_rejected(format!(
                "token refresh failed ({status}): {body}"
            )));
        }

        let parsed: RefreshResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::credential_rejected(format!("invalid refresh response: {e}"))
        })?;

        debug!("renewed session token");
        let expires_at = expiry_from_now(parsed.expires_in_secs());
        Ok(FirebaseSession {
            identity: session.identity.clone(),
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token.or_else(|| session.refresh_token.clone()),
            expires_at,
        })
    }
}

/// Response from `accounts:signInWithIdp`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: Option<String>,
    display_name: Option<String>,
    email: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

impl SignInResponse {
    fn into_session(self) -> AuthResult<FirebaseSession> {
        let uid = self
            .local_id
            .ok_or_else(|| AuthError::credential_rejected("sign-in response lacks a user id"))?;
        let id_token = self.id_token.ok_or_else(|| {
            AuthError::credential_rejected("sign-in response lacks a session token")
        })?;

        let mut identity = Identity::new(uid);
        if let Some(name) = self.display_name {
            identity = identity.with_display_name(name);
        }
        if let Some(email) = self.email {
            identity = identity.with_email(email);
        }

        let expires_in = self.expires_in.and_then(|s| s.parse::<i64>().ok());

        Ok(FirebaseSession {
            identity,
            id_token,
            refresh_token: self.refresh_token,
            expires_at: expiry_from_now(expires_in),
        })
    }
}

/// Response from the secure-token endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

impl RefreshResponse {
    fn expires_in_secs(&self) -> Option<i64> {
        self.expires_in.as_deref().and_then(|s| s.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_response_parsing() {
        let json = r#"{
            "localId": "uid-123",
            "displayName": "Ada Lovelace",
            "email": "ada@example.com",
            "idToken": "firebase-token",
            "refreshToken": "refresh-token",
            "expiresIn": "3600"
        }"#;

        let parsed: SignInResponse = serde_json::from_str(json).unwrap();
        let session = parsed.into_session().unwrap();

        assert_eq!(session.identity.uid, "uid-123");
        assert_eq!(session.identity.label(), "Ada Lovelace");
        assert_eq!(session.id_token, "firebase-token");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-token"));
        assert!(session.expires_at.is_some());
        assert!(!session.is_expired());
    }

    #[test]
    fn sign_in_response_without_token_is_rejected() {
        let json = r#"{ "localId": "uid-123" }"#;
        let parsed: SignInResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.into_session().is_err());
    }

    #[test]
    fn sign_in_response_without_uid_is_rejected() {
        let json = r#"{ "idToken": "firebase-token" }"#;
        let parsed: SignInResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.into_session().is_err());
    }

    #[test]
    fn session_expiry() {
        let mut session = FirebaseSession {
            identity: Identity::new("uid"),
            id_token: "token".into(),
            refresh_token: None,
            expires_at: None,
        };
        assert!(!session.is_expired());

        session.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(session.is_expired());

        session.expires_at = Some(Utc::now() + Duration::hours(1));
        assert!(!session.is_expired());
    }

    #[test]
    fn refresh_response_parsing() {
        let json = r#"{
            "id_token": "new-token",
            "refresh_token": "new-refresh",
            "expires_in": "3600"
        }"#;

        let parsed: RefreshResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id_token, "new-token");
        assert_eq!(parsed.expires_in_secs(), Some(3600));
    }
}
