//! OAuth 2.0 authorization-code flow with a loopback redirect.
//!
//! # Flow Overview
//!
//! 1. Generate a random state token for CSRF protection
//! 2. Bind the local callback listener on the registered redirect port
//! 3. Open the user's browser to Google's consent page
//! 4. User grants permission; Google redirects to the local listener
//! 5. Extract the authorization code from the first callback request
//! 6. Exchange the code for tokens and keep the identity token
//!
//! The listener handles exactly one meaningful request; repeated or
//! concurrent callbacks find it already closed. The whole acquisition
//! is bounded by a deadline so an abandoned browser flow cannot leak a
//! bound port indefinitely.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rand::Rng as _;
use tracing::{debug, error, info, warn};

use crate::config::GoogleConfig;
use crate::error::{AuthError, AuthResult};

/// Google OAuth endpoints.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// State token length in bytes, before hex encoding.
const STATE_TOKEN_BYTES: usize = 16;

/// Fixed response sent to the browser for every callback request,
/// regardless of the outcome.
const CALLBACK_PAGE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
    <html><body><h1>Authentication successful!</h1>\
    <p>You can close this window and return to your editor.</p></body></html>";

/// Drives the authorization-code flow against Google.
#[derive(Debug)]
pub struct OAuthClient {
    config: GoogleConfig,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    pub fn new(config: GoogleConfig) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Runs one complete authorization attempt and returns the Google
    /// identity token.
    ///
    /// This binds the callback listener, opens the user's browser, waits
    /// for the redirect (bounded), and exchanges the authorization code.
    /// There is no retry at any step; the first failure is final.
    pub async fn authorize(&self) -> AuthResult<String> {
        let state = generate_state();
        let redirect_uri = self.config.redirect_uri();

        let listener =
            TcpListener::bind(("127.0.0.1", self.config.redirect_port)).map_err(|e| {
                AuthError::configuration(format!(
                    "failed to bind callback listener on port {}: {e}",
                    self.config.redirect_port
                ))
            })?;

        let auth_url = build_auth_url(
            &self.config.credentials.client_id,
            &redirect_uri,
            &self.config.scopes,
            &state,
        );

        info!("starting sign-in flow, opening browser");
        debug!(url = %auth_url, "authorization URL");

        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {e}");
            eprintln!("\nPlease open this URL in your browser:\n\n{auth_url}\n");
        }

        let code = wait_for_callback(listener, &state, self.config.callback_timeout)?;

        info!("received authorization code, exchanging for tokens");
        self.exchange_code(&code, &redirect_uri).await
    }

    /// Exchanges an authorization code for tokens, returning the
    /// identity token.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> AuthResult<String> {
        let params = [
            ("code", code),
            ("client_id", self.config.credentials.client_id.as_str()),
            (
                "client_secret",
                self.config.credentials.client_secret.as_str(),
            ),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::token_exchange(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::token_exchange(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(AuthError::token_exchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::token_exchange(format!("invalid token response: {e}")))?;

        token_response
            .id_token
            .ok_or_else(|| AuthError::token_exchange("token response lacks an identity token"))
    }
}

/// Generates a cryptographically random hex-encoded state token.
fn generate_state() -> String {
    let mut rng = rand::rng();
    (0..STATE_TOKEN_BYTES)
        .map(|_| format!("{:02x}", rng.random::<u8>()))
        .collect()
}

/// Builds the authorization URL.
fn build_auth_url(client_id: &str, redirect_uri: &str, scopes: &[String], state: &str) -> String {
    let scope = scopes.join(" ");
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&\
        access_type=offline&prompt=consent",
        GOOGLE_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scope),
        urlencoding::encode(state),
    )
}

/// Waits for the OAuth callback and extracts the authorization code.
///
/// Accepts connections on a helper thread; the first request to the
/// callback path settles the flow. Anything else (favicon probes, other
/// paths) is ignored.
fn wait_for_callback(
    listener: TcpListener,
    expected_state: &str,
    timeout: Duration,
) -> AuthResult<String> {
    let expected_state = expected_state.to_string();
    let (tx, rx) = mpsc::channel();

    let _handle = thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Some(result) = handle_callback(stream, &expected_state) {
                        let _ = tx.send(result);
                        return;
                    }
                }
                Err(e) => {
                    error!("failed to accept connection: {e}");
                }
            }
        }
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(AuthError::callback_timeout()),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(AuthError::internal("callback channel disconnected"))
        }
    }
}

/// Handles one incoming request on the callback listener.
///
/// Returns `None` for requests that are not the OAuth callback, so the
/// accept loop keeps waiting.
fn handle_callback(mut stream: TcpStream, expected_state: &str) -> Option<AuthResult<String>> {
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();

    if reader.read_line(&mut request_line).is_err() {
        return None;
    }

    // Request line: GET /callback?code=...&state=... HTTP/1.1
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 || parts[0] != "GET" {
        return None;
    }

    let path = parts[1];
    if !path.starts_with("/callback") {
        return None;
    }

    let params = parse_callback_query(path);

    // The browser gets the same terminal page whatever the outcome.
    let _ = stream.write_all(CALLBACK_PAGE.as_bytes());
    let _ = stream.flush();

    Some(classify_callback(params, expected_state))
}

/// Query parameters consumed from the callback request.
#[derive(Debug, Default, PartialEq, Eq)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Parses the callback path's query string.
fn parse_callback_query(path: &str) -> CallbackParams {
    let query = match path.find('?') {
        Some(i) => &path[i + 1..],
        None => "",
    };

    let mut params = CallbackParams::default();
    for pair in query.split('&') {
        let mut kv = pair.splitn(2, '=');
        if let (Some(key), Some(value)) = (kv.next(), kv.next()) {
            let value = urlencoding::decode(value).unwrap_or_default().into_owned();
            match key {
                "code" => params.code = Some(value),
                "state" => params.state = Some(value),
                "error" => params.error = Some(value),
                _ => {}
            }
        }
    }
    params
}

/// Applies the callback decision order: state binding first, then a
/// provider-reported error, then the code itself.
fn classify_callback(params: CallbackParams, expected_state: &str) -> AuthResult<String> {
    if params.state.as_deref() != Some(expected_state) {
        return Err(AuthError::state_mismatch());
    }

    if let Some(error) = params.error {
        return Err(AuthError::provider(format!(
            "provider reported an error: {error}"
        )));
    }

    match params.code {
        Some(code) => Ok(code),
        None => Err(AuthError::missing_code()),
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}
