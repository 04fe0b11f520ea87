//! Google sign-in and the Firestore-backed project store.
//!
//! This crate covers the provider-facing half of the system:
//!
//! - [`OAuthClient`] - OAuth 2.0 authorization-code flow with a local
//!   callback listener
//! - [`FirebaseAuthClient`] - Identity Toolkit credential exchange and
//!   session token renewal
//! - [`CredentialStorage`] - durable cached credential for session
//!   restoration
//! - [`ProjectStore`] - the store abstraction, implemented remotely by
//!   [`FirestoreStore`] and in-process by [`MemoryStore`]
//!
//! # Sign-in flow
//!
//! 1. `OAuthClient::authorize` obtains a Google identity token via the
//!    browser round trip
//! 2. `FirebaseAuthClient::sign_in_with_id_token` exchanges it for a
//!    [`FirebaseSession`] carrying the user's identity and store tokens
//! 3. The Google token is cached for best-effort restoration on the
//!    next process start

pub mod auth;
pub mod config;
pub mod credential;
pub mod error;
pub mod firestore;
pub mod oauth;
pub mod store;

pub use auth::{FirebaseAuthClient, FirebaseSession};
pub use config::{GoogleConfig, OAuthCredentials};
pub use credential::{CachedCredential, CredentialStorage};
pub use error::{AuthError, AuthErrorCode, AuthResult, StoreError, StoreErrorCode, StoreResult};
pub use firestore::FirestoreStore;
pub use oauth::OAuthClient;
pub use store::{BoxFuture, MemoryStore, ProjectStore};
