//! The authenticated user's identity.

use serde::{Deserialize, Serialize};

/// A signed-in user as reported by the identity provider.
///
/// Created on a successful credential exchange and held by the session
/// for the lifetime of the sign-in. The `uid` is opaque and scopes all
/// remote store operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier assigned by the auth service.
    pub uid: String,

    /// Display name, when the provider supplied one.
    pub display_name: Option<String>,

    /// Account email, when the provider supplied one.
    pub email: Option<String>,
}

impl Identity {
    /// Creates a new identity.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }

    /// Builder method to set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Builder method to set the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Human-readable label: display name, falling back to email,
    /// falling back to the uid.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_display_name() {
        let identity = Identity::new("uid-1")
            .with_display_name("Ada Lovelace")
            .with_email("ada@example.com");
        assert_eq!(identity.label(), "Ada Lovelace");
    }

    #[test]
    fn label_falls_back_to_email() {
        let identity = Identity::new("uid-1").with_email("ada@example.com");
        assert_eq!(identity.label(), "ada@example.com");
    }

    #[test]
    fn label_falls_back_to_uid() {
        let identity = Identity::new("uid-1");
        assert_eq!(identity.label(), "uid-1");
    }
}
