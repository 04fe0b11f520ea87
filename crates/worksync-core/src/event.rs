//! Status events emitted to the presentation shell.

use serde::{Deserialize, Serialize};

use crate::record::ProjectRecord;

/// Events pushed over the service's broadcast channel so that a shell
/// (CLI, panel, ...) can render sign-in state and project listings
/// without polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// The signed-in identity changed (present or absent).
    SignInStatusChanged {
        /// Whether a user is currently signed in.
        signed_in: bool,
        /// Display label of the signed-in user, if any.
        display_name: Option<String>,
    },

    /// A project listing finished loading.
    ProjectsLoaded {
        /// The records, in the store's native order.
        records: Vec<ProjectRecord>,
    },
}

impl StatusEvent {
    /// Convenience constructor for a signed-in transition.
    pub fn signed_in(display_name: impl Into<String>) -> Self {
        Self::SignInStatusChanged {
            signed_in: true,
            display_name: Some(display_name.into()),
        }
    }

    /// Convenience constructor for a signed-out transition.
    pub fn signed_out() -> Self {
        Self::SignInStatusChanged {
            signed_in: false,
            display_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_event_serializes_with_tag() {
        let event = StatusEvent::signed_in("Ada");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sign_in_status_changed");
        assert_eq!(json["signed_in"], true);
        assert_eq!(json["display_name"], "Ada");
    }

    #[test]
    fn projects_loaded_round_trip() {
        let event = StatusEvent::ProjectsLoaded {
            records: vec![ProjectRecord::new("Alpha", vec!["/w/a.ts".into()])],
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: StatusEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
