//! Process-wide session state.
//!
//! A single slot holds the current identity (or none) plus the
//! real-time sync flag. Identity changes are published through a watch
//! channel so collaborators can react to sign-in/sign-out transitions
//! without polling. The slot always starts empty; restoration happens
//! through the service, not here.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use worksync_core::Identity;

/// The mutable session slot.
#[derive(Debug)]
pub struct Session {
    identity_tx: watch::Sender<Option<Identity>>,
    realtime_enabled: AtomicBool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an empty session (signed out, real-time sync off).
    pub fn new() -> Self {
        let (identity_tx, _) = watch::channel(None);
        Self {
            identity_tx,
            realtime_enabled: AtomicBool::new(false),
        }
    }

    /// Subscribes to identity transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity_tx.subscribe()
    }

    /// Returns the current identity, if signed in.
    pub fn identity(&self) -> Option<Identity> {
        self.identity_tx.borrow().clone()
    }

    /// Returns true if an identity is present.
    pub fn is_signed_in(&self) -> bool {
        self.identity_tx.borrow().is_some()
    }

    /// Sets the current identity (sign-in transition).
    pub fn set_identity(&self, identity: Identity) {
        self.identity_tx.send_replace(Some(identity));
    }

    /// Clears the current identity (sign-out transition).
    pub fn clear_identity(&self) {
        self.identity_tx.send_replace(None);
    }

    /// Returns the in-memory real-time sync flag.
    pub fn realtime_enabled(&self) -> bool {
        self.realtime_enabled.load(Ordering::SeqCst)
    }

    /// Sets the in-memory real-time sync flag.
    pub fn set_realtime_enabled(&self, enabled: bool) {
        self.realtime_enabled.store(enabled, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_signed_out() {
        let session = Session::new();
        assert!(!session.is_signed_in());
        assert!(session.identity().is_none());
        assert!(!session.realtime_enabled());
    }

    #[test]
    fn identity_round_trip() {
        let session = Session::new();
        session.set_identity(Identity::new("uid-1").with_display_name("Ada"));
        assert!(session.is_signed_in());
        assert_eq!(session.identity().unwrap().uid, "uid-1");

        session.clear_identity();
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let session = Session::new();
        let mut rx = session.subscribe();

        session.set_identity(Identity::new("uid-1"));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        session.clear_identity();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn realtime_flag_round_trip() {
        let session = Session::new();
        session.set_realtime_enabled(true);
        assert!(session.realtime_enabled());
        session.set_realtime_enabled(false);
        assert!(!session.realtime_enabled());
    }
}
