//! Authentication state as seen by the closet.
//!
//! The identity provider itself is opaque; this module only tracks whether
//! resolution has finished and which principal, if any, is signed in.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Principal {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Resolution has not completed yet
    Loading,
    /// Resolved: `Some` when signed in, `None` for a guest
    Resolved(Option<Principal>),
}

/// Session-level auth source that broadcasts every transition.
pub struct SessionAuth {
    tx: watch::Sender<AuthState>,
}

impl SessionAuth {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AuthState::Loading);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn principal(&self) -> Option<Principal> {
        match &*self.tx.borrow() {
            AuthState::Resolved(p) => p.clone(),
            AuthState::Loading => None,
        }
    }

    /// Finish resolution (or report a later change)
    pub fn resolve(&self, principal: Option<Principal>) {
        match &principal {
            Some(p) => info!("Auth resolved: signed in as {}", p.uid),
            None => info!("Auth resolved: guest"),
        }
        self.tx.send_replace(AuthState::Resolved(principal));
    }

    pub fn sign_in(&self, principal: Principal) {
        self.resolve(Some(principal));
    }

    pub fn sign_out(&self) {
        self.resolve(None);
    }
}

impl Default for SessionAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transitions_are_broadcast() {
        let auth = SessionAuth::new();
        let mut rx = auth.subscribe();
        assert_eq!(*rx.borrow(), AuthState::Loading);

        auth.sign_in(Principal::new("u1"));
        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow_and_update(),
            AuthState::Resolved(Some(Principal::new("u1")))
        );

        auth.sign_out();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), AuthState::Resolved(None));
        assert!(auth.principal().is_none());
    }
}
