//! Access-token holder shared by the API client and the status poller.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Bearer token for the pool backend.
///
/// Backed by a watch channel so background loops notice sign-out without
/// polling a flag.
#[derive(Clone)]
pub struct AuthSession {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl AuthSession {
    /// A session with no token.
    pub fn signed_out() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// A session holding `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::signed_out();
        session.sign_in(token);
        session
    }

    /// Read the token from the environment variable `var`, if set and non-empty.
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(token) if !token.trim().is_empty() => Self::with_token(token.trim()),
            _ => Self::signed_out(),
        }
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        self.tx.send_replace(Some(token.into()));
    }

    /// Clear the token. Subscribers observe the change.
    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
