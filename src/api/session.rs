use std::sync::{
    atomic::{AtomicBool, Ordering},
    PoisonError, RwLock,
};
use tracing::warn;

use crate::traits::Session;

/// In-memory session holding an access token obtained by the sign-in flow.
/// An unauthorized response logs the user out by dropping the token.
#[derive(Debug, Default)]
pub struct TokenSession {
    token: RwLock<Option<String>>,
    expired: AtomicBool,
}

impl TokenSession {
    pub fn new(token: Option<String>) -> Self {
        TokenSession {
            token: RwLock::new(token),
            expired: AtomicBool::new(false),
        }
    }

    /// Stores a fresh token, e.g. after signing in again.
    pub fn sign_in(&self, token: String) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.expired.store(false, Ordering::SeqCst);
    }

    pub fn is_signed_in(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// True once the remote service rejected the session.
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }
}

impl Session for TokenSession {
    fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn on_unauthorized(&self) {
        warn!("Session expired, signing out");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.expired.store(true, Ordering::SeqCst);
    }
}
