//! In-process credential store.

use crate::model::UserIdentity;
use crate::services::CredentialStore;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
struct Session {
    token: Option<SecretString>,
    user: Option<UserIdentity>,
}

/// Keeps the bearer token and user record in memory.
#[derive(Default)]
pub struct MemoryCredentialStore {
    session: RwLock<Session>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that is already signed in.
    pub fn signed_in(token: impl Into<String>, user: UserIdentity) -> Self {
        let store = Self::new();
        store.sign_in(token, user);
        store
    }

    pub fn sign_in(&self, token: impl Into<String>, user: UserIdentity) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        session.token = Some(SecretString::from(token.into()));
        session.user = Some(user);
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MemoryCredentialStore")
            .field("token", &session.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &session.user)
            .finish()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<SecretString> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_owned()))
    }

    fn user(&self) -> Option<UserIdentity> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    fn clear(&self) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        session.token = None;
        session.user = None;
    }
}
