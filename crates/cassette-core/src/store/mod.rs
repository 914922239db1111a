//! Credential storage
//!
//! Durable key/value storage for the access and refresh tokens.
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ Credentials (token pair view) │
//! └───────────────┬───────────────┘
//!                 │ Arc<dyn CredentialStore>
//!          ┌──────┴──────┐
//!          ▼             ▼
//!    ┌───────────┐ ┌───────────┐
//!    │MemoryStore│ │ FileStore │
//!    └───────────┘ └───────────┘
//! ```

mod file;
mod memory;

use std::sync::Arc;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage key of the short-lived bearer token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key of the token used to mint new access tokens
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key/value storage for credentials.
///
/// Storage is assumed to be available; implementations log failures
/// instead of returning them.
pub trait CredentialStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn clear(&self, name: &str);
}

/// Token pair view over a [`CredentialStore`].
///
/// Normal operation writes or clears both tokens together; only a token
/// refresh replaces the access token on its own.
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn CredentialStore>,
}

impl Credentials {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Credentials backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn access_token(&self) -> Option<String> {
        non_empty(self.store.get(ACCESS_TOKEN_KEY))
    }

    pub fn refresh_token(&self) -> Option<String> {
        non_empty(self.store.get(REFRESH_TOKEN_KEY))
    }

    /// Store a freshly issued token pair.
    ///
    /// A missing refresh token clears any stale one so the pair never
    /// mixes two sessions.
    pub fn store_pair(&self, access: &str, refresh: Option<&str>) {
        self.store.set(ACCESS_TOKEN_KEY, access);
        match refresh {
            Some(refresh) if !refresh.is_empty() => self.store.set(REFRESH_TOKEN_KEY, refresh),
            _ => self.store.clear(REFRESH_TOKEN_KEY),
        }
    }

    /// Replace the access token after a refresh
    pub fn store_access(&self, access: &str) {
        self.store.set(ACCESS_TOKEN_KEY, access);
    }

    /// Replace the refresh token after the server rotated it
    pub fn store_refresh(&self, refresh: &str) {
        self.store.set(REFRESH_TOKEN_KEY, refresh);
    }

    /// Drop both tokens
    pub fn clear(&self) {
        self.store.clear(ACCESS_TOKEN_KEY);
        self.store.clear(REFRESH_TOKEN_KEY);
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &self.access_token().map(|_| "****"))
            .field("refresh_token", &self.refresh_token().map(|_| "****"))
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
