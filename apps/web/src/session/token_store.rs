use std::collections::HashMap;

use parking_lot::RwLock;

/// Storage key of the bearer credential.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key of the email awaiting a second factor.
pub const PENDING_EMAIL_KEY: &str = "pendingEmail";

/// Client-side credential storage.
///
/// Shared by every request in one browser context. There is no coordination
/// between writers: concurrent refreshes race and the last write wins.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn set_access_token(&self, token: &str);
    fn pending_email(&self) -> Option<String>;
    fn set_pending_email(&self, email: &str);
    /// Removes and returns the pending email.
    fn take_pending_email(&self) -> Option<String>;
    /// Drops both the access token and the pending email.
    fn clear(&self);
}

/// In-memory key/value storage keyed like the browser's local storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<&'static str, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access_token(token: &str) -> Self {
        let store = Self::new();
        store.set_access_token(token);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        self.entries.read().get(ACCESS_TOKEN_KEY).cloned()
    }

    fn set_access_token(&self, token: &str) {
        self.entries
            .write()
            .insert(ACCESS_TOKEN_KEY, token.to_string());
    }

    fn pending_email(&self) -> Option<String> {
        self.entries.read().get(PENDING_EMAIL_KEY).cloned()
    }

    fn set_pending_email(&self, email: &str) {
        self.entries
            .write()
            .insert(PENDING_EMAIL_KEY, email.to_string());
    }

    fn take_pending_email(&self) -> Option<String> {
        self.entries.write().remove(PENDING_EMAIL_KEY)
    }

    fn clear(&self) {
        let mut entries = self.entries.write();
        entries.remove(ACCESS_TOKEN_KEY);
        entries.remove(PENDING_EMAIL_KEY);
    }
}
