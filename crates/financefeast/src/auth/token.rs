/*
[INPUT]:  Bearer tokens from login or caller supplied
[OUTPUT]: Cached token retrieval, invalidation and a single-writer refresh guard
[POS]:    Auth layer - token lifecycle management
[UPDATE]: When adding token expiry or changing storage strategy
*/

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, MutexGuard};

/// How the cached token was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Supplied,
    Login,
}

/// Stored token data with metadata
#[derive(Clone)]
pub struct TokenData {
    pub token: String,
    pub obtained_at: DateTime<Utc>,
    pub source: TokenSource,
}

impl std::fmt::Debug for TokenData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenData")
            .field("token", &"***")
            .field("obtained_at", &self.obtained_at)
            .field("source", &self.source)
            .finish()
    }
}

/// Thread-safe bearer token cache.
///
/// Reads go through the `RwLock`. Anyone about to log in first takes the
/// refresh guard and re-checks the cache, so concurrent callers trigger at
/// most one login.
#[derive(Debug, Clone)]
pub struct TokenStore {
    data: Arc<RwLock<Option<TokenData>>>,
    refresh: Arc<Mutex<()>>,
}

impl TokenStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(None)),
            refresh: Arc::new(Mutex::new(())),
        }
    }

    /// Store a token
    pub fn set_token(&self, token: String, source: TokenSource) {
        let token_data = TokenData {
            token,
            obtained_at: Utc::now(),
            source,
        };

        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token_data);
    }

    /// Get the current token if available
    pub fn get_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|data| data.token.clone())
    }

    pub fn has_token(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.is_some()
    }

    /// Get token data if available
    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// Clear the token only if it is still `stale`.
    ///
    /// Returns false when another task already replaced it.
    pub fn clear_if(&self, stale: &str) -> bool {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(data) if data.token == stale => {
                *guard = None;
                true
            }
            _ => false,
        }
    }

    /// Acquire the single-writer refresh guard
    pub async fn refresh_guard(&self) -> MutexGuard<'_, ()> {
        self.refresh.lock().await
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let store = TokenStore::new();
        assert!(store.get_token().is_none());
        assert!(!store.has_token());
    }

    #[test]
    fn test_set_and_get_token() {
        let store = TokenStore::new();
        store.set_token("test_token".to_string(), TokenSource::Login);

        assert_eq!(store.get_token(), Some("test_token".to_string()));
        assert_eq!(store.token_data().map(|d| d.source), Some(TokenSource::Login));
    }

    #[test]
    fn test_clear_token() {
        let store = TokenStore::new();
        store.set_token("test_token".to_string(), TokenSource::Supplied);

        store.clear();
        assert!(store.get_token().is_none());
    }

    #[test]
    fn test_clear_if_ignores_replaced_token() {
        let store = TokenStore::new();
        store.set_token("fresh".to_string(), TokenSource::Login);

        assert!(!store.clear_if("stale"));
        assert_eq!(store.get_token(), Some("fresh".to_string()));
        assert!(store.clear_if("fresh"));
        assert!(!store.has_token());
    }

    #[test]
    fn test_clones_share_state() {
        let store = TokenStore::new();
        let other = store.clone();
        store.set_token("shared".to_string(), TokenSource::Login);
        assert_eq!(other.get_token(), Some("shared".to_string()));
    }

    #[test]
    fn test_debug_redacts_token() {
        let store = TokenStore::new();
        store.set_token("secret-token".to_string(), TokenSource::Login);
        let rendered = format!("{:?}", store.token_data());
        assert!(!rendered.contains("secret-token"));
    }
}
