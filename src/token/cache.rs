//! Access token storage
//!
//! A [`TokenCache`] always keeps the latest record in memory. When a
//! [`TokenStore`] is attached, reads go to the store instead and every
//! refresh is written through to it, which lets several processes (or
//! several clients in one process) share one token. After [`TokenCache::clear`]
//! the store is not consulted again until the next refresh replaces the record.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::WechatError;

/// Seconds shaved off the server-reported lifetime so a token is refreshed
/// before WeChat starts rejecting it.
pub const EXPIRY_MARGIN_SECS: u64 = 200;

/// A fetched access token and the instant after which it must not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub expires_at: SystemTime,
}

impl TokenRecord {
    pub fn new(token: impl Into<String>, expires_at: SystemTime) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Builds the record for a token issued at `issued_at` with the given
    /// server lifetime. Lifetimes at or below the margin yield a record that
    /// is already stale.
    pub fn issued(token: impl Into<String>, expires_in: u64, issued_at: SystemTime) -> Self {
        let lifetime = Duration::from_secs(expires_in.saturating_sub(EXPIRY_MARGIN_SECS));
        Self::new(token, issued_at + lifetime)
    }

    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        self.expires_at > now
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(SystemTime::now())
    }
}

/// External persistence for the access token.
///
/// Implement this to keep the token in Redis, a database, or anywhere else
/// shared between processes. `load` returning `Ok(None)` means nothing has
/// been stored yet.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<TokenRecord>, WechatError>;

    async fn save(&self, record: &TokenRecord) -> Result<(), WechatError>;
}

/// In-process [`TokenStore`]; share one `Arc` between clients to share the token.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    record: RwLock<Option<TokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: TokenRecord) -> Self {
        Self {
            record: RwLock::new(Some(record)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<TokenRecord>, WechatError> {
        Ok(self.record.read().await.clone())
    }

    async fn save(&self, record: &TokenRecord) -> Result<(), WechatError> {
        *self.record.write().await = Some(record.clone());
        Ok(())
    }
}

/// Holder of the current [`TokenRecord`] for one client.
pub struct TokenCache {
    memory: RwLock<Option<TokenRecord>>,
    store: Option<Arc<dyn TokenStore>>,
    cleared: AtomicBool,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("store", &self.store.as_ref().map(|_| ".."))
            .field("cleared", &self.cleared.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl TokenCache {
    pub fn in_memory() -> Self {
        Self {
            memory: RwLock::new(None),
            store: None,
            cleared: AtomicBool::new(false),
        }
    }

    pub fn with_store(store: Arc<dyn TokenStore>) -> Self {
        Self {
            memory: RwLock::new(None),
            store: Some(store),
            cleared: AtomicBool::new(false),
        }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// The record callers should trust: the store's when one is attached,
    /// otherwise the in-memory one. Nothing after a [`clear`](Self::clear).
    pub async fn current(&self) -> Result<Option<TokenRecord>, WechatError> {
        if self.cleared.load(Ordering::Acquire) {
            return Ok(None);
        }
        match &self.store {
            Some(store) => store.load().await,
            None => Ok(self.memory.read().await.clone()),
        }
    }

    /// Swaps in a freshly fetched record and writes it through to the store.
    pub async fn replace(&self, record: TokenRecord) -> Result<(), WechatError> {
        *self.memory.write().await = Some(record.clone());
        if let Some(store) = &self.store {
            store.save(&record).await?;
        }
        self.cleared.store(false, Ordering::Release);
        Ok(())
    }

    /// Forgets the current record so the next read comes back empty, even
    /// with a store attached. The stored record itself is overwritten by the
    /// next [`replace`](Self::replace), not deleted here.
    pub async fn clear(&self) {
        *self.memory.write().await = None;
        self.cleared.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_applies_margin() {
        let now = SystemTime::now();
        let record = TokenRecord::issued("T1", 7200, now);
        assert_eq!(record.expires_at, now + Duration::from_secs(7000));
        assert!(record.is_valid_at(now));
        assert!(!record.is_valid_at(now + Duration::from_secs(7000)));
    }

    #[test]
    fn test_issued_short_lifetime_is_stale() {
        let now = SystemTime::now();
        let record = TokenRecord::issued("T1", 120, now);
        assert_eq!(record.expires_at, now);
        assert!(!record.is_valid_at(now));
    }

    #[tokio::test]
    async fn test_in_memory_cache_roundtrip() {
        let cache = TokenCache::in_memory();
        assert!(cache.current().await.unwrap().is_none());

        let record = TokenRecord::issued("T1", 7200, SystemTime::now());
        cache.replace(record.clone()).await.unwrap();
        assert_eq!(cache.current().await.unwrap(), Some(record));

        cache.clear().await;
        assert!(cache.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_takes_precedence_over_memory() {
        let stored = TokenRecord::issued("from_store", 7200, SystemTime::now());
        let store = Arc::new(MemoryTokenStore::with_record(stored.clone()));
        let cache = TokenCache::with_store(store.clone());

        assert!(cache.has_store());
        assert_eq!(cache.current().await.unwrap(), Some(stored));

        let fresh = TokenRecord::issued("fresh", 7200, SystemTime::now());
        cache.replace(fresh.clone()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(fresh.clone()));

        cache.clear().await;
        assert!(cache.current().await.unwrap().is_none());
        // the stored record stays until the next refresh overwrites it
        assert_eq!(store.load().await.unwrap(), Some(fresh));

        let next = TokenRecord::issued("next", 7200, SystemTime::now());
        cache.replace(next.clone()).await.unwrap();
        assert_eq!(cache.current().await.unwrap(), Some(next));
    }
}
