use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::CacheError;
use crate::observability::metrics::get_metrics;
use crate::token::{Fingerprint, IssuedToken, TokenReference};

/// Selects what [`TokenCache::remove`] evicts.
#[derive(Debug, Clone, Copy)]
pub enum CacheKey<'a> {
    Fingerprint(&'a Fingerprint),
    Identifier(&'a TokenReference),
}

/// Storage for issued tokens keyed by request fingerprint.
///
/// Implementations keep no expiry policy of their own; the provider checks
/// every hit before trusting it. All operations must tolerate concurrent
/// callers.
pub trait TokenCache: Send + Sync {
    fn get(
        &self,
        fingerprint: &Fingerprint,
    ) -> impl Future<Output = Result<Option<IssuedToken>, CacheError>> + Send;

    /// Last write wins.
    fn put(
        &self,
        fingerprint: Fingerprint,
        token: IssuedToken,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Returns whether anything was evicted.
    fn remove(&self, key: CacheKey<'_>) -> impl Future<Output = Result<bool, CacheError>> + Send;
}

/// Process-local cache. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenCache {
    inner: Arc<RwLock<HashMap<Fingerprint, IssuedToken>>>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.read().await.contains_key(fingerprint)
    }
}

impl TokenCache for InMemoryTokenCache {
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<IssuedToken>, CacheError> {
        Ok(self.inner.read().await.get(fingerprint).cloned())
    }

    async fn put(&self, fingerprint: Fingerprint, token: IssuedToken) -> Result<(), CacheError> {
        let size = {
            let mut map = self.inner.write().await;
            map.insert(fingerprint, token);
            map.len()
        };
        get_metrics().await.cached_tokens.set(size as i64);
        Ok(())
    }

    async fn remove(&self, key: CacheKey<'_>) -> Result<bool, CacheError> {
        let (removed, size) = {
            let mut map = self.inner.write().await;
            let before = map.len();
            match key {
                CacheKey::Fingerprint(fingerprint) => {
                    map.remove(fingerprint);
                }
                CacheKey::Identifier(identifier) => {
                    map.retain(|_, token| token.identifier() != identifier);
                }
            }
            (before - map.len(), map.len())
        };
        debug!(removed, "token cache eviction");
        get_metrics().await.cached_tokens.set(size as i64);
        Ok(removed > 0)
    }
}
