//! Time-boxed cache of fetched stylesheet bodies.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

/// Shared cache keyed by absolute stylesheet URL.
///
/// Each entry keeps the body together with the post-redirect base URL of
/// the fetch that produced it, so relative imports in a cached sheet
/// resolve the same way on every hit. Entries expire a TTL after
/// insertion. Eviction is lazy: expired entries are skipped on lookup and
/// swept on the next insert. Concurrent extractions may race to fill the
/// same URL; the last writer wins, which is harmless because both fetched
/// the same body.
#[derive(Clone)]
pub struct StylesheetCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CachedSheet>>>,
}

struct CachedSheet {
    body: Arc<str>,
    base: Url,
    stored_at: Instant,
}

impl CachedSheet {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

impl StylesheetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, url: &str) -> Option<(Arc<str>, Url)> {
        let entries = self.entries.read().await;
        entries
            .get(url)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| (entry.body.clone(), entry.base.clone()))
    }

    pub async fn insert(&self, url: String, base: Url, body: Arc<str>) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, entry| !entry.is_expired(ttl));
        entries.insert(
            url,
            CachedSheet {
                body,
                base,
                stored_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
