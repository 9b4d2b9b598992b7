//! Compute-once source cache keyed by origin

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::stats::{CacheStats, StatsCollector};

type Slot = Arc<OnceCell<Arc<str>>>;

/// Thread-safe memoizing cache for script sources.
///
/// Concurrent callers asking for the same origin share one fetch: the first
/// caller runs the loader while the rest await the same cell. A failed fetch
/// leaves the cell empty, so a later call retries instead of caching the
/// error.
#[derive(Debug, Default)]
pub struct SourceCache {
    slots: Mutex<HashMap<String, Slot>>,
    stats: StatsCollector,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached content for `origin`, fetching it with `load` on
    /// first use.
    pub async fn get_or_fetch<F, Fut, E>(&self, origin: &str, load: F) -> Result<Arc<str>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(origin.to_string()).or_default())
        };

        if let Some(content) = slot.get() {
            trace!("source cache hit for '{}'", origin);
            self.stats.record_hit();
            return Ok(Arc::clone(content));
        }

        self.stats.record_miss();
        let content = slot
            .get_or_try_init(|| async {
                debug!("source cache miss, fetching '{}'", origin);
                load().await.map(Arc::from)
            })
            .await?;
        Ok(Arc::clone(content))
    }

    /// Whether `origin` has cached content.
    pub fn contains(&self, origin: &str) -> bool {
        self.slots
            .lock()
            .get(origin)
            .map(|slot| slot.get().is_some())
            .unwrap_or(false)
    }

    /// Number of origins with cached content.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn fetches_once_per_origin() {
        let cache = SourceCache::new();
        let fetches = AtomicUsize::new(0);

        for _ in 0..3 {
            let content: Arc<str> = cache
                .get_or_fetch("res/report.js", || async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>("function action(p) {}".to_string())
                })
                .await
                .unwrap();
            assert_eq!(&*content, "function action(p) {}");
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn distinct_origins_are_independent() {
        let cache = SourceCache::new();
        cache
            .get_or_fetch("a.js", || async { Ok::<_, std::io::Error>("a".to_string()) })
            .await
            .unwrap();
        cache
            .get_or_fetch("b.js", || async { Ok::<_, std::io::Error>("b".to_string()) })
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a.js"));
        assert!(!cache.contains("c.js"));
    }

    #[tokio::test]
    async fn failed_fetch_does_not_poison_the_slot() {
        let cache = SourceCache::new();
        let attempts = AtomicUsize::new(0);

        let result = cache
            .get_or_fetch("flaky.js", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>("connection reset")
            })
            .await;
        assert!(result.is_err());
        assert!(!cache.contains("flaky.js"));

        let content = cache
            .get_or_fetch("flaky.js", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &str>("recovered".to_string())
            })
            .await
            .unwrap();
        assert_eq!(&*content, "recovered");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let cache = Arc::new(SourceCache::new());
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let fetches = Arc::clone(&fetches);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("shared.js", || async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<_, std::io::Error>("shared".to_string())
                    })
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(&*handle.await.unwrap(), "shared");
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }
}
