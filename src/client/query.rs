use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{ClientError, ClientResult};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Cache address: a resource name plus the parameters of the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: &'static str,
    params: Vec<String>,
}

impl QueryKey {
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            params: Vec::new(),
        }
    }

    pub fn with(mut self, param: impl ToString) -> Self {
        self.params.push(param.to_string());
        self
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        for param in &self.params {
            write!(f, "/{}", param)?;
        }
        Ok(())
    }
}

/// How long a cached value is served without refetching (`stale_time`),
/// how long an unused entry survives (`gc_time`), and how many times a
/// retryable failure is retried before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    pub stale_time: Duration,
    pub gc_time: Duration,
    pub retry: u32,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            gc_time: Duration::from_secs(5 * 60),
            retry: 3,
        }
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    last_used: Instant,
    gc_time: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
        now.duration_since(self.fetched_at) < stale_time
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.last_used) >= self.gc_time
    }
}

pub struct QueryClient {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    retry_delay: Duration,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self::with_retry_delay(Duration::from_secs(1))
    }

    /// `base` doubles on each retry, capped at thirty seconds.
    pub fn with_retry_delay(base: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            retry_delay: base,
        }
    }

    /// Returns the cached value for `key` while it is fresh, otherwise runs
    /// `fetcher` (with retries) and caches the result. Failures are never
    /// cached. The lock is released while `fetcher` runs. Storing a result
    /// also evicts every entry past its GC window.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, policy: QueryPolicy, fetcher: F) -> ClientResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let now = Instant::now();
        {
            let mut entries = self.entries.lock().await;
            if let Some(entry) = entries.get_mut(&key) {
                entry.last_used = now;
                if entry.is_fresh(now, policy.stale_time) {
                    if let Some(value) = entry.value.downcast_ref::<T>() {
                        debug!(key = %key, "Query cache hit");
                        return Ok(value.clone());
                    }
                    warn!(key = %key, "Cached value has a different type, refetching");
                }
            }
        }

        let value = self.fetch_with_retry(&key, policy.retry, fetcher).await?;

        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        if entries.len() < before {
            debug!(evicted = before - entries.len(), "Query cache swept");
        }
        entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value.clone()),
                fetched_at: now,
                last_used: now,
                gc_time: policy.gc_time,
            },
        );

        Ok(value)
    }

    async fn fetch_with_retry<T, F, Fut>(&self, key: &QueryKey, retry: u32, fetcher: F) -> ClientResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match fetcher().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < retry && e.is_retryable() => {
                    let delay = self.backoff(attempt);
                    warn!(key = %key, attempt = attempt + 1, error = %e, "Query failed, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }

    /// The cached value for `key` regardless of staleness.
    pub async fn get_cached<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
    }

    /// Drops the entry for exactly `key`. Returns whether one existed.
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        let removed = self.entries.lock().await.remove(key).is_some();
        if removed {
            debug!(key = %key, "Query invalidated");
        }
        removed
    }

    /// Removes entries unused for longer than their GC window.
    pub async fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
