//! Read-through query cache with explicit invalidation.
//!
//! Reads are cached under a [`QueryKey`]; every successful mutation
//! invalidates the keys whose data it changed. There is no push channel,
//! so a mutation made by another client is only seen after the entry
//! expires or is invalidated locally.
//!
//! Every invalidation bumps an epoch. A fetch that was already in flight
//! when the epoch moved does not store its result, so a read that started
//! before a mutation can never repopulate the cache with pre-mutation data.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Projects,
    Project(String),
    ProjectSteps(String),
    TrackedItems(String),
    TrackedItemDetails(String),
    ProjectAttributes(String),
    InventoryItems,
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Projects => f.write_str("projects"),
            QueryKey::Project(id) => write!(f, "project/{id}"),
            QueryKey::ProjectSteps(id) => write!(f, "projectSteps/{id}"),
            QueryKey::TrackedItems(id) => write!(f, "trackedItems/{id}"),
            QueryKey::TrackedItemDetails(id) => write!(f, "trackedItemDetails/{id}"),
            QueryKey::ProjectAttributes(id) => write!(f, "projectAttributes/{id}"),
            QueryKey::InventoryItems => f.write_str("inventoryItems"),
        }
    }
}

/// Typed values behind a [`QueryKey`], stored type-erased.
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<QueryKey, Arc<dyn Any + Send + Sync>>,
    epoch: Arc<AtomicU64>,
}

impl QueryCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .support_invalidation_closures()
                .build(),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn get<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.inner
            .get(key)
            .await
            .and_then(|arc| arc.downcast_ref::<T>().cloned())
    }

    pub async fn insert<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        self.inner.insert(key, Arc::new(value)).await;
    }

    /// Return the cached value or run `fetch`, caching a successful result
    /// unless an invalidation happened while it ran.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(&key).await {
            debug!(key = %key, "cache hit");
            return Ok(hit);
        }
        let started = self.epoch();
        let value = fetch().await?;
        if self.epoch() != started {
            debug!(key = %key, "invalidated during fetch, not caching");
            return Ok(value);
        }
        self.insert(key.clone(), value.clone()).await;
        // An invalidation may land between the check and the insert.
        if self.epoch() != started {
            self.inner.invalidate(&key).await;
        }
        Ok(value)
    }

    pub async fn invalidate(&self, key: &QueryKey) {
        debug!(key = %key, "invalidate");
        self.bump();
        self.inner.invalidate(key).await;
    }

    /// Drop every entry whose key matches `pred`.
    pub fn invalidate_where<P>(&self, pred: P)
    where
        P: Fn(&QueryKey) -> bool + Send + Sync + 'static,
    {
        self.bump();
        if let Err(e) = self.inner.invalidate_entries_if(move |k, _| pred(k)) {
            warn!("predicate invalidation unavailable, clearing cache: {}", e);
            self.inner.invalidate_all();
        }
    }

    pub fn invalidate_all(&self) {
        self.bump();
        self.inner.invalidate_all();
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.inner.get(key).await.is_some()
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entry_count())
            .field("epoch", &self.epoch())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> QueryCache {
        QueryCache::new(100, Duration::from_secs(60))
    }

    #[test]
    fn key_names() {
        assert_eq!(QueryKey::Projects.to_string(), "projects");
        assert_eq!(QueryKey::ProjectSteps("4".into()).to_string(), "projectSteps/4");
        assert_eq!(QueryKey::TrackedItemDetails("9".into()).to_string(), "trackedItemDetails/9");
    }

    #[tokio::test]
    async fn typed_round_trip() {
        let c = cache();
        c.insert(QueryKey::Projects, vec!["a".to_string()]).await;
        assert_eq!(c.get::<Vec<String>>(&QueryKey::Projects).await, Some(vec!["a".to_string()]));
        assert_eq!(c.get::<u32>(&QueryKey::Projects).await, None);
    }

    #[tokio::test]
    async fn get_or_fetch_only_fetches_once() {
        let c = cache();
        let key = QueryKey::TrackedItems("1".into());
        let first: Result<u32, ()> = c.get_or_fetch(key.clone(), || async { Ok(1) }).await;
        let second: Result<u32, ()> = c.get_or_fetch(key.clone(), || async { Ok(2) }).await;
        assert_eq!((first, second), (Ok(1), Ok(1)));

        let err: Result<u32, &str> = c
            .get_or_fetch(QueryKey::InventoryItems, || async { Err("down") })
            .await;
        assert_eq!(err, Err("down"));
        assert!(!c.contains(&QueryKey::InventoryItems).await);
    }

    #[tokio::test]
    async fn invalidate_where_matches_variant() {
        let c = cache();
        c.insert(QueryKey::ProjectSteps("1".into()), 1u8).await;
        c.insert(QueryKey::ProjectSteps("2".into()), 2u8).await;
        c.insert(QueryKey::Projects, 3u8).await;

        c.invalidate_where(|k| matches!(k, QueryKey::ProjectSteps(_)));
        assert!(!c.contains(&QueryKey::ProjectSteps("1".into())).await);
        assert!(!c.contains(&QueryKey::ProjectSteps("2".into())).await);
        assert!(c.contains(&QueryKey::Projects).await);
    }

    #[tokio::test]
    async fn fetch_overlapping_invalidation_is_not_cached() {
        let c = cache();
        let key = QueryKey::TrackedItems("1".into());
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let reader = {
            let c = c.clone();
            let key = key.clone();
            tokio::spawn(async move {
                c.get_or_fetch(key, || async move {
                    let _ = started_tx.send(());
                    let _ = release_rx.await;
                    Ok::<_, ()>("before-update".to_string())
                })
                .await
            })
        };

        started_rx.await.unwrap();
        c.invalidate(&key).await;
        release_tx.send(()).unwrap();

        assert_eq!(reader.await.unwrap(), Ok("before-update".to_string()));
        assert_eq!(c.get::<String>(&key).await, None);

        let fresh: Result<String, ()> = c
            .get_or_fetch(key.clone(), || async { Ok("after-update".to_string()) })
            .await;
        assert_eq!(fresh, Ok("after-update".to_string()));
        assert_eq!(c.get::<String>(&key).await, Some("after-update".to_string()));
    }
}
