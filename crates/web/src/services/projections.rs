//! Cached order projections.
//!
//! Each projection keeps a generation counter. A fetch records the generation
//! before calling the backend and may only store its result if the generation
//! is unchanged afterwards; invalidating or replacing an entry bumps it. A list
//! fetched before a mutation can therefore never overwrite the state the
//! mutation produced.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use gamekart_core::{Order, Projection, UserId};

/// One cached list: a projection as seen by one viewer.
///
/// Shared projections (every admin sees the same list) ignore the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionKey {
    pub projection: Projection,
    pub viewer: Option<UserId>,
}

impl ProjectionKey {
    #[must_use]
    pub fn new(projection: Projection, viewer: &UserId) -> Self {
        Self {
            projection,
            viewer: (!projection.is_shared()).then(|| viewer.clone()),
        }
    }
}

#[derive(Default)]
struct Generations {
    all_orders: AtomicU64,
    my_orders: AtomicU64,
    assigned_orders: AtomicU64,
}

impl Generations {
    const fn slot(&self, projection: Projection) -> &AtomicU64 {
        match projection {
            Projection::AllOrders => &self.all_orders,
            Projection::MyOrders => &self.my_orders,
            Projection::AssignedOrders => &self.assigned_orders,
        }
    }
}

/// Order lists per projection and viewer.
#[derive(Clone)]
pub struct ProjectionCache {
    inner: Arc<ProjectionCacheInner>,
}

struct ProjectionCacheInner {
    lists: Cache<ProjectionKey, Arc<Vec<Order>>>,
    generations: Generations,
}

impl ProjectionCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let lists = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();
        Self {
            inner: Arc::new(ProjectionCacheInner {
                lists,
                generations: Generations::default(),
            }),
        }
    }

    pub async fn get(&self, key: &ProjectionKey) -> Option<Arc<Vec<Order>>> {
        self.inner.lists.get(key).await
    }

    /// Snapshot to pass to [`ProjectionCache::store`] after a fetch.
    #[must_use]
    pub fn generation(&self, projection: Projection) -> u64 {
        self.inner
            .generations
            .slot(projection)
            .load(Ordering::Acquire)
    }

    /// Store a fetched list unless the projection changed since `generation`.
    ///
    /// Returns whether the list was stored.
    pub async fn store(
        &self,
        key: ProjectionKey,
        generation: u64,
        orders: Arc<Vec<Order>>,
    ) -> bool {
        if self.generation(key.projection) != generation {
            debug!(projection = %key.projection, "Discarding stale projection fetch");
            return false;
        }
        self.inner.lists.insert(key, orders).await;
        true
    }

    /// Drop a cached list; the next lookup refetches it.
    pub async fn invalidate(&self, key: &ProjectionKey) {
        self.bump(key.projection);
        self.inner.lists.invalidate(key).await;
    }

    /// Swap the cached copy of `order` for the given document.
    ///
    /// The entry is replaced whole, matched by id. Returns whether a cached
    /// list contained the order; if none did the projection is invalidated
    /// instead.
    pub async fn replace_order(&self, key: &ProjectionKey, order: &Order) -> bool {
        self.bump(key.projection);
        let Some(current) = self.inner.lists.get(key).await else {
            return false;
        };
        let Some(index) = current.iter().position(|cached| cached.id == order.id) else {
            self.inner.lists.invalidate(key).await;
            return false;
        };

        let mut updated = current.as_ref().clone();
        if let Some(slot) = updated.get_mut(index) {
            *slot = order.clone();
        }
        self.inner.lists.insert(key.clone(), Arc::new(updated)).await;
        true
    }

    fn bump(&self, projection: Projection) {
        self.inner
            .generations
            .slot(projection)
            .fetch_add(1, Ordering::AcqRel);
    }
}
