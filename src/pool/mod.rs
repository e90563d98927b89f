//! [`ResourcePool`]: a fixed-capacity pool of [`WorkerResource`]s with a
//! genuine FIFO waiter queue.
//!
//! Generalizes the teacher's `BrowserPool`, but redesigns acquisition: where
//! the teacher's pool always creates on demand and never blocks a caller,
//! this pool has a hard capacity and callers beyond it wait in line for a
//! release, bounded by a timeout.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::config::PipelineConfig;
use crate::error::{RenderError, Result};
use crate::metrics::{Metrics, NoopMetrics};
use crate::worker::{WorkerFactory, WorkerResource, WorkerResourceConfig};

struct Waiter {
    id: u64,
    tx: oneshot::Sender<WorkerResource>,
}

struct Inner {
    capacity: usize,
    factory: Arc<dyn WorkerFactory>,
    pipeline_config: PipelineConfig,
    worker_resource_config: WorkerResourceConfig,
    metrics: Arc<dyn Metrics>,
    runtime: Handle,
    available: Mutex<VecDeque<WorkerResource>>,
    waiters: Mutex<VecDeque<Waiter>>,
    waiter_seq: AtomicU64,
    in_use: AtomicUsize,
    under_replacement: AtomicUsize,
    total_created_ever: AtomicU64,
}

/// A point-in-time snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Idle workers ready to be handed out.
    pub available: usize,
    /// Workers currently checked out (including ones about to be handed to
    /// a waiter).
    pub in_use: usize,
    /// Workers being recreated after failing validation.
    pub under_replacement: usize,
    /// Fixed pool capacity.
    pub capacity: usize,
}

impl PoolStats {
    /// `available + in_use + under_replacement`; never exceeds `capacity`.
    pub fn total_live(&self) -> usize {
        self.available + self.in_use + self.under_replacement
    }
}

/// A fixed-capacity pool of renderer workers.
///
/// Cheap to clone — clones share the same underlying state via an internal
/// `Arc`.
#[derive(Clone)]
pub struct ResourcePool {
    inner: Arc<Inner>,
}

impl ResourcePool {
    /// Create workers up to capacity concurrently. Call once, before the
    /// pool's first real use; a pool that's never warmed up will still work
    /// (acquire creates lazily via replacement spawning on first release),
    /// but callers see the first `capacity` acquisitions pay full creation
    /// latency instead of paying it once up front.
    pub async fn warmup(&self) -> Result<()> {
        let capacity = self.inner.capacity;
        let mut handles = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            let inner = Arc::clone(&self.inner);
            handles.push(tokio::task::spawn_blocking(move || {
                inner.factory.create(&inner.pipeline_config)
            }));
        }

        let mut created = Vec::with_capacity(capacity);
        for handle in handles {
            match handle.await {
                Ok(Ok(worker)) => created.push(worker),
                Ok(Err(e)) => return Err(RenderError::PoolInitFailed(e.to_string())),
                Err(e) => return Err(RenderError::PoolInitFailed(e.to_string())),
            }
        }

        let mut available = self.inner.available.lock().unwrap();
        for worker in created {
            self.inner.total_created_ever.fetch_add(1, Ordering::SeqCst);
            available.push_back(WorkerResource::new(worker, self.inner.worker_resource_config));
        }
        log::info!("pool warmed up with {} workers", capacity);
        Ok(())
    }

    /// Acquire a worker, waiting up to `timeout` if none is idle.
    ///
    /// Waiters are served strictly FIFO. A timed-out wait leaves the queue
    /// without taking a worker; it never cancels work already in flight.
    pub async fn acquire(&self, timeout: Duration) -> Result<PoolHandle> {
        {
            let mut available = self.inner.available.lock().unwrap();
            if let Some(resource) = available.pop_front() {
                drop(available);
                self.inner.in_use.fetch_add(1, Ordering::SeqCst);
                return Ok(PoolHandle {
                    pool: self.clone(),
                    resource: Some(resource),
                });
            }
        }

        let id = self.inner.waiter_seq.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.inner.waiters.lock().unwrap().push_back(Waiter { id, tx });

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(resource)) => Ok(PoolHandle {
                pool: self.clone(),
                resource: Some(resource),
            }),
            Ok(Err(_)) => Err(RenderError::Cancelled),
            Err(_) => {
                self.inner.waiters.lock().unwrap().retain(|w| w.id != id);
                Err(RenderError::AcquisitionTimeout)
            }
        }
    }

    /// A snapshot of current pool occupancy.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.inner.available.lock().unwrap().len(),
            in_use: self.inner.in_use.load(Ordering::SeqCst),
            under_replacement: self.inner.under_replacement.load(Ordering::SeqCst),
            capacity: self.inner.capacity,
        }
    }

    /// Total workers created over the pool's lifetime, including recycled
    /// replacements.
    pub fn total_created_ever(&self) -> u64 {
        self.inner.total_created_ever.load(Ordering::SeqCst)
    }

    fn release(&self, mut resource: WorkerResource) {
        if let Err(e) = resource.reset() {
            log::warn!("worker reset failed: {}", e);
        }

        if !resource.validate() {
            log::info!(
                "worker invalidated after {} uses, spawning replacement",
                resource.use_count()
            );
            self.inner.metrics.incr_pool_replacements();
            self.inner.in_use.fetch_sub(1, Ordering::SeqCst);
            drop(resource);
            self.spawn_replacement();
            return;
        }

        self.route_worker(resource, true);
    }

    /// Hand `resource` to the oldest waiter if one is queued, otherwise park
    /// it in the idle set. `already_in_use` is true when `resource` is
    /// coming from an active checkout (a release); false when it's a
    /// freshly created replacement that hasn't been counted as in-use yet.
    fn route_worker(&self, mut resource: WorkerResource, already_in_use: bool) {
        loop {
            let next = self.inner.waiters.lock().unwrap().pop_front();
            match next {
                Some(waiter) => match waiter.tx.send(resource) {
                    Ok(()) => {
                        if !already_in_use {
                            self.inner.in_use.fetch_add(1, Ordering::SeqCst);
                        }
                        return;
                    }
                    Err(returned) => {
                        // Waiter dropped (cancelled/timed out) between pop
                        // and send; try the next one.
                        resource = returned;
                        continue;
                    }
                },
                None => break,
            }
        }

        if already_in_use {
            self.inner.in_use.fetch_sub(1, Ordering::SeqCst);
        }
        self.inner.available.lock().unwrap().push_back(resource);
    }

    fn spawn_replacement(&self) {
        self.inner.under_replacement.fetch_add(1, Ordering::SeqCst);
        let pool = self.clone();
        self.inner.runtime.spawn(async move {
            let inner = Arc::clone(&pool.inner);
            let created =
                tokio::task::spawn_blocking(move || inner.factory.create(&inner.pipeline_config))
                    .await;
            pool.inner.under_replacement.fetch_sub(1, Ordering::SeqCst);
            match created {
                Ok(Ok(worker)) => {
                    pool.inner.total_created_ever.fetch_add(1, Ordering::SeqCst);
                    let resource = WorkerResource::new(worker, pool.inner.worker_resource_config);
                    pool.route_worker(resource, false);
                }
                Ok(Err(e)) => log::error!("failed to create replacement worker: {}", e),
                Err(e) => log::error!("replacement worker task panicked: {}", e),
            }
        });
    }
}

/// RAII handle to a checked-out [`WorkerResource`].
///
/// Dropping it resets and validates the worker and returns it to the pool
/// (or, if it failed validation, retires it and triggers a replacement).
/// That work is synchronous and may block briefly — drop handles from
/// inside `spawn_blocking`, not from a plain async context.
pub struct PoolHandle {
    pool: ResourcePool,
    resource: Option<WorkerResource>,
}

impl std::ops::Deref for PoolHandle {
    type Target = WorkerResource;
    fn deref(&self) -> &WorkerResource {
        self.resource.as_ref().expect("resource taken before drop")
    }
}

impl std::ops::DerefMut for PoolHandle {
    fn deref_mut(&mut self) -> &mut WorkerResource {
        self.resource.as_mut().expect("resource taken before drop")
    }
}

impl Drop for PoolHandle {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.release(resource);
        }
    }
}

/// Builder for [`ResourcePool`].
pub struct ResourcePoolBuilder {
    capacity: usize,
    factory: Option<Arc<dyn WorkerFactory>>,
    pipeline_config: PipelineConfig,
    metrics: Option<Arc<dyn Metrics>>,
}

impl ResourcePoolBuilder {
    /// Start a new builder with no capacity or factory set.
    pub fn new() -> Self {
        Self {
            capacity: 0,
            factory: None,
            pipeline_config: PipelineConfig::default(),
            metrics: None,
        }
    }

    /// Set the fixed pool capacity (must be > 0).
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the worker factory.
    pub fn factory(mut self, factory: Arc<dyn WorkerFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the pipeline configuration passed to every `WorkerFactory::create` call.
    pub fn pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = config;
        self
    }

    /// Set the metrics backend (defaults to [`NoopMetrics`]).
    pub fn metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the pool. Must be called from within a Tokio runtime — the
    /// pool spawns its own replacement-creation tasks from synchronous
    /// `Drop` contexts and needs a runtime handle to do so.
    pub fn build(self) -> Result<ResourcePool> {
        if self.capacity == 0 {
            return Err(RenderError::Configuration(
                "capacity must be greater than 0".to_string(),
            ));
        }
        let factory = self
            .factory
            .ok_or_else(|| RenderError::Configuration("a worker factory is required".to_string()))?;
        let runtime = Handle::try_current().map_err(|_| {
            RenderError::Configuration(
                "ResourcePool must be built from within a Tokio runtime".to_string(),
            )
        })?;
        let worker_resource_config = WorkerResourceConfig::from(&self.pipeline_config);

        Ok(ResourcePool {
            inner: Arc::new(Inner {
                capacity: self.capacity,
                factory,
                pipeline_config: self.pipeline_config,
                worker_resource_config,
                metrics: self.metrics.unwrap_or_else(|| Arc::new(NoopMetrics::default())),
                runtime,
                available: Mutex::new(VecDeque::new()),
                waiters: Mutex::new(VecDeque::new()),
                waiter_seq: AtomicU64::new(0),
                in_use: AtomicUsize::new(0),
                under_replacement: AtomicUsize::new(0),
                total_created_ever: AtomicU64::new(0),
            }),
        })
    }
}

impl Default for ResourcePoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: OnceLock<Mutex<HashMap<String, ResourcePool>>> = OnceLock::new();

/// Return the process-global pool registered under `key`, building it via
/// `build` on first use for that key and reusing the same instance on every
/// later call with the same key.
///
/// Callers choose `key` to capture whatever should make two pools distinct
/// (typically capacity plus a hash of the relevant configuration).
pub fn shared(key: &str, build: impl FnOnce() -> Result<ResourcePool>) -> Result<ResourcePool> {
    let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = registry.lock().unwrap();
    if let Some(pool) = guard.get(key) {
        return Ok(pool.clone());
    }
    let pool = build()?;
    guard.insert(key.to_string(), pool.clone());
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::MockWorkerFactory;

    fn builder(capacity: usize) -> ResourcePoolBuilder {
        ResourcePoolBuilder::new()
            .capacity(capacity)
            .factory(Arc::new(MockWorkerFactory::new()))
    }

    #[tokio::test]
    async fn warmup_creates_capacity_workers() {
        let pool = builder(3).build().unwrap();
        pool.warmup().await.unwrap();
        let stats = pool.stats();
        assert_eq!(stats.available, 3);
        assert_eq!(stats.total_live(), 3);
    }

    #[tokio::test]
    async fn acquire_and_drop_returns_worker_to_idle() {
        let pool = builder(1).build().unwrap();
        pool.warmup().await.unwrap();
        {
            let handle = pool.acquire(Duration::from_secs(1)).await.unwrap();
            assert_eq!(pool.stats().in_use, 1);
            drop(handle);
        }
        assert_eq!(pool.stats().available, 1);
        assert_eq!(pool.stats().in_use, 0);
    }

    #[tokio::test]
    async fn acquire_times_out_when_pool_is_exhausted() {
        let pool = builder(1).build().unwrap();
        pool.warmup().await.unwrap();
        let _handle = pool.acquire(Duration::from_secs(1)).await.unwrap();
        let result = pool.acquire(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(RenderError::AcquisitionTimeout)));
    }

    #[tokio::test]
    async fn waiting_acquirer_is_served_fifo_on_release() {
        let pool = builder(1).build().unwrap();
        pool.warmup().await.unwrap();
        let handle = pool.acquire(Duration::from_secs(1)).await.unwrap();

        let pool2 = pool.clone();
        let waiter = tokio::spawn(async move { pool2.acquire(Duration::from_secs(2)).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(handle);

        let result = waiter.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn capacity_invariant_holds_after_many_cycles() {
        let pool = builder(2).build().unwrap();
        pool.warmup().await.unwrap();
        for _ in 0..20 {
            let h1 = pool.acquire(Duration::from_secs(1)).await.unwrap();
            let h2 = pool.acquire(Duration::from_secs(1)).await.unwrap();
            drop(h1);
            drop(h2);
        }
        assert!(pool.stats().total_live() <= 2);
    }

    #[tokio::test]
    async fn shared_returns_the_same_pool_for_the_same_key() {
        let key = format!("test-key-{}", std::process::id());
        let a = shared(&key, || builder(1).build()).unwrap();
        let b = shared(&key, || builder(5).build()).unwrap();
        assert_eq!(a.stats().capacity, b.stats().capacity);
    }
}
