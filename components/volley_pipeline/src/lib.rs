//! volley_pipeline component
//!
//! The integration crate (this is where `network_stack` sat in the teacher): wires
//! together the request queue (`volley_scheduler`), the disk cache (`volley_cache`), a
//! caller-supplied [`Transport`], and [`Delivery`] into the cache dispatcher (§4.2) and
//! the network dispatcher pool (§4.3), behind a [`Volley`] facade owning
//! `start()`/`stop()`/`submit()`/`cancel_all()` (§4.1).

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod config;
mod delivery;
mod dispatcher;
mod transport;

pub use config::{PipelineConfig, DEFAULT_THREAD_POOL_SIZE};
pub use delivery::{Delivery, ThreadDelivery};
pub use transport::{Transport, TransportError, TransportResponse};
pub use volley_scheduler::{Request, RequestBuilder, RequestQueue, RetryPolicy};

use std::any::Any;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::debug;
use volley_cache::DiskCache;

/// The pipeline facade (§4.1's `start()`/`stop()` lifecycle, plus submission and bulk
/// cancellation).
///
/// Built from a [`PipelineConfig`]; does not start any dispatcher threads until
/// [`Volley::start`] is called, mirroring the source's separation between
/// construction and `RequestQueue.start()`.
pub struct Volley {
    queue: Arc<RequestQueue>,
    cache: Arc<DiskCache>,
    transport: Arc<dyn Transport>,
    delivery: Arc<dyn Delivery>,
    /// Set only when `Volley` built its own [`ThreadDelivery`] (no caller-supplied
    /// `delivery` in `PipelineConfig`). Kept concretely, alongside `delivery`'s trait
    /// object, purely so `stop_and_join` can reach `ThreadDelivery::stop_and_join` —
    /// that method isn't part of the `Delivery` trait, so it's unreachable through
    /// `delivery` alone.
    owned_delivery: Option<Arc<ThreadDelivery>>,
    thread_pool_size: usize,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Volley {
    /// Build (but do not start) a pipeline from `config`.
    pub fn new(config: PipelineConfig) -> Arc<Self> {
        let queue = Arc::new(RequestQueue::new());
        let (delivery, owned_delivery) = match config.delivery {
            Some(delivery) => (delivery, None),
            None => {
                let owned = ThreadDelivery::new(queue.clone());
                (owned.clone() as Arc<dyn Delivery>, Some(owned))
            }
        };

        Arc::new(Self {
            queue,
            cache: config.cache_store,
            transport: config.transport,
            delivery,
            owned_delivery,
            thread_pool_size: config.thread_pool_size,
            handles: Mutex::new(Vec::new()),
        })
    }

    /// `start()` (§4.1): spawn one cache dispatcher and `thread_pool_size` network
    /// dispatchers, all sharing the two queues, the cache store, and delivery.
    /// Idempotent: a second call while dispatchers are already running is a no-op,
    /// since this queue's "quit" signal (§5) is one-shot and cannot be un-signaled —
    /// restarting would require a fresh `Volley` over a fresh queue.
    pub fn start(self: &Arc<Self>) {
        let mut handles = self.handles.lock().expect("handles mutex poisoned");
        if !handles.is_empty() {
            debug!("start() called while dispatchers already running, ignoring");
            return;
        }

        {
            let queue = self.queue.clone();
            let cache = self.cache.clone();
            let delivery = self.delivery.clone();
            handles.push(
                std::thread::Builder::new()
                    .name("volley-cache-dispatcher".into())
                    .spawn(move || dispatcher::run_cache_dispatcher(queue, cache, delivery))
                    .expect("failed to spawn cache dispatcher thread"),
            );
        }

        for i in 0..self.thread_pool_size {
            let queue = self.queue.clone();
            let cache = self.cache.clone();
            let transport = self.transport.clone();
            let delivery = self.delivery.clone();
            handles.push(
                std::thread::Builder::new()
                    .name(format!("volley-network-dispatcher-{i}"))
                    .spawn(move || dispatcher::run_network_dispatcher(queue, cache, transport, delivery))
                    .expect("failed to spawn network dispatcher thread"),
            );
        }

        debug!(workers = self.thread_pool_size, "pipeline started");
    }

    /// `stop()` (§4.1): signal every dispatcher to quit. Idempotent; does not join.
    pub fn stop(&self) {
        self.queue.stop();
    }

    /// `stop()` plus joining every dispatcher thread — useful for tests and orderly
    /// shutdown (supplemented, SPEC_FULL.md §3). Also stops and joins the owned
    /// [`ThreadDelivery`], if `Volley` built one, so this returns only once the last
    /// dispatcher-enqueued delivery job has actually run, not merely been queued.
    pub fn stop_and_join(&self) {
        self.stop();
        let mut handles = self.handles.lock().expect("handles mutex poisoned");
        for handle in handles.drain(..) {
            let _ = handle.join();
        }
        if let Some(owned) = &self.owned_delivery {
            owned.stop_and_join();
        }
    }

    /// Submit a request (§4.1 `submit()`).
    pub fn submit(&self, req: Arc<Request>) -> Arc<Request> {
        self.queue.submit(req)
    }

    /// Cancel every current request matching `filter` (§4.1 `cancel_all()`).
    pub fn cancel_all(&self, filter: impl Fn(&Request) -> bool) {
        self.queue.cancel_all(filter);
    }

    /// Cancel every current request sharing `tag`'s identity (§4.1's tag-based
    /// specialization).
    pub fn cancel_by_tag(&self, tag: &Arc<dyn Any + Send + Sync>) {
        self.queue.cancel_by_tag(tag);
    }

    /// Mark the cache entry at `key` as needing revalidation (supplemented,
    /// SPEC_FULL.md §3): a thin pass-through to [`DiskCache::invalidate`].
    pub fn invalidate(&self, key: &str, full_expire: bool) {
        self.cache.invalidate(key, full_expire);
    }

    /// A handle to the underlying request queue, for callers that need lower-level
    /// access (e.g. registering a finished-listener).
    pub fn queue(&self) -> &Arc<RequestQueue> {
        &self.queue
    }

    /// A handle to the underlying disk cache, for callers that want to prime or
    /// inspect it directly (used heavily by tests).
    pub fn cache(&self) -> &Arc<DiskCache> {
        &self.cache
    }
}
