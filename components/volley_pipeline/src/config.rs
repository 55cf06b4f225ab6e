//! The pipeline's configuration surface (§6): what a caller passes to build a
//! [`crate::Volley`].

use std::sync::Arc;

use volley_cache::DiskCache;

use crate::delivery::Delivery;
use crate::transport::Transport;

/// Default network dispatcher pool size (§4.1 `start()`).
pub const DEFAULT_THREAD_POOL_SIZE: usize = 4;

/// Construction parameters for a [`crate::Volley`] (§6's `{ cache_store, transport,
/// thread_pool_size, delivery, max_disk_bytes }`).
///
/// `max_disk_bytes` isn't a field here: it's consumed one layer down, by
/// [`volley_cache::DiskCache::open`], which already implements the "`0` (Rust has no
/// ambient negative-sentinel convention, so we use `0` rather than `-1`) means default"
/// rule from §6. Threading it through a second config layer would just be indirection.
pub struct PipelineConfig {
    /// The disk cache the cache dispatcher and network dispatchers share.
    pub cache_store: Arc<DiskCache>,
    /// The transport the network dispatcher pool calls.
    pub transport: Arc<dyn Transport>,
    /// The delivery context responses are posted onto. `None` builds a
    /// [`crate::ThreadDelivery`] backed by a dedicated OS thread.
    pub delivery: Option<Arc<dyn Delivery>>,
    /// Number of network dispatcher workers (default [`DEFAULT_THREAD_POOL_SIZE`]).
    pub thread_pool_size: usize,
}

impl PipelineConfig {
    /// Start building a config with the required collaborators; everything else
    /// defaults per §6.
    pub fn new(cache_store: Arc<DiskCache>, transport: Arc<dyn Transport>) -> Self {
        Self {
            cache_store,
            transport,
            delivery: None,
            thread_pool_size: DEFAULT_THREAD_POOL_SIZE,
        }
    }

    /// Override the network dispatcher pool size. Clamped to at least 1.
    pub fn thread_pool_size(mut self, n: usize) -> Self {
        self.thread_pool_size = n.max(1);
        self
    }

    /// Supply a caller-owned delivery context instead of the default
    /// [`crate::ThreadDelivery`].
    pub fn delivery(mut self, delivery: Arc<dyn Delivery>) -> Self {
        self.delivery = Some(delivery);
        self
    }
}
