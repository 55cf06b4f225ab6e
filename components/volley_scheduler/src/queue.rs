//! The request queue (§4.1): submission, dedup, cancellation, and finish/promotion.
//!
//! Thread spawning for the dispatchers themselves lives one level up, in the
//! pipeline crate that owns the cache store and transport — this queue only owns the
//! bookkeeping structures the dispatcher loops read and write: the two priority
//! queues, the dedup waiting map, and the current-requests set. That keeps this crate
//! free of any dependency on disk or network I/O, mirroring how the source keeps
//! `RequestQueue` ignorant of `Network`/`Cache` implementation details beyond their
//! interfaces.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::priority_queue::RequestPriorityQueue;
use crate::request::Request;

/// Shared queue state: dedup bookkeeping plus the two blocking priority queues.
pub struct RequestQueue {
    sequence_generator: AtomicU64,
    current_requests: Mutex<HashMap<String, Arc<Request>>>,
    /// Keyed by `cache_key`. An entry present with an empty `Vec` is the "none"
    /// sentinel: one request is in flight for that key with no siblings yet.
    waiting_map: Mutex<HashMap<String, Vec<Arc<Request>>>>,
    finished_listeners: Mutex<Vec<Box<dyn Fn(&Arc<Request>) + Send + Sync>>>,

    /// Requests that have a cached (or about-to-be-checked) entry to consult.
    pub cache_queue: RequestPriorityQueue,
    /// Requests that need a real network round trip.
    pub network_queue: RequestPriorityQueue,
}

impl RequestQueue {
    /// A fresh, empty queue.
    pub fn new() -> Self {
        Self {
            sequence_generator: AtomicU64::new(0),
            current_requests: Mutex::new(HashMap::new()),
            waiting_map: Mutex::new(HashMap::new()),
            finished_listeners: Mutex::new(Vec::new()),
            cache_queue: RequestPriorityQueue::new(),
            network_queue: RequestPriorityQueue::new(),
        }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence_generator.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a callback invoked (on the submitter's thread, inside `finish`) every
    /// time a request finishes, regardless of outcome.
    pub fn on_finished(&self, listener: impl Fn(&Arc<Request>) + Send + Sync + 'static) {
        self.finished_listeners.lock().expect("listeners mutex poisoned").push(Box::new(listener));
    }

    /// `submit(req) → req` (§4.1): assigns `sequence`, registers the request, then
    /// routes it to the network queue (uncacheable) or through the dedup waiting map
    /// into the cache queue.
    pub fn submit(&self, req: Arc<Request>) -> Arc<Request> {
        req.set_sequence(self.next_sequence());
        self.current_requests
            .lock()
            .expect("current_requests mutex poisoned")
            .insert(req.identifier.clone(), req.clone());

        if !req.should_cache {
            self.network_queue.push(req.clone());
            return req;
        }

        let mut waiting = self.waiting_map.lock().expect("waiting_map mutex poisoned");
        match waiting.get_mut(&req.cache_key) {
            None => {
                waiting.insert(req.cache_key.clone(), Vec::new());
                drop(waiting);
                self.cache_queue.push(req.clone());
            }
            Some(siblings) => siblings.push(req.clone()),
        }
        req
    }

    /// Set `canceled = true` on every current request matching `filter` (§4.1).
    pub fn cancel_all(&self, filter: impl Fn(&Request) -> bool) {
        let current = self.current_requests.lock().expect("current_requests mutex poisoned");
        for req in current.values() {
            if filter(req) {
                req.cancel();
            }
        }
    }

    /// Cancel every current request whose `tag` is the same `Arc` identity as `tag`.
    pub fn cancel_by_tag(&self, tag: &Arc<dyn std::any::Any + Send + Sync>) {
        self.cancel_all(|req| {
            req.tag
                .as_ref()
                .is_some_and(|t| Arc::ptr_eq(t, tag))
        });
    }

    /// `finish(req)` (§4.1): deregister, notify finished-listeners, and promote any
    /// deduplicated siblings onto the cache queue.
    pub fn finish(&self, req: &Arc<Request>) {
        self.current_requests
            .lock()
            .expect("current_requests mutex poisoned")
            .remove(&req.identifier);

        for listener in self.finished_listeners.lock().expect("listeners mutex poisoned").iter() {
            listener(req);
        }

        if req.should_cache {
            let siblings = self
                .waiting_map
                .lock()
                .expect("waiting_map mutex poisoned")
                .remove(&req.cache_key);
            if let Some(siblings) = siblings {
                for sibling in siblings {
                    self.cache_queue.push(sibling);
                }
            }
        }
    }

    /// Number of requests currently tracked (queued, deduped-waiting, or in-flight).
    pub fn current_request_count(&self) -> usize {
        self.current_requests.lock().expect("current_requests mutex poisoned").len()
    }

    /// Stop both priority queues, unblocking any dispatcher threads parked in `take()`.
    pub fn stop(&self) {
        self.cache_queue.stop();
        self.network_queue.stop();
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}
