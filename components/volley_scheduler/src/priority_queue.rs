//! Blocking priority queue backing the cache and network queues (§4.1, §5).
//!
//! Ordered by higher [`Priority`] first, ties broken by lower `sequence` first — a
//! total order since `sequence` is assigned atomically before any push. `take()`
//! blocks on an empty queue via a condition variable rather than spinning, matching
//! the "volatile quit flag + blocking take" design note: `stop()` flips an atomic and
//! wakes every waiter so the dispatcher loop observes it without polling.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Condvar, Mutex};

use crate::request::Request;
use std::sync::Arc;
use volley_types::Priority;

struct QueueItem(Arc<Request>);

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority() == other.0.priority() && self.0.sequence() == other.0.sequence()
    }
}
impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: higher priority should sort greater, and for equal
        // priority the *smaller* sequence (submitted earlier) should sort greater so
        // it's popped first (FIFO within a priority level).
        self.0
            .priority()
            .cmp(&other.0.priority())
            .then_with(|| other.0.sequence().cmp(&self.0.sequence()))
    }
}

/// A priority-ordered, multi-producer multi-consumer blocking queue of requests.
pub struct RequestPriorityQueue {
    heap: Mutex<BinaryHeap<QueueItem>>,
    not_empty: Condvar,
    stopped: AtomicBool,
}

impl RequestPriorityQueue {
    /// An empty, running queue.
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            not_empty: Condvar::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Push a request on. Unbounded; never blocks.
    pub fn push(&self, req: Arc<Request>) {
        let mut heap = self.heap.lock().expect("queue mutex poisoned");
        heap.push(QueueItem(req));
        self.not_empty.notify_one();
    }

    /// Block until a request is available, priority order, or the queue is stopped.
    ///
    /// Returns `None` only after `stop()` has been called and the queue has drained.
    pub fn take(&self) -> Option<Arc<Request>> {
        let mut heap = self.heap.lock().expect("queue mutex poisoned");
        loop {
            if let Some(item) = heap.pop() {
                return Some(item.0);
            }
            if self.stopped.load(AtomicOrdering::Acquire) {
                return None;
            }
            heap = self
                .not_empty
                .wait(heap)
                .expect("queue condvar wait poisoned");
        }
    }

    /// Signal every blocked (and future) `take()` call to return `None` once drained.
    pub fn stop(&self) {
        self.stopped.store(true, AtomicOrdering::Release);
        self.not_empty.notify_all();
    }

    /// Number of requests currently queued (for tests/diagnostics, not part of the
    /// dispatch contract).
    pub fn len(&self) -> usize {
        self.heap.lock().expect("queue mutex poisoned").len()
    }

    /// `true` iff no requests are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RequestPriorityQueue {
    fn default() -> Self {
        Self::new()
    }
}
