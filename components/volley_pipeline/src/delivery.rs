//! Delivery (§4.6): posting parsed responses or errors onto a caller-selected
//! execution context, with a post-delivery continuation for the cache dispatcher's
//! soft-expired-refresh case.
//!
//! **Open question resolved** (not specified by §4.1/§4.2/§4.6 directly): who calls
//! `RequestQueue::finish`? The source calls it from within the request's own
//! `deliverResponse`, after the listener runs — i.e. finishing is part of delivering,
//! not part of dispatching. We follow that: every `Delivery::post*` call finishes the
//! request itself once its listener has run (or been swallowed for cancellation),
//! *except* `post_with_continuation`, which hands the request straight to the
//! continuation instead — matching §4.2 step 8, where the soft-expired hit is not done
//! with the request; a real network fetch is still to come.

use std::any::Any;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::trace;
use volley_errors::VolleyError;
use volley_scheduler::{Request, RequestQueue};

type Job = Box<dyn FnOnce() + Send>;

/// Posts responses onto a caller-selected execution context (§4.6).
///
/// Contract: implementations must never run a request's listener inline on the
/// calling (dispatcher) thread. If the request was canceled before the posted job
/// runs, the listener must be swallowed (never invoked) but the request must still be
/// finished.
pub trait Delivery: Send + Sync {
    /// Post a terminal success response. Finishes `req` once the listener has run (or
    /// been swallowed).
    fn post(&self, req: Arc<Request>, result: Box<dyn Any + Send>, intermediate: bool);

    /// Post an intermediate (soft-expired cache hit) response, then run `continuation`
    /// on the delivery context instead of finishing `req` — used by the cache
    /// dispatcher to enqueue the refresh fetch only after the caller has observed the
    /// stale-but-usable response (§4.2 step 8).
    fn post_with_continuation(
        &self,
        req: Arc<Request>,
        result: Box<dyn Any + Send>,
        intermediate: bool,
        continuation: Box<dyn FnOnce() + Send>,
    );

    /// Post a terminal error. Finishes `req` once the error listener has run (or been
    /// swallowed).
    fn post_error(&self, req: Arc<Request>, error: VolleyError);
}

fn run_or_swallow(req: &Arc<Request>, result: Box<dyn Any + Send>, intermediate: bool) {
    if req.is_canceled() {
        trace!(id = %req.identifier, "delivery swallowed response: request canceled");
        return;
    }
    req.mark_delivered();
    if let Some(deliver) = req.take_deliver() {
        deliver(result, intermediate);
    }
}

fn run_or_swallow_error(req: &Arc<Request>, error: VolleyError) {
    if req.is_canceled() {
        trace!(id = %req.identifier, "delivery swallowed error: request canceled");
        return;
    }
    if let Some(deliver_error) = req.take_deliver_error() {
        deliver_error(error);
    }
}

/// A [`Delivery`] backed by one dedicated OS thread draining an unbounded channel of
/// boxed closures — the "single-threaded, external" delivery context §5 describes, and
/// the default a [`crate::Volley`] builds for callers that don't supply their own (a
/// UI/main-thread executor would implement `Delivery` directly instead).
pub struct ThreadDelivery {
    queue: Arc<RequestQueue>,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadDelivery {
    /// Spawn the delivery thread and return a ready-to-use `Arc<ThreadDelivery>`.
    pub fn new(queue: Arc<RequestQueue>) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let handle = std::thread::Builder::new()
            .name("volley-delivery".into())
            .spawn(move || {
                for job in receiver {
                    job();
                }
            })
            .expect("failed to spawn delivery thread");

        Arc::new(Self {
            queue,
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    fn send(&self, job: Job) {
        let sender = self.sender.lock().expect("delivery sender mutex poisoned");
        if let Some(sender) = sender.as_ref() {
            // An error here means the delivery thread already exited (post-stop); in
            // that case there is no context left to deliver onto, so drop silently.
            let _ = sender.send(job);
        }
    }

    /// Close the channel and join the delivery thread. Idempotent.
    pub fn stop_and_join(&self) {
        self.sender.lock().expect("delivery sender mutex poisoned").take();
        if let Some(handle) = self.handle.lock().expect("delivery handle mutex poisoned").take() {
            let _ = handle.join();
        }
    }
}

impl Delivery for ThreadDelivery {
    fn post(&self, req: Arc<Request>, result: Box<dyn Any + Send>, intermediate: bool) {
        let queue = self.queue.clone();
        self.send(Box::new(move || {
            run_or_swallow(&req, result, intermediate);
            queue.finish(&req);
        }));
    }

    fn post_with_continuation(
        &self,
        req: Arc<Request>,
        result: Box<dyn Any + Send>,
        intermediate: bool,
        continuation: Box<dyn FnOnce() + Send>,
    ) {
        let queue = self.queue.clone();
        self.send(Box::new(move || {
            let canceled = req.is_canceled();
            run_or_swallow(&req, result, intermediate);
            if canceled {
                // The request is dead; don't resurrect it via the continuation.
                queue.finish(&req);
            } else {
                continuation();
            }
        }));
    }

    fn post_error(&self, req: Arc<Request>, error: VolleyError) {
        let queue = self.queue.clone();
        self.send(Box::new(move || {
            run_or_swallow_error(&req, error);
            queue.finish(&req);
        }));
    }
}
