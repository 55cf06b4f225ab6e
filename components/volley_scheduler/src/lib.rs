//! volley_scheduler component
//!
//! The request queue: priority + FIFO ordering, cache-key deduplication, and the
//! blocking priority queues the cache and network dispatchers drain (§4.1, §5).
//!
//! This component owns `Request` itself — cache-key dedup and cancellation are
//! properties of the request's queue-managed fields, so splitting the record from the
//! queue that manages it would just relocate a dependency, not remove one. It knows
//! nothing about disk I/O or network transports; the pipeline component supplies a
//! cache store and transport and drives dispatcher threads around this queue.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod priority_queue;
mod queue;
mod request;
mod retry;

pub use priority_queue::RequestPriorityQueue;
pub use queue::RequestQueue;
pub use request::{DeliverErrorFn, DeliverFn, ParseFn, ParseOutcome, Request, RequestBuilder};
pub use retry::{RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS};
