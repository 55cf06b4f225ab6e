//! The transport boundary (§6): the thing that actually performs an HTTP round trip.
//!
//! Out of scope per §1 ("the concrete HTTP transport... referenced by their interfaces
//! only"); this module defines the interface the network dispatcher drives and nothing
//! else. A real implementation (connection pool, TLS, DNS) is a separate crate's job,
//! same as the teacher keeps its protocol clients (`http1_protocol`, `http2_protocol`)
//! behind the `NetworkStack` trait rather than inline in `network_stack` itself.

use std::collections::HashMap;
use std::time::Duration;

use volley_scheduler::Request;

/// What a transport implementation returns on a completed round trip (successful or
/// not, from an HTTP point of view — 4xx/5xx still come back through here, not as an
/// `Err`; only transport-level failures are errors, per §6).
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Full response header map, as returned over the wire.
    pub headers: HashMap<String, String>,
    /// Response body bytes, already read to completion.
    ///
    /// §4.3 describes streaming the body "through a small reusable buffer"; that
    /// buffering is the transport's concern (it owns the socket), so by the time a
    /// `TransportResponse` reaches the dispatcher the body is a plain byte vector.
    pub body: Vec<u8>,
}

/// Transport-level failures (§6, §7): the request never got a usable status/body.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The request's URL could not be parsed by the transport. Fatal, not retried.
    #[error("malformed url: {0}")]
    MalformedUrl(String),
    /// TCP/TLS connect did not complete within the configured timeout. Retryable.
    #[error("connect timeout")]
    ConnectTimeout,
    /// A connection was established but no response arrived within the configured
    /// read timeout. Retryable.
    #[error("socket timeout")]
    SocketTimeout,
    /// The transport produced no response and no status at all (§4.3: "no-connection:
    /// status never obtained"). Raised immediately, never retried.
    #[error("no connection")]
    NoConnection,
    /// Any other I/O failure without a usable response.
    #[error("transport io error: {0}")]
    Io(String),
}

/// The synchronous transport interface a concrete HTTP client implements (§6).
///
/// Synchronous by design: §5 models the pipeline as "parallel threads with shared
/// state under explicit mutual exclusion", and the network dispatcher blocks on this
/// call the same way it blocks on `network_queue.take()`. An async transport can still
/// implement this trait by blocking its calling thread on its own runtime handle; that
/// adaptation is the transport's problem, not the dispatcher's.
pub trait Transport: Send + Sync {
    /// Perform one HTTP round trip for `req`, honoring `timeout` as both connect and
    /// read timeout (§5 "Timeout semantics"). `extra_headers` carries conditional-GET
    /// validators (`If-None-Match`/`If-Modified-Since`) the network dispatcher adds on
    /// top of `req.headers`; the transport must merge them into the outgoing request.
    fn perform(
        &self,
        req: &Request,
        extra_headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}
