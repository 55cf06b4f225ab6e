//! volley_errors component
//!
//! `VolleyError`: the error taxonomy described in §7. Every variant carries an
//! optional `NetworkResponse` snapshot and an optional network time, matching the
//! spec's propagation policy: the network dispatcher needs the snapshot to decide
//! retry eligibility without re-parsing anything.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use thiserror::Error;
use volley_types::NetworkResponse;

/// Errors the pipeline can surface to a caller's error listener.
#[derive(Debug, Error)]
pub enum VolleyError {
    /// Socket or connect timeout. Retryable.
    #[error("timeout after {network_time_ms:?}ms")]
    Timeout {
        /// Snapshot of any partial response observed before the timeout fired.
        response: Option<NetworkResponse>,
        /// Time spent before the timeout, if known.
        network_time_ms: Option<u64>,
    },

    /// The transport produced no response and no status at all. Not retried by
    /// default.
    #[error("no connection")]
    NoConnection {
        /// Always `None`: by definition there is nothing to snapshot.
        response: Option<NetworkResponse>,
        /// Always `None`.
        network_time_ms: Option<u64>,
    },

    /// 401 or 403. Retryable, to allow a token refresh via the retry policy.
    #[error("auth failure (status {status})")]
    AuthFailure {
        /// The 401/403 status code observed.
        status: u16,
        /// Snapshot of the response that carried the failure.
        response: Option<NetworkResponse>,
        /// Time spent on the network round trip.
        network_time_ms: Option<u64>,
    },

    /// 301/302 handled as a retry with a new URL; surfaced only if redirect retries
    /// are exhausted.
    #[error("too many redirects")]
    Redirect {
        /// Snapshot of the last redirect response observed.
        response: Option<NetworkResponse>,
        /// Time spent on the network round trip.
        network_time_ms: Option<u64>,
    },

    /// Status in `[500, 599]`, or any other non-2xx/3xx/4xx-retryable status. Not
    /// retried by default.
    #[error("server error (status {status})")]
    ServerError {
        /// The server status code observed.
        status: u16,
        /// Snapshot of the error response.
        response: Option<NetworkResponse>,
        /// Time spent on the network round trip.
        network_time_ms: Option<u64>,
    },

    /// I/O error without a usable response body.
    #[error("network error: {message}")]
    NetworkError {
        /// Human-readable detail from the transport.
        message: String,
        /// Snapshot of any partial response observed.
        response: Option<NetworkResponse>,
        /// Time spent before the error surfaced.
        network_time_ms: Option<u64>,
    },

    /// The parser returned an error form. Bypasses retry entirely.
    #[error("parse error: {message}")]
    ParseError {
        /// Human-readable detail from the parser.
        message: String,
        /// Snapshot of the response that failed to parse.
        response: Option<NetworkResponse>,
        /// Time spent on the network round trip.
        network_time_ms: Option<u64>,
    },

    /// The request's URL could not be parsed. Fatal, no retry.
    #[error("malformed url: {0}")]
    MalformedUrl(String),

    /// Low-level disk cache I/O error.
    #[error("cache error: {0}")]
    CacheError(String),
}

impl VolleyError {
    /// `true` for the variants §4.3/§7 say the network dispatcher should forward
    /// into `RetryPolicy::retry` rather than failing the request immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VolleyError::Timeout { .. } | VolleyError::AuthFailure { .. } | VolleyError::Redirect { .. }
        )
    }

    /// The response snapshot carried by this error, if any.
    pub fn response(&self) -> Option<&NetworkResponse> {
        match self {
            VolleyError::Timeout { response, .. }
            | VolleyError::NoConnection { response, .. }
            | VolleyError::AuthFailure { response, .. }
            | VolleyError::Redirect { response, .. }
            | VolleyError::ServerError { response, .. }
            | VolleyError::NetworkError { response, .. }
            | VolleyError::ParseError { response, .. } => response.as_ref(),
            VolleyError::MalformedUrl(_) | VolleyError::CacheError(_) => None,
        }
    }
}

/// Result alias used throughout the pipeline.
pub type VolleyResult<T> = Result<T, VolleyError>;
