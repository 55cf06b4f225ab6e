//! volley_types component
//!
//! Core data model shared across the pipeline: HTTP method and priority enums, the
//! network response shape dispatchers hand to parsers, and the cache entry / on-disk
//! cache header records the disk cache reads and writes.
//!
//! This component has no dependency on any other workspace member, mirroring the
//! teacher's `network_types` leaf crate.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP methods a request may use.
///
/// `LegacyGetOrPost` mirrors Volley's `Method.DEPRECATED_GET_OR_POST`: the method is
/// chosen by the request itself (GET if it has no body, POST otherwise) rather than
/// fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// TRACE
    Trace,
    /// PATCH
    Patch,
    /// Deprecated: GET if no body is present, POST otherwise.
    LegacyGetOrPost,
}

impl HttpMethod {
    /// The wire name used when building an identifier or talking to a transport.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::LegacyGetOrPost => "GET_OR_POST",
        }
    }
}

/// Request priority levels.
///
/// Ordered so that the derived [`Ord`] implementation ranks `Immediate` highest and
/// `Low` lowest; the scheduler's priority queues rely on this ordering directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Background / prefetch work.
    Low,
    /// The default priority for ordinary requests.
    Normal,
    /// User-visible, time-sensitive work.
    High,
    /// Must be serviced ahead of everything else.
    Immediate,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// A parsed set of response headers, case-insensitively addressable.
///
/// Re-exported rather than redefined: `http::HeaderMap` already gives us the
/// case-insensitive lookup §3 requires.
pub type Headers = HeaderMap;

/// The raw network response a transport returns and a parser consumes.
///
/// Distinct from `CacheEntry`: this is what crosses the network dispatcher boundary on
/// every attempt (including cache-seeded 304 replays), while `CacheEntry` is what
/// persists on disk.
#[derive(Debug, Clone)]
pub struct NetworkResponse {
    /// HTTP status code. Synthesized as 200 when serving straight from cache.
    pub status_code: u16,
    /// Response body bytes.
    pub data: Vec<u8>,
    /// Response headers, carried as plain strings (case-insensitive lookup is via
    /// [`NetworkResponse::header`]).
    pub headers: HashMap<String, String>,
    /// Whether this response represents a 304 Not Modified.
    pub not_modified: bool,
    /// Wall-clock time the network round trip took, in milliseconds. Zero for
    /// responses served from cache.
    pub network_time_ms: u64,
}

impl NetworkResponse {
    /// Case-insensitive header lookup, matching the §3 requirement.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The in-memory record of a cached response (§3).
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    /// Response body bytes.
    pub data: Vec<u8>,
    /// Validator, if the origin supplied one.
    pub etag: Option<String>,
    /// `Date` header value at write time, epoch milliseconds. 0 = unset.
    pub server_date: u64,
    /// `Last-Modified` header value, epoch milliseconds. 0 = unset.
    pub last_modified: u64,
    /// Hard expiry, epoch milliseconds. 0 = unset (treated as already expired, see
    /// [`CacheEntry::is_expired`]).
    pub ttl: u64,
    /// Soft expiry, epoch milliseconds. 0 = unset.
    pub soft_ttl: u64,
    /// Response headers captured at write time.
    pub response_headers: HashMap<String, String>,
}

impl CacheEntry {
    /// `true` iff `ttl` is in the past (or unset).
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.ttl < now_ms
    }

    /// `true` iff a background refresh should be triggered, i.e. `soft_ttl` is in the
    /// past (or unset) but the entry is not yet hard-expired.
    pub fn refresh_needed(&self, now_ms: u64) -> bool {
        self.soft_ttl < now_ms
    }
}

/// On-disk metadata preceding an entry's body bytes (§4.4).
///
/// Field order here is the wire order: changing it changes the file format, which is
/// why [`CACHE_MAGIC`] exists as a version guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeader {
    /// The cache key this entry was stored under.
    pub key: String,
    /// Validator, empty string means "absent" on disk.
    pub etag: String,
    /// See [`CacheEntry::server_date`].
    pub server_date: u64,
    /// See [`CacheEntry::last_modified`].
    pub last_modified: u64,
    /// See [`CacheEntry::ttl`].
    pub ttl: u64,
    /// See [`CacheEntry::soft_ttl`].
    pub soft_ttl: u64,
    /// Response headers captured at write time.
    pub response_headers: HashMap<String, String>,
    /// Total size of the file on disk (header + body), populated when the index is
    /// built from a directory scan; not itself part of the wire format.
    pub file_size: u64,
}

impl CacheHeader {
    /// Build the header half of an on-disk entry from an in-memory [`CacheEntry`].
    pub fn from_entry(key: &str, entry: &CacheEntry, file_size: u64) -> Self {
        Self {
            key: key.to_string(),
            etag: entry.etag.clone().unwrap_or_default(),
            server_date: entry.server_date,
            last_modified: entry.last_modified,
            ttl: entry.ttl,
            soft_ttl: entry.soft_ttl,
            response_headers: entry.response_headers.clone(),
            file_size,
        }
    }

    /// Reassemble the in-memory [`CacheEntry`] this header describes, given its body.
    pub fn into_entry(self, data: Vec<u8>) -> CacheEntry {
        CacheEntry {
            data,
            etag: if self.etag.is_empty() {
                None
            } else {
                Some(self.etag)
            },
            server_date: self.server_date,
            last_modified: self.last_modified,
            ttl: self.ttl,
            soft_ttl: self.soft_ttl,
            response_headers: self.response_headers,
        }
    }
}

/// The 32-bit magic number prefixing every on-disk cache file (§4.4). Acts as a
/// format-version guard: change any layout detail above, change this constant too.
pub const CACHE_MAGIC: u32 = 0x2015_0306;

/// Default on-disk cache budget, 5 MiB (§4.4).
pub const DEFAULT_MAX_CACHE_BYTES: u64 = 5 * 1024 * 1024;

/// The factor pruning targets: stop evicting once `total_bytes < max_bytes * HYSTERESIS`.
pub const HYSTERESIS_FACTOR: f64 = 0.9;
