//! The `Request` record (§3) and its construction surface.
//!
//! Volley's source models a request as an abstract base class overridden per concrete
//! request type, with virtual `parseNetworkResponse`/`deliverResponse` methods. §9's
//! design notes call for the language-neutral replacement: a single concrete `Request`
//! record carrying type-erased parser and listener closures, with the caller's real
//! type `T` captured at construction time and never named again. `RequestBuilder<T>`
//! is the typed front door; by the time a `Request` is built, `T` has been erased into
//! boxed `dyn Any` values moved through the closures below.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use sha1::{Digest, Sha1};
use volley_errors::VolleyError;
use volley_types::{CacheEntry, HttpMethod, NetworkResponse, Priority};

use crate::retry::RetryPolicy;

static IDENTIFIER_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_identifier(method: HttpMethod, url: &str) -> String {
    let counter = IDENTIFIER_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seed = format!("Request:{}:{url}:{ms}:{counter}", method.as_str());
    let mut hasher = Sha1::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// What a parser produces on success: the type-erased result, an optional cache entry
/// to persist, and whether this is an intermediate (soft-expired) delivery.
pub struct ParseOutcome {
    /// The parsed value, still boxed as `T` — downcast by the matching `deliver`
    /// closure captured at the same `RequestBuilder::build_erased` call.
    pub result: Box<dyn Any + Send>,
    /// Cache entry to write, if the parser produced one and the request is cacheable.
    pub cache_entry: Option<CacheEntry>,
}

/// Type-erased parser, callable from any dispatcher thread.
pub type ParseFn = dyn Fn(&NetworkResponse) -> Result<ParseOutcome, VolleyError> + Send + Sync;
/// Type-erased, one-shot success-delivery closure.
pub type DeliverFn = Box<dyn FnOnce(Box<dyn Any + Send>, bool) + Send>;
/// Type-erased, one-shot error-delivery closure.
pub type DeliverErrorFn = Box<dyn FnOnce(VolleyError) + Send>;

/// A submitted request, queue-managed after construction (§3).
///
/// Fields documented as "queue-managed" are wrapped for interior mutability because
/// `Request`s are shared via `Arc` across the submission caller and the dispatcher
/// threads that advance them; nothing here is mutated from more than one place at a
/// time, but the type system doesn't know that, so plain mutexes stand in for the
/// "single-threaded virtual method call" the source relied on.
pub struct Request {
    /// HTTP method.
    pub method: HttpMethod,
    /// Original URL, as submitted.
    pub url: String,
    redirect_url: Mutex<Option<String>>,
    /// Opaque identifier, unique per submission, never changes after construction.
    pub identifier: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body, already encoded (see `RequestBuilder::form_body`).
    pub body: Option<Vec<u8>>,
    /// Scheduling priority.
    pub priority: Priority,
    /// Cache key; defaults to the URL at construction (not re-derived on redirect —
    /// callers that want redirect-aware keys set `cache_key` explicitly).
    pub cache_key: String,
    /// Whether this request participates in caching/dedup at all.
    pub should_cache: bool,
    /// Opaque identity used by bulk-cancel-by-tag.
    pub tag: Option<Arc<dyn Any + Send + Sync>>,
    /// Retry/backoff state, advanced by the network dispatcher.
    pub retry_policy: Mutex<RetryPolicy>,
    /// The cache entry that seeded this attempt, if any (used to honor 304).
    pub cache_entry: Mutex<Option<CacheEntry>>,
    sequence: AtomicU64,
    canceled: AtomicBool,
    response_delivered: AtomicBool,
    parser: Arc<ParseFn>,
    deliver: Mutex<Option<DeliverFn>>,
    deliver_error: Mutex<Option<DeliverErrorFn>>,
}

impl Request {
    /// The effective URL: the redirect target if one has been set, else the original.
    pub fn effective_url(&self) -> String {
        self.redirect_url
            .lock()
            .expect("redirect_url mutex poisoned")
            .clone()
            .unwrap_or_else(|| self.url.clone())
    }

    /// Record a redirect target (§4.3, 301/302 handling).
    pub fn set_redirect_url(&self, url: String) {
        *self.redirect_url.lock().expect("redirect_url mutex poisoned") = Some(url);
    }

    /// `sequence`, assigned exactly once by the queue at submit time. Panics if read
    /// before assignment — callers only ever see an assigned value because `submit`
    /// assigns it before the request is reachable from any queue.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Assign `sequence`. Queue-internal; called exactly once, before the request is
    /// pushed onto any queue.
    pub fn set_sequence(&self, seq: u64) {
        self.sequence.store(seq, Ordering::Release);
    }

    /// Current priority (stable after construction).
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// `true` once `cancel()` has been called.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Flip the cancellation flag. Cooperative: dispatchers check it at dequeue time.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    /// `true` once a response (or error) has been handed to delivery.
    pub fn has_delivered(&self) -> bool {
        self.response_delivered.load(Ordering::Acquire)
    }

    /// Mark delivered. Returns `false` if already delivered (the caller should treat
    /// this as a no-op — `response_delivered` transitions false→true exactly once).
    pub fn mark_delivered(&self) -> bool {
        self.response_delivered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// The parser, shared (not one-shot): the network dispatcher's conditional-GET
    /// path may need to parse both a 304 replay and, later, a real refreshed response.
    pub fn parser(&self) -> &ParseFn {
        &*self.parser
    }

    /// Take the success-delivery closure. One-shot: returns `None` if already taken.
    pub fn take_deliver(&self) -> Option<DeliverFn> {
        self.deliver.lock().expect("deliver mutex poisoned").take()
    }

    /// Take the error-delivery closure. One-shot: returns `None` if already taken.
    pub fn take_deliver_error(&self) -> Option<DeliverErrorFn> {
        self.deliver_error
            .lock()
            .expect("deliver_error mutex poisoned")
            .take()
    }
}

/// Typed construction front door for [`Request`].
///
/// `T` only exists at build time: [`RequestBuilder::build_erased`] boxes the parser's
/// output and the listener closures so the resulting `Request` is homogeneous and can
/// sit in the same priority queue as requests of any other `T`.
pub struct RequestBuilder<T> {
    method: HttpMethod,
    url: String,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
    priority: Priority,
    cache_key: Option<String>,
    should_cache: bool,
    tag: Option<Arc<dyn Any + Send + Sync>>,
    retry_policy: RetryPolicy,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Send + 'static> RequestBuilder<T> {
    /// Start building a request for `method url`.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            priority: Priority::default(),
            cache_key: None,
            should_cache: true,
            tag: None,
            retry_policy: RetryPolicy::default(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Set a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a raw body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Build a URL-encoded form body from `params`, setting the matching content-type
    /// header, per §3 (`params` + `params_encoding`, UTF-8 assumed).
    pub fn form_body(mut self, params: &[(&str, &str)]) -> Self {
        let encoded = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded; charset=utf-8".to_string(),
        );
        self.body = Some(encoded.into_bytes());
        self
    }

    /// Set priority (default `Normal`).
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Override the cache key (default: the URL).
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Opt this request out of caching/dedup entirely.
    pub fn no_cache(mut self) -> Self {
        self.should_cache = false;
        self
    }

    /// Explicitly set whether this request participates in caching/dedup.
    pub fn should_cache(mut self, should_cache: bool) -> Self {
        self.should_cache = should_cache;
        self
    }

    /// Set the retry policy (default: no retries, 2500ms initial timeout).
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Attach an opaque tag for bulk cancel-by-identity.
    pub fn tag(mut self, tag: Arc<dyn Any + Send + Sync>) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Finalize the request, erasing `T` into the boxed closures the dispatchers use.
    ///
    /// `parse` runs on a dispatcher thread and must be pure besides CPU cost (§6).
    /// `on_response` and `on_error` run on the delivery context, never inline on a
    /// dispatcher thread (§4.6) — the dispatchers only ever call `take_deliver`/
    /// `take_deliver_error` and hand the closure to whatever `Delivery` impl posts it.
    pub fn build_erased<P, S, E>(self, parse: P, on_response: S, on_error: E) -> Request
    where
        P: Fn(&NetworkResponse) -> Result<(T, Option<CacheEntry>), VolleyError> + Send + Sync + 'static,
        S: FnOnce(T, bool) + Send + 'static,
        E: FnOnce(VolleyError) + Send + 'static,
    {
        let identifier = next_identifier(self.method, &self.url);
        let cache_key = self.cache_key.unwrap_or_else(|| self.url.clone());

        let parser: Arc<ParseFn> = Arc::new(move |resp| {
            let (value, cache_entry) = parse(resp)?;
            Ok(ParseOutcome {
                result: Box::new(value),
                cache_entry,
            })
        });
        let deliver: DeliverFn = Box::new(move |boxed, intermediate| {
            let value = *boxed
                .downcast::<T>()
                .expect("delivered value type mismatches the request's parser type");
            on_response(value, intermediate);
        });
        let deliver_error: DeliverErrorFn = Box::new(on_error);

        Request {
            method: self.method,
            url: self.url,
            redirect_url: Mutex::new(None),
            identifier,
            headers: self.headers,
            body: self.body,
            priority: self.priority,
            cache_key,
            should_cache: self.should_cache,
            tag: self.tag,
            retry_policy: Mutex::new(self.retry_policy),
            cache_entry: Mutex::new(None),
            sequence: AtomicU64::new(0),
            canceled: AtomicBool::new(false),
            response_delivered: AtomicBool::new(false),
            parser,
            deliver: Mutex::new(Some(deliver)),
            deliver_error: Mutex::new(Some(deliver_error)),
        }
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
