//! The cache dispatcher (§4.2) and network dispatcher pool (§4.3) loops.
//!
//! Both are plain functions meant to be run on their own OS thread (per §5, "parallel
//! threads with shared state under explicit mutual exclusion" — no async runtime
//! involved); [`crate::Volley::start`] is what actually spawns them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, trace, warn};

use volley_cache::DiskCache;
use volley_errors::VolleyError;
use volley_scheduler::{Request, RequestQueue};
use volley_types::{CacheEntry, NetworkResponse};

use crate::delivery::Delivery;
use crate::transport::{Transport, TransportError, TransportResponse};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn to_network_response(resp: &TransportResponse) -> NetworkResponse {
    NetworkResponse {
        status_code: resp.status_code,
        data: resp.body.clone(),
        headers: resp.headers.clone(),
        not_modified: false,
        network_time_ms: 0,
    }
}

fn header_ci<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// The single cache-dispatcher worker loop (§4.2).
///
/// Runs until `queue.cache_queue.take()` returns `None` (i.e. `queue.stop()` was
/// called and the queue drained).
pub fn run_cache_dispatcher(queue: Arc<RequestQueue>, cache: Arc<DiskCache>, delivery: Arc<dyn Delivery>) {
    loop {
        let req = match queue.cache_queue.take() {
            Some(req) => req,
            None => break,
        };

        if req.is_canceled() {
            trace!(id = %req.identifier, "cache-discard-canceled");
            queue.finish(&req);
            continue;
        }

        let now = now_ms();
        match cache.get(&req.cache_key) {
            None => {
                trace!(id = %req.identifier, key = %req.cache_key, "cache miss, routing to network");
                queue.network_queue.push(req);
            }
            Some(entry) if entry.is_expired(now) => {
                trace!(id = %req.identifier, key = %req.cache_key, "hard-expired, routing to network with entry carried");
                *req.cache_entry.lock().expect("cache_entry mutex poisoned") = Some(entry);
                queue.network_queue.push(req);
            }
            Some(entry) => {
                handle_cache_hit(&req, &queue, entry, now, delivery.as_ref());
            }
        }
    }
}

fn handle_cache_hit(
    req: &Arc<Request>,
    queue: &Arc<RequestQueue>,
    entry: CacheEntry,
    now: u64,
    delivery: &dyn Delivery,
) {
    let network_response = NetworkResponse {
        status_code: 200,
        data: entry.data.clone(),
        headers: entry.response_headers.clone(),
        not_modified: false,
        network_time_ms: 0,
    };

    match (req.parser())(&network_response) {
        Err(err) => delivery.post_error(req.clone(), err),
        Ok(outcome) => {
            if entry.refresh_needed(now) {
                debug!(id = %req.identifier, key = %req.cache_key, "soft-expired hit, delivering intermediate then refreshing");
                *req.cache_entry.lock().expect("cache_entry mutex poisoned") = Some(entry);
                let queue = queue.clone();
                let req_for_refresh = req.clone();
                delivery.post_with_continuation(
                    req.clone(),
                    outcome.result,
                    true,
                    Box::new(move || queue.network_queue.push(req_for_refresh)),
                );
            } else {
                trace!(id = %req.identifier, key = %req.cache_key, "fresh cache hit");
                delivery.post(req.clone(), outcome.result, false);
            }
        }
    }
}

/// One of the `thread_pool_size` network-dispatcher worker loops (§4.3).
pub fn run_network_dispatcher(
    queue: Arc<RequestQueue>,
    cache: Arc<DiskCache>,
    transport: Arc<dyn Transport>,
    delivery: Arc<dyn Delivery>,
) {
    loop {
        let req = match queue.network_queue.take() {
            Some(req) => req,
            None => break,
        };

        if req.is_canceled() {
            trace!(id = %req.identifier, "network-discard-cancelled");
            queue.finish(&req);
            continue;
        }

        process_one(&req, &queue, &cache, transport.as_ref(), delivery.as_ref());
    }
}

/// Build the conditional-GET headers from `req.cache_entry`, if any (§4.3 step 4).
fn conditional_headers(req: &Request) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    let cache_entry = req.cache_entry.lock().expect("cache_entry mutex poisoned").clone();
    if let Some(entry) = cache_entry {
        if let Some(etag) = entry.etag {
            headers.insert("If-None-Match".to_string(), etag);
        }
        if entry.last_modified != 0 {
            let when = UNIX_EPOCH + Duration::from_millis(entry.last_modified);
            headers.insert("If-Modified-Since".to_string(), httpdate::fmt_http_date(when));
        }
    }
    headers
}

/// Drive the retry/redirect loop (§4.3 steps 4–8) for a single request until it
/// reaches a terminal outcome (delivered, errored, or handed off as not-modified).
fn process_one(req: &Arc<Request>, queue: &Arc<RequestQueue>, cache: &Arc<DiskCache>, transport: &dyn Transport, delivery: &dyn Delivery) {
    loop {
        let extra_headers = conditional_headers(req);
        let timeout_ms = req
            .retry_policy
            .lock()
            .expect("retry_policy mutex poisoned")
            .current_timeout_ms();

        match transport.perform(req, &extra_headers, Duration::from_millis(timeout_ms)) {
            Err(TransportError::MalformedUrl(msg)) => {
                delivery.post_error(req.clone(), VolleyError::MalformedUrl(msg));
                return;
            }
            Err(TransportError::NoConnection) => {
                delivery.post_error(
                    req.clone(),
                    VolleyError::NoConnection {
                        response: None,
                        network_time_ms: None,
                    },
                );
                return;
            }
            Err(TransportError::Io(message)) => {
                delivery.post_error(
                    req.clone(),
                    VolleyError::NetworkError {
                        message,
                        response: None,
                        network_time_ms: None,
                    },
                );
                return;
            }
            Err(TransportError::ConnectTimeout) | Err(TransportError::SocketTimeout) => {
                let err = VolleyError::Timeout {
                    response: None,
                    network_time_ms: None,
                };
                if let Err(exhausted) = req.retry_policy.lock().expect("retry_policy mutex poisoned").retry(err) {
                    delivery.post_error(req.clone(), exhausted);
                    return;
                }
                continue;
            }
            Ok(resp) => match resp.status_code {
                304 => {
                    handle_not_modified(req, queue, cache, delivery, resp);
                    return;
                }
                301 | 302 => {
                    if let Some(location) = header_ci(&resp.headers, "Location") {
                        req.set_redirect_url(location.to_string());
                    }
                    let err = VolleyError::Redirect {
                        response: Some(to_network_response(&resp)),
                        network_time_ms: None,
                    };
                    if let Err(exhausted) = req.retry_policy.lock().expect("retry_policy mutex poisoned").retry(err) {
                        delivery.post_error(req.clone(), exhausted);
                        return;
                    }
                    continue;
                }
                401 | 403 => {
                    let err = VolleyError::AuthFailure {
                        status: resp.status_code,
                        response: Some(to_network_response(&resp)),
                        network_time_ms: None,
                    };
                    if let Err(exhausted) = req.retry_policy.lock().expect("retry_policy mutex poisoned").retry(err) {
                        delivery.post_error(req.clone(), exhausted);
                        return;
                    }
                    continue;
                }
                200..=299 => {
                    handle_success(req, cache, delivery, resp);
                    return;
                }
                _ => {
                    warn!(id = %req.identifier, status = resp.status_code, "network dispatcher treating status as server error");
                    delivery.post_error(
                        req.clone(),
                        VolleyError::ServerError {
                            status: resp.status_code,
                            response: Some(to_network_response(&resp)),
                            network_time_ms: None,
                        },
                    );
                    return;
                }
            },
        }
    }
}

fn handle_success(req: &Arc<Request>, cache: &Arc<DiskCache>, delivery: &dyn Delivery, resp: TransportResponse) {
    let network_response = to_network_response(&resp);
    match (req.parser())(&network_response) {
        Err(err) => delivery.post_error(req.clone(), err),
        Ok(outcome) => {
            if req.should_cache {
                if let Some(entry) = &outcome.cache_entry {
                    if let Err(err) = cache.put(&req.cache_key, entry) {
                        warn!(id = %req.identifier, key = %req.cache_key, %err, "failed to write cache entry after successful fetch");
                    }
                }
            }
            delivery.post(req.clone(), outcome.result, false);
        }
    }
}

/// §4.3 step 6: merge the 304's headers into the carried cache entry and deliver the
/// cached body, marked `not_modified`. The cache body is never rewritten here — only
/// response headers are merged (testable property 4).
fn handle_not_modified(req: &Arc<Request>, queue: &Arc<RequestQueue>, cache: &Arc<DiskCache>, delivery: &dyn Delivery, resp: TransportResponse) {
    let carried = req.cache_entry.lock().expect("cache_entry mutex poisoned").clone();

    let network_response = match carried {
        Some(mut entry) => {
            for (name, value) in &resp.headers {
                entry.response_headers.insert(name.clone(), value.clone());
            }
            if req.should_cache {
                if let Err(err) = cache.put(&req.cache_key, &entry) {
                    warn!(id = %req.identifier, key = %req.cache_key, %err, "failed to persist merged 304 headers");
                }
            }
            NetworkResponse {
                status_code: 200,
                data: entry.data,
                headers: entry.response_headers,
                not_modified: true,
                network_time_ms: 0,
            }
        }
        // Anomalous per §4.3 step 6: no cache entry was carried into this attempt.
        // Deliver an empty-body 304 response rather than fabricate a body.
        None => NetworkResponse {
            status_code: 304,
            data: Vec::new(),
            headers: resp.headers,
            not_modified: true,
            network_time_ms: 0,
        },
    };

    // §4.3 step 7: a response was already delivered (the soft-expired intermediate)
    // and this refresh only confirmed the body is unchanged — don't deliver a
    // duplicate, just finish.
    if req.has_delivered() {
        trace!(id = %req.identifier, "not-modified after prior delivery, finishing without re-delivering");
        queue.finish(req);
        return;
    }

    match (req.parser())(&network_response) {
        Ok(outcome) => delivery.post(req.clone(), outcome.result, false),
        Err(err) => delivery.post_error(req.clone(), err),
    }
}
