//! Retry/backoff (§4.3, §8 property 9, scenario S5) and redirect-as-retry behavior.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use volley_pipeline::{PipelineConfig, Request, RequestBuilder, RetryPolicy, Volley};
use volley_types::HttpMethod;

use crate::support::{ok_response, ScriptedTransport};

fn no_cache_request(on_error: impl FnOnce(volley_errors::VolleyError) + Send + 'static, retry_policy: RetryPolicy) -> Arc<Request> {
    Arc::new(
        RequestBuilder::<()>::new(HttpMethod::Get, "https://example.com/r")
            .no_cache()
            .retry_policy(retry_policy)
            .build_erased(|_resp| Ok(((), None)), |_, _| {}, on_error),
    )
}

#[test]
fn s5_retry_exhaust_uses_growing_timeouts_then_surfaces_timeout_error() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(volley_cache::DiskCache::open(dir.path(), 0).unwrap());
    let transport = Arc::new(ScriptedTransport::new(vec![
        Err(volley_pipeline::TransportError::SocketTimeout),
        Err(volley_pipeline::TransportError::SocketTimeout),
        Err(volley_pipeline::TransportError::SocketTimeout),
    ]));

    let config = PipelineConfig::new(cache, transport.clone()).thread_pool_size(1);
    let volley = Volley::new(config);
    volley.start();

    let (tx, rx) = mpsc::channel();
    let retry_policy = RetryPolicy::new(2, 1.0).with_initial_timeout_ms(100);
    let req = no_cache_request(
        move |err| {
            let _ = tx.send(err);
        },
        retry_policy,
    );
    volley.submit(req);

    let err = rx.recv_timeout(Duration::from_secs(2)).expect("expected a delivered error");
    assert!(matches!(err, volley_errors::VolleyError::Timeout { .. }));

    volley.stop_and_join();

    let timeouts: Vec<u64> = transport.calls().iter().map(|d| d.as_millis() as u64).collect();
    assert_eq!(timeouts, vec![100, 200, 400]);
}

#[test]
fn retry_count_below_budget_eventually_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(volley_cache::DiskCache::open(dir.path(), 0).unwrap());
    let transport = Arc::new(ScriptedTransport::new(vec![
        Err(volley_pipeline::TransportError::SocketTimeout),
        Ok(ok_response(200, b"ok")),
    ]));

    let config = PipelineConfig::new(cache, transport.clone()).thread_pool_size(1);
    let volley = Volley::new(config);
    volley.start();

    let (tx, rx) = mpsc::channel();
    let req = Arc::new(
        RequestBuilder::<Vec<u8>>::new(HttpMethod::Get, "https://example.com/ok")
            .no_cache()
            .retry_policy(RetryPolicy::new(3, 0.0).with_initial_timeout_ms(50))
            .build_erased(
                |resp| Ok((resp.data.clone(), None)),
                move |body, _| {
                    let _ = tx.send(body);
                },
                |_| {},
            ),
    );
    volley.submit(req);

    let body = rx.recv_timeout(Duration::from_secs(2)).expect("expected a delivered success");
    assert_eq!(body, b"ok".to_vec());
    volley.stop_and_join();
}

#[test]
fn redirect_is_retried_with_new_url_and_surfaces_redirect_error_when_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(volley_cache::DiskCache::open(dir.path(), 0).unwrap());

    let mut redirect_resp = ok_response(302, b"");
    redirect_resp.headers.insert("Location".to_string(), "https://example.com/new".to_string());

    let transport = Arc::new(ScriptedTransport::new(vec![Ok(redirect_resp.clone()), Ok(redirect_resp)]));

    let config = PipelineConfig::new(cache, transport.clone()).thread_pool_size(1);
    let volley = Volley::new(config);
    volley.start();

    let (tx, rx) = mpsc::channel();
    let req = no_cache_request(
        move |err| {
            let _ = tx.send(err);
        },
        RetryPolicy::new(1, 0.0).with_initial_timeout_ms(50),
    );
    volley.submit(req);

    let err = rx.recv_timeout(Duration::from_secs(2)).expect("expected a delivered error");
    assert!(matches!(err, volley_errors::VolleyError::Redirect { .. }));
    volley.stop_and_join();

    assert_eq!(transport.calls().len(), 2);
}

#[test]
fn auth_failure_is_retryable() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(volley_cache::DiskCache::open(dir.path(), 0).unwrap());
    let transport = Arc::new(ScriptedTransport::new(vec![
        Ok(ok_response(401, b"")),
        Ok(ok_response(200, b"token-refreshed")),
    ]));

    let config = PipelineConfig::new(cache, transport.clone()).thread_pool_size(1);
    let volley = Volley::new(config);
    volley.start();

    let (tx, rx) = mpsc::channel();
    let req = Arc::new(
        RequestBuilder::<Vec<u8>>::new(HttpMethod::Get, "https://example.com/protected")
            .no_cache()
            .retry_policy(RetryPolicy::new(1, 0.0))
            .build_erased(
                |resp| Ok((resp.data.clone(), None)),
                move |body, _| {
                    let _ = tx.send(body);
                },
                |_| {},
            ),
    );
    volley.submit(req);

    let body = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(body, b"token-refreshed".to_vec());
    volley.stop_and_join();
}

#[test]
fn server_error_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(volley_cache::DiskCache::open(dir.path(), 0).unwrap());
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(ok_response(500, b""))]));

    let config = PipelineConfig::new(cache, transport.clone()).thread_pool_size(1);
    let volley = Volley::new(config);
    volley.start();

    let (tx, rx) = mpsc::channel();
    let req = no_cache_request(
        move |err| {
            let _ = tx.send(err);
        },
        RetryPolicy::new(5, 1.0),
    );
    volley.submit(req);

    let err = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(matches!(err, volley_errors::VolleyError::ServerError { status: 500, .. }));
    volley.stop_and_join();
    assert_eq!(transport.calls().len(), 1);
}

#[test]
fn malformed_url_is_fatal_and_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(volley_cache::DiskCache::open(dir.path(), 0).unwrap());
    let transport = Arc::new(ScriptedTransport::new(vec![Err(volley_pipeline::TransportError::MalformedUrl(
        "ht!tp://bad".to_string(),
    ))]));

    let config = PipelineConfig::new(cache, transport.clone()).thread_pool_size(1);
    let volley = Volley::new(config);
    volley.start();

    let (tx, rx) = mpsc::channel();
    let req = no_cache_request(
        move |err| {
            let _ = tx.send(err);
        },
        RetryPolicy::new(5, 1.0),
    );
    volley.submit(req);

    let err = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(matches!(err, volley_errors::VolleyError::MalformedUrl(_)));
    volley.stop_and_join();
    assert_eq!(transport.calls().len(), 1);
}
