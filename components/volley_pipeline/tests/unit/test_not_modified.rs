//! 304 coherency (§8 property 4, scenario S3) and hard-expiry (§8 property 6).

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use volley_pipeline::{PipelineConfig, RequestBuilder, Volley};
use volley_types::{CacheEntry, HttpMethod};

use crate::support::{ok_response, ScriptedTransport};

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[test]
fn s3_conditional_get_sends_etag_and_keeps_cached_body_on_304() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(volley_cache::DiskCache::open(dir.path(), 0).unwrap());

    let primed = CacheEntry {
        data: b"X".to_vec(),
        etag: Some("v1".to_string()),
        ttl: 0, // already hard-expired: must revalidate
        soft_ttl: 0,
        ..Default::default()
    };
    cache.put("https://example.com/x", &primed).unwrap();

    let mut not_modified = ok_response(304, b"");
    not_modified.headers.insert("Date".to_string(), "new-date".to_string());
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(not_modified)]));

    let config = PipelineConfig::new(cache.clone(), transport.clone()).thread_pool_size(1);
    let volley = Volley::new(config);
    volley.start();

    let (tx, rx) = mpsc::channel();
    let req = Arc::new(
        RequestBuilder::<Vec<u8>>::new(HttpMethod::Get, "https://example.com/x")
            .build_erased(
                |resp| Ok((resp.data.clone(), None)),
                move |body, _| {
                    let _ = tx.send(body);
                },
                |_| {},
            ),
    );
    volley.submit(req);

    let body = rx.recv_timeout(Duration::from_secs(2)).expect("expected a delivered body");
    assert_eq!(body, b"X".to_vec());
    volley.stop_and_join();

    // The transport was sent the etag as a conditional-GET validator.
    let sent_headers = transport.last_headers();
    assert_eq!(sent_headers.get("If-None-Match").map(String::as_str), Some("v1"));

    // The cached body is unchanged; only headers were merged.
    let refreshed = cache.get("https://example.com/x").unwrap();
    assert_eq!(refreshed.data, b"X".to_vec());
    assert_eq!(refreshed.response_headers.get("Date").map(String::as_str), Some("new-date"));
}

#[test]
fn hard_expiry_delivers_exactly_one_fresh_response_no_intermediate() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(volley_cache::DiskCache::open(dir.path(), 0).unwrap());

    let expired = CacheEntry {
        data: b"stale".to_vec(),
        ttl: now_ms() - 1_000,
        soft_ttl: now_ms() - 1_000,
        ..Default::default()
    };
    cache.put("https://example.com/hard", &expired).unwrap();

    let transport = Arc::new(ScriptedTransport::new(vec![Ok(ok_response(200, b"fresh"))]));
    let config = PipelineConfig::new(cache, transport).thread_pool_size(1);
    let volley = Volley::new(config);
    volley.start();

    let (tx, rx) = mpsc::channel::<(Vec<u8>, bool)>();
    let req = Arc::new(
        RequestBuilder::<Vec<u8>>::new(HttpMethod::Get, "https://example.com/hard")
            .build_erased(
                |resp| Ok((resp.data.clone(), None)),
                move |body, intermediate| {
                    let _ = tx.send((body, intermediate));
                },
                |_| {},
            ),
    );
    volley.submit(req);

    let (body, intermediate) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(body, b"fresh".to_vec());
    assert!(!intermediate);

    // no second delivery follows
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    volley.stop_and_join();
}

#[test]
fn anomalous_304_with_no_carried_entry_delivers_empty_body() {
    // Submitting with should_cache(false) means the cache dispatcher never runs and no
    // cache_entry is ever attached, so if a transport still answers 304 the network
    // dispatcher hits the "anomalous" branch of §4.3 step 6.
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(volley_cache::DiskCache::open(dir.path(), 0).unwrap());
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(ok_response(304, b""))]));
    let config = PipelineConfig::new(cache, transport).thread_pool_size(1);
    let volley = Volley::new(config);
    volley.start();

    let (tx, rx) = mpsc::channel();
    let req = Arc::new(
        RequestBuilder::<Vec<u8>>::new(HttpMethod::Get, "https://example.com/anomalous")
            .no_cache()
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
    assert!(body.is_empty());
    volley.stop_and_join();
}
