use volley_cache::DiskCache;
use volley_types::CacheEntry;

fn entry(data: &[u8], etag: &str) -> CacheEntry {
    CacheEntry {
        data: data.to_vec(),
        etag: Some(etag.to_string()),
        ttl: 1_000_000_000_000,
        soft_ttl: 1_000_000_000_000,
        ..Default::default()
    }
}

#[test]
fn stores_and_retrieves_across_distinct_keys() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::open(dir.path(), 0).unwrap();

    cache.put("https://example.com/a", &entry(b"aaa", "v1")).unwrap();
    cache.put("https://example.com/b", &entry(b"bbb", "v2")).unwrap();

    assert_eq!(cache.get("https://example.com/a").unwrap().data, b"aaa");
    assert_eq!(cache.get("https://example.com/b").unwrap().data, b"bbb");
}

#[test]
fn overwriting_a_key_replaces_its_entry() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::open(dir.path(), 0).unwrap();

    cache.put("key", &entry(b"first", "v1")).unwrap();
    cache.put("key", &entry(b"second", "v2")).unwrap();

    let fetched = cache.get("key").unwrap();
    assert_eq!(fetched.data, b"second");
    assert_eq!(fetched.etag.as_deref(), Some("v2"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn invalidate_on_a_missing_key_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::open(dir.path(), 0).unwrap();
    cache.invalidate("missing", true);
    assert!(cache.get("missing").is_none());
}

#[test]
fn survives_reopen_with_headers_intact() {
    let dir = tempfile::tempdir().unwrap();
    {
        let cache = DiskCache::open(dir.path(), 0).unwrap();
        let mut e = entry(b"payload", "v1");
        e.response_headers.insert("Content-Type".into(), "text/plain".into());
        cache.put("key", &e).unwrap();
    }

    let reopened = DiskCache::open(dir.path(), 0).unwrap();
    let fetched = reopened.get("key").unwrap();
    assert_eq!(
        fetched.response_headers.get("Content-Type").map(String::as_str),
        Some("text/plain")
    );
}
