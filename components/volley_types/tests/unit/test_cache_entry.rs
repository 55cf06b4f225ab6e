use volley_types::CacheEntry;

#[test]
fn unset_ttl_counts_as_expired() {
    let entry = CacheEntry::default();
    assert!(entry.is_expired(1));
    assert!(entry.refresh_needed(1));
}

#[test]
fn fresh_entry_is_neither_expired_nor_needing_refresh() {
    let entry = CacheEntry {
        ttl: 10_000,
        soft_ttl: 10_000,
        ..Default::default()
    };
    assert!(!entry.is_expired(5_000));
    assert!(!entry.refresh_needed(5_000));
}
