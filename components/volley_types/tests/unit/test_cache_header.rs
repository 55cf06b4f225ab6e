use volley_types::{CacheEntry, CacheHeader};

#[test]
fn from_entry_carries_headers_through() {
    let mut entry = CacheEntry::default();
    entry
        .response_headers
        .insert("Content-Type".into(), "text/plain".into());

    let header = CacheHeader::from_entry("https://example.com/a", &entry, 17);
    assert_eq!(header.key, "https://example.com/a");
    assert_eq!(header.file_size, 17);
    assert_eq!(
        header.response_headers.get("Content-Type").map(String::as_str),
        Some("text/plain")
    );
}
