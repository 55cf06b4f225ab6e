use std::collections::HashMap;
use volley_types::NetworkResponse;

fn response_with_headers(pairs: &[(&str, &str)]) -> NetworkResponse {
    let mut headers = HashMap::new();
    for (k, v) in pairs {
        headers.insert(k.to_string(), v.to_string());
    }
    NetworkResponse {
        status_code: 200,
        data: vec![],
        headers,
        not_modified: false,
        network_time_ms: 0,
    }
}

#[test]
fn header_lookup_is_case_insensitive() {
    let resp = response_with_headers(&[("ETag", "\"abc\"")]);
    assert_eq!(resp.header("etag"), Some("\"abc\""));
    assert_eq!(resp.header("ETAG"), Some("\"abc\""));
}

#[test]
fn missing_header_is_none() {
    let resp = response_with_headers(&[]);
    assert_eq!(resp.header("Last-Modified"), None);
}
