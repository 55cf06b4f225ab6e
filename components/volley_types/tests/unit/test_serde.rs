use volley_types::{HttpMethod, Priority};

#[test]
fn http_method_roundtrips_through_json() {
    let json = serde_json::to_string(&HttpMethod::Post).unwrap();
    let deserialized: HttpMethod = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, HttpMethod::Post);
}

#[test]
fn priority_roundtrips_through_json() {
    let json = serde_json::to_string(&Priority::High).unwrap();
    let deserialized: Priority = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, Priority::High);
}
