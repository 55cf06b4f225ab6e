//! §8 properties 2–3: submission sequencing and cache-key deduplication through
//! `RequestQueue`'s public surface (a black-box counterpart to the crate's inline tests).

use std::sync::Arc;

use volley_scheduler::{Request, RequestBuilder, RequestQueue};
use volley_types::{HttpMethod, Priority};

fn req(cache_key: &str, should_cache: bool) -> Arc<Request> {
    Arc::new(
        RequestBuilder::<()>::new(HttpMethod::Get, "https://example.com")
            .cache_key(cache_key)
            .priority(Priority::Normal)
            .should_cache(should_cache)
            .build_erased(|_| Ok(((), None)), |_, _| {}, |_| {}),
    )
}

#[test]
fn sequence_numbers_increase_monotonically_across_submissions() {
    let queue = RequestQueue::new();
    let a = queue.submit(req("a", false));
    let b = queue.submit(req("b", false));
    let c = queue.submit(req("c", false));
    assert!(a.sequence() < b.sequence());
    assert!(b.sequence() < c.sequence());
}

#[test]
fn three_submissions_for_the_same_key_yield_exactly_one_cache_queue_entry() {
    let queue = RequestQueue::new();
    queue.submit(req("K", true));
    queue.submit(req("K", true));
    queue.submit(req("K", true));

    assert_eq!(queue.cache_queue.len(), 1);
    assert_eq!(queue.current_request_count(), 3);
}

#[test]
fn distinct_keys_each_reach_the_cache_queue_independently() {
    let queue = RequestQueue::new();
    queue.submit(req("a", true));
    queue.submit(req("b", true));

    assert_eq!(queue.cache_queue.len(), 2);
}

#[test]
fn finishing_the_leader_promotes_every_deduplicated_sibling() {
    let queue = RequestQueue::new();
    let leader = queue.submit(req("K", true));
    queue.submit(req("K", true));
    queue.submit(req("K", true));

    let taken = queue.cache_queue.take().unwrap();
    assert_eq!(taken.identifier, leader.identifier);

    queue.finish(&leader);
    assert_eq!(queue.cache_queue.len(), 2);
}
