//! Unit tests for the volley_pipeline component: retry/backoff, redirects, and the
//! 304-coherency rules the network dispatcher implements (§4.3).

mod support;
mod test_not_modified;
mod test_retry_redirect;
