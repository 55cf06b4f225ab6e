//! Unit tests for volley_scheduler

mod test_request_queue;
