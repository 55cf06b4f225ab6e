//! Retry state (§4.5). A pure state object owned by the request; the network
//! dispatcher drives it, never mutates its fields directly.

use volley_errors::VolleyError;

/// Default initial timeout before the first attempt, per §3.
pub const DEFAULT_TIMEOUT_MS: u64 = 2_500;
/// Default retry budget: no retries.
pub const DEFAULT_MAX_RETRIES: u32 = 0;
/// Default backoff multiplier: no growth.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.0;

/// Per-request retry/backoff state.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    current_timeout_ms: u64,
    current_retry_count: u32,
    max_retries: u32,
    backoff_multiplier: f64,
}

impl RetryPolicy {
    /// A retry policy with the given budget and backoff, starting at the default
    /// initial timeout.
    pub fn new(max_retries: u32, backoff_multiplier: f64) -> Self {
        Self {
            current_timeout_ms: DEFAULT_TIMEOUT_MS,
            current_retry_count: 0,
            max_retries,
            backoff_multiplier,
        }
    }

    /// Override the initial timeout (before any backoff is applied).
    pub fn with_initial_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.current_timeout_ms = timeout_ms;
        self
    }

    /// The timeout, in milliseconds, to use for the next (or current) attempt.
    pub fn current_timeout_ms(&self) -> u64 {
        self.current_timeout_ms
    }

    /// How many retries have been consumed so far.
    pub fn current_retry_count(&self) -> u32 {
        self.current_retry_count
    }

    /// Advance retry state in response to a retryable error (§4.3).
    ///
    /// `Ok(())` means "retry, with state already advanced to the next attempt's
    /// timeout". `Err(err)` means the retry budget is exhausted; the caller should
    /// propagate `err` (handed back unchanged) to the delivery's error path.
    pub fn retry(&mut self, err: VolleyError) -> Result<(), VolleyError> {
        self.current_retry_count += 1;
        self.current_timeout_ms += (self.current_timeout_ms as f64 * self.backoff_multiplier) as u64;
        if self.current_retry_count > self.max_retries {
            return Err(err);
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_MULTIPLIER)
    }
}
