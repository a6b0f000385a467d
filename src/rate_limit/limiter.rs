//! Rate Limiter
//!
//! One configured limiter instance: its options, its own counter store and
//! the sweep task that keeps idle keys from accumulating.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::StatusCode;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::clock::{system_clock, SharedClock};
use crate::rate_limit::{RateLimitEntry, RateLimitResult, RateLimitStore};
use crate::tasks::{spawn_sweep_task, Sweep};

/// Maps a request to the bucket it is counted in.
pub type KeyGenerator = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// Side effect run when a key goes over its limit. Failures are logged only.
pub type LimitHook = Arc<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;

/// Message used when a policy does not set its own.
pub const DEFAULT_LIMIT_MESSAGE: &str = "Rate limit exceeded";

// == Options ==
/// Configuration of a single limiter.
#[derive(Clone)]
pub struct RateLimitOptions {
    pub window: Duration,
    pub limit: u32,
    pub key_generator: KeyGenerator,
    pub status_code: StatusCode,
    pub message: String,
    /// Take back the request when the response status is below 400
    pub skip_successful_requests: bool,
    /// Take back the request when the response status is 400 or above
    pub skip_failed_requests: bool,
    pub on_limit_reached: Option<LimitHook>,
}

impl RateLimitOptions {
    pub fn new(window: Duration, limit: u32, key_generator: KeyGenerator) -> Self {
        Self {
            window,
            limit,
            key_generator,
            status_code: StatusCode::TOO_MANY_REQUESTS,
            message: DEFAULT_LIMIT_MESSAGE.to_string(),
            skip_successful_requests: false,
            skip_failed_requests: false,
            on_limit_reached: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn skip_successful_requests(mut self, skip: bool) -> Self {
        self.skip_successful_requests = skip;
        self
    }

    pub fn skip_failed_requests(mut self, skip: bool) -> Self {
        self.skip_failed_requests = skip;
        self
    }

    pub fn on_limit_reached(mut self, hook: LimitHook) -> Self {
        self.on_limit_reached = Some(hook);
        self
    }

    pub fn window_ms(&self) -> u64 {
        self.window.as_millis() as u64
    }

    /// Whether a request that finished with `status` is taken back.
    pub fn should_refund(&self, status: StatusCode) -> bool {
        let failed = status.as_u16() >= 400;
        (self.skip_successful_requests && !failed) || (self.skip_failed_requests && failed)
    }
}

impl fmt::Debug for RateLimitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitOptions")
            .field("window", &self.window)
            .field("limit", &self.limit)
            .field("status_code", &self.status_code)
            .field("message", &self.message)
            .field("skip_successful_requests", &self.skip_successful_requests)
            .field("skip_failed_requests", &self.skip_failed_requests)
            .field("on_limit_reached", &self.on_limit_reached.is_some())
            .finish_non_exhaustive()
    }
}

// == Rate Limiter ==
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    options: RateLimitOptions,
    store: Arc<Mutex<RateLimitStore>>,
    clock: SharedClock,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, options: RateLimitOptions) -> Self {
        Self::with_clock(name, options, system_clock())
    }

    pub fn with_clock(name: impl Into<String>, options: RateLimitOptions, clock: SharedClock) -> Self {
        Self {
            name: name.into(),
            options,
            store: Arc::new(Mutex::new(RateLimitStore::new())),
            clock,
            sweeper: Mutex::new(None),
        }
    }

    /// Starts (or restarts) the background sweep on `interval`.
    pub fn start_sweeper(&self, interval: Duration) {
        let handle = spawn_sweep_task(self.store.clone(), self.clock.clone(), interval, "rate limit");
        if let Some(previous) = self.sweeper.lock().replace(handle) {
            previous.abort();
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &RateLimitOptions {
        &self.options
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Derives the bucket key for `request`.
    pub fn key_for(&self, request: &Request) -> String {
        (self.options.key_generator)(request)
    }

    // == Check ==
    /// Counts one request for `key`.
    pub fn check(&self, key: &str) -> RateLimitResult {
        let now = self.clock.now_ms();
        self.store
            .lock()
            .hit(key, now, self.options.window_ms(), self.options.limit)
    }

    /// Takes back one request for `key` booked in the window ending at
    /// `reset_time`, returning the count left.
    pub fn refund(&self, key: &str, reset_time: u64) -> u32 {
        self.store.lock().refund(key, reset_time)
    }

    /// Clears the window for `key`.
    pub fn reset(&self, key: &str) -> bool {
        self.store.lock().reset(key)
    }

    /// Active window for `key`, without counting.
    pub fn status(&self, key: &str) -> Option<RateLimitEntry> {
        let now = self.clock.now_ms();
        self.store.lock().status(key, now)
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Runs one sweep immediately. Returns the number of windows removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_ms();
        self.store.lock().sweep_expired(now)
    }

    // == Limit Hook ==
    /// Runs the `on_limit_reached` hook for `key`.
    ///
    /// Errors and panics inside the hook are logged and swallowed so they can
    /// never replace the rejection.
    pub fn notify_limit_reached(&self, key: &str) {
        let Some(hook) = &self.options.on_limit_reached else {
            return;
        };

        match catch_unwind(AssertUnwindSafe(|| hook(key))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(limiter = %self.name, key = %key, "Rate limit handler error: {:#}", err);
            }
            Err(_) => {
                error!(limiter = %self.name, key = %key, "Rate limit handler panicked");
            }
        }
    }

    // == Destroy ==
    /// Stops the sweep task and drops every window.
    pub fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        self.store.lock().clear();
        info!(limiter = %self.name, "Rate limiter destroyed");
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}
