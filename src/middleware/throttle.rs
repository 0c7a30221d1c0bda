//! Per-client request throttling.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use dashmap::DashMap;

use crate::config::ThrottleConfig;
use crate::dispatch::chain::Middleware;
use crate::dispatch::context::Context;
use crate::error::DispatchResult;
use crate::observability::metrics;

/// Requests per window when the configured limit is zero.
pub const DEFAULT_LIMIT: u32 = 15;

/// Tracked windows above which stale entries are swept on the request path.
const SWEEP_THRESHOLD: usize = 10_000;

/// Minimum time between two request-path sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window limiter keyed by client address and request path.
///
/// Requests over the limit are answered with `429 Too Many Requests`
/// without reaching the rest of the chain.
#[derive(Debug)]
pub struct Throttle {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
    last_sweep: Mutex<Instant>,
}

impl Throttle {
    pub fn new(requests_per_second: u32) -> Self {
        let limit = if requests_per_second == 0 {
            tracing::warn!(default = DEFAULT_LIMIT, "Throttle limit is zero; using default");
            DEFAULT_LIMIT
        } else {
            requests_per_second
        };

        Self {
            limit,
            window: Duration::from_secs(1),
            windows: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.requests_per_second)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one request for `key`, returning whether it is within the limit.
    fn admit(&self, key: String, now: Instant) -> bool {
        let mut window = self.windows.entry(key).or_insert_with(|| Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }
        if window.count >= self.limit {
            return false;
        }
        window.count += 1;
        true
    }

    /// Claim the next sweep if the map is large and the last sweep is at
    /// least [`SWEEP_INTERVAL`] old. Concurrent callers never both win.
    fn sweep_due(&self, now: Instant) -> bool {
        if self.windows.len() <= SWEEP_THRESHOLD {
            return false;
        }
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return false;
        };
        if now.saturating_duration_since(*last) < SWEEP_INTERVAL {
            return false;
        }
        *last = now;
        true
    }

    /// Drop windows that have already expired. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < self.window);
        before.saturating_sub(self.windows.len())
    }
}

impl Middleware for Throttle {
    fn handle(&self, ctx: &mut Context) -> DispatchResult {
        if self.sweep_due(Instant::now()) {
            let removed = self.sweep();
            tracing::debug!(removed, remaining = self.windows.len(), "Swept throttle windows");
        }

        let request = ctx.request();
        let client = request
            .ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let key = format!("{client}|{}", request.path());

        if self.admit(key, Instant::now()) {
            return ctx.next();
        }

        tracing::warn!(
            request_id = %request.id(),
            client = %client,
            path = %request.raw_path(),
            limit = self.limit,
            "Throttle limit exceeded"
        );
        metrics::record_throttled(ctx.route());

        let response = ctx.response_mut();
        response.clear();
        response.set_status(StatusCode::TOO_MANY_REQUESTS);
        Ok(())
    }
}
