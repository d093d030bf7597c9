//! Fixed-window rate limiter middleware.
//!
//! Limits requests to a configurable number per second using a counter that
//! resets each second. Applied as an axum middleware.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Extension, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

struct Window {
    started: Instant,
    count: u64,
}

/// Process-wide request counter, cloned into the middleware.
#[derive(Clone)]
pub struct RateLimiter {
    /// Maximum requests allowed per second; 0 disables limiting.
    max_per_sec: u64,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    /// `max_per_sec` requests per one-second window.
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec,
            window: Arc::new(Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            })),
        }
    }

    /// Count one request against the window; false once it is full.
    pub fn try_acquire(&self) -> bool {
        if self.max_per_sec == 0 {
            return true;
        }
        let Ok(mut window) = self.window.lock() else {
            // Poisoned counter: fail open.
            return true;
        };
        let now = Instant::now();
        if now.duration_since(window.started) >= Duration::from_secs(1) {
            window.started = now;
            window.count = 0;
        }
        if window.count < self.max_per_sec {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

/// Reject the request with 429 once the current window is full.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        next.run(req).await
    } else {
        tracing::warn!(path = %req.uri().path(), "Rate limit exceeded");
        ApiError::TooManyRequests("Rate limit exceeded".to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_within_window() {
        let limiter = RateLimiter::new(3);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_clones_share_budget() {
        let limiter = RateLimiter::new(1);
        let other = limiter.clone();
        assert!(limiter.try_acquire());
        assert!(!other.try_acquire());
    }

    #[test]
    fn test_zero_disables_limit() {
        let limiter = RateLimiter::new(0);
        for _ in 0..1000 {
            assert!(limiter.try_acquire());
        }
    }
}
