//! Fixed-window rate limiting for `/api/*`.
//!
//! Each `"<client-ip>:<path>"` key gets a counter that resets once its window
//! expires. Expired windows are swept periodically by a background task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// How often expired windows are removed.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: DateTime<Utc>,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub limit: u32,
    pub remaining: u32,
    /// Window end as Unix seconds, rounded up.
    pub reset: i64,
    pub allowed: bool,
}

/// Shared fixed-window counters.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
    max_requests: u32,
    window: chrono::Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::seconds(60));
        Self { windows: Arc::new(RwLock::new(HashMap::new())), max_requests, window }
    }

    /// Count a request for `key` at the current time.
    pub async fn check(&self, key: &str) -> Decision {
        self.check_at(key, Utc::now()).await
    }

    async fn check_at(&self, key: &str, now: DateTime<Utc>) -> Decision {
        let resets_at = now.checked_add_signed(self.window).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut windows = self.windows.write().await;
        let entry = windows
            .entry(key.to_string())
            .and_modify(|w| {
                if w.resets_at < now {
                    *w = Window { count: 1, resets_at };
                } else {
                    w.count = w.count.saturating_add(1);
                }
            })
            .or_insert(Window { count: 1, resets_at });

        Decision {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset: ceil_seconds(entry.resets_at),
            allowed: entry.count <= self.max_requests,
        }
    }

    /// Drop expired windows. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, w| w.resets_at >= now);
        before - windows.len()
    }

    /// Sweep expired windows every [`SWEEP_INTERVAL`] until the runtime shuts down.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = limiter.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "swept expired rate limit windows");
                }
            }
        })
    }
}

fn ceil_seconds(at: DateTime<Utc>) -> i64 {
    let secs = at.timestamp();
    if at.timestamp_subsec_nanos() > 0 { secs + 1 } else { secs }
}

/// Client address from proxy headers: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, else `unknown`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded.or_else(real_ip).unwrap_or("unknown").to_string()
}

/// Middleware counting every request and rejecting those over the limit.
pub async fn enforce(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let key = format!("{}:{}", client_ip(request.headers()), request.uri().path());
    let decision = limiter.check(&key).await;

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(key = %key, "rate limit exceeded");
        (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": "Too many requests. Please try again later." })))
            .into_response()
    };

    let headers = response.headers_mut();
    headers.insert(LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(decision.reset));
    response
}
