//! Rate limiting middleware
//!
//! Fixed-window admission control keyed by source id, falling back to the
//! client IP address. Each key holds `{count, reset_at}`: a request after
//! `reset_at` opens a new window, and a request is denied once `count`
//! exceeds the ceiling. There is no smoothing, so up to twice the ceiling
//! can pass across a window boundary.
//!
//! # Usage
//!
//! ```ignore
//! use pulse_api::ratelimit::{RateLimitLayer, RateLimiter};
//!
//! let limiter = RateLimiter::new(&config.rate_limit);
//! let app = Router::new()
//!     .route("/api/logs", post(ingest_logs).layer(RateLimitLayer::new(Some(limiter))));
//! ```

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Query},
    http::{Request, Response},
    response::IntoResponse,
};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service};
use tracing::{debug, warn};

use pulse_config::RateLimitConfig;

use crate::error::ApiError;

/// Header naming the submitting source
pub const SOURCE_HEADER: &str = "x-source-id";

/// Counter for one key
#[derive(Clone, Copy, Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Result of an admission check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Allowed { remaining: u32 },
    Denied { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Read-only view of the limiter table
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSnapshot {
    pub window_ms: u64,
    pub max_requests: u32,
    /// Keys with an open window
    pub tracked: usize,
    /// Keys currently over the ceiling
    pub limited: Vec<String>,
}

/// Shared rate limiter state
#[derive(Clone, Debug)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_limits(config.window(), config.max_requests)
    }

    pub fn with_limits(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_requests,
        }
    }

    /// Check if a request is allowed for the given key
    pub fn check(&self, key: &str) -> Admission {
        self.check_at(key, Instant::now())
    }

    /// Admission check against an explicit clock reading
    pub fn check_at(&self, key: &str, now: Instant) -> Admission {
        let mut windows = self.windows.lock();
        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });

        if now > window.reset_at {
            window.count = 0;
            window.reset_at = now + self.window;
        }
        window.count = window.count.saturating_add(1);

        if window.count > self.max_requests {
            let wait = window.reset_at.saturating_duration_since(now);
            Admission::Denied {
                retry_after_secs: wait.as_millis().div_ceil(1000).max(1) as u64,
            }
        } else {
            Admission::Allowed {
                remaining: self.max_requests - window.count,
            }
        }
    }

    /// Drop windows that have expired
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now())
    }

    pub fn cleanup_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, window| now <= window.reset_at);
        before - windows.len()
    }

    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        self.snapshot_at(Instant::now())
    }

    /// Table view at `now`; a window past its reset no longer counts as limited
    pub fn snapshot_at(&self, now: Instant) -> RateLimitSnapshot {
        let windows = self.windows.lock();
        let mut limited: Vec<String> = windows
            .iter()
            .filter(|(_, w)| now <= w.reset_at && w.count > self.max_requests)
            .map(|(key, _)| key.clone())
            .collect();
        limited.sort();

        RateLimitSnapshot {
            window_ms: self.window.as_millis() as u64,
            max_requests: self.max_requests,
            tracked: windows.len(),
            limited,
        }
    }

    /// Purge expired windows every `interval` until cancelled
    pub fn spawn_cleanup(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = limiter.cleanup();
                        if removed > 0 {
                            debug!(removed, "Purged expired rate limit windows");
                        }
                    }
                }
            }
            debug!("Rate limiter cleanup stopped");
        })
    }
}

/// Rate limiting layer for Tower middleware
///
/// A layer without a limiter passes every request through.
#[derive(Clone, Debug)]
pub struct RateLimitLayer {
    limiter: Option<RateLimiter>,
}

impl RateLimitLayer {
    pub fn new(limiter: Option<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
        }
    }
}

/// Rate limiting service
#[derive(Clone, Debug)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Option<RateLimiter>,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);

        Box::pin(async move {
            if let Some(limiter) = limiter {
                let key = rate_limit_key(&req);
                if let Admission::Denied { retry_after_secs } = limiter.check(&key) {
                    warn!(key = %key, retry_after_secs, "Rate limit exceeded");
                    return Ok(ApiError::RateLimited {
                        retry_after: retry_after_secs,
                    }
                    .into_response());
                }
            }

            inner.call(req).await
        })
    }
}

#[derive(Deserialize)]
struct SourceParam {
    #[serde(rename = "sourceId")]
    source_id: Option<String>,
}

/// Source id from the header or `sourceId` query parameter, else client IP
fn rate_limit_key<B>(req: &Request<B>) -> String {
    if let Some(source) = req.headers().get(SOURCE_HEADER)
        && let Ok(value) = source.to_str()
        && !value.trim().is_empty()
    {
        return value.trim().to_string();
    }

    if let Ok(Query(SourceParam {
        source_id: Some(source),
    })) = Query::<SourceParam>::try_from_uri(req.uri())
        && !source.trim().is_empty()
    {
        return source.trim().to_string();
    }

    extract_client_ip(req).to_string()
}

/// Extract client IP from request
fn extract_client_ip<B>(req: &Request<B>) -> IpAddr {
    // Try X-Forwarded-For header first (for proxies)
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first_ip) = value.split(',').next()
        && let Ok(ip) = first_ip.trim().parse()
    {
        return ip;
    }

    if let Some(real_ip) = req.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && let Ok(ip) = value.trim().parse()
    {
        return ip;
    }

    if let Some(connect_info) = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>() {
        return connect_info.0.ip();
    }

    IpAddr::from([127, 0, 0, 1])
}

#[cfg(test)]
#[path = "ratelimit_test.rs"]
mod tests;
