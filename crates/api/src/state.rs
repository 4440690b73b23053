//! Application state
//!
//! Shared state for API handlers: the pipeline, the rotation scheduler and
//! the optional rate limiter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pulse_pipeline::{Pipeline, RotationScheduler};
use pulse_tap::TapPoint;

use crate::ratelimit::RateLimiter;

// =============================================================================
// AppState
// =============================================================================

/// State cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub scheduler: Arc<RotationScheduler>,
    /// `None` when rate limiting is disabled
    pub limiter: Option<RateLimiter>,
    /// Keep-alive interval for stream connections
    pub heartbeat: Duration,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, scheduler: Arc<RotationScheduler>) -> Self {
        Self {
            pipeline,
            scheduler,
            limiter: None,
            heartbeat: Duration::from_secs(30),
            started_at: Instant::now(),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    #[inline]
    pub fn tap(&self) -> &Arc<TapPoint> {
        self.pipeline.tap()
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
