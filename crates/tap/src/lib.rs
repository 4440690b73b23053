//! Pulse Tap - Live fan-out of accepted entries
//!
//! Every entry the pipeline accepts is published to the [`TapPoint`], which
//! offers it to each connected subscriber whose [`TapFilter`] matches.
//!
//! - Two transports share one registry: push streams (WebSocket, filter can be
//!   replaced by the client) and pull streams (SSE, filter fixed at connect)
//! - Pull subscribers first receive a bounded, filtered replay of recent
//!   entries
//! - Delivery is best-effort: a full client channel drops the item for that
//!   client only, a closed channel removes the client
//! - Dropping a [`Subscription`] unsubscribes it, so every disconnect path
//!   cleans up
//!
//! # Architecture
//!
//! ```text
//! Pipeline.add_log() / add_monitoring()
//!     │
//!     ▼
//! TapPoint.publish(TapItem)
//!     │
//!     ├──→ ReplayBuffer (logs | monitoring)
//!     │
//!     └──→ SubscriberManager.broadcast ── filter ──→ mpsc per client
//!                                                      │
//!                                        WebSocket / SSE handler
//! ```

pub mod buffer;
mod error;
pub mod filter;
mod item;
pub mod protocol;
pub mod subscriber;
pub mod tap_point;

pub use buffer::ReplayBuffer;
pub use error::{Result, TapError};
pub use filter::TapFilter;
pub use item::{ItemKind, TapItem};
pub use protocol::{ClientMessage, ServerMessage, SubscribeFilters};
pub use subscriber::{Subscriber, SubscriberManager, Transport};
pub use tap_point::{Subscription, TapPoint, TapStats};

#[cfg(test)]
mod testutil;
