//! Live stream endpoints
//!
//! - `GET /ws`: push stream (WebSocket). Starts unfiltered; the client may
//!   replace its filter at any time with a `subscribe` frame.
//! - `GET /api/logs/stream`, `GET /api/monitoring/stream`, `GET /api/stream`:
//!   pull streams (SSE). The filter comes from the query string and is fixed
//!   for the life of the connection; a bounded replay of recent matching
//!   entries is sent first.
//!
//! Both transports register with the tap point through a [`Subscription`],
//! which unsubscribes itself when the connection task ends, whichever way it
//! ends.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Query, State,
        rejection::QueryRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use futures_util::stream::{self, BoxStream, Stream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use pulse_tap::{
    ClientMessage, ItemKind, ServerMessage, SubscribeFilters, Subscription, TapFilter, TapItem,
    TapPoint, Transport,
};

use crate::error::Result;
use crate::routes::query;
use crate::state::AppState;

/// Pull-stream filter, fixed at connect time
///
/// `level` is a comma-separated list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PullFilter {
    pub source_id: Option<String>,
    pub level: Option<String>,
    pub script_id: Option<String>,
}

impl PullFilter {
    /// Tap filter for one kind (or both when `kind` is `None`)
    pub fn to_tap_filter(&self, kind: Option<ItemKind>) -> TapFilter {
        let mut filter = TapFilter::new();
        if let Some(kind) = kind {
            filter = filter.with_kinds([kind]);
        }
        if let Some(source) = self.source_id.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.with_sources([source]);
        }
        if let Some(levels) = self.level.as_deref() {
            let levels: Vec<&str> = levels
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            if !levels.is_empty() {
                filter = filter.with_levels(levels);
            }
        }
        if let Some(script) = self.script_id.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.with_script(script);
        }
        filter
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/logs/stream", get(log_stream))
        .route("/api/monitoring/stream", get(monitoring_stream))
        .route("/api/stream", get(combined_stream))
}

// =============================================================================
// Pull stream (SSE)
// =============================================================================

type EventStream =
    Sse<axum::response::sse::KeepAliveStream<BoxStream<'static, std::result::Result<Event, Infallible>>>>;

/// GET /api/logs/stream
async fn log_stream(
    State(state): State<AppState>,
    params: std::result::Result<Query<PullFilter>, QueryRejection>,
) -> Result<EventStream> {
    pull(&state, query(params)?, Some(ItemKind::Log))
}

/// GET /api/monitoring/stream
async fn monitoring_stream(
    State(state): State<AppState>,
    params: std::result::Result<Query<PullFilter>, QueryRejection>,
) -> Result<EventStream> {
    pull(&state, query(params)?, Some(ItemKind::Monitoring))
}

/// GET /api/stream
async fn combined_stream(
    State(state): State<AppState>,
    params: std::result::Result<Query<PullFilter>, QueryRejection>,
) -> Result<EventStream> {
    pull(&state, query(params)?, None)
}

fn pull(state: &AppState, params: PullFilter, kind: Option<ItemKind>) -> Result<EventStream> {
    let subscription = state
        .tap()
        .subscribe(Transport::Pull, params.to_tap_filter(kind))?;
    debug!(id = subscription.id(), ?params, "Pull stream opened");

    Ok(Sse::new(event_stream(subscription).boxed())
        .keep_alive(KeepAlive::new().interval(state.heartbeat)))
}

/// Replay first (oldest first), then live items until the tap drops us
fn event_stream(
    mut subscription: Subscription,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> + Send {
    let replay: VecDeque<TapItem> = subscription.take_replay().into();

    stream::unfold((subscription, replay), |(mut subscription, mut replay)| async move {
        let item = match replay.pop_front() {
            Some(item) => item,
            None => subscription.recv().await?,
        };
        Some((Ok(to_event(item)), (subscription, replay)))
    })
}

fn to_event(item: TapItem) -> Event {
    let event = Event::default();
    let encoded = match item {
        TapItem::Log(entry) => event.event("log").json_data(&*entry),
        TapItem::Monitoring(entry) => event.event("monitoring").json_data(&*entry),
    };
    encoded.unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

// =============================================================================
// Push stream (WebSocket)
// =============================================================================

/// GET /ws
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let tap = Arc::clone(state.tap());
    let heartbeat = state.heartbeat;
    ws.on_upgrade(move |socket| handle_socket(socket, tap, heartbeat))
}

async fn handle_socket(mut socket: WebSocket, tap: Arc<TapPoint>, heartbeat: std::time::Duration) {
    let mut subscription = match tap.subscribe(Transport::Push, TapFilter::new()) {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(error = %e, "Rejecting push stream client");
            let frame = ServerMessage::Error {
                message: e.to_string(),
            };
            if let Ok(text) = frame.encode() {
                let _ = socket.send(Message::Text(text.into())).await;
            }
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let client_id = subscription.id();
    let (mut sender, mut receiver) = socket.split();

    if send(&mut sender, &ServerMessage::Connected { client_id }).await.is_err() {
        return;
    }
    debug!(client_id, "Push stream opened");

    let mut keepalive = tokio::time::interval(heartbeat);
    keepalive.tick().await;

    loop {
        tokio::select! {
            item = subscription.recv() => {
                let Some(item) = item else { break };
                if send(&mut sender, &ServerMessage::from(item)).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_client_message(&subscription, text.as_str());
                    if send(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = keepalive.tick() => {
                if sender.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
        }
    }

    debug!(client_id, "Push stream closed");
}

fn handle_client_message(subscription: &Subscription, text: &str) -> ServerMessage {
    let message = match ClientMessage::decode(text) {
        Ok(message) => message,
        Err(e) => {
            return ServerMessage::Error {
                message: e.to_string(),
            };
        }
    };

    match message {
        ClientMessage::Subscribe { filters } => {
            update_filter(subscription, TapFilter::from_subscribe(&filters), filters)
        }
        ClientMessage::Unsubscribe => {
            update_filter(subscription, TapFilter::new(), SubscribeFilters::default())
        }
        ClientMessage::Ping => ServerMessage::Pong,
    }
}

fn update_filter(
    subscription: &Subscription,
    filter: TapFilter,
    filters: SubscribeFilters,
) -> ServerMessage {
    match subscription.update_filter(filter) {
        Ok(()) => {
            debug!(client_id = subscription.id(), ?filters, "Push filter replaced");
            ServerMessage::Subscribed { filters }
        }
        Err(e) => ServerMessage::Error {
            message: e.to_string(),
        },
    }
}

async fn send<S>(sender: &mut S, message: &ServerMessage) -> std::result::Result<(), ()>
where
    S: futures_util::Sink<Message> + Unpin,
{
    let text = message.encode().map_err(|e| warn!(error = %e, "Failed to encode frame"))?;
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_filter_to_tap_filter() {
        let params = PullFilter {
            source_id: Some("web".into()),
            level: Some("error, WARN,".into()),
            script_id: None,
        };
        let filter = params.to_tap_filter(Some(ItemKind::Log));
        assert!(filter.accepts_kind(ItemKind::Log));
        assert!(!filter.accepts_kind(ItemKind::Monitoring));
        assert_eq!(filter.levels().map(|l| l.len()), Some(2));
        assert!(filter.levels().unwrap().contains("warn"));

        let empty = PullFilter::default().to_tap_filter(None);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_client_messages() {
        let tap = Arc::new(TapPoint::new(&pulse_config::StreamConfig::default()));
        let subscription = tap.subscribe(Transport::Push, TapFilter::new()).unwrap();

        let reply = handle_client_message(
            &subscription,
            r#"{"type":"subscribe","filters":{"levels":["error"]}}"#,
        );
        assert!(matches!(
            reply,
            ServerMessage::Subscribed { ref filters } if filters.levels == Some(vec!["error".to_string()])
        ));

        let reply = handle_client_message(&subscription, r#"{"type":"ping"}"#);
        assert!(matches!(reply, ServerMessage::Pong));

        let reply = handle_client_message(&subscription, r#"{"type":"unsubscribe"}"#);
        assert!(matches!(
            reply,
            ServerMessage::Subscribed { ref filters } if filters.levels.is_none()
        ));

        let reply = handle_client_message(&subscription, "not json");
        assert!(matches!(reply, ServerMessage::Error { .. }));
    }
}
