//! Tests for push-stream frames

use super::*;
use crate::testutil::{log_item, monitoring_item};

#[test]
fn test_decode_subscribe() {
    let msg = ClientMessage::decode(
        r#"{"type":"subscribe","filters":{"sources":["app"],"levels":["error","warn"]}}"#,
    )
    .unwrap();

    assert_eq!(
        msg,
        ClientMessage::Subscribe {
            filters: SubscribeFilters {
                sources: Some(vec!["app".into()]),
                levels: Some(vec!["error".into(), "warn".into()]),
            }
        }
    );
}

#[test]
fn test_decode_subscribe_without_filters() {
    let msg = ClientMessage::decode(r#"{"type":"subscribe"}"#).unwrap();
    assert_eq!(
        msg,
        ClientMessage::Subscribe {
            filters: SubscribeFilters::default()
        }
    );
}

#[test]
fn test_decode_simple_frames() {
    assert_eq!(
        ClientMessage::decode(r#"{"type":"ping"}"#).unwrap(),
        ClientMessage::Ping
    );
    assert_eq!(
        ClientMessage::decode(r#"{"type":"unsubscribe"}"#).unwrap(),
        ClientMessage::Unsubscribe
    );
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(matches!(
        ClientMessage::decode("not json"),
        Err(TapError::Protocol(_))
    ));
    assert!(matches!(
        ClientMessage::decode(r#"{"type":"explode"}"#),
        Err(TapError::Protocol(_))
    ));
}

#[test]
fn test_encode_log_frame() {
    let text = ServerMessage::from(log_item("1", "app", "error"))
        .encode()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["type"], "log");
    assert_eq!(value["data"]["id"], "1");
    assert_eq!(value["data"]["sourceId"], "app");
    assert_eq!(value["data"]["level"], "error");
}

#[test]
fn test_encode_monitoring_frame() {
    let text = ServerMessage::from(monitoring_item("m", "app", "main"))
        .encode()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["type"], "monitoring");
    assert_eq!(value["data"]["type"], "state");
}

#[test]
fn test_encode_control_frames() {
    assert_eq!(
        ServerMessage::Connected { client_id: 7 }.encode().unwrap(),
        r#"{"type":"connected","clientId":7}"#
    );
    assert_eq!(ServerMessage::Pong.encode().unwrap(), r#"{"type":"pong"}"#);
    assert_eq!(
        ServerMessage::Error {
            message: "bad".into()
        }
        .encode()
        .unwrap(),
        r#"{"type":"error","message":"bad"}"#
    );
}
