use super::*;
use serde_json::json;

#[test]
fn test_decode_valid_envelope() {
    let raw = br#"{"type":"emojiAdded","body":{"emoji":{"name":"blob"}}}"#;

    let envelope = decode(raw).unwrap();
    assert_eq!(envelope.event_type, "emojiAdded");
    assert_eq!(envelope.body.get("emoji"), Some(&json!({"name": "blob"})));
}

#[test]
fn test_decode_ignores_extra_fields() {
    let raw = br#"{"type":"pong","body":{},"extra":42}"#;

    let envelope = Envelope::decode(raw).unwrap();
    assert_eq!(envelope.event_type, "pong");
    assert!(envelope.body.is_empty());
}

#[test]
fn test_malformed_json_fails() {
    let result = decode(b"{\"type\":");
    match result.unwrap_err() {
        DecodeError::Malformed(_) => {}
        other => panic!("Expected Malformed error, got {:?}", other),
    }
}

#[test]
fn test_non_object_frame_fails() {
    assert_eq!(decode(b"[1, 2, 3]").unwrap_err(), DecodeError::NotAnObject);
    assert_eq!(decode(b"\"connect\"").unwrap_err(), DecodeError::NotAnObject);
}

#[test]
fn test_missing_type_fails() {
    let result = decode(br#"{"body":{}}"#);
    assert_eq!(result.unwrap_err(), DecodeError::MissingType);
}

#[test]
fn test_non_string_type_fails() {
    assert_eq!(
        decode(br#"{"type":7,"body":{}}"#).unwrap_err(),
        DecodeError::TypeNotString
    );
    assert_eq!(
        decode(br#"{"type":null,"body":{}}"#).unwrap_err(),
        DecodeError::TypeNotString
    );
}

#[test]
fn test_missing_body_fails() {
    let result = decode(br#"{"type":"emojiAdded"}"#);
    assert_eq!(result.unwrap_err(), DecodeError::MissingBody);
}

#[test]
fn test_non_object_body_fails() {
    let result = decode(br#"{"type":"emojiAdded","body":[]}"#);
    assert_eq!(result.unwrap_err(), DecodeError::BodyNotObject);
}

#[test]
fn test_subscribe_frame_round_trip() {
    let id = SubscriptionId::new();
    let text = ControlFrame::subscribe(id).encode().unwrap();

    let envelope = decode(text.as_bytes()).unwrap();
    assert_eq!(envelope.event_type, "connect");
    assert_eq!(
        Value::Object(envelope.body),
        json!({"channel": "main", "id": id.to_string()})
    );
}

#[test]
fn test_unsubscribe_frame_shape() {
    let id = SubscriptionId::new();
    let text = ControlFrame::unsubscribe(id).encode().unwrap();

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        value,
        json!({"type": "disconnect", "body": {"id": id.to_string()}})
    );
}

#[test]
fn test_subscription_id_is_hyphenated_uuid() {
    let id = SubscriptionId::new();
    let text = id.to_string();
    assert_eq!(text.len(), 36);
    assert_eq!(text, id.as_uuid().to_string());
    assert_ne!(id, SubscriptionId::new());
}
