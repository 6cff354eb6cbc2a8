use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, DefaultOnNull, serde_as};

use crate::types::Row;

/// A change event delivered to channel handlers.
///
/// String fields default to `""` when the server omits them or sends `null`. `new` and
/// `old` are `None` when absent, `null` or not an object.
#[serde_as]
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RealtimePayload {
    /// Event type, e.g. `INSERT`, `UPDATE` or `DELETE`. Handlers are keyed by this value.
    #[serde(rename = "type", default)]
    #[serde_as(as = "DefaultOnNull")]
    pub event_type: String,
    #[serde(default)]
    #[serde_as(as = "DefaultOnNull")]
    pub table: String,
    #[serde(default)]
    #[serde_as(as = "DefaultOnNull")]
    pub schema: String,
    #[serde(default)]
    #[serde_as(as = "DefaultOnNull")]
    pub commit_timestamp: String,
    /// Row after the change.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub new: Option<Row>,
    /// Row before the change.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub old: Option<Row>,
}

impl RealtimePayload {
    /// Creates an empty payload of the given event type.
    #[must_use]
    pub fn new<T: Into<String>>(event_type: T) -> Self {
        Self {
            event_type: event_type.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum ControlType {
    Subscribe,
    Unsubscribe,
}

/// Outbound `{"type": …, "channel": …}` control frame.
#[derive(Debug, Serialize)]
pub(crate) struct ControlMessage<'name> {
    #[serde(rename = "type")]
    pub kind: ControlType,
    pub channel: &'name str,
}

impl<'name> ControlMessage<'name> {
    pub(crate) fn subscribe(channel: &'name str) -> Self {
        Self {
            kind: ControlType::Subscribe,
            channel,
        }
    }

    pub(crate) fn unsubscribe(channel: &'name str) -> Self {
        Self {
            kind: ControlType::Unsubscribe,
            channel,
        }
    }
}

/// Inbound frame envelope. Only `event` frames are routed; other types are ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum RealtimeMessage {
    Event {
        channel: String,
        payload: RealtimePayload,
    },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn control_message_should_match_wire_shape() {
        let subscribe = serde_json::to_string(&ControlMessage::subscribe("room1"))
            .expect("serialization failed");
        let unsubscribe = serde_json::to_string(&ControlMessage::unsubscribe("room1"))
            .expect("serialization failed");

        assert_eq!(subscribe, r#"{"type":"subscribe","channel":"room1"}"#);
        assert_eq!(unsubscribe, r#"{"type":"unsubscribe","channel":"room1"}"#);
    }

    #[test]
    fn event_frame_should_decode_with_defaults() {
        let message: RealtimeMessage = serde_json::from_value(json!({
            "type": "event",
            "channel": "room1",
            "payload": { "type": "INSERT", "new": { "id": 1 }, "old": null }
        }))
        .expect("deserialization failed");

        let RealtimeMessage::Event { channel, payload } = message else {
            panic!("expected an event frame");
        };

        assert_eq!(channel, "room1");
        assert_eq!(payload.event_type, "INSERT");
        assert_eq!(payload.table, "");
        assert_eq!(payload.commit_timestamp, "");
        assert_eq!(payload.new, json!({ "id": 1 }).as_object().cloned());
        assert_eq!(payload.old, None);
    }

    #[test]
    fn null_type_and_non_object_rows_should_decode_as_defaults() {
        let message: RealtimeMessage = serde_json::from_value(json!({
            "type": "event",
            "channel": "room1",
            "payload": { "type": null, "table": null, "new": [1, 2], "old": "gone" }
        }))
        .expect("deserialization failed");

        let RealtimeMessage::Event { payload, .. } = message else {
            panic!("expected an event frame");
        };

        assert_eq!(payload, RealtimePayload::new(""));
    }

    #[test]
    fn other_frame_types_should_decode_as_unknown() {
        let message: RealtimeMessage =
            serde_json::from_value(json!({ "type": "presence", "channel": "room1" }))
                .expect("deserialization failed");

        assert!(
            matches!(message, RealtimeMessage::Unknown),
            "unexpected message: {message:?}"
        );
    }

    #[test]
    fn event_frame_without_payload_should_fail() {
        serde_json::from_value::<RealtimeMessage>(json!({ "type": "event", "channel": "room1" }))
            .unwrap_err();
    }

    #[test]
    fn control_type_display_is_lowercase() {
        assert_eq!(ControlType::Subscribe.to_string(), "subscribe");
    }
}
