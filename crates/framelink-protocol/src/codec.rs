use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, Result};
use crate::message::{message_kind, MessageKind, API_VERSION, PROTOCOL_FLAG};

/// A notification sent from the component to its host.
///
/// Values are ephemeral: built, encoded, posted and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// The component has attached its listener and is ready to render.
    #[serde(rename = "componentReady")]
    ComponentReady {
        #[serde(rename = "apiVersion")]
        api_version: u32,
    },
    /// Requested frame height in CSS pixels.
    #[serde(rename = "setFrameHeight")]
    SetFrameHeight { height: u32 },
    /// Opaque output value, forwarded without validation.
    #[serde(rename = "setComponentValue")]
    SetComponentValue {
        #[serde(default)]
        value: Value,
    },
}

impl OutboundMessage {
    /// Ready announcement carrying [`API_VERSION`].
    pub fn ready() -> Self {
        OutboundMessage::ComponentReady {
            api_version: API_VERSION,
        }
    }

    pub fn frame_height(height: u32) -> Self {
        OutboundMessage::SetFrameHeight { height }
    }

    pub fn component_value(value: Value) -> Self {
        OutboundMessage::SetComponentValue { value }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            OutboundMessage::ComponentReady { .. } => MessageKind::ComponentReady,
            OutboundMessage::SetFrameHeight { .. } => MessageKind::SetFrameHeight,
            OutboundMessage::SetComponentValue { .. } => MessageKind::SetComponentValue,
        }
    }
}

/// Encode an outbound message into its wire record.
///
/// Wire format (field order is not significant):
/// ```text
/// { "isStreamlitMessage": true, "type": "setFrameHeight", "height": 150 }
/// ```
pub fn encode_outbound(message: &OutboundMessage) -> Result<Value> {
    let mut record = serde_json::to_value(message)?;
    let fields = record.as_object_mut().ok_or(ProtocolError::NotAnObject)?;
    fields.insert(PROTOCOL_FLAG.to_string(), Value::Bool(true));
    Ok(record)
}

/// Decode a wire record as the host receives it.
///
/// Requires the membership flag and one of the three outbound types.
pub fn decode_outbound(record: &Value) -> Result<OutboundMessage> {
    let fields = record.as_object().ok_or(ProtocolError::NotAnObject)?;

    if fields.get(PROTOCOL_FLAG) != Some(&Value::Bool(true)) {
        return Err(ProtocolError::MissingFlag);
    }

    let message_type = fields
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    match message_kind(message_type) {
        Some(kind) if kind.is_outbound() => Ok(serde_json::from_value(record.clone())?),
        _ => Err(ProtocolError::UnknownType(message_type.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ready_carries_api_version_one() {
        let record = encode_outbound(&OutboundMessage::ready()).unwrap();
        assert_eq!(
            record,
            json!({"isStreamlitMessage": true, "type": "componentReady", "apiVersion": 1})
        );
    }

    #[test]
    fn frame_height_record_shape() {
        let record = encode_outbound(&OutboundMessage::frame_height(150)).unwrap();
        assert_eq!(
            record,
            json!({"isStreamlitMessage": true, "type": "setFrameHeight", "height": 150})
        );
    }

    #[test]
    fn component_value_is_forwarded_verbatim() {
        let value = json!({"a": 1, "nested": [null, "x", {"b": false}]});
        let record = encode_outbound(&OutboundMessage::component_value(value.clone())).unwrap();

        assert_eq!(record["type"], "setComponentValue");
        assert_eq!(record["value"], value);
        assert_eq!(record[PROTOCOL_FLAG], true);
    }

    #[test]
    fn decode_accepts_encoded_records() {
        let message = OutboundMessage::component_value(json!(["x", 2]));
        let record = encode_outbound(&message).unwrap();
        assert_eq!(decode_outbound(&record).unwrap(), message);
    }

    #[test]
    fn decode_rejects_unflagged_records() {
        let record = json!({"type": "setFrameHeight", "height": 10});
        assert!(matches!(
            decode_outbound(&record),
            Err(ProtocolError::MissingFlag)
        ));

        let record = json!({"isStreamlitMessage": "yes", "type": "setFrameHeight", "height": 10});
        assert!(matches!(
            decode_outbound(&record),
            Err(ProtocolError::MissingFlag)
        ));
    }

    #[test]
    fn decode_rejects_render_and_unknown_types() {
        let render = json!({"isStreamlitMessage": true, "type": "streamlit:render"});
        assert!(matches!(
            decode_outbound(&render),
            Err(ProtocolError::UnknownType(t)) if t == "streamlit:render"
        ));

        let untyped = json!({"isStreamlitMessage": true});
        assert!(matches!(
            decode_outbound(&untyped),
            Err(ProtocolError::UnknownType(t)) if t.is_empty()
        ));

        assert!(matches!(
            decode_outbound(&json!([1, 2])),
            Err(ProtocolError::NotAnObject)
        ));
    }

    #[test]
    fn decode_rejects_negative_height() {
        let record = json!({"isStreamlitMessage": true, "type": "setFrameHeight", "height": -5});
        assert!(matches!(decode_outbound(&record), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn missing_value_decodes_as_null() {
        let record = json!({"isStreamlitMessage": true, "type": "setComponentValue"});
        assert_eq!(
            decode_outbound(&record).unwrap(),
            OutboundMessage::component_value(Value::Null)
        );
    }
}
