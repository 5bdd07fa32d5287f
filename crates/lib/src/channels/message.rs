//! Message types crossing the adapter: inbound webhook event, normalized user message, reply shapes.

use crate::channels::output::OutputChannel;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

/// Sender id used when the inbound event carries no contact.
pub const DEFAULT_SENDER_ID: &str = "default";

/// Webhook POST body from the transport. Every field is optional so a partial payload still parses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InboundEvent {
    /// Sender of the message (becomes the user message sender id).
    #[serde(default, deserialize_with = "lenient_string")]
    pub contact: Option<String>,
    /// User text.
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    /// Transport device that received the message; replies are sent from it.
    #[serde(default, deserialize_with = "lenient_string")]
    pub device: Option<String>,
    /// Reply endpoint for this event (webchannel only).
    #[serde(default, deserialize_with = "lenient_string")]
    pub ip: Option<String>,
}

/// Accept strings, numbers and booleans as text; anything else (null, objects) becomes None.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Normalized message handed once to the dialogue engine.
#[derive(Clone)]
pub struct UserMessage {
    content: String,
    output_channel: Arc<dyn OutputChannel>,
    sender_id: String,
    input_channel: String,
    message_id: String,
}

impl UserMessage {
    pub fn new(
        content: impl Into<String>,
        output_channel: Arc<dyn OutputChannel>,
        sender_id: Option<String>,
        input_channel: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            output_channel,
            sender_id: sender_id.unwrap_or_else(|| DEFAULT_SENDER_ID.to_string()),
            input_channel: input_channel.into(),
            message_id: uuid::Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn output_channel(&self) -> &Arc<dyn OutputChannel> {
        &self.output_channel
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    /// Name of the input channel the message came from (e.g. "evachannel").
    pub fn input_channel(&self) -> &str {
        &self.input_channel
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

impl fmt::Debug for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserMessage")
            .field("content", &self.content)
            .field("output_channel", &self.output_channel.name())
            .field("sender_id", &self.sender_id)
            .field("input_channel", &self.input_channel)
            .field("message_id", &self.message_id)
            .finish()
    }
}

/// A selectable option offered with a reply (rendered as a button where the transport supports it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub title: String,
    #[serde(default)]
    pub payload: String,
}

impl Choice {
    pub fn new(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// Text reply body shared by both transports: `{"from": device, "to": recipient, "text": text}`.
#[derive(Debug, Serialize)]
pub(crate) struct TextPayload<'a> {
    pub from: Option<&'a str>,
    pub to: &'a str,
    pub text: &'a str,
}

/// One reply from the engine. Any combination of fields may be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
}

impl OutgoingReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::CollectingOutputChannel;

    #[test]
    fn inbound_event_tolerates_missing_and_null_fields() {
        let e: InboundEvent =
            serde_json::from_str(r#"{"contact":"u1","message":null}"#).unwrap();
        assert_eq!(e.contact.as_deref(), Some("u1"));
        assert_eq!(e.message, None);
        assert_eq!(e.device, None);
        assert_eq!(e.ip, None);
    }

    #[test]
    fn inbound_event_accepts_numeric_contact() {
        let e: InboundEvent =
            serde_json::from_str(r#"{"contact":5511999,"message":"hi","device":"d1"}"#).unwrap();
        assert_eq!(e.contact.as_deref(), Some("5511999"));
        assert_eq!(e.device.as_deref(), Some("d1"));
    }

    #[test]
    fn user_message_defaults_sender() {
        let out = Arc::new(CollectingOutputChannel::new());
        let m = UserMessage::new("hello", out, None, "evachannel");
        assert_eq!(m.sender_id(), DEFAULT_SENDER_ID);
        assert_eq!(m.input_channel(), "evachannel");
        assert_eq!(m.message_id().len(), 32);
    }

    #[test]
    fn reply_parses_engine_shape() {
        let r: OutgoingReply = serde_json::from_str(
            r#"{"recipient_id":"u1","text":"pick","buttons":[{"title":"A","payload":"/a"},{"title":"B"}]}"#,
        )
        .unwrap();
        assert_eq!(r.recipient_id.as_deref(), Some("u1"));
        assert_eq!(r.buttons, vec![Choice::new("A", "/a"), Choice::new("B", "")]);
    }
}
