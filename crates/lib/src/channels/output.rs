//! Outbound side of a channel: how engine replies reach a recipient on the transport.

use crate::channels::message::{Choice, OutgoingReply};
use crate::endpoint::TransportError;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Sends replies to one recipient on one transport.
///
/// Sends are best effort: implementations log delivery failures and return normally, so the
/// engine never sees a transport error. Only `send_text` is required; the other shapes fall back
/// to plain text.
#[async_trait]
pub trait OutputChannel: Send + Sync {
    /// Channel name (e.g. "evachannel").
    fn name(&self) -> &str;

    async fn send_text(&self, recipient_id: &str, text: &str);

    /// Send text with a list of choices. Default sends the text, then one numbered line per choice.
    async fn send_choices(&self, recipient_id: &str, text: &str, choices: &[Choice]) {
        self.send_text(recipient_id, text).await;
        for (idx, choice) in choices.iter().enumerate() {
            self.send_text(recipient_id, &choice_to_string(choice, idx))
                .await;
        }
    }

    async fn send_image_url(&self, recipient_id: &str, image: &str) {
        self.send_text(recipient_id, &format!("Image: {}", image))
            .await;
    }

    async fn send_attachment(&self, recipient_id: &str, attachment: &str) {
        self.send_text(recipient_id, &format!("Attachment: {}", attachment))
            .await;
    }

    async fn send_custom_json(&self, recipient_id: &str, json: &serde_json::Value) {
        self.send_text(recipient_id, &json.to_string()).await;
    }

    /// Render one engine reply. Text without choices is split into one message per paragraph.
    async fn send_response(&self, recipient_id: &str, reply: &OutgoingReply) {
        let text = reply.text.as_deref().unwrap_or("");
        if !reply.buttons.is_empty() {
            self.send_choices(recipient_id, text, &reply.buttons).await;
        } else {
            for part in text.trim().split("\n\n") {
                let part = part.trim();
                if !part.is_empty() {
                    self.send_text(recipient_id, part).await;
                }
            }
        }
        if let Some(ref custom) = reply.custom {
            self.send_custom_json(recipient_id, custom).await;
        }
        if let Some(ref image) = reply.image {
            self.send_image_url(recipient_id, image).await;
        }
        if let Some(ref attachment) = reply.attachment {
            self.send_attachment(recipient_id, attachment).await;
        }
    }
}

/// Plain-text rendering of a choice at position `idx` (0-based): "1: Title (payload)".
pub fn choice_to_string(choice: &Choice, idx: usize) -> String {
    format!("{}: {} ({})", idx + 1, choice.title, choice.payload)
}

/// Log a failed send. Delivery failures stop here.
pub(crate) fn log_send_failure(channel: &str, err: &TransportError) {
    let status = err
        .status_code()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string());
    log::error!(
        "failed to send output message to {}. status: {} response: {} ({})",
        channel,
        status,
        err.body(),
        err
    );
}

/// A message recorded by [`CollectingOutputChannel`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedMessage {
    pub recipient_id: String,
    pub text: Option<String>,
    pub buttons: Vec<Choice>,
    pub image: Option<String>,
    pub attachment: Option<String>,
    pub custom: Option<serde_json::Value>,
}

/// Output channel that keeps every sent message in memory instead of calling a transport.
#[derive(Default)]
pub struct CollectingOutputChannel {
    messages: Mutex<Vec<CollectedMessage>>,
}

impl CollectingOutputChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, oldest first.
    pub async fn messages(&self) -> Vec<CollectedMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn latest_output(&self) -> Option<CollectedMessage> {
        self.messages.lock().await.last().cloned()
    }

    async fn push(&self, msg: CollectedMessage) {
        self.messages.lock().await.push(msg);
    }
}

#[async_trait]
impl OutputChannel for CollectingOutputChannel {
    fn name(&self) -> &str {
        "collector"
    }

    async fn send_text(&self, recipient_id: &str, text: &str) {
        self.push(CollectedMessage {
            recipient_id: recipient_id.to_string(),
            text: Some(text.to_string()),
            ..CollectedMessage::default()
        })
        .await;
    }

    async fn send_choices(&self, recipient_id: &str, text: &str, choices: &[Choice]) {
        self.push(CollectedMessage {
            recipient_id: recipient_id.to_string(),
            text: Some(text.to_string()),
            buttons: choices.to_vec(),
            ..CollectedMessage::default()
        })
        .await;
    }

    async fn send_image_url(&self, recipient_id: &str, image: &str) {
        self.push(CollectedMessage {
            recipient_id: recipient_id.to_string(),
            image: Some(image.to_string()),
            ..CollectedMessage::default()
        })
        .await;
    }

    async fn send_attachment(&self, recipient_id: &str, attachment: &str) {
        self.push(CollectedMessage {
            recipient_id: recipient_id.to_string(),
            attachment: Some(attachment.to_string()),
            ..CollectedMessage::default()
        })
        .await;
    }

    async fn send_custom_json(&self, recipient_id: &str, json: &serde_json::Value) {
        self.push(CollectedMessage {
            recipient_id: recipient_id.to_string(),
            custom: Some(json.clone()),
            ..CollectedMessage::default()
        })
        .await;
    }
}
