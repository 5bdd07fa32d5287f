//! Dialogue engine intake.
//!
//! The engine is external: the adapter only hands it normalized messages through
//! [`MessageHandler`]. [`RestEngine`] is the handler used by the server; it forwards each
//! message to the engine's REST endpoint and relays the returned replies through the
//! message's output channel.

use crate::channels::{OutgoingReply, UserMessage};
use crate::endpoint::{EndpointClient, TransportError};
use async_trait::async_trait;
use serde::Serialize;

/// Engine message intake. Returns once the message has been handed off.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: UserMessage) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("engine reply could not be parsed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Body posted to the engine for each message.
#[derive(Debug, Serialize)]
struct EngineRequest<'a> {
    sender: &'a str,
    message: &'a str,
    input_channel: &'a str,
    message_id: &'a str,
}

/// Client for an engine that answers `POST {sender, message}` with a JSON array of replies.
#[derive(Debug, Clone)]
pub struct RestEngine {
    client: EndpointClient,
}

impl RestEngine {
    pub fn new(client: EndpointClient) -> Self {
        Self { client }
    }

    /// POST the message to the engine and return its replies. An empty body means no replies.
    pub async fn forward(&self, message: &UserMessage) -> Result<Vec<OutgoingReply>, EngineError> {
        let body = EngineRequest {
            sender: message.sender_id(),
            message: message.content(),
            input_channel: message.input_channel(),
            message_id: message.message_id(),
        };
        let res = self.client.post_json(&body, &[]).await?;
        match res {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }
}

#[async_trait]
impl MessageHandler for RestEngine {
    async fn handle(&self, message: UserMessage) -> anyhow::Result<()> {
        let replies = self.forward(&message).await?;
        log::debug!(
            "engine returned {} reply(ies) for sender {} on {}",
            replies.len(),
            message.sender_id(),
            message.input_channel()
        );
        let output = message.output_channel();
        for reply in &replies {
            let recipient = reply.recipient_id.as_deref().unwrap_or(message.sender_id());
            output.send_response(recipient, reply).await;
        }
        Ok(())
    }
}
