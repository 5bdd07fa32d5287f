//! Eva channel: fixed transport endpoint, no auth header, two-step restart.

use crate::channels::input::{InputChannel, RestartProtocol};
use crate::channels::message::{InboundEvent, TextPayload};
use crate::channels::output::{log_send_failure, OutputChannel};
use crate::endpoint::{EndpointClient, EndpointConfig};
use async_trait::async_trait;
use std::sync::Arc;

pub const EVA_CHANNEL_NAME: &str = "evachannel";

/// Sends replies from one device through the configured transport endpoint.
pub struct EvaOutput {
    client: EndpointClient,
    device: Option<String>,
}

impl EvaOutput {
    pub fn new(client: EndpointClient, device: Option<String>) -> Self {
        Self { client, device }
    }
}

#[async_trait]
impl OutputChannel for EvaOutput {
    fn name(&self) -> &str {
        EVA_CHANNEL_NAME
    }

    async fn send_text(&self, recipient_id: &str, text: &str) {
        let body = TextPayload {
            from: self.device.as_deref(),
            to: recipient_id,
            text,
        };
        if let Err(e) = self.client.post_json(&body, &[]).await {
            log_send_failure(EVA_CHANNEL_NAME, &e);
        }
    }
}

/// Inbound side of the eva channel; builds one [`EvaOutput`] per event.
pub struct EvaInput {
    client: EndpointClient,
}

impl EvaInput {
    pub fn new(client: EndpointClient) -> Self {
        Self { client }
    }

    /// Build from the channel's credentials entry.
    pub fn from_credentials(credentials: EndpointConfig) -> anyhow::Result<Self> {
        Ok(Self::new(EndpointClient::new(credentials)?))
    }
}

impl InputChannel for EvaInput {
    fn name(&self) -> &str {
        EVA_CHANNEL_NAME
    }

    fn restart_protocol(&self) -> RestartProtocol {
        RestartProtocol::TwoStep
    }

    fn output_channel(&self, event: &InboundEvent) -> Arc<dyn OutputChannel> {
        Arc::new(EvaOutput::new(self.client.clone(), event.device.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_shape() {
        let body = TextPayload {
            from: Some("dev-1"),
            to: "user1",
            text: "hello",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "from": "dev-1", "to": "user1", "text": "hello" })
        );
    }

    #[test]
    fn missing_device_serializes_as_null() {
        let body = TextPayload {
            from: None,
            to: "user1",
            text: "hi",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap()["from"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn factory_binds_event_device() {
        let input = EvaInput::from_credentials(EndpointConfig::with_url("http://t/send")).unwrap();
        assert_eq!(input.restart_protocol(), RestartProtocol::TwoStep);
        let event = InboundEvent {
            device: Some("dev-9".into()),
            ..InboundEvent::default()
        };
        let out = input.output_channel(&event);
        assert_eq!(out.name(), EVA_CHANNEL_NAME);
    }
}
