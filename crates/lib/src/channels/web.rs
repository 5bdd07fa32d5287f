//! Web channel: reply endpoint taken from each event, `access-token` header, button blocks,
//! single-step restart.

use crate::channels::input::{InputChannel, RestartProtocol};
use crate::channels::message::{Choice, InboundEvent, TextPayload};
use crate::channels::output::{log_send_failure, OutputChannel};
use crate::endpoint::{EndpointClient, EndpointConfig};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

pub const WEB_CHANNEL_NAME: &str = "webchannel";

/// Credentials key holding the token sent as the `access-token` header.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

const ACCESS_TOKEN_HEADER: &str = "access-token";

#[derive(Debug, Serialize)]
struct PlainText<'a> {
    #[serde(rename = "type")]
    typ: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ButtonElement<'a> {
    #[serde(rename = "type")]
    typ: &'static str,
    text: PlainText<'a>,
    value: &'a str,
}

/// `{"type": "actions", "elements": [...]}`; elements keep the order of the choices.
#[derive(Debug, Serialize)]
struct ButtonBlock<'a> {
    #[serde(rename = "type")]
    typ: &'static str,
    elements: Vec<ButtonElement<'a>>,
}

fn button_block(choices: &[Choice]) -> ButtonBlock<'_> {
    ButtonBlock {
        typ: "actions",
        elements: choices
            .iter()
            .map(|c| ButtonElement {
                typ: "button",
                text: PlainText {
                    typ: "plain_text",
                    text: &c.title,
                },
                value: &c.payload,
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
struct ChoicesPayload<'a> {
    from: Option<&'a str>,
    to: &'a str,
    text: &'a str,
    buttons: ButtonBlock<'a>,
}

/// Sends replies from one device to the endpoint chosen for its event.
pub struct WebOutput {
    client: EndpointClient,
    device: Option<String>,
    access_token: Option<String>,
}

impl WebOutput {
    pub fn new(client: EndpointClient, device: Option<String>) -> Self {
        let access_token = client.config().kwarg_str(ACCESS_TOKEN_KEY).map(String::from);
        Self {
            client,
            device,
            access_token,
        }
    }

    /// Target url of this channel's sends.
    pub fn url(&self) -> Option<&str> {
        self.client.config().url.as_deref()
    }

    fn auth_headers(&self) -> Vec<(&str, &str)> {
        self.access_token
            .as_deref()
            .map(|t| vec![(ACCESS_TOKEN_HEADER, t)])
            .unwrap_or_default()
    }

    async fn post<T: Serialize + Sync>(&self, body: &T) {
        if let Err(e) = self.client.post_json(body, &self.auth_headers()).await {
            log_send_failure(WEB_CHANNEL_NAME, &e);
        }
    }
}

#[async_trait]
impl OutputChannel for WebOutput {
    fn name(&self) -> &str {
        WEB_CHANNEL_NAME
    }

    async fn send_text(&self, recipient_id: &str, text: &str) {
        let body = TextPayload {
            from: self.device.as_deref(),
            to: recipient_id,
            text,
        };
        self.post(&body).await;
    }

    async fn send_choices(&self, recipient_id: &str, text: &str, choices: &[Choice]) {
        let body = ChoicesPayload {
            from: self.device.as_deref(),
            to: recipient_id,
            text,
            buttons: button_block(choices),
        };
        self.post(&body).await;
    }
}

/// Inbound side of the web channel. Each event may name its own reply endpoint in `ip`.
pub struct WebInput {
    client: EndpointClient,
}

impl WebInput {
    pub fn new(client: EndpointClient) -> Self {
        Self { client }
    }

    /// Client for an event's replies: a copy of the configured one, with the url replaced by a
    /// non-empty `ip`. The configured client is never changed.
    fn reply_client(&self, event: &InboundEvent) -> EndpointClient {
        match event.ip.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(ip) => self.client.with_url(ip),
            None => self.client.clone(),
        }
    }

    pub fn from_credentials(credentials: EndpointConfig) -> anyhow::Result<Self> {
        if credentials.kwarg_str(ACCESS_TOKEN_KEY).is_none() {
            log::warn!("webchannel: no access_token configured, replies are sent without access-token header");
        }
        Ok(Self::new(EndpointClient::new(credentials)?))
    }
}

impl InputChannel for WebInput {
    fn name(&self) -> &str {
        WEB_CHANNEL_NAME
    }

    fn restart_protocol(&self) -> RestartProtocol {
        RestartProtocol::SingleStep
    }

    fn output_channel(&self, event: &InboundEvent) -> Arc<dyn OutputChannel> {
        Arc::new(WebOutput::new(
            self.reply_client(event),
            event.device.clone(),
        ))
    }
}
