//! Inbound side of a channel: webhook routes, command interception and dispatch to the engine.

use crate::channels::message::{InboundEvent, UserMessage};
use crate::channels::output::OutputChannel;
use crate::engine::MessageHandler;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Token in user text that restarts the conversation instead of being forwarded. Matched case-insensitively.
pub const TRIGGER_TOKEN: &str = "#eva";

/// Engine command that clears the conversation.
pub const RESTART_COMMAND: &str = "/restart";

/// Engine command that opens a new conversation.
pub const START_BOT_COMMAND: &str = "/start_bot";

/// Body returned for every webhook POST.
pub const WEBHOOK_ACK: &str = "success";

/// Largest webhook body read before it is dropped (still acknowledged).
pub const WEBHOOK_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// True when `text` contains the trigger token in any letter case. Missing text never matches.
pub fn contains_trigger_token(text: Option<&str>) -> bool {
    text.map(|t| t.to_lowercase().contains(TRIGGER_TOKEN))
        .unwrap_or(false)
}

/// Commands sent to the engine in place of text that contains the trigger token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartProtocol {
    /// Reset, then start.
    TwoStep,
    /// Start only.
    SingleStep,
}

impl RestartProtocol {
    /// Commands in delivery order.
    pub fn commands(self) -> &'static [&'static str] {
        match self {
            RestartProtocol::TwoStep => &[RESTART_COMMAND, START_BOT_COMMAND],
            RestartProtocol::SingleStep => &[START_BOT_COMMAND],
        }
    }
}

/// A transport variant: its name, restart protocol, and how it builds an output channel per event.
pub trait InputChannel: Send + Sync {
    /// Channel name; also the route segment under `/webhooks/`.
    fn name(&self) -> &str;

    fn restart_protocol(&self) -> RestartProtocol;

    /// Build a fresh output channel addressed by the event (device, and for some variants the endpoint).
    fn output_channel(&self, event: &InboundEvent) -> Arc<dyn OutputChannel>;
}

/// Route one inbound event to the engine.
///
/// Text containing the trigger token is replaced by the channel's restart commands, each awaited
/// before the next is issued; a failed command stops the sequence. Any other text (including
/// none) is forwarded as one message. Engine errors are logged and not returned.
pub async fn dispatch_event(
    channel: &dyn InputChannel,
    event: InboundEvent,
    handler: &dyn MessageHandler,
) {
    let output_channel = channel.output_channel(&event);
    let sender = event.contact;

    if contains_trigger_token(event.message.as_deref()) {
        log::debug!(
            "{}: trigger token from {:?}, sending restart commands",
            channel.name(),
            sender
        );
        for command in channel.restart_protocol().commands() {
            let msg = UserMessage::new(
                *command,
                output_channel.clone(),
                sender.clone(),
                channel.name(),
            );
            if let Err(e) = handler.handle(msg).await {
                log::warn!("{}: engine rejected {}: {}", channel.name(), command, e);
                return;
            }
        }
    } else {
        let msg = UserMessage::new(
            event.message.unwrap_or_default(),
            output_channel,
            sender,
            channel.name(),
        );
        if let Err(e) = handler.handle(msg).await {
            log::warn!("{}: engine failed to handle message: {}", channel.name(), e);
        }
    }
}

#[derive(Clone)]
struct WebhookState {
    channel: Arc<dyn InputChannel>,
    handler: Arc<dyn MessageHandler>,
}

/// Routes for one channel under `/webhooks/<name>`: `GET /` liveness and `POST /webhook`.
pub fn webhook_router(channel: Arc<dyn InputChannel>, handler: Arc<dyn MessageHandler>) -> Router {
    let base = format!("/webhooks/{}", channel.name());
    Router::new()
        .route(&base, get(health))
        .route(&format!("{}/", base), get(health))
        .route(
            &format!("{}/webhook", base),
            post(receive).layer(DefaultBodyLimit::max(WEBHOOK_BODY_LIMIT)),
        )
        .with_state(WebhookState { channel, handler })
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /webhooks/<name>/webhook: always acknowledged with "success".
async fn receive(
    State(state): State<WebhookState>,
    body: Result<Bytes, BytesRejection>,
) -> &'static str {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            log::warn!("{}: dropping unreadable webhook body: {}", state.channel.name(), e);
            return WEBHOOK_ACK;
        }
    };
    match serde_json::from_slice::<InboundEvent>(&body) {
        Ok(event) => {
            dispatch_event(state.channel.as_ref(), event, state.handler.as_ref()).await;
        }
        Err(e) => {
            log::warn!("{}: ignoring malformed webhook body: {}", state.channel.name(), e);
        }
    }
    WEBHOOK_ACK
}
