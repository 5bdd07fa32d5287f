//! Transport channels (evachannel, webchannel).
//!
//! Each channel pairs an inbound webhook side ([`InputChannel`]) with a per-event outbound side
//! ([`OutputChannel`]). Inbound events are turned into [`UserMessage`]s for the engine; the engine
//! replies through the output channel carried by each message.

mod eva;
mod input;
mod message;
mod output;
mod registry;
mod web;

pub use eva::{EvaInput, EvaOutput, EVA_CHANNEL_NAME};
pub use input::{
    contains_trigger_token, dispatch_event, webhook_router, InputChannel, RestartProtocol,
    RESTART_COMMAND, START_BOT_COMMAND, TRIGGER_TOKEN, WEBHOOK_ACK, WEBHOOK_BODY_LIMIT,
};
pub use message::{Choice, InboundEvent, OutgoingReply, UserMessage, DEFAULT_SENDER_ID};
pub use output::{choice_to_string, CollectedMessage, CollectingOutputChannel, OutputChannel};
pub use registry::ChannelRegistry;
pub use web::{WebInput, WebOutput, ACCESS_TOKEN_KEY, WEB_CHANNEL_NAME};
