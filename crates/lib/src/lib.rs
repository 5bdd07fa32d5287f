//! Eva bridge core library: transport channels, engine intake, configuration and the webhook
//! gateway used by the CLI.

pub mod channels;
pub mod config;
pub mod endpoint;
pub mod engine;
pub mod gateway;
