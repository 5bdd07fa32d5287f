//! Channel registry: the input channels enabled by the credentials mapping, looked up by name.

use crate::channels::eva::{EvaInput, EVA_CHANNEL_NAME};
use crate::channels::input::InputChannel;
use crate::channels::web::{WebInput, WEB_CHANNEL_NAME};
use crate::endpoint::EndpointConfig;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Channels available to the gateway, in name order.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: Vec<Arc<dyn InputChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every known channel that has a credentials entry. Unknown names are skipped with a warning.
    pub fn from_credentials(credentials: BTreeMap<String, Option<EndpointConfig>>) -> Result<Self> {
        let mut registry = Self::new();
        for (name, entry) in credentials {
            let channel: Arc<dyn InputChannel> = match name.as_str() {
                EVA_CHANNEL_NAME => Arc::new(EvaInput::from_credentials(required(&name, entry)?)?),
                WEB_CHANNEL_NAME => Arc::new(WebInput::from_credentials(required(&name, entry)?)?),
                other => {
                    log::warn!("ignoring credentials for unknown channel {}", other);
                    continue;
                }
            };
            registry.register(channel);
        }
        Ok(registry)
    }

    /// Add a channel; replaces any channel with the same name.
    pub fn register(&mut self, channel: Arc<dyn InputChannel>) {
        self.channels.retain(|c| c.name() != channel.name());
        log::info!("channel registered: {}", channel.name());
        self.channels.push(channel);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn InputChannel>> {
        self.channels.iter().find(|c| c.name() == name).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn InputChannel>> {
        self.channels.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

fn required(name: &str, entry: Option<EndpointConfig>) -> Result<EndpointConfig> {
    entry.with_context(|| format!("no credentials given for channel {}", name))
}
