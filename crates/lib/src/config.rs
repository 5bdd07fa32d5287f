//! Configuration types and loading.
//!
//! Gateway and engine settings come from a JSON file (e.g. `~/.eva-bridge/config.json`) and
//! environment. Channel endpoints come from a separate credentials YAML keyed by channel name.

use crate::endpoint::EndpointConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Dialogue engine endpoint. `url` is overridden by EVA_BRIDGE_ENGINE_URL.
    #[serde(default)]
    pub engine: EndpointConfig,

    /// Credentials file. Relative paths are resolved against the config file's parent.
    /// Defaults to `credentials.yml` next to the config file.
    #[serde(default)]
    pub credentials: Option<PathBuf>,
}

/// Bind address and port of the webhook server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 5005).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    5005
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the engine url: env EVA_BRIDGE_ENGINE_URL overrides config.
pub fn resolve_engine_url(config: &Config) -> Option<String> {
    non_empty_env("EVA_BRIDGE_ENGINE_URL").or_else(|| {
        config
            .engine
            .url
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("EVA_BRIDGE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".eva-bridge").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or EVA_BRIDGE_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used (for resolving the credentials file).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Resolve the credentials file: `config.credentials` if set (relative to the config file's parent),
/// otherwise `credentials.yml` next to the config file.
pub fn resolve_credentials_path(config: &Config, config_path: &Path) -> PathBuf {
    let config_parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match &config.credentials {
        Some(p) if !p.as_os_str().is_empty() => {
            if p.is_absolute() {
                p.clone()
            } else {
                config_parent.join(p)
            }
        }
        _ => config_parent.join("credentials.yml"),
    }
}

/// Credentials mapping: channel name -> endpoint settings (None for an empty entry).
pub type Credentials = BTreeMap<String, Option<EndpointConfig>>;

/// Parse a credentials YAML document. An empty document yields no entries.
pub fn parse_credentials(yaml: &str) -> Result<Credentials> {
    let blank = yaml
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#'));
    if blank {
        return Ok(Credentials::new());
    }
    let parsed: Option<Credentials> =
        serde_yaml::from_str(yaml).context("parsing credentials yaml")?;
    Ok(parsed.unwrap_or_default())
}

/// Load the credentials file. Missing file => no channels.
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    if !path.exists() {
        log::debug!("credentials file not found: {}", path.display());
        return Ok(Credentials::new());
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading credentials from {}", path.display()))?;
    parse_credentials(&s).with_context(|| format!("loading credentials from {}", path.display()))
}
