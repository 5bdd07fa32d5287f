//! Connection config for an HTTP endpoint (transport or engine) and the client that posts to it.
//!
//! An `EndpointConfig` is loaded once from the credentials mapping and never mutated afterwards.
//! Per-request differences (a different target url, an auth header) are applied to a copy or
//! passed as explicit parameters to [`EndpointClient::post_json`].

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Request timeout used when the endpoint does not set `timeout`.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

fn default_token_name() -> String {
    "token".to_string()
}

/// HTTP basic auth credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Endpoint settings: url plus optional query params, static headers, auth and extra keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Target url. Requests fail with [`TransportError::MissingUrl`] when absent.
    #[serde(default)]
    pub url: Option<String>,
    /// Query parameters added to every request.
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
    /// Headers added to every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
    /// Sent as query parameter `token_name=token` when set.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_token_name")]
    pub token_name: String,
    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Any other key from the credentials entry (e.g. `access_token`).
    #[serde(flatten)]
    pub kwargs: serde_json::Map<String, serde_json::Value>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
            basic_auth: None,
            token: None,
            token_name: default_token_name(),
            timeout: None,
            kwargs: serde_json::Map::new(),
        }
    }
}

impl EndpointConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// String value of an extra key, trimmed; None when missing, empty or not a string.
    pub fn kwarg_str(&self, key: &str) -> Option<&str> {
        self.kwargs
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Query pairs sent with each request: configured params, then the token.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), v)
            })
            .collect();
        if let Some(ref token) = self.token {
            out.push((self.token_name.clone(), token.clone()));
        }
        out
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}

/// Failure of a single outbound request.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("endpoint has no url configured")]
    MissingUrl,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("endpoint responded with status {status_code}: {body}")]
    Response { status_code: u16, body: String },
}

impl TransportError {
    /// HTTP status of the failed request, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Response { status_code, .. } => Some(*status_code),
            TransportError::Request(e) => e.status().map(|s| s.as_u16()),
            TransportError::MissingUrl => None,
        }
    }

    /// Response body of the failed request (empty when no response was received).
    pub fn body(&self) -> &str {
        match self {
            TransportError::Response { body, .. } => body,
            _ => "",
        }
    }
}

/// An endpoint config paired with an HTTP client. Cheap to clone; each clone owns its config.
#[derive(Debug, Clone)]
pub struct EndpointClient {
    config: EndpointConfig,
    http: reqwest::Client,
}

impl EndpointClient {
    pub fn new(config: EndpointConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Copy of this client targeting `url` instead of the configured url. The original is unchanged.
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        let mut config = self.config.clone();
        config.url = Some(url.into());
        Self {
            config,
            http: self.http.clone(),
        }
    }

    /// POST `body` as JSON. `extra_headers` apply to this request only.
    /// Returns the parsed response body, or None when it is empty or not JSON.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        body: &T,
        extra_headers: &[(&str, &str)],
    ) -> Result<Option<serde_json::Value>, TransportError> {
        let url = self
            .config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(TransportError::MissingUrl)?;
        let mut req = self.http.post(url).header(CONTENT_TYPE, "application/json");
        for (name, value) in &self.config.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        for (name, value) in extra_headers {
            req = req.header(*name, *value);
        }
        let query = self.config.query_params();
        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(ref auth) = self.config.basic_auth {
            req = req.basic_auth(&auth.username, Some(&auth.password));
        }
        let res = req.json(body).send().await?;
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(TransportError::Response {
                status_code: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text).ok())
    }
}
