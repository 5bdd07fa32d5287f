//! Shared helpers for integration tests: a fake HTTP endpoint that records every request.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use bridge::channels::{InputChannel, UserMessage};
use bridge::engine::MessageHandler;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One request received by a [`CaptureServer`].
#[derive(Debug, Clone)]
pub struct Captured {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct CaptureState {
    requests: Arc<Mutex<Vec<Captured>>>,
    statuses: Arc<Mutex<VecDeque<u16>>>,
    reply: Option<serde_json::Value>,
}

/// Fake endpoint. Answers with the queued statuses in order, then 200; the body is `reply` as
/// JSON, or empty when `reply` is None.
pub struct CaptureServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl CaptureServer {
    pub async fn start(statuses: Vec<u16>, reply: Option<serde_json::Value>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = CaptureState {
            requests: requests.clone(),
            statuses: Arc::new(Mutex::new(statuses.into())),
            reply,
        };
        let app = Router::new().fallback(capture).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind capture server");
        let addr = listener.local_addr().expect("local_addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn requests(&self) -> Vec<Captured> {
        self.requests.lock().await.clone()
    }
}

async fn capture(
    State(state): State<CaptureState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.requests.lock().await.push(Captured {
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
        headers,
        body,
    });
    let status = state.statuses.lock().await.pop_front().unwrap_or(200);
    let status = StatusCode::from_u16(status).expect("valid status");
    match state.reply {
        Some(ref reply) => (status, axum::Json(reply.clone())).into_response(),
        None => status.into_response(),
    }
}

/// A url on localhost where nothing is listening.
pub fn closed_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let port = listener.local_addr().expect("local_addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}/send", port)
}

/// A message as seen by [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub content: String,
    pub sender_id: String,
    pub input_channel: String,
}

/// Engine stand-in: records every message and, when `echo` is set, replies with
/// "echo: <content>" through the message's output channel. Fails on `fail_on` contents.
#[derive(Default)]
pub struct RecordingHandler {
    pub seen: Mutex<Vec<Seen>>,
    pub echo: bool,
    pub fail_on: Vec<&'static str>,
}

impl RecordingHandler {
    pub async fn contents(&self) -> Vec<String> {
        self.seen.lock().await.iter().map(|s| s.content.clone()).collect()
    }
}

#[async_trait::async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, message: UserMessage) -> anyhow::Result<()> {
        self.seen.lock().await.push(Seen {
            content: message.content().to_string(),
            sender_id: message.sender_id().to_string(),
            input_channel: message.input_channel().to_string(),
        });
        if self.fail_on.iter().any(|c| *c == message.content()) {
            anyhow::bail!("engine unavailable");
        }
        if self.echo {
            message
                .output_channel()
                .send_text(message.sender_id(), &format!("echo: {}", message.content()))
                .await;
        }
        Ok(())
    }
}

/// Serve `app` on a free localhost port; returns its base url.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind app");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

pub fn as_input(channel: impl InputChannel + 'static) -> Arc<dyn InputChannel> {
    Arc::new(channel)
}
